//! Render pass
//!
//! Turns the engine state into a [`RenderFrame`]: a flat list of what to
//! paint, in order. The host only has to draw it; no engine logic lives in
//! the canvas.

use std::sync::Arc;

use image::RgbaImage;

use crate::compositor::CompositedGrid;
use crate::dataset::ClipRecord;
use crate::palette::{darken, ColorMode, Rgba8, ACCENT, BORDER_DARKEN, NEUTRAL, SPOTLIGHT_TINT};
use crate::transform::Transform;
use crate::types::{Cell, ScreenPoint, ScreenRect, Viewport, CELL_SIZE};

/// Spotlight side length in screen pixels (independent of zoom)
pub const SPOTLIGHT_SIZE: f32 = CELL_SIZE as f32 * 2.0;
pub const SPOTLIGHT_BORDER_WIDTH: f32 = 3.5;
pub const TRAIL_WIDTH: f32 = 1.5;

/// The composited grid placed on screen
#[derive(Debug, Clone)]
pub struct GridLayer {
    pub image: Arc<RgbaImage>,
    pub generation: u64,
    pub rect: ScreenRect,
}

/// Outline of a recently visited cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailOutline {
    pub rect: ScreenRect,
    pub color: Rgba8,
    pub width: f32,
}

/// Enlarged, darkened view of the selected cell
#[derive(Debug, Clone)]
pub struct Spotlight {
    pub cell: Cell,
    pub rect: ScreenRect,
    /// Gamma-darkened thumbnail; absent without a sprite sheet
    pub image: Option<Arc<RgbaImage>>,
    pub tint: Rgba8,
    pub border: Rgba8,
    pub border_width: f32,
}

/// Everything to paint for one frame, back to front
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub viewport: Viewport,
    pub background: Rgba8,
    pub grid: Option<GridLayer>,
    pub trails: Vec<TrailOutline>,
    pub spotlight: Option<Spotlight>,
    /// Bottom-center point of the metadata label (the spotlight's top edge)
    pub label_anchor: Option<ScreenPoint>,
}

/// State read by the render pass
pub struct SceneInput<'a> {
    pub viewport: Viewport,
    pub transform: Transform,
    pub grid: Option<&'a CompositedGrid>,
    /// Live trail marks with their opacity
    pub trails: &'a [(Cell, f32)],
    pub selected: Cell,
    pub selected_record: Option<&'a ClipRecord>,
    pub color_mode: ColorMode,
    pub spotlight_image: Option<Arc<RgbaImage>>,
}

/// Screen rectangle of the spotlight around `cell`
pub fn spotlight_rect(transform: &Transform, cell: Cell) -> ScreenRect {
    let cell_rect = transform.cell_rect(cell);
    let offset = (SPOTLIGHT_SIZE - cell_rect.width) / 2.0;
    ScreenRect::square(cell_rect.x - offset, cell_rect.y - offset, SPOTLIGHT_SIZE)
}

/// Whether the spotlight for a cell whose origin is at `cell_rect` is on screen
fn spotlight_visible(cell_rect: &ScreenRect, viewport: Viewport) -> bool {
    cell_rect.x + SPOTLIGHT_SIZE > 0.0
        && cell_rect.y + SPOTLIGHT_SIZE > 0.0
        && cell_rect.x < viewport.width
        && cell_rect.y < viewport.height
}

pub fn build_frame(input: SceneInput<'_>) -> RenderFrame {
    let t = &input.transform;

    let grid = input.grid.map(|g| GridLayer {
        image: Arc::clone(&g.image),
        generation: g.generation,
        rect: t.grid_rect(),
    });

    let trails = input
        .trails
        .iter()
        .map(|&(cell, alpha)| TrailOutline {
            rect: t.cell_rect(cell),
            color: ACCENT.with_alpha((alpha.clamp(0.0, 1.0) * 255.0).round() as u8),
            width: TRAIL_WIDTH,
        })
        .collect();

    let mut spotlight = None;
    let mut label_anchor = None;

    if let Some(record) = input.selected_record {
        let cell_rect = t.cell_rect(input.selected);
        let rect = spotlight_rect(t, input.selected);
        label_anchor = Some(ScreenPoint::new(cell_rect.x + cell_rect.width / 2.0, rect.y));

        if spotlight_visible(&cell_rect, input.viewport) {
            let border = input
                .color_mode
                .color_for(record)
                .map(|c| darken(c, BORDER_DARKEN))
                .unwrap_or(ACCENT);
            spotlight = Some(Spotlight {
                cell: input.selected,
                rect,
                image: input.spotlight_image,
                tint: SPOTLIGHT_TINT,
                border,
                border_width: SPOTLIGHT_BORDER_WIDTH,
            });
        }
    }

    RenderFrame {
        viewport: input.viewport,
        background: NEUTRAL,
        grid,
        trails,
        spotlight,
        label_anchor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::record;
    use crate::dataset::{Gender, SoundType};
    use crate::palette::gender_color;

    fn input<'a>(
        transform: Transform,
        trails: &'a [(Cell, f32)],
        record: Option<&'a ClipRecord>,
        mode: ColorMode,
    ) -> SceneInput<'a> {
        SceneInput {
            viewport: Viewport::new(800.0, 600.0),
            transform,
            grid: None,
            trails,
            selected: Cell::new(10, 10),
            selected_record: record,
            color_mode: mode,
            spotlight_image: None,
        }
    }

    #[test]
    fn test_spotlight_is_centered_on_cell() {
        let r = record("a", 30.0, Gender::Male, SoundType::Cough);
        let t = Transform::new(0.5, 0.0, 0.0);
        let frame = build_frame(input(t, &[], Some(&r), ColorMode::None));

        let spot = frame.spotlight.unwrap();
        // Cell (10,10) at scale 0.5 spans 160..176
        assert_eq!(spot.rect, ScreenRect::square(136.0, 136.0, 64.0));
        assert_eq!(spot.border, ACCENT);
        assert_eq!(frame.label_anchor, Some(ScreenPoint::new(168.0, 136.0)));
    }

    #[test]
    fn test_spotlight_border_follows_color_mode() {
        let r = record("a", 30.0, Gender::Female, SoundType::Cough);
        let t = Transform::new(1.0, 0.0, 0.0);
        let frame = build_frame(input(t, &[], Some(&r), ColorMode::Gender));
        assert_eq!(
            frame.spotlight.unwrap().border,
            darken(gender_color(Gender::Female), BORDER_DARKEN)
        );
    }

    #[test]
    fn test_no_spotlight_without_record_or_off_screen() {
        let t = Transform::new(1.0, 0.0, 0.0);
        let frame = build_frame(input(t, &[], None, ColorMode::None));
        assert!(frame.spotlight.is_none());
        assert!(frame.label_anchor.is_none());

        let r = record("a", 30.0, Gender::Male, SoundType::Cough);
        let far = Transform::new(1.0, -5000.0, 0.0);
        let frame = build_frame(input(far, &[], Some(&r), ColorMode::None));
        assert!(frame.spotlight.is_none());
        // The label anchor still tracks the cell
        assert!(frame.label_anchor.is_some());
    }

    #[test]
    fn test_trails_fade_with_alpha() {
        let t = Transform::new(1.0, 10.0, 20.0);
        let trails = [(Cell::new(1, 1), 0.5), (Cell::new(2, 2), 1.0)];
        let frame = build_frame(input(t, &trails, None, ColorMode::None));
        assert_eq!(frame.trails.len(), 2);
        assert_eq!(frame.trails[0].rect, ScreenRect::square(42.0, 52.0, 32.0));
        assert_eq!(frame.trails[0].color.a, 128);
        assert_eq!(frame.trails[1].color.a, 255);
        assert_eq!(frame.background, NEUTRAL);
    }
}
