//! Canvas program for the clip grid
//!
//! Paints one [`RenderFrame`] back to front (background, grid, trails,
//! spotlight, label) and publishes pointer, wheel and size changes through a
//! single callback.

use cacophony_core::engine::RenderFrame;
use cacophony_core::types::{ScreenPoint, ScreenRect, Viewport};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke, Text};
use iced::widget::image::Handle;
use iced::{mouse, touch, Color, Point, Rectangle, Size, Theme};

use super::{GridEvent, GridImages, LabelSpan, MetadataLabel};
use crate::theme::{to_color, LABEL_BG, LABEL_BORDER, LABEL_GAP};

const LABEL_PADDING: f32 = 10.0;
const LABEL_MIN_WIDTH: f32 = 130.0;
const LABEL_EMOJI_SIZE: f32 = 24.0;
const SPAN_GAP: f32 = 6.0;

/// State kept by the canvas between events
#[derive(Debug, Clone, Copy, Default)]
pub struct GridInteraction {
    /// Last size reported through [`GridEvent::Resized`]
    pub size: Option<Size>,
}

/// Canvas program painting the engine's render frame
pub struct GridCanvas<'a, F> {
    pub frame: Option<&'a RenderFrame>,
    pub images: &'a GridImages,
    pub label: Option<&'a MetadataLabel>,
    /// Whether the engine holds the pointer down; releases are handled
    /// window-wide by the application
    pub held: bool,
    pub on_event: F,
}

impl<'a, F> GridCanvas<'a, F> {
    /// Translate one event into a grid event and whether to capture it
    ///
    /// Pointer input wins over a pending size change, which is reported on
    /// the next event that carries nothing else.
    fn translate(
        &self,
        interaction: &mut GridInteraction,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<(GridEvent, bool)> {
        if let Some(pointer) = self.pointer_event(event, bounds, cursor) {
            return Some(pointer);
        }

        let bounds_size = bounds.size();
        if interaction.size != Some(bounds_size) {
            interaction.size = Some(bounds_size);
            return Some((
                GridEvent::Resized(Viewport::new(bounds_size.width, bounds_size.height)),
                false,
            ));
        }
        None
    }

    fn pointer_event(
        &self,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<(GridEvent, bool)> {
        let relative = |p: Point| ScreenPoint::new(p.x - bounds.x, p.y - bounds.y);

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => cursor
                .position_over(bounds)
                .map(|position| (GridEvent::Pressed(relative(position)), true)),
            Event::Mouse(mouse::Event::CursorMoved { position }) if self.held => {
                Some((GridEvent::Moved(relative(*position)), false))
            }
            Event::Mouse(mouse::Event::WheelScrolled { delta }) if cursor.is_over(bounds) => {
                let y = match delta {
                    mouse::ScrollDelta::Lines { y, .. } | mouse::ScrollDelta::Pixels { y, .. } => *y,
                };
                (y != 0.0).then_some((GridEvent::Wheel(-y), true))
            }
            Event::Touch(touch::Event::FingerPressed { position, .. })
                if bounds.contains(*position) =>
            {
                Some((GridEvent::Pressed(relative(*position)), true))
            }
            Event::Touch(touch::Event::FingerMoved { position, .. }) if self.held => {
                Some((GridEvent::Moved(relative(*position)), false))
            }
            _ => None,
        }
    }
}

impl<'a, Message, F> Program<Message> for GridCanvas<'a, F>
where
    Message: Clone,
    F: Fn(GridEvent) -> Message,
{
    type State = GridInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let (grid_event, capture) = self.translate(interaction, event, bounds, cursor)?;
        let action = canvas::Action::publish((self.on_event)(grid_event));
        Some(if capture { action.and_capture() } else { action })
    }

    fn mouse_interaction(
        &self,
        _interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.held {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        let Some(render) = self.frame else {
            frame.fill_rectangle(
                Point::ORIGIN,
                bounds.size(),
                to_color(cacophony_core::palette::NEUTRAL),
            );
            return vec![frame.into_geometry()];
        };

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), to_color(render.background));

        if let Some(layer) = &render.grid {
            if let Some(handle) = self.images.grid(layer.generation) {
                frame.draw_image(rectangle(layer.rect), image(handle));
            }
        }

        for trail in &render.trails {
            frame.stroke(
                &Path::rectangle(top_left(trail.rect), size(trail.rect)),
                Stroke::default()
                    .with_color(to_color(trail.color))
                    .with_width(trail.width),
            );
        }

        if let Some(spot) = &render.spotlight {
            frame.stroke(
                &Path::rectangle(top_left(spot.rect), size(spot.rect)),
                Stroke::default()
                    .with_color(to_color(spot.border))
                    .with_width(spot.border_width),
            );
            if let Some(handle) = self.images.spotlight() {
                frame.draw_image(rectangle(spot.rect), image(handle));
            }
            frame.fill_rectangle(top_left(spot.rect), size(spot.rect), to_color(spot.tint));
        }

        if let (Some(anchor), Some(label)) = (render.label_anchor, self.label) {
            draw_label(&mut frame, anchor, label);
        }

        vec![frame.into_geometry()]
    }
}

fn image(handle: &Handle) -> canvas::Image {
    canvas::Image::new(handle.clone())
}

fn top_left(r: ScreenRect) -> Point {
    Point::new(r.x, r.y)
}

fn size(r: ScreenRect) -> Size {
    Size::new(r.width, r.height)
}

fn rectangle(r: ScreenRect) -> Rectangle {
    Rectangle::new(top_left(r), size(r))
}

/// Rough advance width of a text run (no shaping available on a frame)
fn span_width(span: &LabelSpan) -> f32 {
    span.text.chars().count() as f32 * span.size * 0.6
}

fn line_width(spans: &[LabelSpan]) -> f32 {
    let text: f32 = spans.iter().map(span_width).sum();
    text + SPAN_GAP * spans.len().saturating_sub(1) as f32
}

/// Label box centred on `anchor.x` whose bottom edge sits `LABEL_GAP` above
/// `anchor.y`
fn draw_label(frame: &mut Frame, anchor: ScreenPoint, label: &MetadataLabel) {
    let title_height = label.title.iter().map(|s| s.size).fold(0.0, f32::max);
    let detail_height = label.detail.iter().map(|s| s.size).fold(0.0, f32::max);
    let text_width = line_width(&label.title).max(line_width(&label.detail));

    let width = (text_width + LABEL_EMOJI_SIZE + LABEL_PADDING * 3.0).max(LABEL_MIN_WIDTH);
    let height = title_height + detail_height + 4.0 + LABEL_PADDING * 2.0;
    let origin = Point::new(anchor.x - width / 2.0, anchor.y - LABEL_GAP - height);

    let panel = Path::rounded_rectangle(origin, Size::new(width, height), 8.0.into());
    frame.fill(&panel, LABEL_BG);
    frame.stroke(&panel, Stroke::default().with_color(LABEL_BORDER).with_width(1.0));

    let left = origin.x + LABEL_PADDING;
    let title_y = origin.y + LABEL_PADDING + title_height / 2.0;
    let detail_y = title_y + title_height / 2.0 + 4.0 + detail_height / 2.0;
    draw_spans(frame, &label.title, left, title_y);
    draw_spans(frame, &label.detail, left, detail_y);

    frame.fill_text(Text {
        content: label.emoji.to_string(),
        position: Point::new(origin.x + width - LABEL_PADDING, origin.y + height / 2.0),
        size: LABEL_EMOJI_SIZE.into(),
        color: Color::BLACK,
        align_x: Horizontal::Right.into(),
        align_y: Vertical::Center.into(),
        ..Text::default()
    });
}

fn draw_spans(frame: &mut Frame, spans: &[LabelSpan], mut x: f32, center_y: f32) {
    for span in spans {
        frame.fill_text(Text {
            content: span.text.clone(),
            position: Point::new(x, center_y),
            size: span.size.into(),
            color: span.color,
            align_x: Horizontal::Left.into(),
            align_y: Vertical::Center.into(),
            ..Text::default()
        });
        x += span_width(span) + SPAN_GAP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, size: f32) -> LabelSpan {
        LabelSpan {
            text: text.to_string(),
            color: Color::BLACK,
            size,
        }
    }

    #[test]
    fn test_line_width_adds_gaps() {
        let spans = [span("abcd", 10.0), span("ef", 10.0)];
        assert!((line_width(&spans) - (24.0 + 12.0 + SPAN_GAP)).abs() < 1e-4);
        assert_eq!(line_width(&[]), 0.0);
    }

    fn canvas(images: &GridImages, held: bool) -> GridCanvas<'_, fn(GridEvent) -> GridEvent> {
        GridCanvas {
            frame: None,
            images,
            label: None,
            held,
            on_event: |e| e,
        }
    }

    const BOUNDS: Rectangle = Rectangle {
        x: 10.0,
        y: 20.0,
        width: 300.0,
        height: 200.0,
    };

    #[test]
    fn test_press_is_not_swallowed_by_pending_resize() {
        let images = GridImages::new();
        let grid = canvas(&images, false);
        let mut interaction = GridInteraction::default();
        let cursor = mouse::Cursor::Available(Point::new(60.0, 70.0));
        let press = Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left));

        assert_eq!(
            grid.translate(&mut interaction, &press, BOUNDS, cursor),
            Some((GridEvent::Pressed(ScreenPoint::new(50.0, 50.0)), true))
        );

        let idle = Event::Mouse(mouse::Event::CursorEntered);
        assert_eq!(
            grid.translate(&mut interaction, &idle, BOUNDS, cursor),
            Some((GridEvent::Resized(Viewport::new(300.0, 200.0)), false))
        );
        assert_eq!(grid.translate(&mut interaction, &idle, BOUNDS, cursor), None);
    }

    #[test]
    fn test_moves_follow_engine_hold_state() {
        let images = GridImages::new();
        let mut interaction = GridInteraction {
            size: Some(BOUNDS.size()),
        };
        let moved = Event::Mouse(mouse::Event::CursorMoved {
            position: Point::new(500.0, 70.0),
        });
        let cursor = mouse::Cursor::Available(Point::new(500.0, 70.0));

        assert_eq!(
            canvas(&images, false).translate(&mut interaction, &moved, BOUNDS, cursor),
            None
        );
        assert_eq!(
            canvas(&images, true).translate(&mut interaction, &moved, BOUNDS, cursor),
            Some((GridEvent::Moved(ScreenPoint::new(490.0, 50.0)), false))
        );

        let release = Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left));
        assert_eq!(
            canvas(&images, true).translate(&mut interaction, &release, BOUNDS, cursor),
            None
        );
    }

    #[test]
    fn test_rect_conversion() {
        let r = ScreenRect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(rectangle(r), Rectangle::new(Point::new(1.0, 2.0), Size::new(3.0, 4.0)));
    }
}
