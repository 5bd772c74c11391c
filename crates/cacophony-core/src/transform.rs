//! Grid ⇄ screen transform
//!
//! A grid-pixel point `(gx, gy)` maps to the screen point
//! `(gx * scale + translate_x, gy * scale + translate_y)`.

use crate::types::{Cell, ScreenPoint, ScreenRect, Viewport, CELL_SIZE, GRID_PIXELS};

/// Scale and translation of the grid on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Transform {
    pub const fn new(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    #[inline]
    pub fn grid_to_screen(&self, gx: f32, gy: f32) -> ScreenPoint {
        ScreenPoint::new(
            gx * self.scale + self.translate_x,
            gy * self.scale + self.translate_y,
        )
    }

    #[inline]
    pub fn screen_to_grid(&self, p: ScreenPoint) -> (f32, f32) {
        (
            (p.x - self.translate_x) / self.scale,
            (p.y - self.translate_y) / self.scale,
        )
    }

    /// Cell under a screen point, without clamping
    pub fn screen_to_cell_unclamped(&self, p: ScreenPoint) -> Cell {
        let (gx, gy) = self.screen_to_grid(p);
        let cell = CELL_SIZE as f32;
        Cell::new((gx / cell).floor() as i32, (gy / cell).floor() as i32)
    }

    /// Cell under a screen point, clamped into the grid
    pub fn screen_to_cell(&self, p: ScreenPoint) -> Cell {
        self.screen_to_cell_unclamped(p).clamped()
    }

    pub fn cell_to_screen_center(&self, cell: Cell) -> ScreenPoint {
        let (cx, cy) = cell.center_px();
        self.grid_to_screen(cx, cy)
    }

    /// Side length of one cell on screen
    #[inline]
    pub fn cell_screen_size(&self) -> f32 {
        CELL_SIZE as f32 * self.scale
    }

    /// Screen rectangle covered by a cell
    pub fn cell_rect(&self, cell: Cell) -> ScreenRect {
        let (gx, gy) = cell.origin_px();
        let origin = self.grid_to_screen(gx, gy);
        ScreenRect::square(origin.x, origin.y, self.cell_screen_size())
    }

    /// Screen rectangle covered by the whole grid bitmap
    pub fn grid_rect(&self) -> ScreenRect {
        let size = GRID_PIXELS as f32 * self.scale;
        ScreenRect::square(self.translate_x, self.translate_y, size)
    }

    /// Rescale while keeping `focus`'s center fixed on screen
    pub fn focal_zoom(&self, new_scale: f32, focus: Cell) -> Transform {
        let (cx, cy) = focus.center_px();
        let anchor = self.grid_to_screen(cx, cy);
        Transform::new(new_scale, anchor.x - cx * new_scale, anchor.y - cy * new_scale)
    }

    /// Whether both translations are within `tolerance` px of `other`
    pub fn translate_near(&self, other: &Transform, tolerance: f32) -> bool {
        (self.translate_x - other.translate_x).abs() < tolerance
            && (self.translate_y - other.translate_y).abs() < tolerance
    }
}

/// Transform at `scale` that puts the center of `target` at the viewport center
pub fn center_transform(scale: f32, target: Cell, viewport: Viewport) -> Transform {
    let (cx, cy) = target.center_px();
    let center = viewport.center();
    Transform::new(scale, center.x - cx * scale, center.y - cy * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GRID_SIZE;

    #[test]
    fn test_screen_cell_roundtrip() {
        let transforms = [
            Transform::new(0.1, 0.0, 0.0),
            Transform::new(0.5, -1234.5, 87.25),
            Transform::new(1.0, 300.0, -2000.0),
            Transform::new(2.0, -9000.0, -9000.0),
        ];
        for t in transforms {
            for x in (0..GRID_SIZE).step_by(13) {
                for y in (0..GRID_SIZE).step_by(11) {
                    let cell = Cell::new(x, y);
                    assert_eq!(t.screen_to_cell(t.cell_to_screen_center(cell)), cell, "{:?}", t);
                }
            }
            let corner = Cell::new(GRID_SIZE - 1, GRID_SIZE - 1);
            assert_eq!(t.screen_to_cell(t.cell_to_screen_center(corner)), corner);
        }
    }

    #[test]
    fn test_screen_to_cell_clamps() {
        let t = Transform::new(1.0, 0.0, 0.0);
        assert_eq!(t.screen_to_cell(ScreenPoint::new(-50.0, 1e7)), Cell::new(0, GRID_SIZE - 1));
        assert_eq!(t.screen_to_cell_unclamped(ScreenPoint::new(-1.0, 0.0)), Cell::new(-1, 0));
    }

    #[test]
    fn test_center_transform_places_cell_at_viewport_center() {
        let viewport = Viewport::new(800.0, 600.0);
        let cell = Cell::new(10, 20);
        let t = center_transform(0.5, cell, viewport);
        let p = t.cell_to_screen_center(cell);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_focal_zoom_keeps_cell_fixed() {
        let t = Transform::new(0.7, -321.0, 45.0);
        let focus = Cell::new(33, 90);
        let before = t.cell_to_screen_center(focus);
        let after = t.focal_zoom(1.4, focus).cell_to_screen_center(focus);
        assert!((before.x - after.x).abs() < 1e-2);
        assert!((before.y - after.y).abs() < 1e-2);
    }
}
