//! Edge panning
//!
//! While the pointer is held, pressing toward a viewport edge pans the grid.
//! An axis pans only when the pointer is near that axis's edge *and* its
//! direction from the viewport center points toward the same edge.

use crate::types::{Cell, ScreenPoint, Viewport, GRID_SIZE};

/// Unit-ish pan direction in screen space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanVector {
    pub x: f32,
    pub y: f32,
}

impl PanVector {
    pub const ZERO: PanVector = PanVector { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Which viewport edges the pointer is close to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeProximity {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

/// Edge distance that counts as "near"; grows with zoom
#[inline]
pub fn edge_threshold(scale: f32) -> f32 {
    10.0 * scale + 110.0
}

pub fn edge_proximity(p: ScreenPoint, viewport: Viewport, threshold: f32) -> EdgeProximity {
    EdgeProximity {
        left: p.x < threshold,
        right: p.x > viewport.width - threshold,
        top: p.y < threshold,
        bottom: p.y > viewport.height - threshold,
    }
}

/// Normalized direction from the viewport center, zero at the center
pub fn direction_from_center(p: ScreenPoint, viewport: Viewport) -> PanVector {
    let center = viewport.center();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    let mag = (dx * dx + dy * dy).sqrt();
    if mag == 0.0 {
        return PanVector::ZERO;
    }
    PanVector::new(dx / mag, dy / mag)
}

/// Pan direction for a held pointer at `p`
pub fn pan_intent(p: ScreenPoint, viewport: Viewport, scale: f32) -> PanVector {
    let edges = edge_proximity(p, viewport, edge_threshold(scale));
    let dir = direction_from_center(p, viewport);

    let mut pan = PanVector::ZERO;
    if (edges.right && dir.x > 0.0) || (edges.left && dir.x < 0.0) {
        pan.x = dir.x;
    }
    if (edges.bottom && dir.y > 0.0) || (edges.top && dir.y < 0.0) {
        pan.y = dir.y;
    }
    pan
}

/// Zero each axis whose selection already sits on the grid boundary it pans toward
pub fn clamp_pan_to_grid(pan: PanVector, selected: Cell) -> PanVector {
    let last = GRID_SIZE - 1;
    let blocked_x = (selected.x == last && pan.x > 0.0) || (selected.x == 0 && pan.x < 0.0);
    let blocked_y = (selected.y == last && pan.y > 0.0) || (selected.y == 0 && pan.y < 0.0);
    PanVector::new(
        if blocked_x { 0.0 } else { pan.x },
        if blocked_y { 0.0 } else { pan.y },
    )
}
