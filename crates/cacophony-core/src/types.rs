//! Common types for Cacophony
//!
//! Grid geometry, cell addressing, screen-space primitives and the stereo
//! sample type shared by the audio backend.

/// Number of cells along each side of the square grid
pub const GRID_SIZE: i32 = 144;

/// Size of one cell in grid pixels (also the sprite tile size)
pub const CELL_SIZE: u32 = 32;

/// Side length of the composited grid bitmap in pixels
pub const GRID_PIXELS: u32 = GRID_SIZE as u32 * CELL_SIZE;

/// Audio sample type (32-bit float for processing)
pub type Sample = f32;

/// A grid position in screen orientation (row 0 is the top row)
///
/// The dataset stores rows bottom-up; [`Cell::stored_row`] is the single
/// place where that flip happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The grid's center cell (used for the initial selection and recentering)
    pub const fn center() -> Self {
        Self::new(GRID_SIZE / 2, GRID_SIZE / 2)
    }

    /// Whether the cell lies inside `[0, GRID_SIZE)` on both axes
    #[inline]
    pub fn in_bounds(&self) -> bool {
        (0..GRID_SIZE).contains(&self.x) && (0..GRID_SIZE).contains(&self.y)
    }

    /// Clamp both coordinates into the grid
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0, GRID_SIZE - 1),
            y: self.y.clamp(0, GRID_SIZE - 1),
        }
    }

    /// Row index as stored in the dataset (vertical axis flipped)
    #[inline]
    pub fn stored_row(&self) -> i32 {
        GRID_SIZE - 1 - self.y
    }

    /// Build a cell from a dataset `(x, stored_row)` pair
    #[inline]
    pub fn from_stored(x: i32, stored_row: i32) -> Self {
        Self::new(x, GRID_SIZE - 1 - stored_row)
    }

    /// Dataset key `"{x}_{stored_row}"`
    pub fn dataset_key(&self) -> String {
        format!("{}_{}", self.x, self.stored_row())
    }

    /// Top-left corner of the cell in grid pixels
    #[inline]
    pub fn origin_px(&self) -> (f32, f32) {
        (
            self.x as f32 * CELL_SIZE as f32,
            self.y as f32 * CELL_SIZE as f32,
        )
    }

    /// Center of the cell in grid pixels
    #[inline]
    pub fn center_px(&self) -> (f32, f32) {
        let (x, y) = self.origin_px();
        let half = CELL_SIZE as f32 / 2.0;
        (x + half, y + half)
    }
}

/// A point in screen (viewport-relative) pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square rectangle helper
    #[inline]
    pub const fn square(x: f32, y: f32, size: f32) -> Self {
        Self::new(x, y, size, size)
    }
}

/// Size of the visible canvas in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A viewport is usable once the host has reported a non-zero size
    #[inline]
    pub fn is_known(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    #[inline]
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A single stereo sample (left and right channels)
///
/// `#[repr(C)]` keeps the `[left, right]` layout, so stereo device buffers
/// are mixed in place through [`StereoSample::frames_mut`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StereoSample {
    pub left: Sample,
    pub right: Sample,
}

impl StereoSample {
    #[inline]
    pub fn new(left: Sample, right: Sample) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn silence() -> Self {
        Self::default()
    }

    /// Same value in both channels
    #[inline]
    pub fn mono(value: Sample) -> Self {
        Self { left: value, right: value }
    }

    /// Zero-copy view of an interleaved stereo buffer as frames
    ///
    /// `None` when the buffer holds an odd number of samples.
    #[inline]
    pub fn frames_mut(interleaved: &mut [Sample]) -> Option<&mut [StereoSample]> {
        bytemuck::try_cast_slice_mut(interleaved).ok()
    }
}

impl std::ops::AddAssign for StereoSample {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.left += other.left;
        self.right += other.right;
    }
}

impl std::ops::Mul<Sample> for StereoSample {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Sample) -> Self {
        Self {
            left: self.left * factor,
            right: self.right * factor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_row_flip_is_involutive() {
        let cell = Cell::new(3, 10);
        let back = Cell::from_stored(cell.x, cell.stored_row());
        assert_eq!(back, cell);
        assert_eq!(cell.stored_row(), GRID_SIZE - 11);
    }

    #[test]
    fn test_dataset_key_uses_flipped_row() {
        assert_eq!(Cell::new(0, 0).dataset_key(), format!("0_{}", GRID_SIZE - 1));
        assert_eq!(Cell::new(5, GRID_SIZE - 1).dataset_key(), "5_0");
    }

    #[test]
    fn test_clamped_and_bounds() {
        assert!(!Cell::new(-1, 4).in_bounds());
        assert_eq!(Cell::new(-1, GRID_SIZE + 3).clamped(), Cell::new(0, GRID_SIZE - 1));
        assert!(Cell::center().in_bounds());
    }

    #[test]
    fn test_frames_view_aliases_interleaved_buffer() {
        let mut data = [0.1, 0.2, 0.3, 0.4];
        let frames = StereoSample::frames_mut(&mut data).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], StereoSample::new(0.3, 0.4));
        frames[0] = StereoSample::mono(1.0);
        assert_eq!(data, [1.0, 1.0, 0.3, 0.4]);

        assert!(StereoSample::frames_mut(&mut [0.0; 3]).is_none());
    }

    #[test]
    fn test_cell_center_px() {
        let (cx, cy) = Cell::new(2, 1).center_px();
        assert_eq!(cx, 2.0 * CELL_SIZE as f32 + CELL_SIZE as f32 / 2.0);
        assert_eq!(cy, CELL_SIZE as f32 * 1.5);
    }
}
