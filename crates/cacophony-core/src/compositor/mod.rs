//! Grid compositor
//!
//! Builds the filter-aware bitmap of the whole grid from the dataset, the
//! sprite sheet, the filter set and the colour mode. Cells whose record passes
//! the filters get their thumbnail (plus an optional tint and 1 px border);
//! every other cell is filled with the neutral background.
//!
//! The result is published as an immutable [`CompositedGrid`]; the render pass
//! only ever sees complete bitmaps.

mod spotlight;
mod worker;

pub use image::RgbaImage;
pub use spotlight::{gamma_darken, spotlight_tile};
pub use worker::{CompositorWorker, RebuildRequest};

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::dataset::Dataset;
use crate::filter::FilterSet;
use crate::palette::{darken, ColorMode, Rgba8, BORDER_DARKEN, NEUTRAL, TINT_ALPHA};
use crate::types::{Cell, CELL_SIZE, GRID_PIXELS};

/// Errors that can occur while loading the sprite sheet
#[derive(Error, Debug)]
pub enum SpriteError {
    #[error("Failed to read sprite sheet {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to decode sprite sheet: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Sprite sheet is {width}x{height}, expected at least {expected}x{expected}")]
    Dimensions {
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Load and validate the sprite sheet (one `CELL_SIZE` tile per cell)
pub fn load_sprite<P: AsRef<Path>>(path: P) -> Result<RgbaImage, SpriteError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| SpriteError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let sprite = decode_sprite(&bytes)?;
    log::info!(
        "Sprite sheet loaded from {:?}: {}x{}",
        path,
        sprite.width(),
        sprite.height()
    );
    Ok(sprite)
}

/// Decode an in-memory sprite sheet
pub fn decode_sprite(bytes: &[u8]) -> Result<RgbaImage, SpriteError> {
    let sprite = image::load_from_memory(bytes)?.to_rgba8();
    if sprite.width() < GRID_PIXELS || sprite.height() < GRID_PIXELS {
        return Err(SpriteError::Dimensions {
            width: sprite.width(),
            height: sprite.height(),
            expected: GRID_PIXELS,
        });
    }
    Ok(sprite)
}

/// A published grid bitmap tagged with the rebuild that produced it
#[derive(Debug, Clone)]
pub struct CompositedGrid {
    pub image: Arc<RgbaImage>,
    pub generation: u64,
}

/// Top-left of a cell's tile, shared by the sprite sheet and the grid bitmap
#[inline]
fn tile_origin(cell: Cell) -> (u32, u32) {
    (cell.x as u32 * CELL_SIZE, cell.y as u32 * CELL_SIZE)
}

/// Copy one tile from the sprite sheet; returns false if it lies outside
fn copy_tile(dst: &mut RgbaImage, sprite: &RgbaImage, cell: Cell) -> bool {
    let (ox, oy) = tile_origin(cell);
    if ox + CELL_SIZE > sprite.width() || oy + CELL_SIZE > sprite.height() {
        return false;
    }

    let row_bytes = (CELL_SIZE * 4) as usize;
    let src_stride = (sprite.width() * 4) as usize;
    let dst_stride = (dst.width() * 4) as usize;
    let src = sprite.as_raw();
    let dst_raw: &mut [u8] = dst;

    for row in 0..CELL_SIZE as usize {
        let s = (oy as usize + row) * src_stride + ox as usize * 4;
        let d = (oy as usize + row) * dst_stride + ox as usize * 4;
        dst_raw[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
    }
    true
}

/// Tint a tile and outline it with the darkened colour
fn overlay_tile(dst: &mut RgbaImage, cell: Cell, color: Rgba8) {
    let (ox, oy) = tile_origin(cell);
    let tint = color.with_alpha(TINT_ALPHA);
    let border = darken(color, BORDER_DARKEN).to_array();
    let last = CELL_SIZE - 1;

    for ty in 0..CELL_SIZE {
        for tx in 0..CELL_SIZE {
            let px = dst.get_pixel_mut(ox + tx, oy + ty);
            px.0 = if tx == 0 || ty == 0 || tx == last || ty == last {
                border
            } else {
                tint.blend_over(px.0)
            };
        }
    }
}

/// Render the whole grid for a filter set and colour mode
///
/// Deterministic: identical inputs produce pixel-identical output. Without a
/// sprite sheet thumbnails are left neutral but tints still apply.
pub fn composite_grid(
    dataset: &Dataset,
    sprite: Option<&RgbaImage>,
    filters: &FilterSet,
    mode: ColorMode,
) -> RgbaImage {
    let start = std::time::Instant::now();
    let compiled = filters.compile();
    let mut grid = RgbaImage::from_pixel(GRID_PIXELS, GRID_PIXELS, image::Rgba(NEUTRAL.to_array()));
    let mut drawn = 0usize;

    for (cell, record) in dataset.iter() {
        if !compiled.matches(Some(record)) {
            continue;
        }
        if let Some(sprite) = sprite {
            copy_tile(&mut grid, sprite, cell);
        }
        if let Some(color) = mode.color_for(record) {
            overlay_tile(&mut grid, cell, color);
        }
        drawn += 1;
    }

    log::debug!(
        "Composited grid: {} of {} cells pass ({:?}, {} filters) in {:?}",
        drawn,
        dataset.len(),
        mode,
        filters.active_names().count(),
        start.elapsed()
    );
    grid
}
