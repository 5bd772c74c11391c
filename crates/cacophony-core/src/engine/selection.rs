//! Nearest-valid-cell search
//!
//! Rings of Chebyshev radius `1..GRID_SIZE/2` are scanned around the start
//! cell, `dx` outer and `dy` inner, visiting only perimeter cells. The first
//! passing cell in scan order wins, which is not always the Euclidean-nearest
//! one; callers rely on that tie-break staying stable.

use crate::dataset::Dataset;
use crate::filter::CompiledFilters;
use crate::types::{Cell, GRID_SIZE};

/// Whether a cell has a record that passes the filters
#[inline]
pub fn is_valid_cell(cell: Cell, dataset: &Dataset, filters: &CompiledFilters) -> bool {
    dataset
        .get(cell)
        .is_some_and(|record| filters.matches(Some(record)))
}

/// First passing cell around `start`, or `None` when no ring has one
pub fn find_nearest_valid_cell(
    start: Cell,
    dataset: &Dataset,
    filters: &CompiledFilters,
) -> Option<Cell> {
    if is_valid_cell(start, dataset, filters) {
        return Some(start);
    }

    for r in 1..GRID_SIZE / 2 {
        for dx in -r..=r {
            for dy in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let cell = Cell::new(start.x + dx, start.y + dy);
                if cell.in_bounds() && is_valid_cell(cell, dataset, filters) {
                    return Some(cell);
                }
            }
        }
    }
    None
}
