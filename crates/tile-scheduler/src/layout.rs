//! Layout solver.
//!
//! Computes the tile grid that maximizes per-tile area inside a container,
//! and the page capacity used by paginated grids. Both are pure functions of
//! their inputs; degenerate inputs short-circuit to a trivial result instead
//! of dividing by zero.

use serde::Serialize;

/// Default tile aspect ratio (16:9).
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Grid chosen for a set of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileGeometry {
    pub cols: u32,
    pub rows: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileGeometry {
    /// Result for "nothing to render": the whole container, no grid.
    #[must_use]
    pub const fn empty(width: u32, height: u32) -> Self {
        Self {
            cols: 0,
            rows: 0,
            tile_width: width,
            tile_height: height,
        }
    }

    /// Area of a single tile in square pixels.
    #[must_use]
    pub fn tile_area(&self) -> u64 {
        u64::from(self.tile_width) * u64::from(self.tile_height)
    }
}

/// Capacity of one page in a paginated grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageGeometry {
    pub cols: u32,
    pub rows: u32,
    pub page_size: usize,
}

fn usable_aspect(aspect_ratio: f64) -> Option<f64> {
    (aspect_ratio.is_finite() && aspect_ratio > 0.0).then_some(aspect_ratio)
}

/// Floor to whole pixels, absorbing float error on exact ratios
/// (`400 / (16/9)` must yield 225, not 224).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_px(value: f64) -> u32 {
    (value + 1e-6).floor().max(0.0) as u32
}

/// Find the column count that maximizes tile area without overflowing.
///
/// Every column count from 1 to `tile_count` is tried. For each, a tile that
/// fills the width and a tile that fills the height are computed, and the
/// one that fits in the other dimension is kept. A later candidate replaces
/// the best only when its area is strictly larger, so ties go to fewer
/// columns.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn solve(tile_count: usize, width: u32, height: u32, aspect_ratio: f64) -> TileGeometry {
    let Some(aspect) = usable_aspect(aspect_ratio) else {
        return TileGeometry::empty(width, height);
    };
    if tile_count == 0 || width == 0 || height == 0 {
        return TileGeometry::empty(width, height);
    }

    // Columns beyond the container width would produce zero-width tiles.
    let max_cols = tile_count.min(width as usize);
    let mut best: Option<TileGeometry> = None;

    for cols in 1..=max_cols {
        let rows = tile_count.div_ceil(cols);
        let (cols, rows) = (cols as u32, rows as u32);

        let fill_width = {
            let tile_width = width / cols;
            let tile_height = floor_px(f64::from(tile_width) / aspect);
            (tile_width, tile_height)
        };
        let fill_height = {
            let tile_height = height / rows;
            let tile_width = floor_px(f64::from(tile_height) * aspect);
            (tile_width, tile_height)
        };

        let (tile_width, tile_height) =
            if u64::from(fill_width.1) * u64::from(rows) <= u64::from(height) {
                fill_width
            } else {
                fill_height
            };

        if u64::from(tile_width) * u64::from(cols) > u64::from(width) {
            continue;
        }

        let candidate = TileGeometry {
            cols,
            rows,
            tile_width,
            tile_height,
        };
        if best.map_or(true, |b| candidate.tile_area() > b.tile_area()) {
            best = Some(candidate);
        }
    }

    best.unwrap_or_else(|| TileGeometry::empty(width, height))
}

/// Single-column geometry for the continuous-scroll list.
#[must_use]
pub fn list_geometry(tile_count: usize, tile_width: u32, aspect_ratio: f64) -> TileGeometry {
    let aspect = usable_aspect(aspect_ratio).unwrap_or(DEFAULT_ASPECT_RATIO);
    TileGeometry {
        cols: u32::from(tile_count > 0),
        rows: u32::try_from(tile_count).unwrap_or(u32::MAX),
        tile_width,
        tile_height: floor_px(f64::from(tile_width) / aspect),
    }
}

/// How many tiles fit on one page of a paginated grid.
///
/// Columns are as many `min_tile_width` tiles as fit across; rows are as
/// many of the resulting tile heights as fit down. The product is capped by
/// `max_tiles_per_page`. Always at least one tile.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn page_geometry(
    width: u32,
    height: u32,
    aspect_ratio: f64,
    min_tile_width: u32,
    max_tiles_per_page: usize,
) -> PageGeometry {
    let cap = max_tiles_per_page.max(1);
    let cols = if min_tile_width == 0 {
        1
    } else {
        (width / min_tile_width).max(1)
    };

    let rows = match usable_aspect(aspect_ratio) {
        Some(aspect) if width > 0 && height > 0 => {
            let tile_height = f64::from(width) / f64::from(cols) / aspect;
            floor_px(f64::from(height) / tile_height).max(1)
        }
        _ => 1,
    };

    let page_size = (cols as usize).saturating_mul(rows as usize).min(cap);
    PageGeometry {
        cols,
        rows,
        page_size,
    }
}
