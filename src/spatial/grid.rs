//! Sub-pixel tile extraction from the full-resolution image
//!
//! A normalized sampling grid spanning `[-scale, scale]` per axis is built
//! once per tile shape. For each tile it is scaled by the tile-to-image ratio,
//! translated to the tile center, mapped to corner-aligned pixel coordinates
//! and reflected at the image border. Pixels are then read with bilinear
//! interpolation, so the global scale factor is absorbed by the sampling and
//! never requires resizing the whole image.

use crate::math::interpolation::LinearTap;
use crate::spatial::extension::reflect_coordinate;
use ndarray::{Array1, Array3, ArrayView3};

/// Normalized per-axis sampling positions for one tile shape
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    rows: Array1<f64>,
    cols: Array1<f64>,
}

impl SamplingGrid {
    /// Grid of `tile_shape` points spanning `[-scale, scale]` on each axis
    pub fn new(tile_shape: (usize, usize), scale: f64) -> Self {
        Self {
            rows: Array1::linspace(-scale, scale, tile_shape.0),
            cols: Array1::linspace(-scale, scale, tile_shape.1),
        }
    }

    /// Tile shape (rows, cols)
    pub fn tile_shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// Bilinear taps along the row axis for a tile centered on image row `center`
    pub fn row_taps(&self, center: i64, extent: usize) -> Vec<LinearTap> {
        axis_taps(&self.rows, center, extent)
    }

    /// Bilinear taps along the column axis for a tile centered on image column `center`
    pub fn col_taps(&self, center: i64, extent: usize) -> Vec<LinearTap> {
        axis_taps(&self.cols, center, extent)
    }
}

/// Pixel coordinate that normalized grid value `g` samples for a tile of
/// `tile_len` centered at `center` on an axis of `extent` pixels
pub fn grid_to_pixel(g: f64, center: i64, tile_len: usize, extent: usize) -> f64 {
    let s = extent as f64;
    let half = s / 2.0;
    let normalized = g.mul_add(tile_len as f64 / s, (center as f64 - half) / half);
    (normalized + 1.0) / 2.0 * (s - 1.0)
}

fn axis_taps(grid: &Array1<f64>, center: i64, extent: usize) -> Vec<LinearTap> {
    let tile_len = grid.len();
    grid.iter()
        .map(|&g| {
            let pixel = grid_to_pixel(g, center, tile_len, extent);
            LinearTap::at(reflect_coordinate(pixel, extent), extent)
        })
        .collect()
}

/// Extracts channel-first tiles from a `(rows, cols, channels)` image
#[derive(Debug, Clone)]
pub struct TileSampler {
    grid: SamplingGrid,
}

impl TileSampler {
    /// Sampler for one tile shape and scale
    pub fn new(tile_shape: (usize, usize), scale: f64) -> Self {
        Self {
            grid: SamplingGrid::new(tile_shape, scale),
        }
    }

    /// Resample the tile centered at `image_center` (row, col)
    ///
    /// Returns a `(channels, tile_rows, tile_cols)` array. An image with an
    /// empty side yields zeros.
    pub fn sample(&self, image: ArrayView3<'_, f32>, image_center: [i64; 2]) -> Array3<f32> {
        let (rows, cols, channels) = image.dim();
        let (tile_rows, tile_cols) = self.grid.tile_shape();
        if rows == 0 || cols == 0 {
            return Array3::zeros((channels, tile_rows, tile_cols));
        }

        let row_taps = self.grid.row_taps(image_center[0], rows);
        let col_taps = self.grid.col_taps(image_center[1], cols);
        let pixel = |r: usize, c: usize, ch: usize| image.get((r, c, ch)).copied().unwrap_or(0.0);

        Array3::from_shape_fn((channels, tile_rows, tile_cols), |(ch, i, j)| {
            match (row_taps.get(i), col_taps.get(j)) {
                (Some(rt), Some(ct)) => {
                    let top = ct.blend(pixel(rt.lower, ct.lower, ch), pixel(rt.lower, ct.upper, ch));
                    let bottom =
                        ct.blend(pixel(rt.upper, ct.lower, ch), pixel(rt.upper, ct.upper, ch));
                    rt.blend(top, bottom)
                }
                _ => 0.0,
            }
        })
    }
}
