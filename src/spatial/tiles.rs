//! Tile placement over a (scaled) image
//!
//! Centers are spread evenly along each axis, starting half a tile minus the
//! border padding inside the image edge, so that edge pixels are covered by a
//! tile interior rather than its rim. Each center yields an "in" range (the
//! part of the tile that lands inside the image) and an "out" range (where
//! that part is written in the accumulation buffers). Both ranges always
//! have the same length.

use crate::io::configuration::InferenceConfig;
use crate::io::error::{InferenceError, Result, invalid_input};

/// Half-open index range `[start, stop)` along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceRange {
    /// First index
    pub start: usize,
    /// One past the last index
    pub stop: usize,
}

impl SliceRange {
    /// Create a range
    pub const fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }

    /// Number of indices covered
    pub const fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    /// Whether the range covers nothing
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tile-local and buffer-local ranges for one center on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSlices {
    /// Region of the tile to keep
    pub input: SliceRange,
    /// Region of the output buffer to write
    pub output: SliceRange,
}

/// Evenly spaced tile centers along one axis of length `len`
///
/// Candidates run from `tile / 2 - tile * padding` to the mirrored point at
/// the far edge, `floor((len + 2 * tile * padding) / (tile * shift)) + 1` of
/// them. Each is truncated toward zero to a pixel index and consecutive
/// duplicates are collapsed, so an axis no longer than the tile yields a
/// single center.
pub fn centers_1d(len: usize, tile: usize, padding_factor: f64, max_shift: f64) -> Vec<i64> {
    let tile_f = tile as f64;
    let padding = tile_f * padding_factor;
    let start = tile_f / 2.0 - padding;
    let end = len as f64 - start;
    let count = ((2.0f64.mul_add(padding, len as f64)) / (tile_f * max_shift)).floor() as usize + 1;

    let step = if count > 1 {
        (end - start) / (count - 1) as f64
    } else {
        0.0
    };

    let mut centers: Vec<i64> = (0..count)
        .map(|i| {
            if count > 1 && i == count - 1 {
                end
            } else {
                step.mul_add(i as f64, start)
            }
        })
        .map(|c| c.trunc() as i64)
        .collect();
    centers.dedup();
    centers
}

/// In/out ranges for a tile of length `tile` centered at `center` on an axis of length `len`
///
/// The tile occupies `[center - tile / 2, center - tile / 2 + tile)` in
/// buffer coordinates (integer half-width). The out range is that interval
/// clipped to the axis; the in range is the same interval in tile-local
/// coordinates. A tile entirely outside the axis gets two empty ranges.
///
/// # Errors
///
/// Returns [`InferenceError::GeometryInvariant`] if the two ranges disagree
/// in length or the in range leaves the tile
pub fn axis_slices(axis: usize, center: i64, len: usize, tile: usize) -> Result<AxisSlices> {
    let len_i = len as i64;
    let lower = center - (tile / 2) as i64;
    let upper = lower + tile as i64;

    let out_start = lower.clamp(0, len_i);
    let out_stop = upper.clamp(0, len_i);

    if out_stop <= out_start {
        return Ok(AxisSlices {
            input: SliceRange::new(0, 0),
            output: SliceRange::new(out_start as usize, out_start as usize),
        });
    }

    let in_start = out_start - lower;
    let in_stop = out_stop - lower;

    if in_start < 0 || in_stop > tile as i64 || in_stop - in_start != out_stop - out_start {
        return Err(InferenceError::GeometryInvariant {
            axis,
            center,
            reason: format!(
                "in range [{in_start}, {in_stop}) does not match out range [{out_start}, {out_stop})"
            ),
        });
    }

    Ok(AxisSlices {
        input: SliceRange::new(in_start as usize, in_stop as usize),
        output: SliceRange::new(out_start as usize, out_stop as usize),
    })
}

/// One tile's position and the ranges it reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    /// Position in processing order
    pub index: usize,
    /// Center in scaled (buffer) coordinates, (row, col)
    pub center: [i64; 2],
    /// Center in original image coordinates, (row, col)
    pub image_center: [i64; 2],
    /// Row ranges
    pub rows: AxisSlices,
    /// Column ranges
    pub cols: AxisSlices,
}

/// All tile placements for one image, in row-major center order
#[derive(Debug, Clone)]
pub struct TileGeometry {
    image_shape: (usize, usize),
    scaled_shape: (usize, usize),
    tile_shape: (usize, usize),
    placements: Vec<TilePlacement>,
}

impl TileGeometry {
    /// Compute placements for an image of `image_shape` (rows, cols)
    ///
    /// Tiles that fall completely outside the scaled image are dropped, since
    /// they cannot contribute to any output pixel.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the scaled image is
    /// empty, or a placement violates the slice-length invariant
    pub fn new(config: &InferenceConfig, image_shape: (usize, usize)) -> Result<Self> {
        config.validate()?;
        let scaled_shape = config.scaled_shape(image_shape.0, image_shape.1);
        if scaled_shape.0 == 0 || scaled_shape.1 == 0 {
            return Err(invalid_input(&format!(
                "image of {}x{} is empty at scale {}",
                image_shape.0, image_shape.1, config.scale
            )));
        }

        let (tile_rows, tile_cols) = config.tile_shape;
        let row_centers = centers_1d(
            scaled_shape.0,
            tile_rows,
            config.border_padding_factor,
            config.max_tile_shift,
        );
        let col_centers = centers_1d(
            scaled_shape.1,
            tile_cols,
            config.border_padding_factor,
            config.max_tile_shift,
        );

        let to_image = |c: i64| (c as f64 * config.scale).trunc() as i64;

        let mut placements = Vec::with_capacity(row_centers.len() * col_centers.len());
        for &cy in &row_centers {
            let rows = axis_slices(0, cy, scaled_shape.0, tile_rows)?;
            if rows.output.is_empty() {
                continue;
            }
            for &cx in &col_centers {
                let cols = axis_slices(1, cx, scaled_shape.1, tile_cols)?;
                if cols.output.is_empty() {
                    continue;
                }
                placements.push(TilePlacement {
                    index: placements.len(),
                    center: [cy, cx],
                    image_center: [to_image(cy), to_image(cx)],
                    rows,
                    cols,
                });
            }
        }

        Ok(Self {
            image_shape,
            scaled_shape,
            tile_shape: config.tile_shape,
            placements,
        })
    }

    /// Placements in processing order
    pub fn placements(&self) -> &[TilePlacement] {
        &self.placements
    }

    /// Number of tiles
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether there are no tiles
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Original image shape (rows, cols)
    pub const fn image_shape(&self) -> (usize, usize) {
        self.image_shape
    }

    /// Accumulation buffer shape (rows, cols)
    pub const fn scaled_shape(&self) -> (usize, usize) {
        self.scaled_shape
    }

    /// Tile shape (rows, cols)
    pub const fn tile_shape(&self) -> (usize, usize) {
        self.tile_shape
    }
}
