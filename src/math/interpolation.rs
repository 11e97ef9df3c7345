//! Bilinear interpolation helpers
//!
//! Tile extraction and result rescaling both reduce to weighting two
//! neighbouring samples per axis, so the per-axis tap is the shared unit.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

/// Two neighbouring sample indices and the weight of the upper one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTap {
    /// Index at or below the coordinate
    pub lower: usize,
    /// Index above the coordinate, clamped to the last sample
    pub upper: usize,
    /// Weight of `upper`; `lower` receives `1 - fraction`
    pub fraction: f32,
}

impl LinearTap {
    /// Tap for a continuous coordinate on an axis with `len` samples
    ///
    /// The coordinate is clamped into `[0, len - 1]` first.
    pub fn at(coordinate: f64, len: usize) -> Self {
        let last = len.saturating_sub(1);
        let clamped = coordinate.clamp(0.0, last as f64);
        let lower = (clamped.floor() as usize).min(last);
        let upper = (lower + 1).min(last);
        Self {
            lower,
            upper,
            fraction: (clamped - lower as f64) as f32,
        }
    }

    /// Blend two samples with this tap's weights
    pub fn blend(&self, lower_value: f32, upper_value: f32) -> f32 {
        (upper_value - lower_value).mul_add(self.fraction, lower_value)
    }
}

/// Source coordinate of output sample `index` under corner alignment
///
/// The first and last samples of both grids coincide.
pub fn align_corners_coordinate(index: usize, src_len: usize, dst_len: usize) -> f64 {
    if dst_len <= 1 {
        return 0.0;
    }
    index as f64 * (src_len.saturating_sub(1)) as f64 / (dst_len - 1) as f64
}

fn axis_taps(src_len: usize, dst_len: usize) -> Vec<LinearTap> {
    (0..dst_len)
        .map(|i| LinearTap::at(align_corners_coordinate(i, src_len, dst_len), src_len))
        .collect()
}

/// Resize a single-channel map to `shape` with corner-aligned bilinear interpolation
pub fn resize_bilinear_2d(input: ArrayView2<'_, f32>, shape: (usize, usize)) -> Array2<f32> {
    let (src_rows, src_cols) = input.dim();
    if (src_rows, src_cols) == shape {
        return input.to_owned();
    }
    if src_rows == 0 || src_cols == 0 {
        return Array2::zeros(shape);
    }

    let row_taps = axis_taps(src_rows, shape.0);
    let col_taps = axis_taps(src_cols, shape.1);

    let sample = |r: usize, c: usize| input.get((r, c)).copied().unwrap_or(0.0);

    Array2::from_shape_fn(shape, |(r, c)| {
        match (row_taps.get(r), col_taps.get(c)) {
            (Some(rt), Some(ct)) => {
                let top = ct.blend(sample(rt.lower, ct.lower), sample(rt.lower, ct.upper));
                let bottom = ct.blend(sample(rt.upper, ct.lower), sample(rt.upper, ct.upper));
                rt.blend(top, bottom)
            }
            _ => 0.0,
        }
    })
}

/// Resize every channel of a channel-first volume to `shape`
pub fn resize_bilinear_3d(input: ArrayView3<'_, f32>, shape: (usize, usize)) -> Array3<f32> {
    let channels = input.len_of(Axis(0));
    let mut output = Array3::zeros((channels, shape.0, shape.1));
    for (src, mut dst) in input
        .axis_iter(Axis(0))
        .zip(output.axis_iter_mut(Axis(0)))
    {
        dst.assign(&resize_bilinear_2d(src, shape));
    }
    output
}
