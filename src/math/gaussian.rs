//! Gaussian windows and the per-tile blending kernel
//!
//! Overlapping tiles are merged with a weight that peaks at the tile center
//! and decays towards the borders, which suppresses seams where the model
//! sees little context. The kernel is strictly positive so every covered
//! pixel keeps a nonzero weight.

use ndarray::{Array1, Array2};

/// Symmetric Gaussian window of `length` samples centered between the middle samples
///
/// Sample `i` has value `exp(-(i - (length - 1) / 2)^2 / (2 std^2))`.
pub fn gaussian_window(length: usize, std: f64) -> Array1<f64> {
    let middle = (length as f64 - 1.0) / 2.0;
    let two_var = 2.0 * std * std;
    Array1::from_shape_fn(length, |i| {
        let n = i as f64 - middle;
        (-(n * n) / two_var).exp()
    })
}

/// Blending weight mask applied to every tile of a given shape
#[derive(Debug, Clone, PartialEq)]
pub struct WeightKernel {
    weights: Array2<f32>,
}

impl WeightKernel {
    /// All-ones kernel; overlapping tiles are averaged
    pub fn uniform(tile_shape: (usize, usize)) -> Self {
        Self {
            weights: Array2::ones(tile_shape),
        }
    }

    /// Separable Gaussian kernel with `std = side * sigma_scale` per axis
    ///
    /// Normalized so the maximum is exactly 1. Entries that underflow to zero
    /// are raised to the smallest nonzero entry.
    pub fn gaussian(tile_shape: (usize, usize), sigma_scale: f64) -> Self {
        let (rows, cols) = tile_shape;
        let row_window = gaussian_window(rows, rows as f64 * sigma_scale);
        let col_window = gaussian_window(cols, cols as f64 * sigma_scale);

        let outer = Array2::from_shape_fn((rows, cols), |(r, c)| {
            row_window.get(r).copied().unwrap_or(0.0) * col_window.get(c).copied().unwrap_or(0.0)
        });
        let max = outer.iter().copied().fold(0.0_f64, f64::max);

        let mut weights = if max > 0.0 {
            outer.mapv(|w| (w / max) as f32)
        } else {
            Array2::ones((rows, cols))
        };

        let min_nonzero = weights
            .iter()
            .copied()
            .filter(|&w| w > 0.0)
            .fold(f32::INFINITY, f32::min);
        if min_nonzero.is_finite() {
            weights.mapv_inplace(|w| if w > 0.0 { w } else { min_nonzero });
        }

        Self { weights }
    }

    /// Build the kernel selected by a configuration
    pub fn from_config(config: &crate::io::configuration::InferenceConfig) -> Self {
        if config.use_gaussian {
            Self::gaussian(config.tile_shape, config.gaussian_sigma_scale)
        } else {
            Self::uniform(config.tile_shape)
        }
    }

    /// Weight mask with the tile's shape
    pub const fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Kernel shape (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.weights.dim()
    }
}
