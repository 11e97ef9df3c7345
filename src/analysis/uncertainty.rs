//! Pixel-wise uncertainty from a stack of ensemble probability maps
//!
//! Epistemic uncertainty measures disagreement between ensemble members and
//! augmentations. Aleatoric uncertainty measures how close each member's own
//! prediction is to the decision boundary. Their sum is divided by `0.25`,
//! the maximum of `p * (1 - p)`, so each class channel lies in `[0, 1]`.
//!
//! For more than two classes the per-class values are averaged by default.
//! Since the class means sum to one, that average is additionally bounded by
//! `4 (C - 1) / C^2` for `C` classes.

use crate::io::configuration::UNCERTAINTY_NORMALIZER;
use ndarray::{Array2, Array3, ArrayView4, Axis, Zip};

/// How per-class uncertainty is collapsed into one value per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UncertaintyReduction {
    /// Average the combined uncertainty over all classes
    #[default]
    MeanOverClasses,
    /// Use the combined uncertainty of a single class channel
    Class(usize),
}

/// `mean(p^2) - mean(p)^2` over the stack axis, per class and pixel
///
/// `stack` has shape `(members, classes, rows, cols)`.
pub fn epistemic(stack: ArrayView4<'_, f32>) -> Array3<f32> {
    let members = stack.len_of(Axis(0)).max(1) as f32;
    let mean = stack.sum_axis(Axis(0)) / members;
    let mean_sq = stack.mapv(|p| p * p).sum_axis(Axis(0)) / members;
    mean_sq - mean.mapv(|m| m * m)
}

/// `mean(p * (1 - p))` over the stack axis, per class and pixel
pub fn aleatoric(stack: ArrayView4<'_, f32>) -> Array3<f32> {
    let members = stack.len_of(Axis(0)).max(1) as f32;
    stack.mapv(|p| p * (1.0 - p)).sum_axis(Axis(0)) / members
}

/// Normalized epistemic plus aleatoric uncertainty per class and pixel
pub fn combined(stack: ArrayView4<'_, f32>) -> Array3<f32> {
    let mut total = epistemic(stack);
    Zip::from(&mut total)
        .and(&aleatoric(stack))
        .for_each(|e, &a| *e = (*e + a) / UNCERTAINTY_NORMALIZER);
    total
}

/// Estimates a single uncertainty map for one tile's prediction stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UncertaintyEstimator {
    reduction: UncertaintyReduction,
}

impl UncertaintyEstimator {
    /// Estimator using the given class reduction
    pub const fn new(reduction: UncertaintyReduction) -> Self {
        Self { reduction }
    }

    /// Configured class reduction
    pub const fn reduction(&self) -> UncertaintyReduction {
        self.reduction
    }

    /// `(rows, cols)` uncertainty for a `(members, classes, rows, cols)` stack
    ///
    /// A class index outside the stack yields zeros.
    pub fn estimate(&self, stack: ArrayView4<'_, f32>) -> Array2<f32> {
        let (_, classes, rows, cols) = stack.dim();
        let per_class = combined(stack);
        match self.reduction {
            UncertaintyReduction::MeanOverClasses => per_class
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array2::zeros((rows, cols))),
            UncertaintyReduction::Class(class) if class < classes => {
                per_class.index_axis(Axis(0), class).to_owned()
            }
            UncertaintyReduction::Class(_) => Array2::zeros((rows, cols)),
        }
    }
}
