//! Weighted overlap-add merging of tile predictions
//!
//! Each tile contributes its weighted consensus probabilities and weighted
//! uncertainty to full-size sum buffers, alongside the weights themselves.
//! Dividing by the weight sum at the end yields the blended result. The
//! buffers live for exactly one prediction call.

use crate::analysis::uncertainty::UncertaintyEstimator;
use crate::io::error::{InferenceError, Result, invalid_input};
use crate::math::gaussian::WeightKernel;
use crate::spatial::tiles::{AxisSlices, TilePlacement};
use ndarray::{Array2, Array3, ArrayView4, Axis, Zip, s};

/// One tile's weighted prediction, ready to be merged
#[derive(Debug, Clone)]
pub struct TileContribution {
    /// Where the tile lands in the accumulation buffers
    pub placement: TilePlacement,
    /// Consensus probabilities multiplied by the kernel, `(classes, rows, cols)`
    pub softmax: Array3<f32>,
    /// Uncertainty multiplied by the kernel, `(rows, cols)`
    pub uncertainty: Array2<f32>,
}

impl TileContribution {
    /// Reduce a `(members, classes, rows, cols)` stack and apply the kernel
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InvalidInput`] if the stack is empty or its
    /// spatial shape differs from the kernel
    pub fn from_stack(
        placement: TilePlacement,
        stack: ArrayView4<'_, f32>,
        kernel: &WeightKernel,
        estimator: &UncertaintyEstimator,
    ) -> Result<Self> {
        let (members, classes, rows, cols) = stack.dim();
        if members == 0 || (rows, cols) != kernel.shape() {
            return Err(invalid_input(&format!(
                "prediction stack of shape {:?} does not match kernel {:?}",
                stack.shape(),
                kernel.shape()
            )));
        }

        let weights = kernel.weights();
        let mut softmax = stack
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array3::zeros((classes, rows, cols)));
        for mut class in softmax.axis_iter_mut(Axis(0)) {
            class *= weights;
        }

        let mut uncertainty = estimator.estimate(stack);
        uncertainty *= weights;

        Ok(Self {
            placement,
            softmax,
            uncertainty,
        })
    }
}

/// Call-scoped accumulation buffers
#[derive(Debug, Clone)]
pub struct MergeAccumulator {
    softmax_sum: Array3<f32>,
    weight_sum: Array2<f32>,
    uncertainty_sum: Array2<f32>,
    merged_tiles: usize,
}

/// Blended outputs at the scaled resolution
#[derive(Debug, Clone)]
pub struct MergedOutputs {
    /// Class probabilities `(classes, rows, cols)`
    pub softmax: Array3<f32>,
    /// Uncertainty `(rows, cols)`
    pub uncertainty: Array2<f32>,
}

fn check_axis(
    axis: usize,
    slices: &AxisSlices,
    tile_len: usize,
    buffer_len: usize,
    center: i64,
) -> Result<()> {
    if slices.input.len() != slices.output.len()
        || slices.input.stop > tile_len
        || slices.output.stop > buffer_len
    {
        return Err(InferenceError::GeometryInvariant {
            axis,
            center,
            reason: format!(
                "in {:?} (tile {tile_len}) and out {:?} (buffer {buffer_len}) are incompatible",
                slices.input, slices.output
            ),
        });
    }
    Ok(())
}

impl MergeAccumulator {
    /// Zeroed buffers for `num_classes` classes over `scaled_shape` (rows, cols)
    pub fn new(num_classes: usize, scaled_shape: (usize, usize)) -> Self {
        let (rows, cols) = scaled_shape;
        Self {
            softmax_sum: Array3::zeros((num_classes, rows, cols)),
            weight_sum: Array2::zeros((rows, cols)),
            uncertainty_sum: Array2::zeros((rows, cols)),
            merged_tiles: 0,
        }
    }

    /// Add one tile's contribution and its kernel weights
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::GeometryInvariant`] if the tile's ranges do
    /// not fit the tile or the buffers
    pub fn add(&mut self, contribution: &TileContribution, kernel: &WeightKernel) -> Result<()> {
        let placement = &contribution.placement;
        let (tile_rows, tile_cols) = kernel.shape();
        let (_, rows, cols) = self.softmax_sum.dim();
        check_axis(0, &placement.rows, tile_rows, rows, placement.center[0])?;
        check_axis(1, &placement.cols, tile_cols, cols, placement.center[1])?;
        if contribution.softmax.dim() != (self.softmax_sum.len_of(Axis(0)), tile_rows, tile_cols)
            || contribution.uncertainty.dim() != (tile_rows, tile_cols)
        {
            return Err(invalid_input(&format!(
                "tile {} contribution does not match tile shape {tile_rows}x{tile_cols}",
                placement.index
            )));
        }

        let (ir, ic) = (placement.rows.input, placement.cols.input);
        let (or, oc) = (placement.rows.output, placement.cols.output);

        let mut softmax_region = self
            .softmax_sum
            .slice_mut(s![.., or.start..or.stop, oc.start..oc.stop]);
        softmax_region += &contribution
            .softmax
            .slice(s![.., ir.start..ir.stop, ic.start..ic.stop]);

        let mut weight_region = self
            .weight_sum
            .slice_mut(s![or.start..or.stop, oc.start..oc.stop]);
        weight_region += &kernel
            .weights()
            .slice(s![ir.start..ir.stop, ic.start..ic.stop]);

        let mut uncertainty_region = self
            .uncertainty_sum
            .slice_mut(s![or.start..or.stop, oc.start..oc.stop]);
        uncertainty_region += &contribution
            .uncertainty
            .slice(s![ir.start..ir.stop, ic.start..ic.stop]);

        self.merged_tiles += 1;
        Ok(())
    }

    /// Number of tiles merged so far
    pub const fn merged_tiles(&self) -> usize {
        self.merged_tiles
    }

    /// Per-pixel sum of blending weights
    pub const fn weight_sum(&self) -> &Array2<f32> {
        &self.weight_sum
    }

    /// Per-pixel, per-class sum of weighted probabilities
    pub const fn softmax_sum(&self) -> &Array3<f32> {
        &self.softmax_sum
    }

    /// Per-pixel sum of weighted uncertainty
    pub const fn uncertainty_sum(&self) -> &Array2<f32> {
        &self.uncertainty_sum
    }

    /// Divide the sums by the weight sum
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::CoverageViolation`] for the first pixel
    /// whose weight sum is zero, negative or NaN
    pub fn finalize(self) -> Result<MergedOutputs> {
        if let Some(((row, col), &weight)) = self
            .weight_sum
            .indexed_iter()
            .find(|&(_, &w)| !(w > 0.0 && w.is_finite()))
        {
            return Err(InferenceError::CoverageViolation { row, col, weight });
        }

        let Self {
            mut softmax_sum,
            weight_sum,
            mut uncertainty_sum,
            ..
        } = self;

        for mut class in softmax_sum.axis_iter_mut(Axis(0)) {
            Zip::from(&mut class)
                .and(&weight_sum)
                .for_each(|v, &w| *v /= w);
        }
        Zip::from(&mut uncertainty_sum)
            .and(&weight_sum)
            .for_each(|v, &w| *v /= w);

        Ok(MergedOutputs {
            softmax: softmax_sum,
            uncertainty: uncertainty_sum,
        })
    }
}
