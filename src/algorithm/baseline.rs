//! Intensity-threshold baseline model
//!
//! Classifies each pixel of a normalized tile as background or foreground by
//! comparing its channel-mean intensity against a threshold. An ensemble of
//! such models with slightly different thresholds disagrees exactly on the
//! ambiguous intensities, which makes it a useful reference for the blending
//! and uncertainty machinery without any learned weights.

use crate::algorithm::ensemble::SegmentationModel;
use crate::io::error::ModelError;
use ndarray::{Array3, ArrayView3, Axis};

/// Two-class model: foreground where mean intensity exceeds `threshold`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityThresholdModel {
    threshold: f32,
    gain: f32,
}

impl IntensityThresholdModel {
    /// Model with the given threshold (in normalized units) and logit gain
    pub const fn new(threshold: f32, gain: f32) -> Self {
        Self { threshold, gain }
    }

    /// Decision threshold
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Logit slope around the threshold
    pub const fn gain(&self) -> f32 {
        self.gain
    }
}

impl SegmentationModel for IntensityThresholdModel {
    fn infer(&self, tile: ArrayView3<'_, f32>) -> Result<Array3<f32>, ModelError> {
        let (_, rows, cols) = tile.dim();
        let Some(intensity) = tile.mean_axis(Axis(0)) else {
            return Err("tile has no channels".into());
        };

        let margin = intensity.mapv(|v| self.gain * (v - self.threshold) / 2.0);
        let mut logits = Array3::zeros((2, rows, cols));
        logits.index_axis_mut(Axis(0), 0).assign(&margin.mapv(|m| -m));
        logits.index_axis_mut(Axis(0), 1).assign(&margin);
        Ok(logits)
    }
}
