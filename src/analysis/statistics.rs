//! Summary statistics over images and prediction outputs

use crate::io::error::{Result, invalid_parameter};
use ndarray::{ArrayView2, ArrayView3, Axis, Zip};

/// Standard deviation floor for constant channels
const MIN_CHANNEL_STD: f32 = 1e-6;

/// Per-channel normalization statistics
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl ChannelStats {
    /// Validate and wrap externally supplied statistics
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ, no channel is given, or a
    /// standard deviation is not a positive finite number
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(invalid_parameter(
                "channel_stats",
                &format!("{} means, {} stds", mean.len(), std.len()),
                &"mean and std need one non-empty entry per channel",
            ));
        }
        if let Some(bad) = std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(invalid_parameter(
                "channel_std",
                bad,
                &"must be a positive finite number",
            ));
        }
        if let Some(bad) = mean.iter().find(|m| !m.is_finite()) {
            return Err(invalid_parameter("channel_mean", bad, &"must be finite"));
        }
        Ok(Self { mean, std })
    }

    /// Identity normalization (mean 0, std 1) for `channels` channels
    pub fn identity(channels: usize) -> Self {
        Self {
            mean: vec![0.0; channels],
            std: vec![1.0; channels],
        }
    }

    /// Measure mean and population std of each channel of a `(rows, cols, channels)` image
    ///
    /// Constant channels get a small positive std so normalization stays finite.
    pub fn from_image(image: ArrayView3<'_, f32>) -> Self {
        let channels = image.len_of(Axis(2));
        let mut mean = Vec::with_capacity(channels);
        let mut std = Vec::with_capacity(channels);
        for channel in image.axis_iter(Axis(2)) {
            let m = channel.mean().unwrap_or(0.0);
            let var = channel.mapv(|v| (v - m) * (v - m)).mean().unwrap_or(0.0);
            mean.push(m);
            std.push(var.sqrt().max(MIN_CHANNEL_STD));
        }
        Self { mean, std }
    }

    /// Per-channel means
    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    /// Per-channel standard deviations
    pub fn std(&self) -> &[f32] {
        &self.std
    }

    /// Number of channels described
    pub fn channels(&self) -> usize {
        self.mean.len()
    }
}

/// Mean uncertainty over foreground pixels (class index above 0)
///
/// Returns `None` when nothing was predicted as foreground or the two maps
/// differ in shape.
pub fn uncertainty_score(
    argmax: ArrayView2<'_, usize>,
    uncertainty: ArrayView2<'_, f32>,
) -> Option<f32> {
    if argmax.dim() != uncertainty.dim() {
        return None;
    }
    let mut sum = 0.0_f64;
    let mut count = 0_usize;
    Zip::from(argmax)
        .and(uncertainty)
        .for_each(|&class, &u| {
            if class > 0 {
                sum += f64::from(u);
                count += 1;
            }
        });
    (count > 0).then(|| (sum / count as f64) as f32)
}

/// Fraction of pixels assigned to each class
pub fn class_fractions(argmax: ArrayView2<'_, usize>, num_classes: usize) -> Vec<f32> {
    let mut counts = vec![0_usize; num_classes];
    for &class in argmax {
        if let Some(count) = counts.get_mut(class) {
            *count += 1;
        }
    }
    let total = argmax.len().max(1) as f32;
    counts.into_iter().map(|c| c as f32 / total).collect()
}

