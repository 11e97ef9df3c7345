//! Model ensemble evaluated on a single tile
//!
//! Every tile is normalized once, then run through each augmentation and
//! each model. Logits are de-augmented and converted to class probabilities,
//! giving a stack of `models x augmentations` probability maps. A model that
//! fails or returns a malformed shape aborts the tile: the ensemble never
//! drops a member to keep going.

use crate::algorithm::augmentation::AugmentationSet;
use crate::analysis::statistics::ChannelStats;
use crate::io::error::{InferenceError, ModelError, Result, invalid_input, invalid_parameter};
use crate::math::probability::softmax_classes;
use ndarray::{Array3, Array4, ArrayView3, Axis};
use tracing::trace;

/// A segmentation model with a fixed input window
///
/// `infer` receives a normalized `(channels, rows, cols)` tile and returns
/// `(classes, rows, cols)` logits for the same window.
pub trait SegmentationModel: Send + Sync {
    /// Run the model on one tile
    ///
    /// # Errors
    ///
    /// Returns any error the model's backend reports
    fn infer(&self, tile: ArrayView3<'_, f32>) -> std::result::Result<Array3<f32>, ModelError>;
}

/// Normalize a `(channels, rows, cols)` tile in place as `(x - mean) / std`
pub fn normalize_tile(tile: &mut Array3<f32>, stats: &ChannelStats) {
    for ((mut channel, &mean), &std) in tile
        .axis_iter_mut(Axis(0))
        .zip(stats.mean())
        .zip(stats.std())
    {
        channel.mapv_inplace(|v| (v - mean) / std);
    }
}

/// Models, augmentations and normalization used for every tile
pub struct ModelEnsemble {
    models: Vec<Box<dyn SegmentationModel>>,
    augmentations: AugmentationSet,
    stats: ChannelStats,
    num_classes: usize,
}

impl std::fmt::Debug for ModelEnsemble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEnsemble")
            .field("models", &self.models.len())
            .field("augmentations", &self.augmentations)
            .field("stats", &self.stats)
            .field("num_classes", &self.num_classes)
            .finish()
    }
}

impl ModelEnsemble {
    /// Assemble an ensemble
    ///
    /// # Errors
    ///
    /// Returns an error if no model or no augmentation is given, or if fewer
    /// than two classes are requested
    pub fn new(
        models: Vec<Box<dyn SegmentationModel>>,
        augmentations: AugmentationSet,
        stats: ChannelStats,
        num_classes: usize,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(invalid_parameter(
                "models",
                &0,
                &"the ensemble needs at least one model",
            ));
        }
        if augmentations.is_empty() {
            return Err(invalid_parameter(
                "augmentations",
                &0,
                &"at least one augmentation (identity) is required",
            ));
        }
        if num_classes < 2 {
            return Err(invalid_parameter(
                "num_classes",
                &num_classes,
                &"at least 2 classes are required",
            ));
        }
        Ok(Self {
            models,
            augmentations,
            stats,
            num_classes,
        })
    }

    /// Number of models
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Augmentations evaluated per model
    pub const fn augmentations(&self) -> &AugmentationSet {
        &self.augmentations
    }

    /// Normalization statistics
    pub const fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Number of predicted classes
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Stack size: one probability map per (augmentation, model) pair
    pub fn members(&self) -> usize {
        self.models.len() * self.augmentations.len()
    }

    /// Check that an image has the channel count the statistics describe
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::InvalidInput`] on a mismatch
    pub fn check_channels(&self, channels: usize) -> Result<()> {
        if channels == self.stats.channels() {
            Ok(())
        } else {
            Err(invalid_input(&format!(
                "image has {channels} channels but normalization describes {}",
                self.stats.channels()
            )))
        }
    }

    /// Probability stack `(members, classes, rows, cols)` for a raw tile
    ///
    /// Members are ordered augmentation-major: all models under the first
    /// augmentation, then all models under the second, and so on.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::ModelInference`] if a model fails and
    /// [`InferenceError::MalformedLogits`] if it returns the wrong shape
    pub fn predict_tile(&self, tile_index: usize, tile: ArrayView3<'_, f32>) -> Result<Array4<f32>> {
        let (_, rows, cols) = tile.dim();
        let expected = [self.num_classes, rows, cols];

        let mut normalized = tile.to_owned();
        normalize_tile(&mut normalized, &self.stats);

        let mut stack = Array4::zeros((self.members(), self.num_classes, rows, cols));
        let mut slots = stack.axis_iter_mut(Axis(0));

        for augmentation in self.augmentations.iter() {
            let augmented = augmentation.augment(normalized.view());
            for (model_index, model) in self.models.iter().enumerate() {
                let logits = model.infer(augmented.view()).map_err(|source| {
                    InferenceError::ModelInference {
                        tile_index,
                        model_index,
                        source,
                    }
                })?;
                if logits.shape() != expected {
                    return Err(InferenceError::MalformedLogits {
                        tile_index,
                        model_index,
                        expected,
                        actual: logits.shape().to_vec(),
                    });
                }

                let probabilities = softmax_classes(augmentation.deaugment(logits.view()).view());
                if let Some(mut slot) = slots.next() {
                    slot.assign(&probabilities);
                }
            }
            trace!(
                tile_index,
                augmentation = augmentation.name(),
                "evaluated augmentation"
            );
        }

        Ok(stack)
    }
}
