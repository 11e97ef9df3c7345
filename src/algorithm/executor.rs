//! Tiled ensemble prediction over a whole image
//!
//! Tiles are extracted and evaluated in parallel in fixed-size batches. The
//! batch results are merged by the calling thread in tile order, so the
//! accumulation buffers have a single owner and the outcome does not depend
//! on thread scheduling.

use crate::algorithm::accumulator::{MergeAccumulator, TileContribution};
use crate::algorithm::augmentation::AugmentationSet;
use crate::algorithm::ensemble::{ModelEnsemble, SegmentationModel};
use crate::analysis::statistics::ChannelStats;
use crate::analysis::uncertainty::UncertaintyEstimator;
use crate::io::configuration::InferenceConfig;
use crate::io::error::{InferenceError, Result, invalid_parameter};
use crate::math::gaussian::WeightKernel;
use crate::math::interpolation::{resize_bilinear_2d, resize_bilinear_3d};
use crate::math::probability::argmax_classes;
use crate::spatial::grid::TileSampler;
use crate::spatial::tiles::{TileGeometry, TilePlacement};
use ndarray::{Array2, Array3, ArrayView3};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// Final outputs of one prediction call, at the input resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Most probable class per pixel `(rows, cols)`
    pub argmax: Array2<usize>,
    /// Blended class probabilities `(classes, rows, cols)`
    pub softmax: Array3<f32>,
    /// Blended uncertainty `(rows, cols)`
    pub uncertainty: Array2<f32>,
    /// Number of tiles evaluated
    pub tiles: usize,
}

/// Receives progress after every merged tile
pub trait TileObserver {
    /// Called with the number of merged tiles and the total tile count
    fn tile_merged(&self, completed: usize, total: usize);
}

impl<F> TileObserver for F
where
    F: Fn(usize, usize),
{
    fn tile_merged(&self, completed: usize, total: usize) {
        self(completed, total);
    }
}

/// Optional hooks for a prediction call
#[derive(Default)]
pub struct PredictOptions<'a> {
    /// Progress callback
    pub observer: Option<&'a dyn TileObserver>,
    /// When set to `true`, the call stops before the next batch and returns
    /// [`InferenceError::Cancelled`]
    pub cancel: Option<Arc<AtomicBool>>,
}

impl PredictOptions<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Tiled ensemble predictor
///
/// Holds only immutable state, so one instance can serve concurrent calls.
#[derive(Debug)]
pub struct Predictor {
    config: InferenceConfig,
    ensemble: ModelEnsemble,
    kernel: WeightKernel,
    sampler: TileSampler,
    estimator: UncertaintyEstimator,
}

impl Predictor {
    /// Build a predictor from a configuration and a ready ensemble
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or disagrees with the
    /// ensemble's class count
    pub fn new(config: InferenceConfig, ensemble: ModelEnsemble) -> Result<Self> {
        config.validate()?;
        if ensemble.num_classes() != config.num_classes {
            return Err(invalid_parameter(
                "num_classes",
                &config.num_classes,
                &format!("ensemble predicts {} classes", ensemble.num_classes()),
            ));
        }
        Ok(Self {
            kernel: WeightKernel::from_config(&config),
            sampler: TileSampler::new(config.tile_shape, config.scale),
            estimator: UncertaintyEstimator::new(config.uncertainty_reduction),
            config,
            ensemble,
        })
    }

    /// Build a predictor whose augmentations follow `config.use_tta`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration, models or statistics are invalid
    pub fn with_models(
        config: InferenceConfig,
        models: Vec<Box<dyn SegmentationModel>>,
        stats: ChannelStats,
    ) -> Result<Self> {
        let ensemble = ModelEnsemble::new(
            models,
            AugmentationSet::from_flag(config.use_tta),
            stats,
            config.num_classes,
        )?;
        Self::new(config, ensemble)
    }

    /// Active configuration
    pub const fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Model ensemble
    pub const fn ensemble(&self) -> &ModelEnsemble {
        &self.ensemble
    }

    /// Blending kernel shared by all tiles
    pub const fn kernel(&self) -> &WeightKernel {
        &self.kernel
    }

    /// Tile placements for an image of `(rows, cols)`
    ///
    /// # Errors
    ///
    /// Returns an error if the scaled image would be empty
    pub fn geometry(&self, image_shape: (usize, usize)) -> Result<TileGeometry> {
        TileGeometry::new(&self.config, image_shape)
    }

    /// Predict classes, probabilities and uncertainty for a `(rows, cols, channels)` image
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not match the normalization
    /// statistics, if any model fails on any tile, or if an internal geometry
    /// invariant is violated
    pub fn predict(&self, image: ArrayView3<'_, f32>) -> Result<Prediction> {
        self.predict_with(image, &PredictOptions::default())
    }

    /// [`Predictor::predict`] with progress reporting and cancellation
    ///
    /// # Errors
    ///
    /// As [`Predictor::predict`], plus [`InferenceError::Cancelled`] when the
    /// cancellation flag is raised
    pub fn predict_with(
        &self,
        image: ArrayView3<'_, f32>,
        options: &PredictOptions<'_>,
    ) -> Result<Prediction> {
        let (rows, cols, channels) = image.dim();
        self.ensemble.check_channels(channels)?;

        let geometry = self.geometry((rows, cols))?;
        let total = geometry.len();
        let scaled_shape = geometry.scaled_shape();
        debug!(
            rows,
            cols,
            channels,
            scaled_rows = scaled_shape.0,
            scaled_cols = scaled_shape.1,
            tiles = total,
            members = self.ensemble.members(),
            "starting tiled prediction"
        );

        let mut accumulator = MergeAccumulator::new(self.config.num_classes, scaled_shape);

        for batch in geometry.placements().chunks(self.config.tile_batch_size) {
            if options.is_cancelled() {
                debug!(completed = accumulator.merged_tiles(), "prediction cancelled");
                return Err(InferenceError::Cancelled {
                    completed_tiles: accumulator.merged_tiles(),
                });
            }

            let contributions: Vec<Result<TileContribution>> = batch
                .par_iter()
                .map(|placement| self.process_tile(image, placement))
                .collect();

            for contribution in contributions {
                accumulator.add(&contribution?, &self.kernel)?;
                if let Some(observer) = options.observer {
                    observer.tile_merged(accumulator.merged_tiles(), total);
                }
            }
            debug!(merged = accumulator.merged_tiles(), total, "merged tile batch");
        }

        let merged = accumulator.finalize()?;

        let (softmax, uncertainty) = if scaled_shape == (rows, cols) {
            (merged.softmax, merged.uncertainty)
        } else {
            debug!(rows, cols, "rescaling outputs to input resolution");
            (
                resize_bilinear_3d(merged.softmax.view(), (rows, cols)),
                resize_bilinear_2d(merged.uncertainty.view(), (rows, cols)),
            )
        };
        let argmax = argmax_classes(softmax.view());

        Ok(Prediction {
            argmax,
            softmax,
            uncertainty,
            tiles: total,
        })
    }

    fn process_tile(
        &self,
        image: ArrayView3<'_, f32>,
        placement: &TilePlacement,
    ) -> Result<TileContribution> {
        let tile = self.sampler.sample(image, placement.image_center);
        let stack = self.ensemble.predict_tile(placement.index, tile.view())?;
        trace!(
            tile = placement.index,
            row = placement.center[0],
            col = placement.center[1],
            "tile evaluated"
        );
        TileContribution::from_stack(*placement, stack.view(), &self.kernel, &self.estimator)
    }
}
