//! Tiled ensemble inference for image segmentation
//!
//! Large images are cut into overlapping, optionally rescaled tiles. Every
//! tile is evaluated by an ensemble of models under test-time augmentations,
//! and the per-tile probabilities and uncertainties are blended back into
//! full-size maps with a Gaussian (or uniform) weighting kernel.

#![deny(unsafe_code)]

/// Ensemble evaluation, tile merging and the prediction driver
pub mod algorithm;
/// Uncertainty estimation and prediction summaries
pub mod analysis;
/// Configuration, errors, image files and the command-line interface
pub mod io;
/// Blending kernels, interpolation and class probabilities
pub mod math;
/// Tile placement and resampling
pub mod spatial;

pub use algorithm::ensemble::{ModelEnsemble, SegmentationModel};
pub use algorithm::executor::{PredictOptions, Prediction, Predictor, TileObserver};
pub use analysis::statistics::ChannelStats;
pub use analysis::uncertainty::UncertaintyReduction;
pub use io::configuration::InferenceConfig;
pub use io::error::{InferenceError, ModelError, Result};
