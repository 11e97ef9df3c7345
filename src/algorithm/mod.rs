/// Weighted overlap-add accumulation of tile predictions
pub mod accumulator;
/// Invertible test-time augmentations
pub mod augmentation;
/// Intensity threshold model used by the command-line tool
pub mod baseline;
/// Segmentation model trait and ensemble evaluation
pub mod ensemble;
/// Tiled prediction driver
pub mod executor;
