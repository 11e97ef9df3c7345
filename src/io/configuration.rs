//! Inference defaults and validated runtime configuration

use crate::analysis::uncertainty::UncertaintyReduction;
use crate::io::error::{Result, invalid_parameter};

// Defaults mirror the settings the ensembles were trained and evaluated with
/// Default tile height and width in pixels
pub const DEFAULT_TILE_SHAPE: (usize, usize) = (512, 512);
/// Default image-to-model resolution ratio
pub const DEFAULT_SCALE: f64 = 1.0;
/// Default margin beyond the image, as a fraction of the tile size
pub const DEFAULT_BORDER_PADDING_FACTOR: f64 = 0.25;
/// Default center spacing, as a fraction of the tile size
pub const DEFAULT_MAX_TILE_SHIFT: f64 = 0.9;
/// Default Gaussian standard deviation, as a fraction of the tile size
pub const DEFAULT_GAUSSIAN_SIGMA_SCALE: f64 = 1.0 / 8.0;
/// Default number of segmentation classes
pub const DEFAULT_NUM_CLASSES: usize = 2;
/// Number of tiles processed in parallel before merging
pub const DEFAULT_TILE_BATCH_SIZE: usize = 16;

/// Tile sides must exceed this value
pub const MIN_TILE_SIDE: usize = 2;

/// Normalizing constant for combined uncertainty (maximum of `p * (1 - p)`)
pub const UNCERTAINTY_NORMALIZER: f32 = 0.25;

// CLI settings
/// Default binarization thresholds for the baseline ensemble (in normalized units)
pub const DEFAULT_BASELINE_THRESHOLDS: [f32; 3] = [-0.25, 0.0, 0.25];
/// Default logit gain for baseline models
pub const DEFAULT_BASELINE_GAIN: f32 = 4.0;
/// Suffix added to class map previews
pub const MASK_SUFFIX: &str = "_mask";
/// Suffix added to uncertainty map previews
pub const UNCERTAINTY_SUFFIX: &str = "_uncertainty";

/// Parameters controlling tiling, blending and ensemble behavior
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InferenceConfig {
    /// Model input window (rows, cols); each side must exceed 2
    pub tile_shape: (usize, usize),
    /// Image pixels per model pixel; must be positive
    pub scale: f64,
    /// Margin beyond the image edge used when placing centers, in `[0, 1)`
    pub border_padding_factor: f64,
    /// Fraction of the tile size between consecutive centers, in `(0, 1]`
    pub max_tile_shift: f64,
    /// Blend overlapping tiles with a Gaussian instead of uniform weights
    pub use_gaussian: bool,
    /// Gaussian standard deviation as a fraction of the tile size
    pub gaussian_sigma_scale: f64,
    /// Enable flip test-time augmentation
    pub use_tta: bool,
    /// Number of classes the models predict (at least 2)
    pub num_classes: usize,
    /// How per-class uncertainty is collapsed into a single map
    pub uncertainty_reduction: UncertaintyReduction,
    /// Tiles run in parallel before their results are merged
    pub tile_batch_size: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            tile_shape: DEFAULT_TILE_SHAPE,
            scale: DEFAULT_SCALE,
            border_padding_factor: DEFAULT_BORDER_PADDING_FACTOR,
            max_tile_shift: DEFAULT_MAX_TILE_SHIFT,
            use_gaussian: true,
            gaussian_sigma_scale: DEFAULT_GAUSSIAN_SIGMA_SCALE,
            use_tta: true,
            num_classes: DEFAULT_NUM_CLASSES,
            uncertainty_reduction: UncertaintyReduction::MeanOverClasses,
            tile_batch_size: DEFAULT_TILE_BATCH_SIZE,
        }
    }
}

impl InferenceConfig {
    /// Set the tile shape
    #[must_use]
    pub const fn with_tile_shape(mut self, rows: usize, cols: usize) -> Self {
        self.tile_shape = (rows, cols);
        self
    }

    /// Set the resolution scale
    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the border padding factor
    #[must_use]
    pub const fn with_border_padding(mut self, factor: f64) -> Self {
        self.border_padding_factor = factor;
        self
    }

    /// Set the maximum tile shift
    #[must_use]
    pub const fn with_max_tile_shift(mut self, shift: f64) -> Self {
        self.max_tile_shift = shift;
        self
    }

    /// Toggle Gaussian blending
    #[must_use]
    pub const fn with_gaussian(mut self, enabled: bool) -> Self {
        self.use_gaussian = enabled;
        self
    }

    /// Toggle test-time augmentation
    #[must_use]
    pub const fn with_tta(mut self, enabled: bool) -> Self {
        self.use_tta = enabled;
        self
    }

    /// Set the number of classes
    #[must_use]
    pub const fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// Set the uncertainty reduction
    #[must_use]
    pub const fn with_uncertainty_reduction(mut self, reduction: UncertaintyReduction) -> Self {
        self.uncertainty_reduction = reduction;
        self
    }

    /// Check every parameter against its allowed range
    ///
    /// # Errors
    ///
    /// Returns [`crate::InferenceError::InvalidParameter`] naming the first
    /// parameter that is out of range
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.tile_shape;
        if rows <= MIN_TILE_SIDE || cols <= MIN_TILE_SIDE {
            return Err(invalid_parameter(
                "tile_shape",
                &format!("{rows}x{cols}"),
                &format!("each side must be greater than {MIN_TILE_SIDE}"),
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(invalid_parameter(
                "scale",
                &self.scale,
                &"must be a positive finite number",
            ));
        }
        if !(0.0..1.0).contains(&self.border_padding_factor) {
            return Err(invalid_parameter(
                "border_padding_factor",
                &self.border_padding_factor,
                &"must lie in [0, 1)",
            ));
        }
        if !(self.max_tile_shift > 0.0 && self.max_tile_shift <= 1.0) {
            return Err(invalid_parameter(
                "max_tile_shift",
                &self.max_tile_shift,
                &"must lie in (0, 1]",
            ));
        }
        if !(self.gaussian_sigma_scale.is_finite() && self.gaussian_sigma_scale > 0.0) {
            return Err(invalid_parameter(
                "gaussian_sigma_scale",
                &self.gaussian_sigma_scale,
                &"must be a positive finite number",
            ));
        }
        if self.num_classes < 2 {
            return Err(invalid_parameter(
                "num_classes",
                &self.num_classes,
                &"at least 2 classes are required",
            ));
        }
        if let UncertaintyReduction::Class(class) = self.uncertainty_reduction {
            if class >= self.num_classes {
                return Err(invalid_parameter(
                    "uncertainty_reduction",
                    &class,
                    &format!("class index must be below {}", self.num_classes),
                ));
            }
        }
        if self.tile_batch_size == 0 {
            return Err(invalid_parameter(
                "tile_batch_size",
                &self.tile_batch_size,
                &"must be at least 1",
            ));
        }
        Ok(())
    }

    /// Shape of the accumulation buffers for an image of `(rows, cols)`
    ///
    /// Each side is `floor(side / scale)`.
    pub fn scaled_shape(&self, rows: usize, cols: usize) -> (usize, usize) {
        (
            (rows as f64 / self.scale).floor() as usize,
            (cols as f64 / self.scale).floor() as usize,
        )
    }
}
