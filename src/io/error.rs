//! Error types for configuration, inference and image adapters

use std::fmt;
use std::path::PathBuf;

/// Error returned by a [`crate::algorithm::ensemble::SegmentationModel`]
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all inference operations
#[derive(Debug)]
pub enum InferenceError {
    /// Configuration or normalization parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Input image does not match the configured predictor
    InvalidInput {
        /// Description of what's wrong with the input
        reason: String,
    },

    /// A model failed while processing a tile
    ///
    /// The whole call is aborted. The ensemble never continues with the
    /// remaining members, so callers never receive a silently degraded result.
    ModelInference {
        /// Position of the tile in center order
        tile_index: usize,
        /// Position of the failing model in the ensemble
        model_index: usize,
        /// Error reported by the model
        source: ModelError,
    },

    /// A model returned logits of the wrong shape
    MalformedLogits {
        /// Position of the tile in center order
        tile_index: usize,
        /// Position of the offending model in the ensemble
        model_index: usize,
        /// Expected (classes, rows, cols)
        expected: [usize; 3],
        /// Shape the model actually produced
        actual: Vec<usize>,
    },

    /// Input and output slice lengths disagree for a tile
    ///
    /// Indicates a bug in tile geometry, never a caller mistake.
    GeometryInvariant {
        /// Axis on which the mismatch occurred (0 = rows, 1 = cols)
        axis: usize,
        /// Tile center on that axis
        center: i64,
        /// Description of the mismatch
        reason: String,
    },

    /// An output pixel received no blending weight
    ///
    /// Indicates a bug in tile geometry, never a caller mistake.
    CoverageViolation {
        /// Row of the uncovered pixel in the scaled buffer
        row: usize,
        /// Column of the uncovered pixel in the scaled buffer
        col: usize,
        /// Accumulated weight found at that pixel
        weight: f32,
    },

    /// The caller raised the cancellation flag
    Cancelled {
        /// Tiles merged before cancellation was observed
        completed_tiles: usize,
    },

    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save an output preview
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidInput { reason } => write!(f, "Invalid input: {reason}"),
            Self::ModelInference {
                tile_index,
                model_index,
                source,
            } => {
                write!(
                    f,
                    "Model {model_index} failed on tile {tile_index}: {source}"
                )
            }
            Self::MalformedLogits {
                tile_index,
                model_index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Model {model_index} returned logits of shape {actual:?} on tile {tile_index} (expected {expected:?})"
                )
            }
            Self::GeometryInvariant {
                axis,
                center,
                reason,
            } => {
                write!(
                    f,
                    "Tile geometry invariant violated on axis {axis} at center {center}: {reason}"
                )
            }
            Self::CoverageViolation { row, col, weight } => {
                write!(
                    f,
                    "Pixel ({row}, {col}) has accumulated weight {weight}; tile coverage is incomplete"
                )
            }
            Self::Cancelled { completed_tiles } => {
                write!(f, "Prediction cancelled after {completed_tiles} tiles")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ModelInference { source, .. } => Some(source.as_ref()),
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for inference results
pub type Result<T> = std::result::Result<T, InferenceError>;

impl From<std::io::Error> for InferenceError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> InferenceError {
    InferenceError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid input error
pub fn invalid_input(reason: &impl ToString) -> InferenceError {
    InferenceError::InvalidInput {
        reason: reason.to_string(),
    }
}
