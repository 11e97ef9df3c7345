//! Input/output, configuration and error handling

/// Command-line arguments and batch file processing
pub mod cli;
/// Inference configuration and defaults
pub mod configuration;
/// Error types shared across the crate
pub mod error;
/// Image decoding and preview export
pub mod image;
/// Terminal progress reporting
pub mod progress;
