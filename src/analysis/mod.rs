//! Uncertainty estimation and summary statistics

/// Normalization statistics and output summaries
pub mod statistics;
/// Epistemic and aleatoric uncertainty
pub mod uncertainty;
