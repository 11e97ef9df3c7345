//! Numerical building blocks shared by sampling, blending and merging

/// Gaussian windows and the tile blending kernel
pub mod gaussian;
/// Bilinear taps and corner-aligned resizing
pub mod interpolation;
/// Softmax and argmax over the class axis
pub mod probability;
