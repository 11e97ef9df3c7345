//! Spatial layout of tiles over an image
//!
//! This module contains spatial-related functionality including:
//! - Tile center placement and in/out slice ranges
//! - Sub-pixel tile extraction on a precomputed sampling grid
//! - Reflection of sampling coordinates at the image border

/// Border reflection of continuous coordinates
pub mod extension;
/// Sampling grid and tile extraction
pub mod grid;
/// Tile centers and slice ranges
pub mod tiles;

pub use grid::TileSampler;
pub use tiles::TileGeometry;
