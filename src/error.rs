//! Error types for tile construction, height writes and configuration.

use crate::tile::{TileCoord, TileIndex};

/// Errors reported by terrain tiles and the sculpt configuration.
#[derive(thiserror::Error, Debug)]
pub enum SculptError {
    /// Tiles need at least two samples per axis to span any area
    #[error("invalid tile dimensions {width}x{height} (minimum 2x2)")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid sample spacing {0} (must be finite and positive)")]
    InvalidSpacing(f32),

    #[error("height buffer has {actual} samples, expected {expected}")]
    HeightCountMismatch { expected: usize, actual: usize },

    #[error("non-finite height {value} at {index:?} in tile {tile:?}")]
    NonFiniteHeight {
        tile: TileCoord,
        index: TileIndex,
        value: f32,
    },

    #[error("index {index:?} out of bounds for tile {tile:?} ({width}x{height})")]
    IndexOutOfBounds {
        tile: TileCoord,
        index: TileIndex,
        width: usize,
        height: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}
