use thiserror::Error;

/// Construction-time failures.
///
/// Path queries never return these: an unreachable target is an empty [`crate::NavPath`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("flat coordinate list must have an even length, got {0}")]
    OddCoordinateCount(usize),

    #[error("tile map must be non-empty, got {width}x{height}")]
    EmptyTileMap { width: u32, height: u32 },

    #[error("tile map {width}x{height} has more tiles than i32 can index")]
    TileMapTooLarge { width: u32, height: u32 },

    #[error("tile mask has {actual} bytes, expected {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, NavError>;
