//! Error types for clipmark.

use thiserror::Error;

/// Main error type for clip engine operations.
///
/// Geometry mutators never produce one of these; they clamp instead. Errors
/// are reserved for contract violations and malformed input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipError {
    #[error("Invalid point map: {0}")]
    InvalidPointMap(String),

    #[error("Time {time} is outside the map bounds [{start}, {end}]")]
    TimeOutOfBounds { time: f64, start: f64, end: f64 },

    #[error("Invalid clip boundary: {0}")]
    InvalidBoundary(String),

    #[error("Point {0} is a boundary point and cannot be removed")]
    BoundaryPoint(usize),

    #[error("Index {index} out of range for map of {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid crop descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Could not determine a valid aspect-ratio-constrained crop")]
    AspectRatioUnsatisfiable,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClipError {
    pub fn point_map(msg: impl Into<String>) -> Self {
        Self::InvalidPointMap(msg.into())
    }

    pub fn descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

/// Result type alias for clip engine operations.
pub type Result<T> = std::result::Result<T, ClipError>;
