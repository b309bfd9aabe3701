//! Error types for spline construction and asset loading

use serde::{Deserialize, Serialize};

/// Errors raised while building splines or loading spline assets.
///
/// Playback itself never fails: a cursor before or after its spline is a
/// value, not an error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SplineError {
    /// X granularity must be finite and positive
    #[error("Invalid x granularity: {granularity}")]
    InvalidGranularity { granularity: f32 },

    /// Y range must be finite with start <= end
    #[error("Invalid y range: [{start}, {end}]")]
    InvalidRange { start: f32, end: f32 },

    /// Capacity must fit the 16-bit node count
    #[error("Invalid node capacity: {max_nodes}")]
    InvalidCapacity { max_nodes: usize },

    /// Node appended to a full spline
    #[error("Spline is full: capacity {max_nodes} nodes")]
    CapacityExceeded { max_nodes: u16 },

    /// Nodes must be strictly increasing in x once quantized
    #[error("Node x {x} does not follow previous node x {previous_x}")]
    NonIncreasingX { x: f32, previous_x: f32 },

    /// X is negative or past the last representable grain
    #[error("Node x {x} is out of range [0, {max_x}]")]
    XOutOfRange { x: f32, max_x: f32 },

    /// In-place buffer cannot hold the requested capacity
    #[error("Buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall { required: usize, available: usize },

    /// Reopened buffer does not hold a spline
    #[error("Corrupt spline buffer: {reason}")]
    CorruptBuffer { reason: String },

    /// A spline needs at least one node
    #[error("No nodes given")]
    EmptyNodes,

    /// Target nodes are malformed
    #[error("Invalid target: {reason}")]
    InvalidTarget { reason: String },

    /// Asset could not be parsed or validated
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl SplineError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidGranularity { .. }
            | Self::InvalidRange { .. }
            | Self::InvalidCapacity { .. } => "config",
            Self::CapacityExceeded { .. }
            | Self::NonIncreasingX { .. }
            | Self::XOutOfRange { .. }
            | Self::EmptyNodes => "nodes",
            Self::BufferTooSmall { .. } | Self::CorruptBuffer { .. } => "memory",
            Self::InvalidTarget { .. } => "target",
            Self::Parse { .. } => "parse",
        }
    }
}

impl From<serde_json::Error> for SplineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}
