//! Error types for building and driving kinematic chains.

use kinecal_core::error::ValidationError;

/// Errors that can occur when building or evaluating a chain.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// Wrong configuration length or non-finite configuration value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Joint axis is zero or not finite.
    #[error("joint {0} has a zero or non-finite axis")]
    ZeroAxis(String),

    /// Lower limit above upper limit, or a NaN limit.
    #[error("joint {joint} has invalid limits [{lower}, {upper}]")]
    InvalidLimits { joint: String, lower: f64, upper: f64 },

    /// A positioner must have at least one joint.
    #[error("positioner {0} has no joints")]
    EmptyChain(String),

    /// Joint or auxiliary index out of range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Joint type token other than `revolute` or `prismatic`.
    #[error("unknown joint type: {0}")]
    UnknownJointKind(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
