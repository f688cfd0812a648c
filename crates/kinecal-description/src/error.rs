//! Error types for description generation, loading and JSON I/O.

use std::path::PathBuf;

use kinecal_chain::ChainError;
use kinecal_core::error::ValidationError;

/// Errors that can occur while generating, reading or loading descriptions.
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    /// Joint order is not a permutation of `0..len`.
    #[error("invalid joint order {order:?}: expected a permutation of 0..{len}")]
    InvalidOrder { order: Vec<usize>, len: usize },

    #[error("duplicate joint name: {0}")]
    DuplicateName(String),

    /// Blank positioner, joint or stack name. Holds what was being named.
    #[error("{0} name is empty")]
    EmptyName(String),

    /// Supplied joint type disagrees with the calibrated joint.
    #[error("joint {joint}: type {given} does not match calibrated type {calibrated}")]
    KindMismatch {
        joint: usize,
        given: kinecal_chain::JointKind,
        calibrated: kinecal_chain::JointKind,
    },

    #[error("unknown joint: {0}")]
    UnknownJoint(String),

    #[error("unknown positioner: {0}")]
    UnknownPositioner(String),

    #[error("unknown positioning stack: {0}")]
    UnknownStack(String),

    #[error("positioning stack {0} has no positioners")]
    EmptyStack(String),

    #[error("positioner {positioner} has a non-finite {which} transform")]
    NonFiniteTransform {
        positioner: String,
        which: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
