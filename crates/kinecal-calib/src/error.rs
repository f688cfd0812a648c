//! Calibration error types.

use std::fmt;

use kinecal_chain::{ChainError, JointKind};

/// Why a joint's sample set cannot define its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// All samples sit at (numerically) the same position.
    CoincidentPoints,
    /// Revolute samples lie on a line, so no plane or circle is defined.
    CollinearPoints,
    /// Offsets are neither strictly increasing nor strictly decreasing.
    NonMonotonicOffsets,
    /// The circle solve was singular or produced no real radius.
    CircleFitFailed,
}

impl fmt::Display for Degeneracy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CoincidentPoints => "points are coincident",
            Self::CollinearPoints => "points are collinear",
            Self::NonMonotonicOffsets => "offsets are not strictly monotonic",
            Self::CircleFitFailed => "circle fit failed",
        })
    }
}

/// Errors that abort a calibration run. Joint indices are zero-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("no joints to calibrate")]
    NoJoints,

    #[error("joint {joint}: {points} points but {offsets} offsets")]
    DimensionMismatch {
        joint: usize,
        points: usize,
        offsets: usize,
    },

    #[error("joint {joint}: {kind} joint needs at least {required} points, got {got}")]
    UnderDetermined {
        joint: usize,
        kind: JointKind,
        required: usize,
        got: usize,
    },

    #[error("joint {joint}: degenerate geometry, {reason}")]
    DegenerateGeometry { joint: usize, reason: Degeneracy },

    #[error("joint {joint}: non-finite value in sample {sample}")]
    NonFiniteValue { joint: usize, sample: usize },

    #[error("joint {joint}: non-finite home offset")]
    NonFiniteHome { joint: usize },

    #[error("base alignment failed: no singular vectors for the predicted probe positions")]
    AlignmentFailed,

    /// Building the fitted positioner failed.
    #[error(transparent)]
    Chain(#[from] ChainError),
}
