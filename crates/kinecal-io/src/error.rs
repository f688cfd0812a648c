//! Error types for reading measurement text files.

use std::path::PathBuf;

use kinecal_core::error::ValidationError;

/// Errors raised while reading calibration or measurement files.
///
/// Line numbers are 1-based and count blank lines.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Failed to read the file.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file holds no data rows.
    #[error("no data rows")]
    Empty,

    #[error("line {line}: expected {expected} fields, got {got}")]
    FieldCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },

    /// NaN or infinity in the data.
    #[error("line {line}: non-finite value")]
    NonFiniteValue { line: usize },

    #[error("line {line}: unknown joint type {token:?}")]
    UnknownJointType { line: usize, token: String },

    /// Rows of one joint disagree on a per-joint field.
    #[error("joint {joint}: {field} differs between rows")]
    InconsistentJoint { joint: usize, field: &'static str },

    #[error("joint {joint}: needs at least {required} rows, got {got}")]
    TooFewPoints {
        joint: usize,
        required: usize,
        got: usize,
    },

    #[error("joint {joint}: home offset {home} outside measured range [{min}, {max}]")]
    HomeOutOfRange {
        joint: usize,
        home: f64,
        min: f64,
        max: f64,
    },

    #[error("expected {expected} rows, got {got}")]
    RowCount { expected: usize, got: usize },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
