//! Text readers for calibration input.
//!
//! Every reader accepts comma and/or whitespace separated fields, skips blank
//! lines and rejects NaN or infinite values, so what it returns can go
//! straight to [`kinecal_calib::CalibrationEngine`] or the measurement-vector
//! checks in [`kinecal_core::validation`].
//!
//! # Architecture
//!
//! ```text
//! calibration CSV ──► parse_calibration ──► CalibrationData ──► JointMeasurements
//! transform file  ──► parse_trans_matrix ──► Matrix4
//! vectors file    ──► parse_vectors ──► MeasurementVectors
//! ```

pub mod calibration;
pub mod error;
pub mod matrix;
mod text;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use calibration::{
    CALIBRATION_FIELDS, CalibrationData, MIN_ROWS_PER_JOINT, parse_calibration,
    read_calibration_file,
};
pub use error::ReadError;
pub use matrix::{parse_trans_matrix, parse_vectors, read_trans_matrix, read_vectors};
