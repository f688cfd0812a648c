//! Kinematic calibration by circle-point analysis.
//!
//! Recovers joint axes and origins, plus base and tool transforms, from probe
//! positions recorded while each joint of a serial positioner is moved on
//! its own.
//!
//! # Architecture
//!
//! ```text
//! JointMeasurements ──► CalibrationEngine ──► CalibrationResult ──► Positioner
//!                        (plane/circle, line,
//!                         sign, frame chaining,
//!                         tool + base alignment)
//! ```
//!
//! Joints are solved strictly in chain order; each fit depends on the
//! accumulated home frame of every proximal joint.

mod align;
pub mod engine;
pub mod error;
mod fit;
pub mod result;

pub use engine::{CALIBRATED_POSITIONER_NAME, CalibrationEngine, JointMeasurements};
pub use error::{CalibrationError, Degeneracy};
pub use result::{CalibrationResult, ResidualKind, ResidualSummary};
