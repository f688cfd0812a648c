//! Declarative positioner and instrument descriptions.
//!
//! Provides the JSON schema consumed by the instrument loader, the generator
//! that turns a [`CalibrationResult`](kinecal_calib::CalibrationResult) into
//! a [`PositionerDescription`], and the loader that rebuilds
//! [`Positioner`](kinecal_chain::Positioner)s and
//! [`PositioningStack`](kinecal_chain::PositioningStack)s from descriptions.
//!
//! # Architecture
//!
//! ```text
//! CalibrationResult ──► generate_description ──► PositionerDescription ──► JSON
//!                                                         │
//! InstrumentDescription ──► StackSelector::select ──► PositioningStack
//! ```

pub mod error;
pub mod generate;
pub mod io;
pub mod loader;
pub mod schema;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::DescriptionError;
pub use generate::{CalibrationSetup, generate_description};
pub use io::{from_json_str, read_instrument, read_json, to_json_string, write_json};
pub use loader::StackSelector;
pub use schema::{
    DescriptionDocument, InstrumentDescription, JointDescription, LinkDescription,
    PositionerDescription, StackDescription,
};
