//! Shared test fixtures and utilities for kinecal crates.
//!
//! Provides reference positioners, synthetic probe measurements generated
//! from them, and deterministic RNG setup.

pub mod fixtures;
pub mod rng;
pub mod synthetic;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{linear_offsets, rotary_arm, sample_stage, slide_and_turntable};
pub use rng::{random_configuration, seeded_rng};
pub use synthetic::{add_noise, synthetic_measurements};
