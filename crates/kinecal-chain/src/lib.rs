//! Kinematic chain model for multi-joint positioning hardware.
//!
//! Provides single-degree-of-freedom [`Joint`]s, serial [`Positioner`]s that
//! compose them into a forward-kinematics pose, and [`PositioningStack`]s
//! that attach auxiliary positioners to a main chain through independently
//! adjustable base transforms.
//!
//! # Architecture
//!
//! ```text
//! Joint ──► Positioner ──► PositioningStack ──► end pose(s)
//! ```
//!
//! Joint values only change through [`Joint::set_value`], which enforces the
//! locked and limit semantics in one place. Positioners refresh their cached
//! pose on every value change, so a pose read is never stale.

pub mod error;
pub mod joint;
pub mod positioner;
pub mod stack;

pub use error::ChainError;
pub use joint::{Joint, JointKind, JointState};
pub use positioner::Positioner;
pub use stack::{AuxiliaryPositioner, Composition, PositioningStack, StackState};
