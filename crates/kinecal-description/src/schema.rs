//! Declarative description types.
//!
//! These mirror the JSON documents read by the instrument loader. Matrices
//! are row-major 4×4 arrays; lengths are millimetres and revolute values are
//! radians.

use serde::{Deserialize, Serialize};

use kinecal_chain::{Composition, JointKind};

use crate::error::DescriptionError;

pub(crate) const fn identity_rows() -> [[f64; 4]; 4] {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

// ---------------------------------------------------------------------------
// JointDescription
// ---------------------------------------------------------------------------

/// One joint of a positioner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: JointKind,
    /// Link the joint is attached to.
    pub parent: String,
    /// Link the joint moves.
    pub child: String,
    pub axis: [f64; 3],
    /// Point on the axis in the parent joint's frame.
    pub origin: [f64; 3],
    /// Absent means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<f64>,
    #[serde(default)]
    pub home_offset: f64,
}

// ---------------------------------------------------------------------------
// LinkDescription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescription {
    pub name: String,
}

impl LinkDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

// ---------------------------------------------------------------------------
// PositionerDescription
// ---------------------------------------------------------------------------

/// A serial positioner: joints in base-to-tip order plus base/tool transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionerDescription {
    pub name: String,
    #[serde(default = "identity_rows")]
    pub base: [[f64; 4]; 4],
    #[serde(default = "identity_rows")]
    pub tool: [[f64; 4]; 4],
    /// Joint names in the order an operator lists them, when that differs
    /// from the kinematic order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_order: Option<Vec<String>>,
    pub joints: Vec<JointDescription>,
    #[serde(default)]
    pub links: Vec<LinkDescription>,
}

impl PositionerDescription {
    /// Index of the joint called `name`.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Joint indices in display order: `custom_order` if present, else
    /// kinematic order.
    pub fn display_order(&self) -> Result<Vec<usize>, DescriptionError> {
        let Some(names) = &self.custom_order else {
            return Ok((0..self.joints.len()).collect());
        };
        let order = names
            .iter()
            .map(|name| {
                self.joint_index(name)
                    .ok_or_else(|| DescriptionError::UnknownJoint(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        crate::generate::check_permutation(&order, self.joints.len())?;
        Ok(order)
    }
}

// ---------------------------------------------------------------------------
// Stacks and instruments
// ---------------------------------------------------------------------------

/// A named combination of positioners; the first is the main chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    pub positioners: Vec<String>,
    #[serde(default)]
    pub composition: Composition,
}

/// Every positioner of an instrument and the stacks built from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentDescription {
    pub name: String,
    pub positioners: Vec<PositionerDescription>,
    #[serde(default)]
    pub positioning_stacks: Vec<StackDescription>,
}

impl InstrumentDescription {
    /// Wrap a single positioner in an instrument with one stack of the same
    /// name.
    pub fn from_positioner(positioner: PositionerDescription) -> Self {
        let name = positioner.name.clone();
        Self {
            name: name.clone(),
            positioning_stacks: vec![StackDescription {
                name: name.clone(),
                positioners: vec![name],
                composition: Composition::default(),
            }],
            positioners: vec![positioner],
        }
    }

    pub fn positioner(&self, name: &str) -> Result<&PositionerDescription, DescriptionError> {
        self.positioners
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| DescriptionError::UnknownPositioner(name.into()))
    }

    pub fn stack(&self, name: &str) -> Result<&StackDescription, DescriptionError> {
        self.positioning_stacks
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| DescriptionError::UnknownStack(name.into()))
    }

    /// Stack names in declaration order.
    pub fn stack_names(&self) -> Vec<&str> {
        self.positioning_stacks.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Either document kind accepted by [`crate::io::read_instrument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DescriptionDocument {
    Instrument(InstrumentDescription),
    Positioner(PositionerDescription),
}

impl From<DescriptionDocument> for InstrumentDescription {
    fn from(document: DescriptionDocument) -> Self {
        match document {
            DescriptionDocument::Instrument(instrument) => instrument,
            DescriptionDocument::Positioner(positioner) => Self::from_positioner(positioner),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
