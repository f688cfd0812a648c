//! Positioning stacks: a main positioner plus auxiliary positioners attached
//! through replaceable base transforms.

use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

use kinecal_core::math::{from_rows, is_finite_matrix, to_rows};
use kinecal_core::validation::{ensure_finite, ensure_len};

use crate::error::ChainError;
use crate::joint::{Joint, JointState};
use crate::positioner::Positioner;

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// How auxiliary end poses combine with the main chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    /// Each auxiliary hangs off the end of the previous one:
    /// `main · (base_1 · aux_1) · (base_2 · aux_2) · …`.
    #[default]
    Serial,
    /// Each auxiliary offsets its own output frame from the main end pose:
    /// `main · base_i · aux_i`. The combined pose is the main pose.
    Parallel,
}

// ---------------------------------------------------------------------------
// AuxiliaryPositioner
// ---------------------------------------------------------------------------

/// An auxiliary chain and the transform attaching it to the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliaryPositioner {
    pub positioner: Positioner,
    pub base: Matrix4<f64>,
}

impl AuxiliaryPositioner {
    /// `base · positioner.pose`.
    pub fn pose(&self) -> Matrix4<f64> {
        self.base * self.positioner.pose()
    }
}

// ---------------------------------------------------------------------------
// StackState
// ---------------------------------------------------------------------------

/// Persistable state of a stack: every joint plus the auxiliary bases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackState {
    pub joints: Vec<JointState>,
    pub auxiliary_bases: Vec<[[f64; 4]; 4]>,
}

// ---------------------------------------------------------------------------
// PositioningStack
// ---------------------------------------------------------------------------

/// A main positioner with zero or more auxiliary positioners.
#[derive(Debug, Clone, PartialEq)]
pub struct PositioningStack {
    name: String,
    main: Positioner,
    auxiliary: Vec<AuxiliaryPositioner>,
    composition: Composition,
}

impl PositioningStack {
    pub fn new(name: impl Into<String>, main: Positioner) -> Self {
        Self {
            name: name.into(),
            main,
            auxiliary: Vec::new(),
            composition: Composition::default(),
        }
    }

    #[must_use]
    pub const fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = composition;
        self
    }

    #[must_use]
    pub fn with_auxiliary(mut self, positioner: Positioner, base: Matrix4<f64>) -> Self {
        self.add_auxiliary(positioner, base);
        self
    }

    pub fn add_auxiliary(&mut self, positioner: Positioner, base: Matrix4<f64>) {
        self.auxiliary.push(AuxiliaryPositioner { positioner, base });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn composition(&self) -> Composition {
        self.composition
    }

    pub const fn main(&self) -> &Positioner {
        &self.main
    }

    pub const fn main_mut(&mut self) -> &mut Positioner {
        &mut self.main
    }

    pub fn auxiliary(&self) -> &[AuxiliaryPositioner] {
        &self.auxiliary
    }

    pub fn auxiliary_mut(&mut self, index: usize) -> Result<&mut AuxiliaryPositioner, ChainError> {
        let len = self.auxiliary.len();
        self.auxiliary
            .get_mut(index)
            .ok_or(ChainError::IndexOutOfRange { index, len })
    }

    /// Every positioner in declaration order, main first.
    pub fn positioners(&self) -> impl Iterator<Item = &Positioner> {
        std::iter::once(&self.main).chain(self.auxiliary.iter().map(|a| &a.positioner))
    }

    /// Every joint in declaration order.
    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.positioners().flat_map(Positioner::joints)
    }

    /// Total degrees of freedom across all chains.
    pub fn dof(&self) -> usize {
        self.positioners().map(Positioner::dof).sum()
    }

    /// Concatenated configuration, main chain first.
    pub fn configuration(&self) -> Vec<f64> {
        self.positioners().flat_map(Positioner::configuration).collect()
    }

    /// Replace the attachment transform of one auxiliary chain.
    ///
    /// Joint values are untouched; the combined pose reflects the new base
    /// on the next pose query.
    pub fn change_base(&mut self, index: usize, base: Matrix4<f64>) -> Result<(), ChainError> {
        self.auxiliary_mut(index)?.base = base;
        tracing::debug!(stack = %self.name, index, "auxiliary base changed");
        Ok(())
    }

    /// Split `values` across the chains by joint count and drive each one.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `values.len() != self.dof()`; `NonFiniteValue`
    /// for NaN or infinite entries. No chain is changed on error.
    pub fn set_configuration(&mut self, values: &[f64]) -> Result<Matrix4<f64>, ChainError> {
        ensure_len(self.dof(), values.len())?;
        ensure_finite(values)?;

        let (head, mut rest) = values.split_at(self.main.dof());
        self.main.forward_kinematics(head)?;
        for aux in &mut self.auxiliary {
            let (q, tail) = rest.split_at(aux.positioner.dof());
            aux.positioner.forward_kinematics(q)?;
            rest = tail;
        }
        Ok(self.pose())
    }

    /// Combined end pose.
    pub fn pose(&self) -> Matrix4<f64> {
        match self.composition {
            Composition::Serial => self
                .auxiliary
                .iter()
                .fold(*self.main.pose(), |acc, aux| acc * aux.pose()),
            Composition::Parallel => *self.main.pose(),
        }
    }

    /// Output frame of auxiliary chain `index`.
    pub fn auxiliary_pose(&self, index: usize) -> Result<Matrix4<f64>, ChainError> {
        let len = self.auxiliary.len();
        if index >= len {
            return Err(ChainError::IndexOutOfRange { index, len });
        }
        let main = *self.main.pose();
        Ok(match self.composition {
            Composition::Serial => self.auxiliary[..=index]
                .iter()
                .fold(main, |acc, aux| acc * aux.pose()),
            Composition::Parallel => main * self.auxiliary[index].pose(),
        })
    }

    /// Map a stack-wide joint index to (chain, joint) where chain 0 is main.
    fn locate(&self, index: usize) -> Result<(usize, usize), ChainError> {
        let mut local = index;
        for (chain, positioner) in self.positioners().enumerate() {
            if local < positioner.dof() {
                return Ok((chain, local));
            }
            local -= positioner.dof();
        }
        Err(ChainError::IndexOutOfRange {
            index,
            len: self.dof(),
        })
    }

    fn chain_mut(&mut self, chain: usize) -> &mut Positioner {
        if chain == 0 {
            &mut self.main
        } else {
            &mut self.auxiliary[chain - 1].positioner
        }
    }

    /// Lock or release a joint addressed by its stack-wide index.
    pub fn set_joint_locked(&mut self, index: usize, locked: bool) -> Result<(), ChainError> {
        let (chain, local) = self.locate(index)?;
        self.chain_mut(chain).set_joint_locked(local, locked)
    }

    /// Toggle limit clamping for a joint addressed by its stack-wide index.
    pub fn set_joint_ignore_limits(&mut self, index: usize, ignore: bool) -> Result<(), ChainError> {
        let (chain, local) = self.locate(index)?;
        self.chain_mut(chain).set_joint_ignore_limits(local, ignore)
    }

    pub fn state(&self) -> StackState {
        StackState {
            joints: self.positioners().flat_map(Positioner::joint_states).collect(),
            auxiliary_bases: self.auxiliary.iter().map(|a| to_rows(&a.base)).collect(),
        }
    }

    /// Restore a state captured by [`PositioningStack::state`].
    ///
    /// Every value and base is checked before any chain changes, so a
    /// rejected state leaves the stack as it was.
    pub fn restore(&mut self, state: &StackState) -> Result<(), ChainError> {
        ensure_len(self.dof(), state.joints.len())?;
        ensure_len(self.auxiliary.len(), state.auxiliary_bases.len())?;
        let bases: Vec<Matrix4<f64>> = state.auxiliary_bases.iter().map(from_rows).collect();
        if let Some(index) = bases.iter().position(|m| !is_finite_matrix(m)) {
            return Err(kinecal_core::error::ValidationError::NonFiniteValue { index }.into());
        }
        let values: Vec<f64> = state.joints.iter().map(|s| s.value).collect();
        ensure_finite(&values)?;

        let (head, mut rest) = state.joints.split_at(self.main.dof());
        self.main.restore_joint_states(head)?;
        for (aux, base) in self.auxiliary.iter_mut().zip(bases) {
            let (states, tail) = rest.split_at(aux.positioner.dof());
            aux.positioner.restore_joint_states(states)?;
            aux.base = base;
            rest = tail;
        }
        tracing::debug!(stack = %self.name, "stack state restored");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
