//! Serial positioner: an ordered chain of joints from base to tip.
//!
//! The pose of a [`Positioner`] is `base · T_1(q_1) · … · T_n(q_n) · tool`.
//! It is cached and refreshed on every value change made through the
//! positioner, so [`Positioner::pose`] always reflects the most recently set
//! configuration.

use nalgebra::Matrix4;

use kinecal_core::validation::{ensure_finite, ensure_len};

use crate::error::ChainError;
use crate::joint::{Joint, JointState};

/// An ordered serial chain of joints with base and tool transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Positioner {
    name: String,
    joints: Vec<Joint>,
    base: Matrix4<f64>,
    tool: Matrix4<f64>,
    pose: Matrix4<f64>,
}

impl Positioner {
    /// Build a positioner from joints in base-to-tip order.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyChain`] if `joints` is empty.
    pub fn new(name: impl Into<String>, joints: Vec<Joint>) -> Result<Self, ChainError> {
        let name = name.into();
        if joints.is_empty() {
            return Err(ChainError::EmptyChain(name));
        }
        let mut positioner = Self {
            name,
            joints,
            base: Matrix4::identity(),
            tool: Matrix4::identity(),
            pose: Matrix4::identity(),
        };
        positioner.refresh();
        Ok(positioner)
    }

    #[must_use]
    pub fn with_base(mut self, base: Matrix4<f64>) -> Self {
        self.set_base(base);
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Matrix4<f64>) -> Self {
        self.set_tool(tool);
        self
    }

    pub fn set_base(&mut self, base: Matrix4<f64>) {
        self.base = base;
        self.refresh();
    }

    pub fn set_tool(&mut self, tool: Matrix4<f64>) {
        self.tool = tool;
        self.refresh();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of joints (degrees of freedom).
    pub fn dof(&self) -> usize {
        self.joints.len()
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Index of the joint called `name`.
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name() == name)
    }

    pub const fn base(&self) -> &Matrix4<f64> {
        &self.base
    }

    pub const fn tool(&self) -> &Matrix4<f64> {
        &self.tool
    }

    /// Current joint values in chain order.
    pub fn configuration(&self) -> Vec<f64> {
        self.joints.iter().map(Joint::value).collect()
    }

    /// Home offsets in chain order.
    pub fn home_configuration(&self) -> Vec<f64> {
        self.joints.iter().map(Joint::home_offset).collect()
    }

    /// Tip pose for the current configuration.
    pub const fn pose(&self) -> &Matrix4<f64> {
        &self.pose
    }

    /// Set every joint value from `q` and return the resulting tip pose.
    ///
    /// Values pass through [`Joint::set_value`], so locked joints keep their
    /// value and limits are applied unless ignored.
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if `q.len() != self.dof()`, `NonFiniteValue` if any
    /// entry is NaN or infinite. The configuration is unchanged on error.
    pub fn forward_kinematics(&mut self, q: &[f64]) -> Result<Matrix4<f64>, ChainError> {
        ensure_len(self.dof(), q.len())?;
        ensure_finite(q)?;

        for (joint, &value) in self.joints.iter_mut().zip(q.iter()) {
            joint.set_value(value);
        }
        self.refresh();
        Ok(self.pose)
    }

    /// Tip pose for an arbitrary configuration without touching joint state.
    ///
    /// Limits and locks are not applied; the geometry is evaluated as given.
    pub fn evaluate(&self, q: &[f64]) -> Result<Matrix4<f64>, ChainError> {
        ensure_len(self.dof(), q.len())?;
        ensure_finite(q)?;
        Ok(self.compose(q.iter().copied()))
    }

    /// Frame after each joint at the current configuration, base included.
    pub fn joint_frames(&self) -> Vec<Matrix4<f64>> {
        let mut transform = self.base;
        self.joints
            .iter()
            .map(|joint| {
                transform *= joint.pose();
                transform
            })
            .collect()
    }

    /// Request a new value for one joint.
    pub fn set_joint_value(&mut self, index: usize, value: f64) -> Result<(), ChainError> {
        self.joint_mut(index)?.set_value(value);
        self.refresh();
        Ok(())
    }

    pub fn set_joint_locked(&mut self, index: usize, locked: bool) -> Result<(), ChainError> {
        self.joint_mut(index)?.set_locked(locked);
        Ok(())
    }

    pub fn set_joint_ignore_limits(
        &mut self,
        index: usize,
        ignore: bool,
    ) -> Result<(), ChainError> {
        self.joint_mut(index)?.set_ignore_limits(ignore);
        Ok(())
    }

    /// Move every unlocked joint back to its home offset.
    pub fn reset(&mut self) {
        for joint in &mut self.joints {
            joint.set_value(joint.home_offset());
        }
        self.refresh();
    }

    /// Persistable state of every joint.
    pub fn joint_states(&self) -> Vec<JointState> {
        self.joints.iter().map(Joint::state).collect()
    }

    /// Restore values and flags captured by [`Positioner::joint_states`].
    pub fn restore_joint_states(&mut self, states: &[JointState]) -> Result<(), ChainError> {
        ensure_len(self.dof(), states.len())?;
        let values: Vec<f64> = states.iter().map(|s| s.value).collect();
        ensure_finite(&values)?;

        for (joint, state) in self.joints.iter_mut().zip(states) {
            joint.restore(*state);
        }
        self.refresh();
        Ok(())
    }

    fn joint_mut(&mut self, index: usize) -> Result<&mut Joint, ChainError> {
        let len = self.joints.len();
        self.joints
            .get_mut(index)
            .ok_or(ChainError::IndexOutOfRange { index, len })
    }

    fn compose(&self, q: impl Iterator<Item = f64>) -> Matrix4<f64> {
        let mut transform = self.base;
        for (joint, value) in self.joints.iter().zip(q) {
            transform *= joint.transform(value);
        }
        transform * self.tool
    }

    fn refresh(&mut self) {
        self.pose = self.compose(self.joints.iter().map(Joint::value));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinecal_core::error::ValidationError;
    use kinecal_core::math::{transform_point, translation, translation_of};
    use nalgebra::Vector3;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// X stage carrying a vertical rotation stage 100 mm above it.
    fn table() -> Positioner {
        let x = Joint::prismatic("X Stage", Vector3::x(), Vector3::zeros())
            .unwrap()
            .with_limits(-200.0, 200.0)
            .unwrap();
        let omega = Joint::revolute("Omega", Vector3::z(), Vector3::new(0.0, 0.0, 100.0))
            .unwrap()
            .with_limits(-PI, PI)
            .unwrap();
        Positioner::new("Table", vec![x, omega])
            .unwrap()
            .with_tool(translation(&Vector3::new(10.0, 0.0, 0.0)))
    }

    #[test]
    fn empty_chain_rejected() {
        let err = Positioner::new("empty", Vec::new()).unwrap_err();
        assert_eq!(err, ChainError::EmptyChain("empty".into()));
    }

    #[test]
    fn fk_zero_position() {
        let mut p = table();
        let pose = p.forward_kinematics(&[0.0, 0.0]).unwrap();
        assert_relative_eq!(
            translation_of(&pose),
            Vector3::new(10.0, 0.0, 100.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn fk_composes_in_chain_order() {
        let mut p = table();
        let pose = p.forward_kinematics(&[50.0, FRAC_PI_2]).unwrap();
        // tool offset rotated onto +Y, whole stack shifted 50 along X
        assert_relative_eq!(
            translation_of(&pose),
            Vector3::new(50.0, 10.0, 100.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(*p.pose(), pose, epsilon = 1e-12);
    }

    #[test]
    fn fk_wrong_length_is_dimension_mismatch() {
        let mut p = table();
        for q in [vec![], vec![1.0], vec![1.0, 2.0, 3.0]] {
            let err = p.forward_kinematics(&q).unwrap_err();
            assert_eq!(
                err,
                ChainError::Validation(ValidationError::DimensionMismatch {
                    expected: 2,
                    got: q.len()
                })
            );
        }
        assert!(p.evaluate(&[0.0]).is_err());
    }

    #[test]
    fn fk_rejects_non_finite_and_keeps_state() {
        let mut p = table();
        p.forward_kinematics(&[10.0, 0.5]).unwrap();
        let err = p.forward_kinematics(&[f64::NAN, 0.0]).unwrap_err();
        assert_eq!(
            err,
            ChainError::Validation(ValidationError::NonFiniteValue { index: 0 })
        );
        assert_eq!(p.configuration(), vec![10.0, 0.5]);
    }

    #[test]
    fn fk_clamps_and_respects_locks() {
        let mut p = table();
        p.forward_kinematics(&[500.0, 0.25]).unwrap();
        assert_eq!(p.configuration(), vec![200.0, 0.25]);

        p.set_joint_locked(1, true).unwrap();
        p.set_joint_ignore_limits(0, true).unwrap();
        p.forward_kinematics(&[500.0, 1.0]).unwrap();
        assert_eq!(p.configuration(), vec![500.0, 0.25]);
    }

    #[test]
    fn pose_never_stale_after_single_joint_change() {
        let mut p = table();
        p.forward_kinematics(&[0.0, 0.0]).unwrap();
        p.set_joint_value(0, 25.0).unwrap();
        assert_relative_eq!(*p.pose(), p.evaluate(&[25.0, 0.0]).unwrap(), epsilon = 1e-12);

        p.set_base(translation(&Vector3::new(0.0, 0.0, -5.0)));
        assert_relative_eq!(translation_of(p.pose()).z, 95.0, epsilon = 1e-12);
    }

    #[test]
    fn evaluate_does_not_mutate() {
        let p = table();
        let before = p.configuration();
        let pose = p.evaluate(&[1000.0, 4.0]).unwrap();
        assert_eq!(p.configuration(), before);
        // limits are not applied by evaluate
        assert_relative_eq!(translation_of(&pose).x, 1000.0 + 10.0 * 4.0_f64.cos(), epsilon = 1e-9);
    }

    #[test]
    fn joint_frames_end_before_tool() {
        let mut p = table();
        p.forward_kinematics(&[30.0, 0.0]).unwrap();
        let frames = p.joint_frames();
        assert_eq!(frames.len(), 2);
        assert_relative_eq!(translation_of(&frames[0]), Vector3::new(30.0, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(translation_of(&frames[1]), Vector3::new(30.0, 0.0, 100.0), epsilon = 1e-12);
        let tip = transform_point(&frames[1], &Vector3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(tip, translation_of(p.pose()), epsilon = 1e-12);
    }

    #[test]
    fn reset_returns_unlocked_joints_home() {
        let mut p = table();
        p.forward_kinematics(&[80.0, 1.0]).unwrap();
        p.set_joint_locked(1, true).unwrap();
        p.reset();
        assert_eq!(p.configuration(), vec![0.0, 1.0]);
        assert_eq!(p.home_configuration(), vec![0.0, 0.0]);
    }

    #[test]
    fn joint_index_out_of_range() {
        let mut p = table();
        assert_eq!(
            p.set_joint_value(2, 0.0),
            Err(ChainError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(p.joint_index("Omega"), Some(1));
        assert_eq!(p.joint_index("Chi"), None);
    }

    #[test]
    fn joint_states_round_trip() {
        let mut p = table();
        p.set_joint_ignore_limits(0, true).unwrap();
        p.forward_kinematics(&[350.0, 0.5]).unwrap();
        p.set_joint_locked(1, true).unwrap();
        let states = p.joint_states();

        let mut restored = table();
        restored.restore_joint_states(&states).unwrap();
        assert_eq!(restored.configuration(), vec![350.0, 0.5]);
        assert_eq!(restored.joint_states(), states);
        assert_relative_eq!(*restored.pose(), *p.pose(), epsilon = 1e-12);

        assert!(restored.restore_joint_states(&states[..1]).is_err());
    }
}
