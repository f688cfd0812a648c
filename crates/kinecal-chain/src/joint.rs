//! Single-degree-of-freedom joint.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix4, Unit, Vector3};
use serde::{Deserialize, Serialize};

use kinecal_core::error::ValidationError;
use kinecal_core::math::{rotation, translation};

use crate::error::ChainError;

// ---------------------------------------------------------------------------
// JointKind
// ---------------------------------------------------------------------------

/// Motion type of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JointKind {
    /// Rotation about the axis; values in radians.
    Revolute,
    /// Translation along the axis; values in length units (mm).
    Prismatic,
}

impl JointKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Revolute => "revolute",
            Self::Prismatic => "prismatic",
        }
    }
}

impl fmt::Display for JointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JointKind {
    type Err = ChainError;

    /// Case-sensitive: only `revolute` and `prismatic` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revolute" => Ok(Self::Revolute),
            "prismatic" => Ok(Self::Prismatic),
            other => Err(ChainError::UnknownJointKind(other.into())),
        }
    }
}

// ---------------------------------------------------------------------------
// JointState
// ---------------------------------------------------------------------------

/// The mutable part of a joint, as persisted with a project.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub value: f64,
    pub locked: bool,
    pub ignore_limits: bool,
}

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// A revolute or prismatic joint.
///
/// `origin` is expressed in the parent joint's frame. The joint frame sits at
/// `origin`; a revolute joint rotates about `axis` through that point, a
/// prismatic joint slides the frame along `axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    name: String,
    kind: JointKind,
    axis: Unit<Vector3<f64>>,
    origin: Vector3<f64>,
    lower_limit: f64,
    upper_limit: f64,
    home_offset: f64,
    locked: bool,
    ignore_limits: bool,
    value: f64,
}

impl Joint {
    /// Create an unlimited joint at value zero.
    ///
    /// # Errors
    ///
    /// [`ChainError::ZeroAxis`] if `axis` has no direction, and a
    /// `NonFiniteValue` validation error if `origin` is not finite.
    pub fn new(
        name: impl Into<String>,
        kind: JointKind,
        axis: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Result<Self, ChainError> {
        let name = name.into();
        if !axis.iter().all(|v| v.is_finite()) {
            return Err(ChainError::ZeroAxis(name));
        }
        let Some(axis) = Unit::try_new(axis, f64::EPSILON) else {
            return Err(ChainError::ZeroAxis(name));
        };
        if let Some(index) = origin.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue { index }.into());
        }

        Ok(Self {
            name,
            kind,
            axis,
            origin,
            lower_limit: f64::NEG_INFINITY,
            upper_limit: f64::INFINITY,
            home_offset: 0.0,
            locked: false,
            ignore_limits: false,
            value: 0.0,
        })
    }

    /// Shorthand for a revolute joint.
    pub fn revolute(
        name: impl Into<String>,
        axis: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Result<Self, ChainError> {
        Self::new(name, JointKind::Revolute, axis, origin)
    }

    /// Shorthand for a prismatic joint.
    pub fn prismatic(
        name: impl Into<String>,
        axis: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Result<Self, ChainError> {
        Self::new(name, JointKind::Prismatic, axis, origin)
    }

    /// Set position limits. Infinite limits mean unbounded.
    ///
    /// The current value is clamped into the new range.
    pub fn with_limits(mut self, lower: f64, upper: f64) -> Result<Self, ChainError> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(ChainError::InvalidLimits {
                joint: self.name,
                lower,
                upper,
            });
        }
        self.lower_limit = lower;
        self.upper_limit = upper;
        self.value = self.clamp(self.value);
        Ok(self)
    }

    /// Set the home offset and move the joint there.
    #[must_use]
    pub fn with_home_offset(mut self, home: f64) -> Self {
        self.home_offset = home;
        self.value = self.clamp(home);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn kind(&self) -> JointKind {
        self.kind
    }

    pub const fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    pub const fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    pub const fn lower_limit(&self) -> f64 {
        self.lower_limit
    }

    pub const fn upper_limit(&self) -> f64 {
        self.upper_limit
    }

    pub const fn home_offset(&self) -> f64 {
        self.home_offset
    }

    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    pub const fn ignores_limits(&self) -> bool {
        self.ignore_limits
    }

    /// Current configuration value.
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Clamp `v` into the joint limits.
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.lower_limit, self.upper_limit)
    }

    /// Request a new value.
    ///
    /// A locked joint keeps its value. Otherwise the value is clamped to the
    /// limits unless limits are ignored, in which case it is stored as given.
    pub fn set_value(&mut self, v: f64) {
        if self.locked {
            return;
        }
        self.value = if self.ignore_limits { v } else { self.clamp(v) };
    }

    /// Freeze or release the joint at its current value.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Enable or disable limit clamping for subsequent value changes.
    pub fn set_ignore_limits(&mut self, ignore: bool) {
        self.ignore_limits = ignore;
    }

    pub const fn state(&self) -> JointState {
        JointState {
            value: self.value,
            locked: self.locked,
            ignore_limits: self.ignore_limits,
        }
    }

    /// Restore persisted flags and value, bypassing the lock of the current
    /// state but honouring the restored limit flag.
    pub(crate) fn restore(&mut self, state: JointState) {
        self.ignore_limits = state.ignore_limits;
        self.locked = false;
        self.set_value(state.value);
        self.locked = state.locked;
    }

    /// Transform from the parent frame to this joint's frame at `value`.
    pub fn transform(&self, value: f64) -> Matrix4<f64> {
        match self.kind {
            JointKind::Revolute => translation(&self.origin) * rotation(&self.axis, value),
            JointKind::Prismatic => translation(&(self.origin + self.axis.into_inner() * value)),
        }
    }

    /// Transform at the current value.
    pub fn pose(&self) -> Matrix4<f64> {
        self.transform(self.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinecal_core::math::transform_point;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn limited_revolute() -> Joint {
        Joint::revolute("omega", Vector3::z(), Vector3::new(0.0, 0.0, 10.0))
            .unwrap()
            .with_limits(-PI, PI)
            .unwrap()
    }

    // -- JointKind --

    #[test]
    fn joint_kind_parse_is_case_sensitive() {
        assert_eq!("revolute".parse::<JointKind>().unwrap(), JointKind::Revolute);
        assert_eq!(
            "prismatic".parse::<JointKind>().unwrap(),
            JointKind::Prismatic
        );
        assert_eq!(
            "Prismatic".parse::<JointKind>(),
            Err(ChainError::UnknownJointKind("Prismatic".into()))
        );
        assert!("prismatis".parse::<JointKind>().is_err());
    }

    #[test]
    fn joint_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&JointKind::Prismatic).unwrap();
        assert_eq!(json, "\"prismatic\"");
        let kind: JointKind = serde_json::from_str("\"revolute\"").unwrap();
        assert_eq!(kind, JointKind::Revolute);
        assert_eq!(JointKind::Revolute.to_string(), "revolute");
    }

    // -- construction --

    #[test]
    fn axis_is_normalized() {
        let joint = Joint::prismatic("x", Vector3::new(0.0, 0.0, 5.0), Vector3::zeros()).unwrap();
        assert_relative_eq!(joint.axis().into_inner(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn zero_axis_rejected() {
        let err = Joint::revolute("bad", Vector3::zeros(), Vector3::zeros()).unwrap_err();
        assert_eq!(err, ChainError::ZeroAxis("bad".into()));

        let err = Joint::revolute("nan", Vector3::new(f64::NAN, 0.0, 1.0), Vector3::zeros());
        assert!(matches!(err, Err(ChainError::ZeroAxis(_))));
    }

    #[test]
    fn non_finite_origin_rejected() {
        let err = Joint::revolute("j", Vector3::z(), Vector3::new(0.0, f64::INFINITY, 0.0));
        assert_eq!(
            err,
            Err(ChainError::Validation(ValidationError::NonFiniteValue { index: 1 }))
        );
    }

    #[test]
    fn inverted_limits_rejected() {
        let err = Joint::prismatic("y", Vector3::y(), Vector3::zeros())
            .unwrap()
            .with_limits(10.0, -10.0);
        assert!(matches!(err, Err(ChainError::InvalidLimits { .. })));
    }

    #[test]
    fn default_limits_are_unbounded() {
        let joint = Joint::prismatic("y", Vector3::y(), Vector3::zeros()).unwrap();
        assert_eq!(joint.lower_limit(), f64::NEG_INFINITY);
        assert_eq!(joint.upper_limit(), f64::INFINITY);
        assert!((joint.value()).abs() < f64::EPSILON);
    }

    #[test]
    fn home_offset_sets_value() {
        let joint = limited_revolute().with_home_offset(0.5);
        assert!((joint.home_offset() - 0.5).abs() < f64::EPSILON);
        assert!((joint.value() - 0.5).abs() < f64::EPSILON);
    }

    // -- set_value --

    #[test]
    fn set_value_clamps_to_limits() {
        let mut joint = limited_revolute();
        joint.set_value(5.0);
        assert!((joint.value() - PI).abs() < f64::EPSILON);
        joint.set_value(-5.0);
        assert!((joint.value() + PI).abs() < f64::EPSILON);
        joint.set_value(1.0);
        assert!((joint.value() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn set_value_ignoring_limits_stores_exactly() {
        let mut joint = limited_revolute();
        joint.set_ignore_limits(true);
        joint.set_value(7.25);
        assert_eq!(joint.value(), 7.25);
    }

    #[test]
    fn set_value_on_locked_joint_is_noop() {
        let mut joint = limited_revolute();
        joint.set_value(0.3);
        joint.set_locked(true);
        for v in [-100.0, 0.0, 2.0, f64::INFINITY] {
            joint.set_value(v);
            assert_eq!(joint.value(), 0.3);
        }
        joint.set_locked(false);
        joint.set_value(0.1);
        assert_eq!(joint.value(), 0.1);
    }

    #[test]
    fn restore_overrides_lock_and_keeps_flags() {
        let mut joint = limited_revolute();
        joint.set_locked(true);
        joint.restore(JointState {
            value: 6.0,
            locked: true,
            ignore_limits: true,
        });
        assert_eq!(joint.value(), 6.0);
        assert!(joint.is_locked());
        assert!(joint.ignores_limits());
        assert_eq!(joint.state().value, 6.0);
    }

    // -- transform --

    #[test]
    fn revolute_transform_rotates_about_origin() {
        let joint = limited_revolute();
        let m = joint.transform(FRAC_PI_2);
        let p = transform_point(&m, &Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vector3::new(0.0, 1.0, 10.0), epsilon = 1e-12);
    }

    #[test]
    fn prismatic_transform_translates_along_axis() {
        let joint =
            Joint::prismatic("x", Vector3::x(), Vector3::new(0.0, 1.0, 0.0)).unwrap();
        let m = joint.transform(25.0);
        let p = transform_point(&m, &Vector3::zeros());
        assert_relative_eq!(p, Vector3::new(25.0, 1.0, 0.0), epsilon = 1e-12);
        // no rotation
        assert_relative_eq!(
            m.fixed_view::<3, 3>(0, 0).into_owned(),
            nalgebra::Matrix3::identity(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn pose_uses_current_value() {
        let mut joint = limited_revolute();
        joint.set_value(0.7);
        assert_relative_eq!(joint.pose(), joint.transform(0.7), epsilon = 1e-12);
    }
}
