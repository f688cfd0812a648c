//! Calibration output and residual statistics.

use nalgebra::{Matrix4, Vector3};

use kinecal_chain::{JointKind, Positioner};

/// Which residual set a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualKind {
    /// Full-chain replay against the measurements.
    Model,
    /// Each joint's circle or line against its own samples.
    Fit,
}

/// Statistics over residual norms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualSummary {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    /// Residuals whose norm exceeds the configured tolerance.
    pub exceeding: usize,
}

impl ResidualSummary {
    fn from_norms(norms: impl Iterator<Item = f64>, tolerance: f64) -> Self {
        let mut summary = Self {
            count: 0,
            mean: 0.0,
            max: 0.0,
            exceeding: 0,
        };
        let mut total = 0.0;
        for norm in norms {
            summary.count += 1;
            total += norm;
            summary.max = summary.max.max(norm);
            if norm > tolerance {
                summary.exceeding += 1;
            }
        }
        if summary.count > 0 {
            summary.mean = total / summary.count as f64;
        }
        summary
    }

    /// True when no residual exceeds the tolerance.
    pub const fn within_tolerance(&self) -> bool {
        self.exceeding == 0
    }
}

/// Output of one calibration run. Immutable once built.
#[derive(Debug, Clone)]
pub struct CalibrationResult {
    pub(crate) joint_axes: Vec<Vector3<f64>>,
    pub(crate) joint_origins: Vec<Vector3<f64>>,
    pub(crate) model_errors: Vec<Vec<Vector3<f64>>>,
    pub(crate) fit_errors: Vec<Vec<Vector3<f64>>>,
    pub(crate) positioner: Positioner,
    pub(crate) residual_tolerance: f64,
}

impl CalibrationResult {
    /// Number of calibrated joints.
    pub fn joint_count(&self) -> usize {
        self.joint_axes.len()
    }

    /// Joint axes in the reference frame with every joint at home.
    pub fn joint_axes(&self) -> &[Vector3<f64>] {
        &self.joint_axes
    }

    /// Points on each joint axis in the reference frame with every joint at
    /// home. For revolute joints this is the fitted circle centre.
    pub fn joint_origins(&self) -> &[Vector3<f64>] {
        &self.joint_origins
    }

    /// Reference frame to first joint.
    pub fn base(&self) -> &Matrix4<f64> {
        self.positioner.base()
    }

    /// Last joint to probe tip.
    pub fn tool(&self) -> &Matrix4<f64> {
        self.positioner.tool()
    }

    /// `measured − predicted` per joint and sample.
    pub fn model_errors(&self) -> &[Vec<Vector3<f64>>] {
        &self.model_errors
    }

    /// Per-sample offset from the joint's fitted circle or line, in the
    /// reference frame.
    pub fn fit_errors(&self) -> &[Vec<Vector3<f64>>] {
        &self.fit_errors
    }

    /// The fitted model. Joint geometry is expressed in each parent joint's
    /// frame and joints start at their home offsets.
    pub fn positioner(&self) -> &Positioner {
        &self.positioner
    }

    pub fn kinds(&self) -> Vec<JointKind> {
        self.positioner.joints().iter().map(|j| j.kind()).collect()
    }

    pub fn home_offsets(&self) -> Vec<f64> {
        self.positioner.home_configuration()
    }

    pub const fn residual_tolerance(&self) -> f64 {
        self.residual_tolerance
    }

    /// Summarise residual norms, over every joint or only `joint`.
    ///
    /// Returns `None` if `joint` is out of range.
    pub fn summary(&self, kind: ResidualKind, joint: Option<usize>) -> Option<ResidualSummary> {
        let errors = match kind {
            ResidualKind::Model => &self.model_errors,
            ResidualKind::Fit => &self.fit_errors,
        };
        let selected: &[Vec<Vector3<f64>>] = match joint {
            Some(j) => std::slice::from_ref(errors.get(j)?),
            None => errors,
        };
        Some(ResidualSummary::from_norms(
            selected.iter().flatten().map(|e| e.norm()),
            self.residual_tolerance,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinecal_chain::Joint;

    fn result() -> CalibrationResult {
        let joint = Joint::prismatic("X", Vector3::x(), Vector3::zeros()).unwrap();
        CalibrationResult {
            joint_axes: vec![Vector3::x(), Vector3::y()],
            joint_origins: vec![Vector3::zeros(), Vector3::zeros()],
            model_errors: vec![
                vec![Vector3::new(0.05, 0.0, 0.0), Vector3::new(0.0, 0.3, 0.4)],
                vec![Vector3::new(0.0, 0.0, 0.09)],
            ],
            fit_errors: vec![vec![Vector3::zeros(); 2], vec![Vector3::zeros()]],
            positioner: Positioner::new("P", vec![joint]).unwrap(),
            residual_tolerance: 0.1,
        }
    }

    #[test]
    fn summary_over_all_joints() {
        let s = result().summary(ResidualKind::Model, None).unwrap();
        assert_eq!(s.count, 3);
        assert_relative_eq!(s.mean, (0.05 + 0.5 + 0.09) / 3.0, epsilon = 1e-12);
        assert_relative_eq!(s.max, 0.5, epsilon = 1e-12);
        assert_eq!(s.exceeding, 1);
        assert!(!s.within_tolerance());
    }

    #[test]
    fn summary_for_one_joint() {
        let r = result();
        let s = r.summary(ResidualKind::Model, Some(1)).unwrap();
        assert_eq!(s.count, 1);
        assert!(s.within_tolerance());

        let s = r.summary(ResidualKind::Fit, Some(0)).unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.max, 0.0);
        assert!(r.summary(ResidualKind::Fit, Some(2)).is_none());
    }
}
