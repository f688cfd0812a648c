//! Circle-point analysis.
//!
//! Each joint is moved on its own while every other joint sits at its home
//! offset, and a probe position is recorded per offset. Joints are solved in
//! chain order: a joint's samples are first mapped into the frame left by all
//! proximal joints at home, then a circle (revolute) or line (prismatic) is
//! fitted there. The solved joint at home is folded into that accumulated
//! frame before the next joint is processed.

use std::f64::consts::{PI, TAU};

use nalgebra::{Matrix4, Unit, Vector3};

use kinecal_chain::{Joint, JointKind, Positioner};
use kinecal_core::config::CalibrationConfig;
use kinecal_core::error::ConfigError;
use kinecal_core::math::{rigid_inverse, transform_point, transform_vector, translation, translation_of};

use crate::align::rigid_alignment;
use crate::error::{CalibrationError, Degeneracy};
use crate::fit::{Circle, Line, PrincipalAxes};
use crate::result::{CalibrationResult, ResidualKind};

/// Name given to the positioner built from fitted joints.
pub const CALIBRATED_POSITIONER_NAME: &str = "Calibrated Positioner";

/// Probe samples recorded while moving one joint.
#[derive(Debug, Clone, PartialEq)]
pub struct JointMeasurements {
    pub kind: JointKind,
    /// Probe positions in the measurement frame, one per offset.
    pub points: Vec<Vector3<f64>>,
    /// Joint value that produced each point.
    pub offsets: Vec<f64>,
    pub home_offset: f64,
}

impl JointMeasurements {
    pub fn new(kind: JointKind, points: Vec<Vector3<f64>>, offsets: Vec<f64>, home_offset: f64) -> Self {
        Self {
            kind,
            points,
            offsets,
            home_offset,
        }
    }
}

/// Geometry solved for one joint in its parent frame.
struct JointFit {
    axis: Unit<Vector3<f64>>,
    origin: Vector3<f64>,
    residuals: Vec<Vector3<f64>>,
}

/// Calibrates a serial positioner from per-joint probe measurements.
#[derive(Debug, Clone, Default)]
pub struct CalibrationEngine {
    config: CalibrationConfig,
}

impl CalibrationEngine {
    /// Engine using `config`, which must pass [`CalibrationConfig::validate`].
    pub fn new(config: CalibrationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub const fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Run circle-point analysis over `joints`, given in chain order.
    ///
    /// Any failing joint aborts the whole run.
    pub fn calibrate(&self, joints: &[JointMeasurements]) -> Result<CalibrationResult, CalibrationError> {
        if joints.is_empty() {
            return Err(CalibrationError::NoJoints);
        }
        for (index, input) in joints.iter().enumerate() {
            self.check_input(index, input)?;
        }
        tracing::info!(joints = joints.len(), "starting circle-point analysis");

        let mut accumulated = Matrix4::identity();
        let mut frames = Vec::with_capacity(joints.len());
        let mut fitted = Vec::with_capacity(joints.len());
        let mut fit_errors: Vec<Vec<Vector3<f64>>> = Vec::with_capacity(joints.len());

        for (index, input) in joints.iter().enumerate() {
            let inverse = rigid_inverse(&accumulated);
            let local: Vec<Vector3<f64>> = input.points.iter().map(|p| transform_point(&inverse, p)).collect();

            let fit = self.fit_joint(index, input, &local)?;
            tracing::debug!(
                joint = index,
                kind = %input.kind,
                axis = ?fit.axis.as_slice(),
                origin = ?fit.origin.as_slice(),
                "joint fitted"
            );
            fit_errors.push(fit.residuals.iter().map(|r| transform_vector(&accumulated, r)).collect());

            let joint = Joint::new(format!("Joint {}", index + 1), input.kind, fit.axis.into_inner(), fit.origin)?
                .with_home_offset(input.home_offset);
            frames.push(accumulated);
            accumulated *= joint.transform(input.home_offset);
            fitted.push(joint);
        }

        let mut positioner = Positioner::new(CALIBRATED_POSITIONER_NAME, fitted)?;
        let configurations = sample_configurations(joints);
        let measured: Vec<Vector3<f64>> = joints.iter().flat_map(|j| j.points.iter().copied()).collect();

        positioner.set_tool(estimate_tool(&positioner, &configurations, &measured)?);
        let predicted = configurations
            .iter()
            .map(|q| positioner.evaluate(q).map(|pose| translation_of(&pose)))
            .collect::<Result<Vec<_>, _>>()?;

        let alignment = rigid_alignment(&predicted, &measured, self.config.alignment_tolerance)?;
        if !alignment.rotation_estimated {
            tracing::warn!("predicted probe positions are collinear; base estimated as translation only");
        }
        let base = alignment.transform;
        positioner.set_base(base);

        let mut residuals = measured.iter().zip(&predicted).map(|(m, p)| m - transform_point(&base, p));
        let model_errors = joints
            .iter()
            .map(|j| residuals.by_ref().take(j.points.len()).collect())
            .collect();

        let result = CalibrationResult {
            joint_axes: fitted_axes(&positioner, &frames, &base),
            joint_origins: fitted_origins(&positioner, &frames, &base),
            model_errors,
            fit_errors,
            positioner,
            residual_tolerance: self.config.residual_tolerance,
        };

        if let Some(summary) = result.summary(ResidualKind::Model, None) {
            if summary.within_tolerance() {
                tracing::info!(mean = summary.mean, max = summary.max, "calibration finished");
            } else {
                tracing::warn!(
                    mean = summary.mean,
                    max = summary.max,
                    exceeding = summary.exceeding,
                    tolerance = self.config.residual_tolerance,
                    "model errors exceed tolerance"
                );
            }
        }
        Ok(result)
    }

    fn check_input(&self, joint: usize, input: &JointMeasurements) -> Result<(), CalibrationError> {
        let (points, offsets) = (input.points.len(), input.offsets.len());
        if points != offsets {
            return Err(CalibrationError::DimensionMismatch { joint, points, offsets });
        }

        let required = match input.kind {
            JointKind::Revolute => self.config.min_revolute_points,
            JointKind::Prismatic => self.config.min_prismatic_points,
        };
        if points < required {
            return Err(CalibrationError::UnderDetermined {
                joint,
                kind: input.kind,
                required,
                got: points,
            });
        }

        let finite = |k: usize| input.points[k].iter().all(|v| v.is_finite()) && input.offsets[k].is_finite();
        if let Some(sample) = (0..points).find(|&k| !finite(k)) {
            return Err(CalibrationError::NonFiniteValue { joint, sample });
        }
        if !input.home_offset.is_finite() {
            return Err(CalibrationError::NonFiniteHome { joint });
        }
        Ok(())
    }

    /// Fit one joint to samples already expressed in its parent frame.
    fn fit_joint(
        &self,
        joint: usize,
        input: &JointMeasurements,
        local: &[Vector3<f64>],
    ) -> Result<JointFit, CalibrationError> {
        let degenerate = |reason| CalibrationError::DegenerateGeometry { joint, reason };

        if offset_direction(&input.offsets).is_none() {
            return Err(degenerate(Degeneracy::NonMonotonicOffsets));
        }
        let axes = PrincipalAxes::new(local);
        if axes.largest_spread() <= self.config.coincidence_tolerance {
            return Err(degenerate(Degeneracy::CoincidentPoints));
        }

        match input.kind {
            JointKind::Revolute => {
                if axes.middle_spread() <= self.config.degeneracy_tolerance * axes.largest_spread() {
                    return Err(degenerate(Degeneracy::CollinearPoints));
                }
                let circle = Circle::fit(local, &axes).ok_or_else(|| degenerate(Degeneracy::CircleFitFailed))?;

                // positive offsets must turn the probe counter-clockwise about the axis
                let axis = if rotation_sign(&circle, local, &input.offsets) < 0.0 {
                    Unit::new_unchecked(-circle.normal.into_inner())
                } else {
                    circle.normal
                };

                Ok(JointFit {
                    axis,
                    origin: circle.center,
                    residuals: local.iter().map(|p| circle.residual(p)).collect(),
                })
            }
            JointKind::Prismatic => {
                let line = Line::fit(&axes);

                // positive offsets must move the probe along the axis
                let mean_offset = input.offsets.iter().sum::<f64>() / input.offsets.len() as f64;
                let correlation: f64 = input
                    .offsets
                    .iter()
                    .zip(local)
                    .map(|(q, p)| (q - mean_offset) * line.direction.dot(&(p - line.origin)))
                    .sum();
                let axis = if correlation < 0.0 {
                    Unit::new_unchecked(-line.direction.into_inner())
                } else {
                    line.direction
                };

                Ok(JointFit {
                    axis,
                    origin: line.origin,
                    residuals: local.iter().map(|p| line.residual(p)).collect(),
                })
            }
        }
    }
}

/// `+1` for strictly increasing offsets, `-1` for strictly decreasing.
fn offset_direction(offsets: &[f64]) -> Option<f64> {
    if offsets.len() < 2 {
        return None;
    }
    if offsets.windows(2).all(|w| w[1] > w[0]) {
        Some(1.0)
    } else if offsets.windows(2).all(|w| w[1] < w[0]) {
        Some(-1.0)
    } else {
        None
    }
}

/// Wrap an angle into `[-π, π)`.
fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// `+1` if rotating about the circle normal by each offset step best explains
/// the measured angles, `-1` if the opposite sense does.
///
/// Angles are measured about the centre from the first sample and compared
/// modulo a full turn, so offset steps larger than half a turn still resolve.
fn rotation_sign(circle: &Circle, points: &[Vector3<f64>], offsets: &[f64]) -> f64 {
    let normal = circle.normal.into_inner();
    let in_plane = |p: &Vector3<f64>| {
        let d = p - circle.center;
        d - normal * normal.dot(&d)
    };
    let first = in_plane(&points[0]);
    let score = |sign: f64| -> f64 {
        points
            .iter()
            .zip(offsets)
            .skip(1)
            .map(|(p, q)| {
                let d = in_plane(p);
                let measured = normal.dot(&first.cross(&d)).atan2(first.dot(&d));
                wrap_angle(measured - sign * (q - offsets[0])).abs()
            })
            .sum()
    };
    if score(-1.0) < score(1.0) { -1.0 } else { 1.0 }
}

/// Configuration for every sample: homes, with the moving joint at its offset.
fn sample_configurations(joints: &[JointMeasurements]) -> Vec<Vec<f64>> {
    let homes: Vec<f64> = joints.iter().map(|j| j.home_offset).collect();
    joints
        .iter()
        .enumerate()
        .flat_map(|(index, input)| {
            let homes = &homes;
            input.offsets.iter().map(move |&offset| {
                let mut q = homes.clone();
                q[index] = offset;
                q
            })
        })
        .collect()
}

/// Probe offset from the last joint frame that best explains every sample.
///
/// With an identity tool rotation the least-squares tip position is the mean
/// of the measurements expressed in the last joint frame.
fn estimate_tool(
    positioner: &Positioner,
    configurations: &[Vec<f64>],
    measured: &[Vector3<f64>],
) -> Result<Matrix4<f64>, CalibrationError> {
    let mut sum = Vector3::zeros();
    for (q, p) in configurations.iter().zip(measured) {
        let frame = positioner.evaluate(q)?;
        sum += transform_point(&rigid_inverse(&frame), p);
    }
    Ok(translation(&(sum / measured.len() as f64)))
}

fn fitted_axes(positioner: &Positioner, frames: &[Matrix4<f64>], base: &Matrix4<f64>) -> Vec<Vector3<f64>> {
    positioner
        .joints()
        .iter()
        .zip(frames)
        .map(|(joint, frame)| transform_vector(&(base * frame), joint.axis()))
        .collect()
}

fn fitted_origins(positioner: &Positioner, frames: &[Matrix4<f64>], base: &Matrix4<f64>) -> Vec<Vector3<f64>> {
    positioner
        .joints()
        .iter()
        .zip(frames)
        .map(|(joint, frame)| transform_point(&(base * frame), joint.origin()))
        .collect()
}
