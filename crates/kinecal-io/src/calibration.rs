//! Kinematic calibration measurements.
//!
//! One row per probe sample: `joint, x, y, z, offset, type, home`. `joint`
//! identifies the joint that was moved, `x y z` is the measured probe
//! position, `offset` the joint value at that sample, `type` either
//! `prismatic` or `revolute`, and `home` the joint's home offset. Rows may
//! come in any order; joints are returned in ascending index order.

use std::collections::BTreeMap;
use std::path::Path;

use nalgebra::Vector3;

use kinecal_calib::JointMeasurements;
use kinecal_chain::JointKind;

use crate::error::ReadError;
use crate::text::{Row, non_empty_rows, read_to_string};

/// Fields per calibration row.
pub const CALIBRATION_FIELDS: usize = 7;

/// Fewest rows accepted for a single joint.
pub const MIN_ROWS_PER_JOINT: usize = 3;

/// Calibration samples grouped per joint, in kinematic order.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationData {
    /// Joint indices as written in the file.
    pub indices: Vec<usize>,
    pub points: Vec<Vec<Vector3<f64>>>,
    pub kinds: Vec<JointKind>,
    pub offsets: Vec<Vec<f64>>,
    pub homes: Vec<f64>,
}

impl CalibrationData {
    pub fn joint_count(&self) -> usize {
        self.kinds.len()
    }

    /// Engine input, one entry per joint.
    pub fn measurements(&self) -> Vec<JointMeasurements> {
        self.points
            .iter()
            .zip(&self.offsets)
            .zip(self.kinds.iter().zip(&self.homes))
            .map(|((points, offsets), (&kind, &home))| {
                JointMeasurements::new(kind, points.clone(), offsets.clone(), home)
            })
            .collect()
    }
}

/// Samples for one joint while the file is being read.
struct JointRows {
    kind: JointKind,
    home: f64,
    points: Vec<Vector3<f64>>,
    offsets: Vec<f64>,
}

fn parse_kind(row: &Row<'_>) -> Result<JointKind, ReadError> {
    let token = row.fields[5];
    token.parse().map_err(|_| ReadError::UnknownJointType {
        line: row.line,
        token: token.into(),
    })
}

fn parse_index(row: &Row<'_>) -> Result<usize, ReadError> {
    let token = row.fields[0];
    token.parse().map_err(|_| ReadError::InvalidNumber {
        line: row.line,
        token: token.into(),
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Read a calibration measurement file.
pub fn read_calibration_file(path: impl AsRef<Path>) -> Result<CalibrationData, ReadError> {
    let path = path.as_ref();
    let data = parse_calibration(&read_to_string(path)?)?;
    tracing::info!(
        path = %path.display(),
        joints = data.joint_count(),
        "read calibration measurements"
    );
    Ok(data)
}

/// Parse calibration measurements from text.
#[allow(clippy::float_cmp)]
pub fn parse_calibration(content: &str) -> Result<CalibrationData, ReadError> {
    let mut joints: BTreeMap<usize, JointRows> = BTreeMap::new();

    for row in non_empty_rows(content)? {
        row.expect_fields(CALIBRATION_FIELDS)?;
        let index = parse_index(&row)?;
        let point = Vector3::new(row.number(1)?, row.number(2)?, row.number(3)?);
        let offset = row.number(4)?;
        let kind = parse_kind(&row)?;
        let home = row.number(6)?;

        let entry = joints.entry(index).or_insert_with(|| JointRows {
            kind,
            home,
            points: Vec::new(),
            offsets: Vec::new(),
        });
        if entry.kind != kind {
            return Err(ReadError::InconsistentJoint {
                joint: index,
                field: "type",
            });
        }
        if entry.home != home {
            return Err(ReadError::InconsistentJoint {
                joint: index,
                field: "home offset",
            });
        }
        entry.points.push(point);
        entry.offsets.push(offset);
    }

    let mut data = CalibrationData {
        indices: Vec::with_capacity(joints.len()),
        points: Vec::with_capacity(joints.len()),
        kinds: Vec::with_capacity(joints.len()),
        offsets: Vec::with_capacity(joints.len()),
        homes: Vec::with_capacity(joints.len()),
    };
    for (index, joint) in joints {
        if joint.points.len() < MIN_ROWS_PER_JOINT {
            return Err(ReadError::TooFewPoints {
                joint: index,
                required: MIN_ROWS_PER_JOINT,
                got: joint.points.len(),
            });
        }
        let min = joint.offsets.iter().copied().fold(f64::INFINITY, f64::min);
        let max = joint.offsets.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if joint.home < min || joint.home > max {
            return Err(ReadError::HomeOutOfRange {
                joint: index,
                home: joint.home,
                min,
                max,
            });
        }
        data.indices.push(index);
        data.points.push(joint.points);
        data.kinds.push(joint.kind);
        data.offsets.push(joint.offsets);
        data.homes.push(joint.home);
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
