//! Mapping a calibration result into a positioner description.

use std::collections::HashSet;

use kinecal_calib::CalibrationResult;
use kinecal_chain::JointKind;
use kinecal_core::math::to_rows;
use kinecal_core::validation::ensure_len;

use crate::error::DescriptionError;
use crate::schema::{JointDescription, LinkDescription, PositionerDescription};

/// Operator-supplied metadata for a calibrated positioner.
///
/// Every per-joint field is in kinematic order (base to tip), the same order
/// the calibration consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSetup {
    pub name: String,
    /// Display order of the joints, a permutation of `0..n`.
    pub order: Vec<usize>,
    pub names: Vec<String>,
    pub kinds: Vec<JointKind>,
    pub homes: Vec<f64>,
    /// Offsets each joint was measured at; their range becomes the limits.
    pub offsets: Vec<Vec<f64>>,
}

impl CalibrationSetup {
    /// Setup with kinematic display order and default joint names
    /// (`Joint 1`, `Joint 2`, …).
    pub fn new(
        name: impl Into<String>,
        kinds: Vec<JointKind>,
        homes: Vec<f64>,
        offsets: Vec<Vec<f64>>,
    ) -> Self {
        let n = kinds.len();
        Self {
            name: name.into(),
            order: (0..n).collect(),
            names: (1..=n).map(|i| format!("Joint {i}")).collect(),
            kinds,
            homes,
            offsets,
        }
    }

    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: Vec<usize>) -> Self {
        self.order = order;
        self
    }

    /// Check everything the generator requires of the setup.
    pub fn validate(&self, joint_count: usize) -> Result<(), DescriptionError> {
        if self.name.trim().is_empty() {
            return Err(DescriptionError::EmptyName("positioner".into()));
        }
        ensure_len(joint_count, self.names.len())?;
        ensure_len(joint_count, self.kinds.len())?;
        ensure_len(joint_count, self.homes.len())?;
        ensure_len(joint_count, self.offsets.len())?;
        check_permutation(&self.order, joint_count)?;
        check_joint_names(self.names.iter().map(String::as_str))
    }
}

/// Fail with `InvalidOrder` unless `order` uses every index in `0..len`
/// exactly once.
pub(crate) fn check_permutation(order: &[usize], len: usize) -> Result<(), DescriptionError> {
    let mut seen = vec![false; len];
    let valid = order.len() == len
        && order
            .iter()
            .all(|&i| i < len && !std::mem::replace(&mut seen[i], true));
    if valid {
        Ok(())
    } else {
        Err(DescriptionError::InvalidOrder {
            order: order.to_vec(),
            len,
        })
    }
}

/// Joint names must be non-blank and pairwise unique.
pub(crate) fn check_joint_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), DescriptionError> {
    let mut seen = HashSet::new();
    for (index, name) in names.into_iter().enumerate() {
        if name.trim().is_empty() {
            return Err(DescriptionError::EmptyName(format!("joint {}", index + 1)));
        }
        if !seen.insert(name) {
            return Err(DescriptionError::DuplicateName(name.into()));
        }
    }
    Ok(())
}

fn limits(offsets: &[f64]) -> (Option<f64>, Option<f64>) {
    let lower = offsets.iter().copied().reduce(f64::min);
    let upper = offsets.iter().copied().reduce(f64::max);
    (lower, upper)
}

/// Build the description of a calibrated positioner.
///
/// Joint geometry, base and tool come from `result`; names, types, homes
/// and display order from `setup`. Limits are the range of offsets each
/// joint was measured over.
pub fn generate_description(
    setup: &CalibrationSetup,
    result: &CalibrationResult,
) -> Result<PositionerDescription, DescriptionError> {
    let model = result.positioner();
    setup.validate(model.dof())?;

    for (joint, (given, calibrated)) in setup.kinds.iter().zip(model.joints()).enumerate() {
        if *given != calibrated.kind() {
            return Err(DescriptionError::KindMismatch {
                joint,
                given: *given,
                calibrated: calibrated.kind(),
            });
        }
    }

    let links: Vec<LinkDescription> = std::iter::once(LinkDescription::new("base"))
        .chain(setup.names.iter().map(|name| LinkDescription::new(format!("{name} link"))))
        .collect();

    let joints = model
        .joints()
        .iter()
        .enumerate()
        .map(|(i, joint)| {
            let (lower_limit, upper_limit) = limits(&setup.offsets[i]);
            JointDescription {
                name: setup.names[i].clone(),
                kind: setup.kinds[i],
                parent: links[i].name.clone(),
                child: links[i + 1].name.clone(),
                axis: joint.axis().into_inner().into(),
                origin: (*joint.origin()).into(),
                lower_limit,
                upper_limit,
                home_offset: setup.homes[i],
            }
        })
        .collect();

    let identity: Vec<usize> = (0..model.dof()).collect();
    let custom_order = (setup.order != identity)
        .then(|| setup.order.iter().map(|&i| setup.names[i].clone()).collect());

    tracing::info!(positioner = %setup.name, joints = model.dof(), "generated description");
    Ok(PositionerDescription {
        name: setup.name.trim().to_owned(),
        base: to_rows(result.base()),
        tool: to_rows(result.tool()),
        custom_order,
        joints,
        links,
    })
}
