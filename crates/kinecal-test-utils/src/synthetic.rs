//! Synthetic circle-point measurements generated from a known positioner.

use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};

use kinecal_calib::JointMeasurements;
use kinecal_chain::{ChainError, Positioner};
use kinecal_core::math::translation_of;

/// Probe positions recorded while moving each joint through `offsets[i]`
/// with every other joint at its home offset.
///
/// The probe is the origin of the positioner's tool frame.
pub fn synthetic_measurements(
    positioner: &Positioner,
    offsets: &[Vec<f64>],
) -> Result<Vec<JointMeasurements>, ChainError> {
    kinecal_core::validation::ensure_len(positioner.dof(), offsets.len())?;
    let homes = positioner.home_configuration();

    positioner
        .joints()
        .iter()
        .zip(offsets)
        .enumerate()
        .map(|(index, (joint, joint_offsets))| {
            let points = joint_offsets
                .iter()
                .map(|&offset| {
                    let mut q = homes.clone();
                    q[index] = offset;
                    positioner.evaluate(&q).map(|pose| translation_of(&pose))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(JointMeasurements::new(
                joint.kind(),
                points,
                joint_offsets.clone(),
                joint.home_offset(),
            ))
        })
        .collect()
}

/// Perturb every coordinate with zero-mean Gaussian noise.
///
/// Fails with `BadVariance` unless `sigma` is finite and non-negative.
pub fn add_noise(
    measurements: &mut [JointMeasurements],
    sigma: f64,
    rng: &mut impl Rng,
) -> Result<(), NormalError> {
    if sigma < 0.0 {
        return Err(NormalError::BadVariance);
    }
    let normal = Normal::new(0.0, sigma)?;
    for point in measurements.iter_mut().flat_map(|m| m.points.iter_mut()) {
        for value in point.iter_mut() {
            *value += normal.sample(rng);
        }
    }
    Ok(())
}
