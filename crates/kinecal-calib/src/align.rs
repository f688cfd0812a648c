//! Closed-form rigid registration (Kabsch / SVD absolute orientation).

use nalgebra::{Matrix3, Matrix4, Vector3};

use kinecal_core::math::translation;

use crate::error::CalibrationError;

/// Outcome of [`rigid_alignment`].
#[derive(Debug, Clone)]
pub(crate) struct Alignment {
    /// Maps source points onto target points.
    pub transform: Matrix4<f64>,
    /// False when the source set was too close to collinear for a rotation
    /// to be observable and only a translation was estimated.
    pub rotation_estimated: bool,
}

/// Least-squares rigid transform `T` minimising `Σ |target_k − T·source_k|²`.
///
/// Reflections are corrected by flipping the singular vector with the
/// smallest singular value. When the middle singular value is at most
/// `tolerance` times the largest the rotation is unobservable and the
/// result is the centroid translation alone.
///
/// # Errors
///
/// `AlignmentFailed` if the cross-covariance is not finite or its SVD
/// yields no singular vectors.
pub(crate) fn rigid_alignment(
    source: &[Vector3<f64>],
    target: &[Vector3<f64>],
    tolerance: f64,
) -> Result<Alignment, CalibrationError> {
    let n = source.len().max(1) as f64;
    let source_centroid = source.iter().sum::<Vector3<f64>>() / n;
    let target_centroid = target.iter().sum::<Vector3<f64>>() / n;

    let mut h = Matrix3::zeros();
    for (s, t) in source.iter().zip(target) {
        h += (s - source_centroid) * (t - target_centroid).transpose();
    }

    let translation_only = || Alignment {
        transform: translation(&(target_centroid - source_centroid)),
        rotation_estimated: false,
    };

    if !h.iter().all(|v| v.is_finite()) {
        return Err(CalibrationError::AlignmentFailed);
    }
    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(CalibrationError::AlignmentFailed);
    };

    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| svd.singular_values[b].total_cmp(&svd.singular_values[a]));
    let (largest, middle, smallest) = (order[0], order[1], order[2]);
    if svd.singular_values[middle] <= tolerance * svd.singular_values[largest] {
        return Ok(translation_only());
    }

    let mut v = v_t.transpose();
    let mut r = v * u.transpose();

    // Handle reflection case
    if r.determinant() < 0.0 {
        v.column_mut(smallest).neg_mut();
        r = v * u.transpose();
    }

    let t = target_centroid - r * source_centroid;
    let mut transform = Matrix4::identity();
    transform.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    transform.fixed_view_mut::<3, 1>(0, 3).copy_from(&t);
    Ok(Alignment {
        transform,
        rotation_estimated: true,
    })
}
