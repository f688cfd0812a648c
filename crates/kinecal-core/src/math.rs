//! Homogeneous transform helpers.
//!
//! Poses are 4x4 homogeneous matrices in double precision. Persisted and
//! serialized matrices are row-major `[[f64; 4]; 4]`.

use nalgebra::{Matrix3, Matrix4, Unit, Vector3, Vector4};

/// Rotation matrix of `angle` radians about a unit `axis` (Rodrigues' formula).
pub fn rotation_matrix(axis: &Unit<Vector3<f64>>, angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    let t = 1.0 - c;
    let (x, y, z) = (axis.x, axis.y, axis.z);

    Matrix3::new(
        t * x * x + c,
        t * x * y - s * z,
        t * x * z + s * y,
        t * x * y + s * z,
        t * y * y + c,
        t * y * z - s * x,
        t * x * z - s * y,
        t * y * z + s * x,
        t * z * z + c,
    )
}

/// Homogeneous rotation of `angle` radians about `axis` through the origin.
pub fn rotation(axis: &Unit<Vector3<f64>>, angle: f64) -> Matrix4<f64> {
    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 3>(0, 0)
        .copy_from(&rotation_matrix(axis, angle));
    m
}

/// Homogeneous translation by `offset`.
pub fn translation(offset: &Vector3<f64>) -> Matrix4<f64> {
    Matrix4::new_translation(offset)
}

/// Inverse of a rigid transform: `[R | t]⁻¹ = [Rᵀ | -Rᵀ t]`.
pub fn rigid_inverse(m: &Matrix4<f64>) -> Matrix4<f64> {
    let r_t = m.fixed_view::<3, 3>(0, 0).transpose();
    let t = m.fixed_view::<3, 1>(0, 3).into_owned();
    let mut inv = Matrix4::identity();
    inv.fixed_view_mut::<3, 3>(0, 0).copy_from(&r_t);
    inv.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-(r_t * t)));
    inv
}

/// Apply a homogeneous transform to a point.
pub fn transform_point(m: &Matrix4<f64>, p: &Vector3<f64>) -> Vector3<f64> {
    let h = m * Vector4::new(p.x, p.y, p.z, 1.0);
    Vector3::new(h.x, h.y, h.z)
}

/// Apply only the rotation part of a homogeneous transform.
pub fn transform_vector(m: &Matrix4<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    m.fixed_view::<3, 3>(0, 0) * v
}

/// Translation component of a homogeneous transform.
pub fn translation_of(m: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Row-major array form of a matrix.
pub fn to_rows(m: &Matrix4<f64>) -> [[f64; 4]; 4] {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = m[(r, c)];
        }
    }
    rows
}

/// Matrix from its row-major array form.
pub fn from_rows(rows: &[[f64; 4]; 4]) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}

/// Whether every entry of the matrix is finite.
pub fn is_finite_matrix(m: &Matrix4<f64>) -> bool {
    m.iter().all(|v| v.is_finite())
}
