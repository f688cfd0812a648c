//! Shape and consistency checks shared by calibration input and persisted
//! measurement data.

use nalgebra::Vector3;

use crate::error::ValidationError;

/// Fail with `DimensionMismatch` unless `got == expected`.
pub fn ensure_len(expected: usize, got: usize) -> Result<(), ValidationError> {
    if expected == got {
        Ok(())
    } else {
        Err(ValidationError::DimensionMismatch { expected, got })
    }
}

/// Fail with `NonFiniteValue` at the first NaN or infinite entry.
pub fn ensure_finite(values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::NonFiniteValue { index }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// MeasurementVectors
// ---------------------------------------------------------------------------

/// A dense `(points, 3·k, alignments)` array of stacked 3-vectors.
///
/// Each point carries `k` measurement vectors (one per detector) for every
/// sample alignment. Storage is row-major in that axis order.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementVectors {
    points: usize,
    columns: usize,
    alignments: usize,
    data: Vec<f64>,
}

impl MeasurementVectors {
    /// Wrap `data` with the given shape.
    pub fn new(
        points: usize,
        columns: usize,
        alignments: usize,
        data: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        if columns % 3 != 0 {
            return Err(ValidationError::ColumnsNotMultipleOfThree { columns });
        }
        ensure_len(points * columns * alignments, data.len())?;
        ensure_finite(&data)?;
        Ok(Self {
            points,
            columns,
            alignments,
            data,
        })
    }

    /// All-zero array (every vector absent).
    pub fn zeros(points: usize, vectors_per_point: usize, alignments: usize) -> Self {
        let columns = vectors_per_point * 3;
        Self {
            points,
            columns,
            alignments,
            data: vec![0.0; points * columns * alignments],
        }
    }

    /// Build a single-alignment array from equal-width rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ValidationError> {
        let columns = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * columns);
        for row in rows {
            ensure_len(columns, row.len())?;
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), columns, 1, data)
    }

    /// `(points, columns, alignments)`.
    pub const fn shape(&self) -> (usize, usize, usize) {
        (self.points, self.columns, self.alignments)
    }

    /// Number of stacked 3-vectors per point.
    pub const fn vectors_per_point(&self) -> usize {
        self.columns / 3
    }

    fn index(&self, point: usize, column: usize, alignment: usize) -> usize {
        assert!(
            point < self.points && column < self.columns && alignment < self.alignments,
            "index ({point}, {column}, {alignment}) out of bounds for shape {:?}",
            self.shape()
        );
        (point * self.columns + column) * self.alignments + alignment
    }

    /// Value at `(point, column, alignment)`.
    ///
    /// # Panics
    ///
    /// If any index is outside [`MeasurementVectors::shape`].
    pub fn get(&self, point: usize, column: usize, alignment: usize) -> f64 {
        self.data[self.index(point, column, alignment)]
    }

    /// # Panics
    ///
    /// If any index is outside [`MeasurementVectors::shape`].
    pub fn set(&mut self, point: usize, column: usize, alignment: usize, value: f64) {
        let i = self.index(point, column, alignment);
        self.data[i] = value;
    }

    /// The `k`-th stacked vector at a point/alignment.
    ///
    /// # Panics
    ///
    /// If `k >= vectors_per_point()` or the point/alignment is out of range.
    pub fn vector(&self, point: usize, k: usize, alignment: usize) -> Vector3<f64> {
        let c = k * 3;
        Vector3::new(
            self.get(point, c, alignment),
            self.get(point, c + 1, alignment),
            self.get(point, c + 2, alignment),
        )
    }

    /// Store the `k`-th stacked vector at a point/alignment.
    ///
    /// # Panics
    ///
    /// Under the same conditions as [`MeasurementVectors::vector`].
    pub fn set_vector(&mut self, point: usize, k: usize, alignment: usize, v: &Vector3<f64>) {
        let c = k * 3;
        self.set(point, c, alignment, v.x);
        self.set(point, c + 1, alignment, v.y);
        self.set(point, c + 2, alignment, v.z);
    }

    /// Position of the first vector that is neither unit length nor zero.
    fn first_invalid(&self, tolerance: f64) -> Option<(usize, usize)> {
        for point in 0..self.points {
            for alignment in 0..self.alignments {
                for k in 0..self.vectors_per_point() {
                    let norm = self.vector(point, k, alignment).norm();
                    let is_zero = norm <= tolerance;
                    let is_unit = (norm - 1.0).abs() <= tolerance;
                    if !(is_zero || is_unit) {
                        return Some((point, alignment));
                    }
                }
            }
        }
        None
    }
}

/// Whether every stacked vector is a unit vector or zero.
///
/// A zero vector marks a detector without a measurement at that
/// point/alignment, so all present sibling vectors share the same (unit) norm.
pub fn validate_vector_length(vectors: &MeasurementVectors, tolerance: f64) -> bool {
    vectors.first_invalid(tolerance).is_none()
}

/// Guard persisted measurement vectors before they enter the data model.
///
/// The array must hold one row per measurement point, one 3-vector per
/// detector, and pass [`validate_vector_length`].
pub fn check_measurement_vectors(
    vectors: &MeasurementVectors,
    point_count: usize,
    detector_count: usize,
    tolerance: f64,
) -> Result<(), ValidationError> {
    let (points, columns, _) = vectors.shape();
    ensure_len(point_count, points)?;
    ensure_len(detector_count * 3, columns)?;
    match vectors.first_invalid(tolerance) {
        Some((point, alignment)) => {
            Err(ValidationError::InvalidVectorLength { point, alignment })
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-5;

    const ALIGNMENT_0: [[f64; 3]; 3] = [
        [0.000_007_6, 1.000_000_0, 0.000_048_0],
        [0.040_189_9, 0.965_927_0, 0.255_675_2],
        [0.150_634_6, 0.258_993_2, 0.954_060_7],
    ];
    const ALIGNMENT_1: [[f64; 3]; 3] = [
        [0.155_321_5, -0.000_048_6, 0.987_864_0],
        [0.149_993_6, -0.258_814_7, 0.954_210_0],
        [0.040_391_5, -0.965_879_1, 0.255_824_1],
    ];

    fn filled(points: usize, k: usize, alignments: usize, value: f64) -> MeasurementVectors {
        let columns = k * 3;
        MeasurementVectors::new(
            points,
            columns,
            alignments,
            vec![value; points * columns * alignments],
        )
        .unwrap()
    }

    #[test]
    fn ensure_len_reports_expected_and_got() {
        assert!(ensure_len(3, 3).is_ok());
        assert_eq!(
            ensure_len(3, 4),
            Err(ValidationError::DimensionMismatch {
                expected: 3,
                got: 4
            })
        );
    }

    #[test]
    fn ensure_finite_reports_first_bad_index() {
        assert!(ensure_finite(&[1.0, 2.0]).is_ok());
        assert_eq!(
            ensure_finite(&[1.0, f64::NAN, f64::INFINITY]),
            Err(ValidationError::NonFiniteValue { index: 1 })
        );
        assert_eq!(
            ensure_finite(&[f64::NEG_INFINITY]),
            Err(ValidationError::NonFiniteValue { index: 0 })
        );
    }

    #[test]
    fn new_rejects_bad_shapes() {
        assert_eq!(
            MeasurementVectors::new(1, 4, 1, vec![0.0; 4]),
            Err(ValidationError::ColumnsNotMultipleOfThree { columns: 4 })
        );
        assert_eq!(
            MeasurementVectors::new(2, 3, 1, vec![0.0; 3]),
            Err(ValidationError::DimensionMismatch {
                expected: 6,
                got: 3
            })
        );
        assert_eq!(
            MeasurementVectors::new(1, 3, 1, vec![0.0, f64::NAN, 0.0]),
            Err(ValidationError::NonFiniteValue { index: 1 })
        );
    }

    #[test]
    fn from_rows_requires_equal_widths() {
        let rows = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0]];
        assert!(MeasurementVectors::from_rows(&rows).is_err());

        let rows = vec![vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]];
        let vectors = MeasurementVectors::from_rows(&rows).unwrap();
        assert_eq!(vectors.shape(), (1, 6, 1));
        assert_eq!(vectors.vectors_per_point(), 2);
        assert_eq!(vectors.vector(0, 1, 0), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn all_ones_are_not_unit_vectors() {
        let vectors = filled(3, 1, 2, 1.0);
        assert!(!validate_vector_length(&vectors, TOL));
    }

    #[test]
    fn all_zeros_are_valid() {
        let vectors = MeasurementVectors::zeros(3, 1, 2);
        assert!(validate_vector_length(&vectors, TOL));
    }

    #[test]
    fn unit_vectors_across_alignments_are_valid() {
        let mut vectors = MeasurementVectors::zeros(3, 1, 2);
        for point in 0..3 {
            vectors.set_vector(point, 0, 0, &Vector3::from(ALIGNMENT_0[point]));
            vectors.set_vector(point, 0, 1, &Vector3::from(ALIGNMENT_1[point]));
        }
        assert!(validate_vector_length(&vectors, TOL));
    }

    #[test]
    fn zero_sibling_is_valid_until_component_perturbed() {
        let mut vectors = MeasurementVectors::zeros(3, 2, 1);
        let first = [ALIGNMENT_0[0], [0.0; 3], ALIGNMENT_0[2]];
        for point in 0..3 {
            vectors.set_vector(point, 0, 0, &Vector3::from(first[point]));
            vectors.set_vector(point, 1, 0, &Vector3::from(ALIGNMENT_1[point]));
        }
        assert!(validate_vector_length(&vectors, TOL));

        vectors.set(0, 0, 0, 10.0);
        assert!(!validate_vector_length(&vectors, TOL));
    }

    #[test]
    fn check_measurement_vectors_guards_shape_and_norms() {
        let mut vectors = MeasurementVectors::zeros(3, 1, 2);
        for point in 0..3 {
            vectors.set_vector(point, 0, 0, &Vector3::from(ALIGNMENT_0[point]));
        }
        assert!(check_measurement_vectors(&vectors, 3, 1, TOL).is_ok());

        // more vectors than detectors
        let err = check_measurement_vectors(&filled(3, 2, 2, 0.0), 3, 1, TOL).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DimensionMismatch {
                expected: 3,
                got: 6
            }
        );

        // more vectors than points
        let err = check_measurement_vectors(&filled(4, 1, 2, 0.0), 3, 1, TOL).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DimensionMismatch {
                expected: 3,
                got: 4
            }
        );

        // invalid normals
        let err = check_measurement_vectors(&filled(3, 1, 2, 1.0), 3, 1, TOL).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidVectorLength {
                point: 0,
                alignment: 0
            }
        );
    }

    #[test]
    #[should_panic(expected = "out of bounds for shape (2, 6, 1)")]
    fn vector_past_the_last_detector_panics() {
        let vectors = MeasurementVectors::zeros(2, 2, 1);
        let _ = vectors.vector(0, 2, 0);
    }
}
