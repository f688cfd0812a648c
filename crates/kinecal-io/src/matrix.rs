//! Numeric array files: a 4×4 transform and measurement vectors.

use std::path::Path;

use nalgebra::Matrix4;

use kinecal_core::validation::MeasurementVectors;

use crate::error::ReadError;
use crate::text::{non_empty_rows, read_to_string};

// ---------------------------------------------------------------------------
// Transform matrix
// ---------------------------------------------------------------------------

/// Read a 4×4 homogeneous transform, one row per line.
pub fn read_trans_matrix(path: impl AsRef<Path>) -> Result<Matrix4<f64>, ReadError> {
    let path = path.as_ref();
    let matrix = parse_trans_matrix(&read_to_string(path)?)?;
    tracing::info!(path = %path.display(), "read transform matrix");
    Ok(matrix)
}

/// Parse exactly four rows of four finite numbers.
pub fn parse_trans_matrix(content: &str) -> Result<Matrix4<f64>, ReadError> {
    let rows = non_empty_rows(content)?;
    let mut values = Vec::with_capacity(16);
    for row in &rows {
        row.expect_fields(4)?;
        values.extend(row.numbers()?);
    }
    if rows.len() != 4 {
        return Err(ReadError::RowCount {
            expected: 4,
            got: rows.len(),
        });
    }
    Ok(Matrix4::from_row_slice(&values))
}

// ---------------------------------------------------------------------------
// Measurement vectors
// ---------------------------------------------------------------------------

/// Read measurement vectors: one row per measurement point, three columns
/// per detector.
pub fn read_vectors(path: impl AsRef<Path>) -> Result<MeasurementVectors, ReadError> {
    let path = path.as_ref();
    let vectors = parse_vectors(&read_to_string(path)?)?;
    let (points, columns, _) = vectors.shape();
    tracing::info!(path = %path.display(), points, columns, "read measurement vectors");
    Ok(vectors)
}

/// Parse equal-width rows into a single-alignment vector array.
pub fn parse_vectors(content: &str) -> Result<MeasurementVectors, ReadError> {
    let rows = non_empty_rows(content)?;
    let width = rows[0].fields.len();
    let values = rows
        .iter()
        .map(|row| {
            row.expect_fields(width)?;
            row.numbers()
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MeasurementVectors::from_rows(&values)?)
}
