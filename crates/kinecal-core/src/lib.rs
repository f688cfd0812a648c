// kinecal-core: errors, configuration, transform math and validation shared by kinecal crates.

pub mod config;
pub mod error;
pub mod math;
pub mod validation;

pub mod prelude {
    pub use crate::config::{CalibrationConfig, KinecalConfig, ValidationConfig};
    pub use crate::error::{ConfigError, KinecalError, ValidationError};
    pub use crate::math::{
        from_rows, is_finite_matrix, rigid_inverse, rotation, rotation_matrix, to_rows,
        transform_point, transform_vector, translation, translation_of,
    };
    pub use crate::validation::{
        MeasurementVectors, check_measurement_vectors, ensure_finite, ensure_len,
        validate_vector_length,
    };
}
