use thiserror::Error;

/// Top-level error type for kinecal-core.
#[derive(Debug, Error)]
pub enum KinecalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Shape and value validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Non-finite value at index {index}")]
    NonFiniteValue { index: usize },

    #[error("Column count {columns} is not a multiple of 3")]
    ColumnsNotMultipleOfThree { columns: usize },

    #[error("Vector length is not unit or zero at point {point}, alignment {alignment}")]
    InvalidVectorLength { point: usize, alignment: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinecal_error_from_config_error() {
        let err = ConfigError::InvalidValue {
            field: "residual_tolerance".into(),
            message: "must be > 0".into(),
        };
        let top: KinecalError = err.into();
        assert!(matches!(top, KinecalError::Config(_)));
        assert!(top.to_string().contains("residual_tolerance"));
    }

    #[test]
    fn kinecal_error_from_validation_error() {
        let err = ValidationError::NonFiniteValue { index: 4 };
        let top: KinecalError = err.into();
        assert!(matches!(top, KinecalError::Validation(_)));
        assert!(top.to_string().contains("index 4"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn validation_error_is_copy() {
        let err = ValidationError::DimensionMismatch {
            expected: 3,
            got: 2,
        };
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn validation_error_display_messages() {
        assert_eq!(
            ValidationError::DimensionMismatch {
                expected: 6,
                got: 3
            }
            .to_string(),
            "Dimension mismatch: expected 6, got 3"
        );
        assert_eq!(
            ValidationError::NonFiniteValue { index: 2 }.to_string(),
            "Non-finite value at index 2"
        );
        assert_eq!(
            ValidationError::ColumnsNotMultipleOfThree { columns: 4 }.to_string(),
            "Column count 4 is not a multiple of 3"
        );
        assert_eq!(
            ValidationError::InvalidVectorLength {
                point: 1,
                alignment: 0
            }
            .to_string(),
            "Vector length is not unit or zero at point 1, alignment 0"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidValue {
                field: "min_revolute_points".into(),
                message: "must be at least 3".into()
            }
            .to_string(),
            "Invalid value for min_revolute_points: must be at least 3"
        );
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn errors_are_send_sync() {
        assert_send_sync::<KinecalError>();
        assert_send_sync::<ValidationError>();
    }
}
