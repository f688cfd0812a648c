use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_degeneracy_tolerance() -> f64 {
    1e-6
}
const fn default_coincidence_tolerance() -> f64 {
    1e-9
}
const fn default_alignment_tolerance() -> f64 {
    1e-9
}
const fn default_min_revolute_points() -> usize {
    3
}
const fn default_min_prismatic_points() -> usize {
    2
}
const fn default_residual_tolerance() -> f64 {
    0.1
}
const fn default_vector_length_tolerance() -> f64 {
    1e-5
}

/// Fewest samples from which a circle is defined.
pub const REVOLUTE_POINT_FLOOR: usize = 3;
/// Fewest samples from which a line is defined.
pub const PRISMATIC_POINT_FLOOR: usize = 2;

// ---------------------------------------------------------------------------
// KinecalConfig
// ---------------------------------------------------------------------------

/// Top-level configuration, usually loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KinecalConfig {
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl KinecalConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calibration.validate()?;
        self.validation.validate()
    }

    /// Parse and validate a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// CalibrationConfig
// ---------------------------------------------------------------------------

/// Numerical settings for circle-point analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Ratio of secondary to primary point spread below which a sample set
    /// is rank deficient (collinear for a revolute joint).
    #[serde(default = "default_degeneracy_tolerance")]
    pub degeneracy_tolerance: f64,

    /// RMS spread (length units) below which samples are coincident.
    #[serde(default = "default_coincidence_tolerance")]
    pub coincidence_tolerance: f64,

    /// Ratio of singular values below which the base rotation is unobservable
    /// and only a translation is estimated.
    #[serde(default = "default_alignment_tolerance")]
    pub alignment_tolerance: f64,

    #[serde(default = "default_min_revolute_points")]
    pub min_revolute_points: usize,

    #[serde(default = "default_min_prismatic_points")]
    pub min_prismatic_points: usize,

    /// Residual norm (mm) above which a sample is flagged in summaries.
    #[serde(default = "default_residual_tolerance")]
    pub residual_tolerance: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            degeneracy_tolerance: default_degeneracy_tolerance(),
            coincidence_tolerance: default_coincidence_tolerance(),
            alignment_tolerance: default_alignment_tolerance(),
            min_revolute_points: default_min_revolute_points(),
            min_prismatic_points: default_min_prismatic_points(),
            residual_tolerance: default_residual_tolerance(),
        }
    }
}

impl CalibrationConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("degeneracy_tolerance", self.degeneracy_tolerance)?;
        positive("coincidence_tolerance", self.coincidence_tolerance)?;
        positive("alignment_tolerance", self.alignment_tolerance)?;
        positive("residual_tolerance", self.residual_tolerance)?;
        if self.min_revolute_points < REVOLUTE_POINT_FLOOR {
            return Err(ConfigError::InvalidValue {
                field: "min_revolute_points".into(),
                message: format!("must be at least {REVOLUTE_POINT_FLOOR}"),
            });
        }
        if self.min_prismatic_points < PRISMATIC_POINT_FLOOR {
            return Err(ConfigError::InvalidValue {
                field: "min_prismatic_points".into(),
                message: format!("must be at least {PRISMATIC_POINT_FLOOR}"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

/// Tolerances used when accepting persisted measurement data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_vector_length_tolerance")]
    pub vector_length_tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            vector_length_tolerance: default_vector_length_tolerance(),
        }
    }
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("vector_length_tolerance", self.vector_length_tolerance)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.into(),
            message: format!("must be finite and > 0, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calibration_config_default_values() {
        let cfg = CalibrationConfig::default();
        assert!((cfg.degeneracy_tolerance - 1e-6).abs() < f64::EPSILON);
        assert!((cfg.residual_tolerance - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.min_revolute_points, 3);
        assert_eq!(cfg.min_prismatic_points, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn calibration_config_rejects_zero_tolerance() {
        let cfg = CalibrationConfig {
            degeneracy_tolerance: 0.0,
            ..CalibrationConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("degeneracy_tolerance"));
    }

    #[test]
    fn calibration_config_rejects_nan_tolerance() {
        let cfg = CalibrationConfig {
            residual_tolerance: f64::NAN,
            ..CalibrationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn calibration_config_rejects_too_few_points() {
        let cfg = CalibrationConfig {
            min_revolute_points: 2,
            ..CalibrationConfig::default()
        };
        assert_eq!(
            cfg.validate().unwrap_err().to_string(),
            "Invalid value for min_revolute_points: must be at least 3"
        );

        let cfg = CalibrationConfig {
            min_prismatic_points: 1,
            ..CalibrationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_toml_deserialization() {
        let toml_str = r"
            [calibration]
            degeneracy_tolerance = 1e-4
            min_revolute_points = 5
            residual_tolerance = 0.05

            [validation]
            vector_length_tolerance = 1e-3
        ";
        let cfg = KinecalConfig::from_toml_str(toml_str).unwrap();
        assert!((cfg.calibration.degeneracy_tolerance - 1e-4).abs() < f64::EPSILON);
        assert_eq!(cfg.calibration.min_revolute_points, 5);
        assert_eq!(cfg.calibration.min_prismatic_points, 2);
        assert!((cfg.calibration.residual_tolerance - 0.05).abs() < f64::EPSILON);
        assert!((cfg.validation.vector_length_tolerance - 1e-3).abs() < f64::EPSILON);
    }

    #[test]
    fn config_toml_defaults() {
        let cfg = KinecalConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, KinecalConfig::default());
    }

    #[test]
    fn config_toml_invalid_value_rejected() {
        let toml_str = r"
            [validation]
            vector_length_tolerance = -1.0
        ";
        assert!(KinecalConfig::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn config_from_file() {
        let dir = std::env::temp_dir().join("kinecal_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kinecal.toml");
        std::fs::write(
            &path,
            r"
            [calibration]
            alignment_tolerance = 1e-6
        ",
        )
        .unwrap();

        let cfg = KinecalConfig::from_file(&path).unwrap();
        assert!((cfg.calibration.alignment_tolerance - 1e-6).abs() < f64::EPSILON);

        // Cleanup
        let _ = std::fs::remove_file(&path);
        let _ = std::fs::remove_dir(&dir);
    }

    #[test]
    fn config_from_file_not_found() {
        let result = KinecalConfig::from_file("/nonexistent/path/kinecal.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
