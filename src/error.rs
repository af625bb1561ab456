//! Error types for the readiness engine
//!
//! The scorers themselves never fail: missing data degrades the score
//! instead. Errors only arise at the edges, when static configuration is
//! malformed or when collaborator input is out of range.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// History import or result export
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Could not write config TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Static configuration problems, detected once at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing requirements for sport profile: {sport}")]
    MissingSportProfile { sport: String },

    #[error("Duplicate requirements for sport profile: {sport}")]
    DuplicateSportProfile { sport: String },

    /// Template intervals leave a gap, overlap, or never close
    #[error("Phase template for {event_type} is malformed: {reason}")]
    MalformedPhaseTemplate { event_type: String, reason: String },

    #[error("No phase template for default event type {event_type}")]
    MissingDefaultTemplate { event_type: String },

    /// A tunable is outside its meaningful range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },
}

impl ConfigError {
    /// First tunable in `values` that is NaN or infinite
    pub(crate) fn require_finite(values: &[(&str, f64)]) -> std::result::Result<(), ConfigError> {
        match values.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("must be a finite number, got {}", value),
            }),
            None => Ok(()),
        }
    }
}

/// Collaborator input rejected before it reaches the scorers
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} out of range: {value}")]
    OutOfRange { field: String, value: String },

    #[error("More than one health snapshot for {date}")]
    DuplicateSnapshot { date: String },

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, ReadinessError>;

/// How loudly an error should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Bad input for one request; other requests are unaffected
    Warning,
    /// The operation failed but the engine is usable
    Error,
    /// The engine cannot run until this is fixed
    Critical,
}

impl ReadinessError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReadinessError::Config(_)
            | ReadinessError::TomlParse(_)
            | ReadinessError::Internal(_) => ErrorSeverity::Critical,
            ReadinessError::Validation(_) => ErrorSeverity::Warning,
            ReadinessError::Io(_) | ReadinessError::Json(_) | ReadinessError::TomlWrite(_) => {
                ErrorSeverity::Error
            }
        }
    }

    /// Text for end users, without internal type names
    pub fn user_message(&self) -> String {
        match self {
            ReadinessError::Config(ConfigError::FileNotFound { path }) => {
                format!("Could not find configuration file: {}", path.display())
            }
            ReadinessError::Config(err) => {
                format!("The engine configuration is invalid and must be fixed: {}", err)
            }
            ReadinessError::Validation(ValidationError::OutOfRange { field, .. }) => format!(
                "Some synced data has an impossible value for {}. Please re-sync.",
                field
            ),
            ReadinessError::Json(err) => format!("The history file could not be read: {}", err),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        let err: ReadinessError = ConfigError::MissingSportProfile {
            sport: "swim".to_string(),
        }
        .into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err: ReadinessError = ValidationError::OutOfRange {
            field: "sleep_hours".to_string(),
            value: "-1".to_string(),
        }
        .into();
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Critical);
    }

    #[test]
    fn test_require_finite_names_first_bad_field() {
        assert!(ConfigError::require_finite(&[("a", 1.0), ("b", -2.5)]).is_ok());

        let err = ConfigError::require_finite(&[("a", 1.0), ("b", f64::NAN), ("c", f64::INFINITY)])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "b"));
    }

    #[test]
    fn test_user_message() {
        let err: ReadinessError = ConfigError::FileNotFound {
            path: PathBuf::from("config.toml"),
        }
        .into();
        assert!(err.user_message().contains("Could not find"));

        let err: ReadinessError = ValidationError::OutOfRange {
            field: "hrv".to_string(),
            value: "0".to_string(),
        }
        .into();
        assert!(err.user_message().contains("hrv"));
    }
}
