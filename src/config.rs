use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::acwr::AcwrConfig;
use crate::error::{ConfigError, ReadinessError, Result};
use crate::events::EventProximityConfig;
use crate::fatigue::FatigueConfig;
use crate::logging::LogConfig;
use crate::phase::PhaseConfig;
use crate::readiness::{AlgorithmVersion, ScoringConfig};
use crate::sleep::SleepTrendConfig;
use crate::sport_readiness::{default_requirements, validate_requirements, SportRequirements};

/// Engine configuration: every tunable and static table in one place.
///
/// Loaded once at startup and validated before an engine is built. A running
/// engine shares it read-only; changing a value means building a new engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub metadata: ConfigMetadata,

    /// Algorithm used when a caller does not pick one
    pub default_version: AlgorithmVersion,

    pub athlete: AthleteSettings,
    pub scoring: ScoringConfig,
    pub fatigue: FatigueConfig,
    pub acwr: AcwrConfig,
    pub sleep_trend: SleepTrendConfig,
    pub event_proximity: EventProximityConfig,
    pub sports: Vec<SportRequirements>,
    pub phases: PhaseConfig,
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-athlete physiology used when deriving loads and sleep targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteSettings {
    pub max_hr: u16,
    pub resting_hr: u16,
    pub sleep_target_hours: f64,

    /// Used when no 7-day HRV baseline can be derived from history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv_baseline: Option<f64>,
}

impl Default for AthleteSettings {
    fn default() -> Self {
        AthleteSettings {
            max_hr: 185,
            resting_hr: 50,
            sleep_target_hours: 7.5,
            hrv_baseline: None,
        }
    }
}

impl AthleteSettings {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_hr <= self.resting_hr {
            return Err(ConfigError::InvalidValue {
                field: "athlete.max_hr".to_string(),
                reason: format!("must exceed resting_hr ({})", self.resting_hr),
            });
        }
        if !(self.sleep_target_hours > 0.0 && self.sleep_target_hours <= 24.0) {
            return Err(ConfigError::InvalidValue {
                field: "athlete.sleep_target_hours".to_string(),
                reason: "must be within (0, 24]".to_string(),
            });
        }
        if let Some(baseline) = self.hrv_baseline {
            if !baseline.is_finite() || baseline <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "athlete.hrv_baseline".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            metadata: ConfigMetadata::default(),
            default_version: AlgorithmVersion::V2,
            athlete: AthleteSettings::default(),
            scoring: ScoringConfig::default(),
            fatigue: FatigueConfig::default(),
            acwr: AcwrConfig::default(),
            sleep_trend: SleepTrendConfig::default(),
            event_proximity: EventProximityConfig::default(),
            sports: default_requirements(),
            phases: PhaseConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check every table; the first problem found is returned
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.athlete.validate()?;
        self.scoring.validate()?;
        self.fatigue.validate()?;
        self.acwr.validate()?;
        self.sleep_trend.validate()?;
        self.event_proximity.validate()?;
        validate_requirements(&self.sports)?;
        self.phases.validate()?;
        Ok(())
    }

    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self)?;
        fs::write(&path, toml_content)?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readiness")
            .join("config.toml")
    }

    /// Load `path`, falling back to built-in defaults.
    ///
    /// The load error is handed back instead of logged, since the logging
    /// settings themselves come from this file.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, Option<ReadinessError>) {
        match Self::load_from_file(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }
}
