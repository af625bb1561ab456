// Library interface for the readiness engine
// The binary and the integration tests both go through these modules

pub mod acwr;
pub mod classifiers;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod fatigue;
pub mod guidance;
pub mod logging;
pub mod models;
pub mod phase;
pub mod readiness;
pub mod sleep;
pub mod sport_readiness;
pub mod training_load;
pub mod trends;

// Re-export commonly used types for convenience
pub use models::*;
pub use acwr::{AcwrAssessment, AcwrConfig, AcwrEngine, AcwrZone};
pub use config::{AthleteSettings, EngineConfig};
pub use engine::{AthleteHistory, DailyReport, DayRequest, PreparedHistory, ReadinessEngine};
pub use error::{ConfigError, ReadinessError, Result, ValidationError};
pub use fatigue::{FatigueAssessment, FatigueConfig, FatigueEngine, FatigueLevels};
pub use guidance::{Guidance, ReadinessCategory};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use phase::{PhaseDetector, PhaseStatus, PlannedPhase, TrainingPhase};
pub use readiness::{AlgorithmVersion, Factor, ReadinessInput, ReadinessResult, ReadinessScorer};
pub use sport_readiness::{SportProfile, SportReadinessEvaluator, SportStatus, SportStatusReport};
