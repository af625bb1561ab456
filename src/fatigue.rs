//! Per-body-system fatigue from recent training
//!
//! Every session in the lookback window contributes its intensity impact,
//! split across the upper / lower / cardio / CNS dimensions by the session's
//! body-region weights and scaled down by how many days ago it happened.
//!
//! # Recency decay
//!
//! The decay is a linear step table indexed by days ago, `1.0, 0.85, 0.70,
//! 0.55, 0.40` for days 0-4, and zero from day 5 on. Weights are validated to
//! be non-increasing, inside `[0, 1]` and at most [`MAX_LOOKBACK_DAYS`] long
//! when the configuration is loaded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::{ActivityRecord, DimensionWeights, FatigueDimension, IntensityZone};

/// Sessions this many days old or older never contribute fatigue
pub const MAX_LOOKBACK_DAYS: usize = 5;

/// Point value per intensity zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityImpact {
    pub easy: f64,
    pub moderate: f64,
    pub hard: f64,
    pub max: f64,
}

impl IntensityImpact {
    pub fn get(&self, zone: IntensityZone) -> f64 {
        match zone {
            IntensityZone::Easy => self.easy,
            IntensityZone::Moderate => self.moderate,
            IntensityZone::Hard => self.hard,
            IntensityZone::Max => self.max,
        }
    }
}

/// How the four dimensions collapse into one readiness penalty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FatigueAggregate {
    /// Most fatigued body system
    Max,
    /// Weighted sum of dimension points, clamped to the point range
    WeightedSum { weights: DimensionWeights },
}

/// Constants of the pre-dimension fatigue model used by the V1 scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyFatigueConfig {
    pub intensity_impact: IntensityImpact,

    /// Sessions 1..=window_days days old count; today's sessions do not
    pub window_days: u16,

    pub cap: f64,
}

impl Default for LegacyFatigueConfig {
    fn default() -> Self {
        LegacyFatigueConfig {
            intensity_impact: IntensityImpact {
                easy: 5.0,
                moderate: 15.0,
                hard: 30.0,
                max: 45.0,
            },
            window_days: 3,
            cap: 40.0,
        }
    }
}

/// Fatigue model tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueConfig {
    /// Weight applied to a session `index` days old; beyond the table the weight is zero
    pub recency_weights: Vec<f64>,

    pub intensity_impact: IntensityImpact,

    /// Per-dimension point ceiling, also the normalisation divisor
    pub max_points: f64,

    pub aggregate: FatigueAggregate,

    pub legacy: LegacyFatigueConfig,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        FatigueConfig {
            recency_weights: vec![1.0, 0.85, 0.70, 0.55, 0.40],
            intensity_impact: IntensityImpact {
                easy: 3.0,
                moderate: 10.0,
                hard: 20.0,
                max: 30.0,
            },
            max_points: 30.0,
            aggregate: FatigueAggregate::Max,
            legacy: LegacyFatigueConfig::default(),
        }
    }
}

impl FatigueConfig {
    /// Length of the lookback window in days
    pub fn lookback_days(&self) -> usize {
        self.recency_weights.len()
    }

    /// Recency weight for a session `days_ago` days old
    pub fn recency_weight(&self, days_ago: i64) -> f64 {
        if days_ago < 0 {
            return 0.0;
        }
        self.recency_weights
            .get(days_ago as usize)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recency_weights.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.recency_weights".to_string(),
                reason: "at least one day is required".to_string(),
            });
        }

        if self
            .recency_weights
            .iter()
            .any(|w| !w.is_finite() || !(0.0..=1.0).contains(w))
        {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.recency_weights".to_string(),
                reason: "weights must lie in [0, 1]".to_string(),
            });
        }

        if self.recency_weights.len() > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.recency_weights".to_string(),
                reason: format!("at most {} days; older sessions carry no fatigue", MAX_LOOKBACK_DAYS),
            });
        }

        if self.recency_weights.windows(2).any(|w| w[1] > w[0]) {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.recency_weights".to_string(),
                reason: "weights must be non-increasing with age".to_string(),
            });
        }

        if !self.max_points.is_finite() || self.max_points <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.max_points".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        for zone in IntensityZone::ALL {
            let impacts = [
                self.intensity_impact.get(zone),
                self.legacy.intensity_impact.get(zone),
            ];
            if impacts.iter().any(|i| !i.is_finite() || *i < 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: format!("fatigue.intensity_impact.{}", zone),
                    reason: "impacts must be non-negative".to_string(),
                });
            }
        }

        if !self.legacy.cap.is_finite() || self.legacy.cap < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "fatigue.legacy.cap".to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        if let FatigueAggregate::WeightedSum { weights } = &self.aggregate {
            for dimension in FatigueDimension::ALL {
                let w = weights.get(dimension);
                if !w.is_finite() || w < 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field: format!("fatigue.aggregate.weights.{}", dimension),
                        reason: "weights must be finite and non-negative".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// One value per body system
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FatigueLevels {
    pub upper: f64,
    pub lower: f64,
    pub cardio: f64,
    pub cns: f64,
}

impl FatigueLevels {
    pub fn get(&self, dimension: FatigueDimension) -> f64 {
        match dimension {
            FatigueDimension::Upper => self.upper,
            FatigueDimension::Lower => self.lower,
            FatigueDimension::Cardio => self.cardio,
            FatigueDimension::Cns => self.cns,
        }
    }

    fn get_mut(&mut self, dimension: FatigueDimension) -> &mut f64 {
        match dimension {
            FatigueDimension::Upper => &mut self.upper,
            FatigueDimension::Lower => &mut self.lower,
            FatigueDimension::Cardio => &mut self.cardio,
            FatigueDimension::Cns => &mut self.cns,
        }
    }

    pub fn max(&self) -> f64 {
        FatigueDimension::ALL
            .iter()
            .map(|d| self.get(*d))
            .fold(0.0, f64::max)
    }

    /// Dimension with the highest value; ties resolve in `FatigueDimension::ALL` order
    pub fn dominant(&self) -> FatigueDimension {
        let mut best = FatigueDimension::Upper;
        for dimension in FatigueDimension::ALL {
            if self.get(dimension) > self.get(best) {
                best = dimension;
            }
        }
        best
    }

    /// Training recommendation from fractional fatigue levels
    pub fn recommendation(&self) -> &'static str {
        let max_fatigue = self.max();
        if max_fatigue < 0.4 {
            "Full send - high intensity training OK"
        } else if max_fatigue < 0.6 {
            "Moderate intensity training OK"
        } else if max_fatigue < 0.75 {
            "Easy training recommended"
        } else {
            "Recovery day - rest or active recovery only"
        }
    }
}

/// Output of the fatigue engine for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueAssessment {
    /// Raw points per dimension, in `[0, max_points]`
    pub points: FatigueLevels,

    /// Points divided by `max_points`, in `[0, 1]`
    pub fractions: FatigueLevels,

    /// Aggregate readiness penalty, in `[0, max_points]`
    pub penalty: f64,

    /// Sessions that fell inside the lookback window
    pub contributing_sessions: usize,
}

/// Converts recent sessions into per-dimension fatigue
pub struct FatigueEngine<'a> {
    config: &'a FatigueConfig,
}

impl<'a> FatigueEngine<'a> {
    pub fn new(config: &'a FatigueConfig) -> Self {
        FatigueEngine { config }
    }

    /// Per-dimension fatigue as of `today`. An empty list yields all zeros.
    pub fn assess(&self, activities: &[ActivityRecord], today: NaiveDate) -> FatigueAssessment {
        let mut points = FatigueLevels::default();
        let mut contributing_sessions = 0;

        for activity in activities {
            let days_ago = (today - activity.date()).num_days();
            let recency = self.config.recency_weight(days_ago);
            if recency <= 0.0 {
                continue;
            }
            contributing_sessions += 1;

            let impact = self.config.intensity_impact.get(activity.intensity_zone);
            let weights = activity.weights();
            for dimension in FatigueDimension::ALL {
                *points.get_mut(dimension) += impact * weights.get(dimension) * recency;
            }
        }

        let max_points = self.config.max_points;
        let mut fractions = FatigueLevels::default();
        for dimension in FatigueDimension::ALL {
            let clamped = points.get(dimension).clamp(0.0, max_points);
            *points.get_mut(dimension) = clamped;
            *fractions.get_mut(dimension) = clamped / max_points;
        }

        let penalty = match &self.config.aggregate {
            FatigueAggregate::Max => points.max(),
            FatigueAggregate::WeightedSum { weights } => FatigueDimension::ALL
                .iter()
                .map(|d| points.get(*d) * weights.get(*d))
                .sum::<f64>()
                .clamp(0.0, max_points),
        };

        tracing::trace!(
            sessions = contributing_sessions,
            penalty,
            "fatigue assessed"
        );

        FatigueAssessment {
            points,
            fractions,
            penalty,
            contributing_sessions,
        }
    }

    /// Single-pool fatigue used by the V1 scorer.
    ///
    /// Only sessions 1..=window_days days old count, each decaying by its
    /// discipline's recovery rate raised to the days elapsed.
    pub fn legacy_penalty(&self, activities: &[ActivityRecord], today: NaiveDate) -> f64 {
        let legacy = &self.config.legacy;
        let total: f64 = activities
            .iter()
            .filter_map(|activity| {
                let days_ago = (today - activity.date()).num_days();
                if days_ago <= 0 || days_ago > legacy.window_days as i64 {
                    return None;
                }
                let base = legacy.intensity_impact.get(activity.intensity_zone);
                let decay = activity.discipline.recovery_rate().powi(days_ago as i32);
                Some(base * decay)
            })
            .sum();

        total.clamp(0.0, legacy.cap)
    }
}
