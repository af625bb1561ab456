//! Composite daily readiness score
//!
//! # Composition
//!
//! The V2 score starts from a base of 70 and adds signed components:
//!
//! | component       | range  | needs                         |
//! |-----------------|--------|-------------------------------|
//! | HRV             | ±15    | today's HRV and a baseline    |
//! | Sleep           | ±20    | last night's hours            |
//! | Sleep trend     | ±10    | three nights of sleep         |
//! | Body battery    | ±10    | morning reading               |
//! | Fatigue         | -30..0 | sessions in the last 5 days   |
//! | ACWR            | -25..0 | daily load series             |
//! | Trend           | -5..+3 | average of prior scores       |
//! | Event proximity | -5..10 | an upcoming A/B event         |
//!
//! A component with missing inputs is skipped entirely: it neither moves the
//! total nor shows up in the factor list. The total is clamped to `[0, 100]`
//! and then rounded half-up.
//!
//! The V1 score is the older model: no sleep trend, ACWR or event terms, a
//! single-pool fatigue penalty and stricter category thresholds.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::acwr::{AcwrAssessment, AcwrEngine};
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::events::EventProximityEngine;
use crate::fatigue::{FatigueAssessment, FatigueEngine};
use crate::guidance::{CategoryThresholds, Guidance, ReadinessCategory};
use crate::models::{ActivityRecord, EventPriority, HealthSnapshot};
use crate::sleep::SleepTrendEngine;
use crate::sport_readiness::{SportProfile, SportReadinessEvaluator, SportStatusReport};

/// Scoring algorithm, chosen per call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmVersion {
    V1,
    #[default]
    V2,
}

impl fmt::Display for AlgorithmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmVersion::V1 => write!(f, "v1"),
            AlgorithmVersion::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for AlgorithmVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" | "1" => Ok(AlgorithmVersion::V1),
            "v2" | "2" => Ok(AlgorithmVersion::V2),
            _ => Err(format!("Invalid algorithm version: {}", s)),
        }
    }
}

/// Single-night component tunables and category thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub base_score: f64,

    /// Points per unit of relative HRV deviation from baseline
    pub hrv_scale: f64,
    pub hrv_cap: f64,

    /// Points per unit of (hours / target - 1)
    pub sleep_scale: f64,
    pub sleep_cap: f64,

    /// Sleep score at or above which `sleep_quality_bonus` applies
    pub sleep_quality_good: u8,
    pub sleep_quality_bonus: f64,

    /// Sleep score below which `sleep_quality_penalty` applies
    pub sleep_quality_poor: u8,
    pub sleep_quality_penalty: f64,

    /// Body battery reading that contributes nothing
    pub body_battery_neutral: f64,
    /// Reading distance that maps to the full cap
    pub body_battery_span: f64,
    pub body_battery_cap: f64,

    /// Prior-score average below which the trend adjustment is negative
    pub trend_low: f64,
    pub trend_low_adjustment: f64,

    /// Prior-score average above which the trend adjustment is positive
    pub trend_high: f64,
    pub trend_high_adjustment: f64,

    pub thresholds: CategoryThresholds,
    pub legacy_thresholds: CategoryThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            base_score: 70.0,
            hrv_scale: 75.0,
            hrv_cap: 15.0,
            sleep_scale: 40.0,
            sleep_cap: 20.0,
            sleep_quality_good: 80,
            sleep_quality_bonus: 3.0,
            sleep_quality_poor: 50,
            sleep_quality_penalty: 5.0,
            body_battery_neutral: 70.0,
            body_battery_span: 30.0,
            body_battery_cap: 10.0,
            trend_low: 50.0,
            trend_low_adjustment: -5.0,
            trend_high: 75.0,
            trend_high_adjustment: 3.0,
            thresholds: CategoryThresholds::v2(),
            legacy_thresholds: CategoryThresholds::v1(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_finite(&[
            ("scoring.hrv_scale", self.hrv_scale),
            ("scoring.sleep_scale", self.sleep_scale),
            ("scoring.sleep_quality_bonus", self.sleep_quality_bonus),
            ("scoring.sleep_quality_penalty", self.sleep_quality_penalty),
            ("scoring.body_battery_neutral", self.body_battery_neutral),
            ("scoring.body_battery_span", self.body_battery_span),
            ("scoring.trend_low", self.trend_low),
            ("scoring.trend_low_adjustment", self.trend_low_adjustment),
            ("scoring.trend_high", self.trend_high),
            ("scoring.trend_high_adjustment", self.trend_high_adjustment),
        ])?;

        if !(0.0..=100.0).contains(&self.base_score) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.base_score".to_string(),
                reason: "must be within 0-100".to_string(),
            });
        }

        for (field, value) in [
            ("scoring.hrv_cap", self.hrv_cap),
            ("scoring.sleep_cap", self.sleep_cap),
            ("scoring.body_battery_cap", self.body_battery_cap),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "caps must be non-negative".to_string(),
                });
            }
        }

        if self.body_battery_span <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.body_battery_span".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        if self.trend_low > self.trend_high {
            return Err(ConfigError::InvalidValue {
                field: "scoring.trend_low".to_string(),
                reason: "must not exceed trend_high".to_string(),
            });
        }

        if !self.thresholds.is_descending() || !self.legacy_thresholds.is_descending() {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds".to_string(),
                reason: "category thresholds must be strictly descending".to_string(),
            });
        }

        Ok(())
    }

    pub fn hrv_component(&self, hrv: f64, baseline: f64) -> Option<f64> {
        if baseline <= 0.0 {
            return None;
        }
        let deviation = (hrv - baseline) / baseline;
        Some((deviation * self.hrv_scale).clamp(-self.hrv_cap, self.hrv_cap))
    }

    /// Last-night sleep, shifted by sleep quality and re-capped
    pub fn sleep_component(&self, hours: f64, target: f64, sleep_score: Option<u8>) -> f64 {
        let ratio = if target > 0.0 { hours / target } else { 1.0 };
        let mut component = ((ratio - 1.0) * self.sleep_scale).clamp(-self.sleep_cap, self.sleep_cap);

        match sleep_score {
            Some(score) if score >= self.sleep_quality_good => component += self.sleep_quality_bonus,
            Some(score) if score < self.sleep_quality_poor => component -= self.sleep_quality_penalty,
            _ => {}
        }

        component.clamp(-self.sleep_cap, self.sleep_cap)
    }

    pub fn body_battery_component(&self, reading: u8) -> f64 {
        let deviation = (reading as f64 - self.body_battery_neutral) / self.body_battery_span;
        (deviation * self.body_battery_cap).clamp(-self.body_battery_cap, self.body_battery_cap)
    }

    pub fn trend_adjustment(&self, avg_prior_score: f64) -> f64 {
        if avg_prior_score < self.trend_low {
            self.trend_low_adjustment
        } else if avg_prior_score > self.trend_high {
            self.trend_high_adjustment
        } else {
            0.0
        }
    }

    pub fn thresholds_for(&self, version: AlgorithmVersion) -> &CategoryThresholds {
        match version {
            AlgorithmVersion::V1 => &self.legacy_thresholds,
            AlgorithmVersion::V2 => &self.thresholds,
        }
    }
}

/// Everything the scorer needs for one day. Assembled by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessInput {
    pub today: NaiveDate,

    /// Today's health snapshot, if any was synced
    #[serde(default)]
    pub health: Option<HealthSnapshot>,

    /// 7-day HRV baseline; falls back to the snapshot's own baseline
    #[serde(default)]
    pub hrv_baseline: Option<f64>,

    #[serde(default)]
    pub recent_activities: Vec<ActivityRecord>,

    /// Daily loads, oldest first, ending today
    #[serde(default)]
    pub load_series: Vec<Decimal>,

    /// Sleep hours for recent nights, oldest first
    #[serde(default)]
    pub sleep_hours_3d: Vec<f64>,

    #[serde(default)]
    pub days_to_next_event: Option<i64>,

    #[serde(default)]
    pub next_event_priority: Option<EventPriority>,

    /// Average of the previous days' scores
    #[serde(default)]
    pub avg_readiness_3d: Option<f64>,
}

impl ReadinessInput {
    /// Input with no data at all for `today`
    pub fn empty(today: NaiveDate) -> Self {
        ReadinessInput {
            today,
            health: None,
            hrv_baseline: None,
            recent_activities: Vec::new(),
            load_series: Vec::new(),
            sleep_hours_3d: Vec::new(),
            days_to_next_event: None,
            next_event_priority: None,
            avg_readiness_3d: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorStatus {
    Positive,
    Negative,
    Neutral,
}

impl FactorStatus {
    fn from_value(value: f64) -> Self {
        if value > 0.0 {
            FactorStatus::Positive
        } else if value < 0.0 {
            FactorStatus::Negative
        } else {
            FactorStatus::Neutral
        }
    }
}

/// One named contribution to the score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub value: f64,
    pub detail: String,
    pub status: FactorStatus,
}

impl Factor {
    fn new(name: &str, value: f64, detail: String) -> Self {
        Factor {
            name: name.to_string(),
            value,
            detail,
            status: FactorStatus::from_value(value),
        }
    }
}

/// The scorer's output for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessResult {
    pub date: NaiveDate,
    pub version: AlgorithmVersion,
    pub score: u8,

    /// Sum of all components before clamping and rounding
    pub raw_total: f64,

    pub category: ReadinessCategory,
    pub factors: Vec<Factor>,
    pub guidance: Guidance,
    pub fatigue: FatigueAssessment,
    pub acwr: AcwrAssessment,
    pub sport_readiness: BTreeMap<SportProfile, SportStatusReport>,
}

/// Clamp to `[0, 100]` and round half-up
pub fn finalize_score(raw_total: f64) -> u8 {
    if raw_total.is_nan() {
        return 0;
    }
    (raw_total.clamp(0.0, 100.0) + 0.5).floor() as u8
}

/// Running total plus the factors that produced it
struct Tally {
    total: f64,
    factors: Vec<Factor>,
}

impl Tally {
    fn new(base: f64) -> Self {
        Tally {
            total: base,
            factors: Vec::new(),
        }
    }

    fn add(&mut self, name: &str, value: f64, detail: String) {
        self.total += value;
        self.factors.push(Factor::new(name, value, detail));
    }
}

pub struct ReadinessScorer<'a> {
    config: &'a EngineConfig,
}

impl<'a> ReadinessScorer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        ReadinessScorer { config }
    }

    /// Score one day with the selected algorithm
    pub fn compute(&self, input: &ReadinessInput, version: AlgorithmVersion) -> ReadinessResult {
        let scoring = &self.config.scoring;
        let mut tally = Tally::new(scoring.base_score);

        self.add_single_night(&mut tally, input);

        let fatigue_engine = FatigueEngine::new(&self.config.fatigue);
        let fatigue = fatigue_engine.assess(&input.recent_activities, input.today);
        let acwr_engine = AcwrEngine::new(&self.config.acwr);

        let acwr = match version {
            AlgorithmVersion::V2 => {
                self.add_sleep_trend(&mut tally, input);

                if fatigue.contributing_sessions > 0 {
                    let dominant = fatigue.fractions.dominant();
                    tally.add(
                        "Fatigue",
                        -fatigue.penalty,
                        format!(
                            "{} fatigue {:.0}%",
                            dominant,
                            fatigue.fractions.get(dominant) * 100.0
                        ),
                    );
                }

                let acwr = acwr_engine.assess(&input.load_series);
                if acwr.sufficient_history {
                    tally.add(
                        "ACWR",
                        -acwr.penalty.to_f64().unwrap_or(0.0),
                        format!("{:.2} ({})", acwr.ratio, acwr.zone),
                    );
                }
                acwr
            }
            AlgorithmVersion::V1 => {
                let legacy = fatigue_engine.legacy_penalty(&input.recent_activities, input.today);
                if legacy > 0.0 {
                    tally.add(
                        "Recent Training",
                        -legacy,
                        format!(
                            "Sessions in the last {} days",
                            self.config.fatigue.legacy.window_days
                        ),
                    );
                }
                acwr_engine.assess_rolling(&input.load_series)
            }
        };

        if let Some(avg) = input.avg_readiness_3d {
            tally.add(
                "Trend",
                scoring.trend_adjustment(avg),
                format!("{:.0} average over recent days", avg),
            );
        }

        if version == AlgorithmVersion::V2 {
            self.add_event_proximity(&mut tally, input);
        }

        let raw_total = tally.total;
        let score = finalize_score(raw_total);
        let category = scoring.thresholds_for(version).categorize(score as f64);

        let sport_readiness = SportReadinessEvaluator::new(&self.config.sports).evaluate(
            score,
            &fatigue.fractions,
            acwr.ratio,
        );

        tracing::debug!(
            date = %input.today,
            %version,
            score,
            raw_total,
            %category,
            factors = tally.factors.len(),
            "readiness computed"
        );

        ReadinessResult {
            date: input.today,
            version,
            score,
            raw_total,
            category,
            factors: tally.factors,
            guidance: category.guidance(),
            fatigue,
            acwr,
            sport_readiness,
        }
    }

    /// HRV, last-night sleep and body battery; shared by both versions
    fn add_single_night(&self, tally: &mut Tally, input: &ReadinessInput) {
        let scoring = &self.config.scoring;
        let Some(health) = &input.health else {
            return;
        };

        let baseline = input.hrv_baseline.or(health.hrv_baseline);
        if let (Some(hrv), Some(baseline)) = (health.hrv, baseline) {
            if let Some(component) = scoring.hrv_component(hrv, baseline) {
                tally.add(
                    "HRV",
                    component,
                    format!("{:.0}ms vs {:.0}ms baseline", hrv, baseline),
                );
            }
        }

        if let Some(hours) = health.sleep_hours {
            let target = self.config.athlete.sleep_target_hours;
            let component = scoring.sleep_component(hours, target, health.sleep_score);
            let detail = match health.sleep_score {
                Some(quality) => format!("{:.1}h vs {:.1}h target, quality {}", hours, target, quality),
                None => format!("{:.1}h vs {:.1}h target", hours, target),
            };
            tally.add("Sleep", component, detail);
        }

        if let Some(reading) = health.body_battery_morning {
            tally.add(
                "Body Battery",
                scoring.body_battery_component(reading),
                format!("{} morning reading", reading),
            );
        }
    }

    fn add_sleep_trend(&self, tally: &mut Tally, input: &ReadinessInput) {
        let engine = SleepTrendEngine::new(&self.config.sleep_trend);
        let target = self.config.athlete.sleep_target_hours;
        if let Some(balance) = engine.balance_hours(&input.sleep_hours_3d, target) {
            tally.add(
                "Sleep Trend",
                engine.adjustment(&input.sleep_hours_3d, target),
                format!(
                    "{:+.1}h vs target over {} nights",
                    balance, self.config.sleep_trend.nights
                ),
            );
        }
    }

    fn add_event_proximity(&self, tally: &mut Tally, input: &ReadinessInput) {
        let (Some(days), Some(priority)) = (input.days_to_next_event, input.next_event_priority)
        else {
            return;
        };
        if days < 0 {
            return;
        }

        let modifier = EventProximityEngine::new(&self.config.event_proximity)
            .modifier(Some(days), Some(priority));
        tally.add(
            "Event Proximity",
            modifier,
            format!("{}-race in {} days", priority, days),
        );
    }
}
