//! Engine facade
//!
//! [`ReadinessEngine`] owns a validated configuration and wires the data flow:
//! raw history is validated and normalised once, a [`ReadinessInput`] is
//! assembled per day, and the pure scorers run over it. The engine holds no
//! mutable state, so one instance can serve any number of threads.

use chrono::{Duration, NaiveDate};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::classifiers::RawActivity;
use crate::config::EngineConfig;
use crate::error::{ErrorSeverity, Result, ValidationError};
use crate::events::next_priority_event;
use crate::fatigue::FatigueLevels;
use crate::models::{ActivityRecord, Event, HealthSnapshot};
use crate::phase::{PhaseDetector, PhaseStatus, PlannedPhase};
use crate::readiness::{AlgorithmVersion, ReadinessInput, ReadinessResult, ReadinessScorer};
use crate::sport_readiness::{SportProfile, SportReadinessEvaluator, SportStatusReport};
use crate::training_load::LoadSeriesBuilder;
use crate::trends::{weekly_trends, DailyMetrics, WeeklySummary};

/// Prior scores averaged into the trend adjustment
const TREND_WINDOW_DAYS: usize = 3;

/// Days of HRV readings averaged when no baseline was synced
const HRV_BASELINE_DAYS: i64 = 7;

/// Everything the sync layer knows about one athlete
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteHistory {
    /// Already classified sessions
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,

    /// Provider sessions still to be classified
    #[serde(default)]
    pub raw_activities: Vec<RawActivity>,

    #[serde(default)]
    pub health: Vec<HealthSnapshot>,

    #[serde(default)]
    pub events: Vec<Event>,
}

impl AthleteHistory {
    /// Read a history export from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Validated history with every session classified and snapshots keyed by day
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedHistory {
    /// Sorted by start time
    pub activities: Vec<ActivityRecord>,
    pub health: BTreeMap<NaiveDate, HealthSnapshot>,
    pub events: Vec<Event>,
}

impl PreparedHistory {
    pub fn snapshot(&self, date: NaiveDate) -> Option<&HealthSnapshot> {
        self.health.get(&date)
    }
}

/// One day's result plus the training phase on that day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub readiness: ReadinessResult,
    pub phase: PhaseStatus,
}

/// A single independent evaluation, e.g. one athlete's morning score
#[derive(Debug, Clone)]
pub struct DayRequest {
    pub history: Arc<AthleteHistory>,
    pub date: NaiveDate,
    pub version: AlgorithmVersion,
    pub prior_scores: Vec<u8>,
}

pub struct ReadinessEngine {
    config: Arc<EngineConfig>,
}

impl ReadinessEngine {
    /// Validate the tables and build an engine. Fails fast on bad configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_shared_config(Arc::new(config))
    }

    pub fn with_shared_config(config: Arc<EngineConfig>) -> Result<Self> {
        config.validate()?;
        debug!(
            sports = config.sports.len(),
            templates = config.phases.templates.len(),
            "engine configuration validated"
        );
        Ok(ReadinessEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score one day from an already assembled input
    pub fn compute_readiness(
        &self,
        input: &ReadinessInput,
        version: AlgorithmVersion,
    ) -> ReadinessResult {
        ReadinessScorer::new(&self.config).compute(input, version)
    }

    pub fn evaluate_sport_readiness(
        &self,
        score: u8,
        fatigue: &FatigueLevels,
        acwr: Decimal,
    ) -> BTreeMap<SportProfile, SportStatusReport> {
        SportReadinessEvaluator::new(&self.config.sports).evaluate(score, fatigue, acwr)
    }

    pub fn detect_phase(&self, events: &[Event], today: NaiveDate) -> PhaseStatus {
        PhaseDetector::new(&self.config.phases).detect(events, today)
    }

    pub fn generate_plan(&self, event: &Event) -> Vec<PlannedPhase> {
        PhaseDetector::new(&self.config.phases).generate_plan(event)
    }

    /// Validate collaborator input and classify raw sessions
    pub fn prepare(&self, history: &AthleteHistory) -> Result<PreparedHistory> {
        let mut activities = Vec::with_capacity(history.activities.len() + history.raw_activities.len());
        for activity in &history.activities {
            activity.validate()?;
            activities.push(activity.clone());
        }
        for raw in &history.raw_activities {
            activities.push(raw.normalize(&self.config.athlete)?);
        }
        activities.sort_by_key(|a| a.started_at);

        let mut health = BTreeMap::new();
        for snapshot in &history.health {
            snapshot.validate()?;
            if health.insert(snapshot.date, snapshot.clone()).is_some() {
                return Err(ValidationError::DuplicateSnapshot {
                    date: snapshot.date.to_string(),
                }
                .into());
            }
        }

        debug!(
            activities = activities.len(),
            snapshots = health.len(),
            events = history.events.len(),
            "history prepared"
        );

        Ok(PreparedHistory {
            activities,
            health,
            events: history.events.clone(),
        })
    }

    /// Build the scorer input for `date` from prepared history.
    ///
    /// `prior_scores` are the scores of the days before `date`, oldest first;
    /// only the last three are averaged.
    pub fn assemble_input(
        &self,
        history: &PreparedHistory,
        date: NaiveDate,
        prior_scores: &[u8],
    ) -> ReadinessInput {
        let config = &self.config;

        let lookback = (config.fatigue.lookback_days() as i64)
            .max(config.fatigue.legacy.window_days as i64 + 1);
        let earliest = date - Duration::days(lookback - 1);
        let recent_activities: Vec<ActivityRecord> = history
            .activities
            .iter()
            .filter(|a| (earliest..=date).contains(&a.date()))
            .cloned()
            .collect();

        let load_series =
            LoadSeriesBuilder::new(config.acwr.window_days).loads(&history.activities, date);

        let health = history.snapshot(date).cloned();

        let nights = config.sleep_trend.nights as i64;
        let sleep_hours_3d: Vec<f64> = (0..nights)
            .rev()
            .filter_map(|offset| history.snapshot(date - Duration::days(offset)))
            .filter_map(|s| s.sleep_hours)
            .collect();

        let hrv_baseline = health
            .as_ref()
            .and_then(|h| h.hrv_baseline)
            .or_else(|| self.derived_hrv_baseline(history, date))
            .or(config.athlete.hrv_baseline);

        let next_event = next_priority_event(&history.events, date);

        let recent_scores = &prior_scores[prior_scores.len().saturating_sub(TREND_WINDOW_DAYS)..];
        let avg_readiness_3d = (!recent_scores.is_empty()).then(|| {
            recent_scores.iter().map(|s| *s as f64).sum::<f64>() / recent_scores.len() as f64
        });

        ReadinessInput {
            today: date,
            health,
            hrv_baseline,
            recent_activities,
            load_series,
            sleep_hours_3d,
            days_to_next_event: next_event.map(|e| e.days_until(date)),
            next_event_priority: next_event.map(|e| e.priority),
            avg_readiness_3d,
        }
    }

    /// Mean HRV over the seven days before `date`
    fn derived_hrv_baseline(&self, history: &PreparedHistory, date: NaiveDate) -> Option<f64> {
        let start = date - Duration::days(HRV_BASELINE_DAYS);
        let readings: Vec<f64> = history
            .health
            .range(start..date)
            .filter_map(|(_, s)| s.hrv)
            .collect();
        (!readings.is_empty()).then(|| readings.iter().sum::<f64>() / readings.len() as f64)
    }

    fn report(
        &self,
        history: &PreparedHistory,
        date: NaiveDate,
        prior_scores: &[u8],
        version: AlgorithmVersion,
    ) -> DailyReport {
        let input = self.assemble_input(history, date, prior_scores);
        DailyReport {
            readiness: self.compute_readiness(&input, version),
            phase: self.detect_phase(&history.events, date),
        }
    }

    pub fn compute_day(
        &self,
        history: &AthleteHistory,
        date: NaiveDate,
        prior_scores: &[u8],
        version: AlgorithmVersion,
    ) -> Result<DailyReport> {
        let prepared = self.prepare(history)?;
        Ok(self.report(&prepared, date, prior_scores, version))
    }

    /// Score every day in `[from, to]`, each day's score feeding the next day's trend
    pub fn compute_range(
        &self,
        history: &AthleteHistory,
        from: NaiveDate,
        to: NaiveDate,
        version: AlgorithmVersion,
    ) -> Result<Vec<DailyReport>> {
        if from > to {
            return Err(ValidationError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        let prepared = self.prepare(history)?;
        let mut scores: Vec<u8> = Vec::new();
        let mut reports = Vec::new();

        for date in from.iter_days().take_while(|d| *d <= to) {
            let report = self.report(&prepared, date, &scores, version);
            scores.push(report.readiness.score);
            reports.push(report);
        }

        info!(%from, %to, days = reports.len(), %version, "range computed");
        Ok(reports)
    }

    /// Evaluate independent requests in parallel. Order of results matches the input.
    pub fn compute_batch(&self, requests: &[DayRequest]) -> Vec<Result<DailyReport>> {
        let results: Vec<Result<DailyReport>> = requests
            .par_iter()
            .map(|request| {
                self.compute_day(
                    &request.history,
                    request.date,
                    &request.prior_scores,
                    request.version,
                )
            })
            .collect();

        let mut failed = 0;
        for (request, result) in requests.iter().zip(&results) {
            let Err(err) = result else { continue };
            failed += 1;
            match err.severity() {
                ErrorSeverity::Warning => {
                    warn!(date = %request.date, error = %err, "batch request rejected")
                }
                _ => error!(date = %request.date, error = %err, "batch request failed"),
            }
        }
        info!(requests = requests.len(), failed, "batch computed");
        results
    }

    /// Weekly summaries over `[from, to]` from history and already computed reports
    pub fn weekly_trends(
        &self,
        history: &AthleteHistory,
        reports: &[DailyReport],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeeklySummary>> {
        let prepared = self.prepare(history)?;
        let daily: Vec<DailyMetrics> = reports
            .iter()
            .map(|r| DailyMetrics::from_result(&r.readiness, prepared.snapshot(r.readiness.date)))
            .collect();
        Ok(weekly_trends(&prepared.activities, &daily, from, to))
    }
}
