//! Weekly training summaries
//!
//! Weeks run Monday to Sunday. Volume comes from the week's activities;
//! averages come from whichever daily results and health readings exist.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ActivityRecord, Discipline, HealthSnapshot, IntensityZone};
use crate::readiness::ReadinessResult;

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Sunday of the week containing `date`
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// Per-day values that feed weekly averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    pub readiness_score: Option<u8>,
    pub hrv: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub acwr: Option<Decimal>,
}

impl DailyMetrics {
    pub fn from_result(result: &ReadinessResult, health: Option<&HealthSnapshot>) -> Self {
        DailyMetrics {
            date: result.date,
            readiness_score: Some(result.score),
            hrv: health.and_then(|h| h.hrv),
            sleep_hours: health.and_then(|h| h.sleep_hours),
            acwr: result.acwr.sufficient_history.then_some(result.acwr.ratio),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub activity_count: usize,
    pub total_hours: f64,
    pub total_load: Decimal,
    pub hours_by_discipline: BTreeMap<Discipline, f64>,

    /// Share of the week's minutes per zone; empty when no minutes were logged
    pub intensity_distribution: BTreeMap<IntensityZone, f64>,

    pub avg_readiness: Option<f64>,
    pub avg_hrv: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_acwr: Option<Decimal>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

impl WeeklySummary {
    /// Summary for the week starting at the Monday of `start`.
    ///
    /// Returns `None` for a week without activities.
    pub fn aggregate(
        start: NaiveDate,
        activities: &[ActivityRecord],
        daily: &[DailyMetrics],
    ) -> Option<Self> {
        let week_start = week_start(start);
        let week_end = week_end(start);
        let in_week = |d: NaiveDate| d >= week_start && d <= week_end;

        let week: Vec<&ActivityRecord> = activities.iter().filter(|a| in_week(a.date())).collect();
        if week.is_empty() {
            return None;
        }

        let total_minutes: u32 = week.iter().map(|a| a.duration_minutes).sum();
        let total_load = week.iter().map(|a| a.training_load).sum();

        let mut hours_by_discipline = BTreeMap::new();
        let mut minutes_by_zone: BTreeMap<IntensityZone, u32> = BTreeMap::new();
        for activity in &week {
            *hours_by_discipline.entry(activity.discipline).or_insert(0.0) +=
                activity.duration_minutes as f64 / 60.0;
            *minutes_by_zone.entry(activity.intensity_zone).or_insert(0) += activity.duration_minutes;
        }

        let intensity_distribution = if total_minutes > 0 {
            IntensityZone::ALL
                .iter()
                .map(|zone| {
                    let minutes = minutes_by_zone.get(zone).copied().unwrap_or(0);
                    (*zone, minutes as f64 / total_minutes as f64)
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        let days: Vec<&DailyMetrics> = daily.iter().filter(|d| in_week(d.date)).collect();
        let acwr_values: Vec<Decimal> = days.iter().filter_map(|d| d.acwr).collect();
        let avg_acwr = (!acwr_values.is_empty())
            .then(|| acwr_values.iter().sum::<Decimal>() / Decimal::from(acwr_values.len()));

        Some(WeeklySummary {
            week_start,
            week_end,
            activity_count: week.len(),
            total_hours: total_minutes as f64 / 60.0,
            total_load,
            hours_by_discipline,
            intensity_distribution,
            avg_readiness: mean(days.iter().filter_map(|d| d.readiness_score.map(f64::from))),
            avg_hrv: mean(days.iter().filter_map(|d| d.hrv)),
            avg_sleep_hours: mean(days.iter().filter_map(|d| d.sleep_hours)),
            avg_acwr,
        })
    }
}

/// Summaries for every week touching `[from, to]` that has activity, oldest first
pub fn weekly_trends(
    activities: &[ActivityRecord],
    daily: &[DailyMetrics],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<WeeklySummary> {
    let mut summaries = Vec::new();
    let mut monday = week_start(from);
    while monday <= to {
        if let Some(summary) = WeeklySummary::aggregate(monday, activities, daily) {
            summaries.push(summary);
        }
        monday += Duration::weeks(1);
    }
    summaries
}
