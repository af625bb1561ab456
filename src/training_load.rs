//! Training load per session and per day
//!
//! # Load derivation
//!
//! A session's load comes from the first available source:
//! 1. the provider's own training-load value,
//! 2. Banister TRIMP from average heart rate,
//! 3. duration times an intensity multiplier.
//!
//! TRIMP = duration * HRr * 0.64 * e^(1.92 * HRr), where HRr is the heart-rate
//! reserve fraction `(avg - rest) / (max - rest)`.

use chrono::{Duration, NaiveDate};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::AthleteSettings;
use crate::models::{ActivityRecord, IntensityZone};

/// Load per minute when nothing better than the intensity zone is known
pub fn intensity_multiplier(zone: IntensityZone) -> Decimal {
    match zone {
        IntensityZone::Easy => dec!(0.5),
        IntensityZone::Moderate => dec!(1.0),
        IntensityZone::Hard => dec!(1.8),
        IntensityZone::Max => dec!(2.5),
    }
}

/// Banister TRIMP for one session, rounded to 2 decimal places.
///
/// A degenerate heart-rate range (max <= rest) falls back to the duration.
pub fn calculate_trimp(duration_minutes: u32, avg_hr: u16, resting_hr: u16, max_hr: u16) -> Decimal {
    if max_hr <= resting_hr {
        return Decimal::from(duration_minutes);
    }

    let hr_fraction = (avg_hr as f64 - resting_hr as f64) / (max_hr as f64 - resting_hr as f64);
    let intensity_factor = 0.64 * (1.92 * hr_fraction).exp();
    let trimp = duration_minutes as f64 * hr_fraction * intensity_factor;

    Decimal::from_f64(trimp.max(0.0))
        .unwrap_or(Decimal::ZERO)
        .round_dp(2)
}

/// Load for a session from whichever source is available
pub fn estimate_load(
    provider_load: Option<Decimal>,
    duration_minutes: u32,
    avg_hr: Option<u16>,
    zone: IntensityZone,
    athlete: &AthleteSettings,
) -> Decimal {
    if let Some(load) = provider_load {
        return load;
    }

    match avg_hr {
        Some(hr) if hr > 0 => {
            calculate_trimp(duration_minutes, hr, athlete.resting_hr, athlete.max_hr)
        }
        _ => Decimal::from(duration_minutes) * intensity_multiplier(zone),
    }
}

/// Summed training load for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub load: Decimal,
    pub session_count: u32,
}

/// Builds a gap-free daily load series ending on a given day
pub struct LoadSeriesBuilder {
    window_days: u16,
}

impl LoadSeriesBuilder {
    pub fn new(window_days: u16) -> Self {
        LoadSeriesBuilder { window_days }
    }

    /// One entry per day for the `window_days` days ending on `today`, oldest first.
    ///
    /// Days without sessions carry a load of zero. Sessions outside the window are ignored.
    pub fn build(&self, activities: &[ActivityRecord], today: NaiveDate) -> Vec<DailyLoad> {
        let start = today - Duration::days(self.window_days as i64 - 1);

        let mut by_day: BTreeMap<NaiveDate, (Decimal, u32)> = BTreeMap::new();
        for activity in activities {
            let date = activity.date();
            if date < start || date > today {
                continue;
            }
            let entry = by_day.entry(date).or_insert((Decimal::ZERO, 0));
            entry.0 += activity.training_load;
            entry.1 += 1;
        }

        start
            .iter_days()
            .take(self.window_days as usize)
            .map(|date| {
                let (load, session_count) =
                    by_day.get(&date).copied().unwrap_or((Decimal::ZERO, 0));
                DailyLoad {
                    date,
                    load,
                    session_count,
                }
            })
            .collect()
    }

    /// Just the load values of [`build`](Self::build)
    pub fn loads(&self, activities: &[ActivityRecord], today: NaiveDate) -> Vec<Decimal> {
        self.build(activities, today)
            .into_iter()
            .map(|d| d.load)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Discipline;
    use chrono::{TimeZone, Utc};

    fn athlete() -> AthleteSettings {
        AthleteSettings::default()
    }

    fn record(date: NaiveDate, load: Decimal) -> ActivityRecord {
        ActivityRecord {
            id: date.to_string(),
            started_at: Utc
                .from_utc_datetime(&date.and_hms_opt(18, 0, 0).unwrap()),
            discipline: Discipline::Bike,
            duration_minutes: 60,
            intensity_zone: IntensityZone::Moderate,
            training_load: load,
            body_regions: None,
        }
    }

    #[test]
    fn test_trimp() {
        // HRr = (150 - 50) / (185 - 50) = 0.7407
        let trimp = calculate_trimp(60, 150, 50, 185);
        assert!(trimp > dec!(110) && trimp < dec!(120), "trimp = {}", trimp);

        assert_eq!(calculate_trimp(45, 150, 60, 60), dec!(45));
    }

    #[test]
    fn test_estimate_load_precedence() {
        let a = athlete();
        assert_eq!(
            estimate_load(Some(dec!(88)), 60, Some(150), IntensityZone::Easy, &a),
            dec!(88)
        );
        assert_eq!(
            estimate_load(None, 60, Some(150), IntensityZone::Easy, &a),
            calculate_trimp(60, 150, a.resting_hr, a.max_hr)
        );
        assert_eq!(
            estimate_load(None, 40, None, IntensityZone::Hard, &a),
            dec!(72)
        );
    }

    #[test]
    fn test_series_has_one_entry_per_day() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let activities = vec![
            record(today, dec!(50)),
            record(today, dec!(25)),
            record(today - Duration::days(3), dec!(40)),
            record(today - Duration::days(40), dec!(999)),
            record(today + Duration::days(1), dec!(999)),
        ];

        let series = LoadSeriesBuilder::new(28).build(&activities, today);
        assert_eq!(series.len(), 28);
        assert_eq!(series[0].date, today - Duration::days(27));
        assert_eq!(series[27].date, today);
        assert_eq!(series[27].load, dec!(75));
        assert_eq!(series[27].session_count, 2);
        assert_eq!(series[24].load, dec!(40));

        let total: Decimal = series.iter().map(|d| d.load).sum();
        assert_eq!(total, dec!(115));

        for pair in series.windows(2) {
            assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
        }
    }

    #[test]
    fn test_empty_series_is_all_zero() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let loads = LoadSeriesBuilder::new(28).loads(&[], today);
        assert_eq!(loads.len(), 28);
        assert!(loads.iter().all(|l| l.is_zero()));
    }
}
