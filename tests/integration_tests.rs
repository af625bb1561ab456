use chrono::{Duration, NaiveDate, TimeZone, Utc};
use readiness::acwr::{AcwrEngine, AcwrZone};
use readiness::classifiers::RawActivity;
use readiness::{
    ActivityRecord, AlgorithmVersion, AthleteHistory, Discipline, EngineConfig, Event,
    EventPriority, EventType, HealthSnapshot, IntensityZone, ReadinessCategory, ReadinessEngine,
    ReadinessError, ReadinessInput, SportProfile, SportStatus, TrainingPhase,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Integration tests that exercise the public engine surface end to end

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 20).unwrap()
    }

    fn engine() -> ReadinessEngine {
        ReadinessEngine::new(EngineConfig::default()).unwrap()
    }

    fn session(date: NaiveDate, discipline: Discipline, zone: IntensityZone, load: Decimal) -> ActivityRecord {
        ActivityRecord {
            id: format!("{}-{}", date, discipline),
            started_at: Utc.from_utc_datetime(&date.and_hms_opt(7, 0, 0).unwrap()),
            discipline,
            duration_minutes: 60,
            intensity_zone: zone,
            training_load: load,
            body_regions: None,
        }
    }

    /// Three easy weeks, then a week at roughly sixty times the load
    fn overreaching_loads() -> Vec<Decimal> {
        let mut loads = vec![dec!(5); 21];
        loads.extend(vec![dec!(300); 7]);
        loads
    }

    /// Good HRV, short sleep, no event and a load spike deep in the danger zones
    #[test]
    fn test_overreaching_athlete_scores_below_moderate() {
        let engine = engine();
        let acwr = AcwrEngine::new(&engine.config().acwr);
        assert_eq!(acwr.penalty(dec!(2.39)), dec!(21.95));
        assert_eq!(acwr.zone(dec!(2.39)), AcwrZone::HighRisk);

        let input = ReadinessInput {
            health: Some(HealthSnapshot {
                hrv: Some(60.0),
                hrv_baseline: Some(55.0),
                sleep_hours: Some(6.45),
                ..HealthSnapshot::empty(today())
            }),
            load_series: overreaching_loads(),
            ..ReadinessInput::empty(today())
        };

        let result = engine.compute_readiness(&input, AlgorithmVersion::V2);

        let hrv = result.factors.iter().find(|f| f.name == "HRV").unwrap();
        assert!(hrv.value > 0.0);
        let sleep = result.factors.iter().find(|f| f.name == "Sleep").unwrap();
        assert!(sleep.value < 0.0);
        assert!(result.factors.iter().all(|f| f.name != "Event Proximity"));

        assert!(result.acwr.ratio > dec!(2.0));
        assert!(result.score < 65);
        assert!(matches!(
            result.category,
            ReadinessCategory::Low | ReadinessCategory::Recovery | ReadinessCategory::Rest
        ));

        let hard_run = &result.sport_readiness[&SportProfile::HardRun];
        assert_eq!(hard_run.status, SportStatus::NotReady);
        assert!(hard_run.blockers.iter().any(|b| b.starts_with("ACWR")));
        assert_eq!(
            result.sport_readiness[&SportProfile::HyroxIntervals].status,
            SportStatus::NotReady
        );
    }

    #[test]
    fn test_compute_readiness_is_idempotent() {
        let engine = engine();
        let input = ReadinessInput {
            health: Some(HealthSnapshot {
                hrv: Some(48.0),
                hrv_baseline: Some(52.0),
                sleep_hours: Some(7.9),
                sleep_score: Some(84),
                body_battery_morning: Some(62),
                ..HealthSnapshot::empty(today())
            }),
            recent_activities: vec![session(
                today() - Duration::days(1),
                Discipline::Strength,
                IntensityZone::Hard,
                dec!(90),
            )],
            load_series: vec![dec!(40); 28],
            sleep_hours_3d: vec![7.0, 7.5, 7.9],
            days_to_next_event: Some(10),
            next_event_priority: Some(EventPriority::A),
            avg_readiness_3d: Some(68.0),
            ..ReadinessInput::empty(today())
        };

        let first = engine.compute_readiness(&input, AlgorithmVersion::V2);
        let second = engine.compute_readiness(&input, AlgorithmVersion::V2);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_hyrox_six_weeks_out_is_build() {
        let engine = engine();
        let events = vec![
            Event::new("Hyrox Hamburg", today() + Duration::weeks(6), EventType::Hyrox, EventPriority::A),
            Event::new("Parkrun", today() + Duration::days(5), EventType::Other, EventPriority::C),
        ];

        let status = engine.detect_phase(&events, today());
        assert_eq!(status.phase, TrainingPhase::Build);
        assert_eq!(status.weeks_out, Some(6.0));
        assert_eq!(status.event.unwrap().name, "Hyrox Hamburg");

        let plan = engine.generate_plan(&events[0]);
        let phases: Vec<_> = plan.iter().map(|p| p.phase).collect();
        assert_eq!(
            phases,
            vec![
                TrainingPhase::Base,
                TrainingPhase::Build,
                TrainingPhase::Peak,
                TrainingPhase::Taper
            ]
        );
        assert_eq!(plan[3].end_date, events[0].date);
    }

    #[test]
    fn test_sport_evaluation_through_engine() {
        let engine = engine();
        let result = engine.compute_readiness(&ReadinessInput::empty(today()), AlgorithmVersion::V2);
        let sports = engine.evaluate_sport_readiness(result.score, &result.fatigue.fractions, result.acwr.ratio);

        assert_eq!(sports.len(), SportProfile::ALL.len());
        assert_eq!(sports[&SportProfile::EasyRun].status, SportStatus::Ready);
        assert_eq!(sports, result.sport_readiness);
    }

    #[test]
    fn test_range_from_raw_history() {
        let engine = engine();
        let start = today() - Duration::days(34);

        let raw_activities: Vec<RawActivity> = (0..35)
            .map(|offset| {
                let date = start + Duration::days(offset);
                RawActivity {
                    id: format!("raw-{}", offset),
                    started_at: Utc.from_utc_datetime(&date.and_hms_opt(18, 0, 0).unwrap()),
                    activity_type: "running".to_string(),
                    name: Some("Evening run".to_string()),
                    duration_minutes: 50,
                    avg_hr: Some(145),
                    aerobic_training_effect: None,
                    training_load: None,
                    body_regions: None,
                }
            })
            .collect();

        let health = (0..35)
            .map(|offset| HealthSnapshot {
                hrv: Some(55.0 + (offset % 4) as f64),
                sleep_hours: Some(7.5),
                body_battery_morning: Some(70),
                ..HealthSnapshot::empty(start + Duration::days(offset))
            })
            .collect();

        let history = AthleteHistory {
            raw_activities,
            health,
            events: vec![Event::new(
                "City Marathon",
                today() + Duration::weeks(3),
                EventType::Marathon,
                EventPriority::A,
            )],
            ..AthleteHistory::default()
        };

        let reports = engine
            .compute_range(&history, today() - Duration::days(6), today(), AlgorithmVersion::V2)
            .unwrap();
        assert_eq!(reports.len(), 7);

        // The same run every day keeps acute and chronic load level
        let last = &reports[6].readiness;
        assert!(last.acwr.sufficient_history);
        assert!(last.acwr.ratio > dec!(0.99) && last.acwr.ratio < dec!(1.01));
        assert_eq!(last.acwr.zone, AcwrZone::Optimal);
        assert!(reports[1..]
            .iter()
            .all(|r| r.readiness.factors.iter().any(|f| f.name == "Trend")));
        assert!(reports.iter().all(|r| r.phase.phase == TrainingPhase::Peak));

        let v1 = engine
            .compute_range(&history, today() - Duration::days(6), today(), AlgorithmVersion::V1)
            .unwrap();
        assert!(v1.iter().all(|r| r.readiness.acwr.penalty == Decimal::ZERO));
    }

    #[test]
    fn test_invalid_history_rejected() {
        let history = AthleteHistory {
            health: vec![HealthSnapshot {
                body_battery_morning: Some(140),
                ..HealthSnapshot::empty(today())
            }],
            ..AthleteHistory::default()
        };
        let result = engine().compute_day(&history, today(), &[], AlgorithmVersion::V2);
        assert!(matches!(result, Err(ReadinessError::Validation(_))));
    }

    #[test]
    fn test_malformed_template_fails_at_startup() {
        let mut config = EngineConfig::default();
        let hyrox = config
            .phases
            .templates
            .iter_mut()
            .find(|t| t.event_type == EventType::Hyrox)
            .unwrap();
        hyrox.intervals.retain(|i| i.phase != TrainingPhase::Build);

        assert!(matches!(
            ReadinessEngine::new(config),
            Err(ReadinessError::Config(_))
        ));
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = EngineConfig::default();
        config.athlete.sleep_target_hours = 8.0;
        config.default_version = AlgorithmVersion::V1;
        config.save_to_file(&path).unwrap();

        let loaded = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.athlete.sleep_target_hours, 8.0);
        assert_eq!(loaded.default_version, AlgorithmVersion::V1);
        assert!(ReadinessEngine::new(loaded).is_ok());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Fewer than seven days with load never produces a ratio other than 1
        #[test]
        fn sparse_history_is_neutral(
            days in proptest::collection::vec(0usize..28, 0..7),
            load in 1i64..500,
        ) {
            let mut series = vec![Decimal::ZERO; 28];
            for d in days {
                series[d] = Decimal::from(load);
            }
            let config = EngineConfig::default();
            let assessment = AcwrEngine::new(&config.acwr).assess(&series);
            prop_assert_eq!(assessment.ratio, Decimal::ONE);
            prop_assert_eq!(assessment.penalty, Decimal::ZERO);
        }

        /// Batch and sequential evaluation agree
        #[test]
        fn batch_matches_single_day(offset in 0i64..20, hrv in 30.0f64..90.0) {
            use readiness::DayRequest;
            use std::sync::Arc;

            let engine = ReadinessEngine::new(EngineConfig::default()).unwrap();
            let date = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap() + Duration::days(offset);
            let history = Arc::new(AthleteHistory {
                health: vec![HealthSnapshot {
                    hrv: Some(hrv),
                    hrv_baseline: Some(60.0),
                    ..HealthSnapshot::empty(date)
                }],
                ..AthleteHistory::default()
            });
            let request = DayRequest {
                history: Arc::clone(&history),
                date,
                version: AlgorithmVersion::V2,
                prior_scores: vec![],
            };

            let batch = engine.compute_batch(&[request]);
            let single = engine.compute_day(&history, date, &[], AlgorithmVersion::V2).unwrap();
            prop_assert_eq!(batch.into_iter().next().unwrap().unwrap(), single);
        }
    }
}
