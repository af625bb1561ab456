use chrono::{Duration, NaiveDate, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use readiness::acwr::AcwrEngine;
use readiness::{
    ActivityRecord, AlgorithmVersion, AthleteHistory, DayRequest, Discipline, EngineConfig,
    HealthSnapshot, IntensityZone, ReadinessEngine,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Benchmarks for the scoring pipeline
///
/// Single-day scoring should stay far below a millisecond; range and batch
/// runs show how the engine scales with history length and request count.

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
}

fn create_history(days: i64) -> AthleteHistory {
    let disciplines = [Discipline::Run, Discipline::Bike, Discipline::Strength, Discipline::Swim];
    let zones = [IntensityZone::Easy, IntensityZone::Moderate, IntensityZone::Hard];

    let activities = (0..days)
        .map(|d| {
            let date = start_date() + Duration::days(d);
            ActivityRecord {
                id: format!("bench-{}", d),
                started_at: Utc.from_utc_datetime(&date.and_hms_opt(7, 0, 0).unwrap()),
                discipline: disciplines[d as usize % disciplines.len()],
                duration_minutes: 30 + (d % 5) as u32 * 15,
                intensity_zone: zones[d as usize % zones.len()],
                training_load: Decimal::from(40 + (d % 7) * 12),
                body_regions: None,
            }
        })
        .collect();

    let health = (0..days)
        .map(|d| HealthSnapshot {
            hrv: Some(50.0 + (d % 9) as f64),
            sleep_hours: Some(6.5 + (d % 4) as f64 * 0.4),
            sleep_score: Some(60 + (d % 30) as u8),
            body_battery_morning: Some(50 + (d % 40) as u8),
            ..HealthSnapshot::empty(start_date() + Duration::days(d))
        })
        .collect();

    AthleteHistory {
        activities,
        health,
        ..AthleteHistory::default()
    }
}

fn bench_acwr(c: &mut Criterion) {
    let config = EngineConfig::default();
    let engine = AcwrEngine::new(&config.acwr);
    let loads: Vec<Decimal> = (0..28).map(|d| Decimal::from(30 + (d % 6) * 10)).collect();

    c.bench_function("acwr_assess_28d", |b| {
        b.iter(|| engine.assess(black_box(&loads)))
    });
}

fn bench_single_day(c: &mut Criterion) {
    let engine = ReadinessEngine::new(EngineConfig::default()).unwrap();
    let history = create_history(60);
    let prepared = engine.prepare(&history).unwrap();
    let date = start_date() + Duration::days(59);

    c.bench_function("compute_readiness_single_day", |b| {
        b.iter(|| {
            let input = engine.assemble_input(&prepared, black_box(date), &[70, 72, 68]);
            engine.compute_readiness(&input, AlgorithmVersion::V2)
        })
    });
}

fn bench_range(c: &mut Criterion) {
    let engine = ReadinessEngine::new(EngineConfig::default()).unwrap();
    let mut group = c.benchmark_group("Range Computation");

    for &days in &[30i64, 90, 365] {
        let history = create_history(days + 28);
        let from = start_date() + Duration::days(28);
        let to = from + Duration::days(days - 1);

        group.throughput(Throughput::Elements(days as u64));
        group.bench_with_input(BenchmarkId::new("compute_range", days), &history, |b, history| {
            b.iter(|| engine.compute_range(history, from, to, AlgorithmVersion::V2))
        });
    }

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let engine = ReadinessEngine::new(EngineConfig::default()).unwrap();
    let history = Arc::new(create_history(60));
    let mut group = c.benchmark_group("Batch Computation");

    for &size in &[10usize, 100, 1000] {
        let requests: Vec<DayRequest> = (0..size)
            .map(|i| DayRequest {
                history: Arc::clone(&history),
                date: start_date() + Duration::days(30 + (i % 30) as i64),
                version: AlgorithmVersion::V2,
                prior_scores: vec![65, 70],
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute_batch", size), &requests, |b, requests| {
            b.iter(|| engine.compute_batch(requests))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_acwr, bench_single_day, bench_range, bench_batch);
criterion_main!(benches);
