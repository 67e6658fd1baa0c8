//! Horizon benchmarks
//!
//! Run with: `cargo bench --bench horizon -p slot-engine`

use std::hint::black_box;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use slot_engine::{
    AvailabilityEngine, AvailabilitySnapshot, BusyInterval, DayInput, DaySchedule, EngineConfig,
    InMemoryStore, SlotGenerator, SlotRequest, StaffSelector,
};
use uuid::Uuid;

const NY: Tz = chrono_tz::America::New_York;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap()
}

/// One hour-long appointment every three hours across the horizon.
fn busy(count: usize) -> Vec<BusyInterval> {
    (0..count)
        .map(|i| {
            let start = now() + Duration::hours(3 * i as i64);
            BusyInterval::normalized(start, Some(start + Duration::hours(1)))
        })
        .collect()
}

fn bench_single_day(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_day");
    let generator = SlotGenerator::from_config(&EngineConfig::default());
    let work_start = Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap();

    for granularity in [5i64, 15, 30] {
        let busy = busy(4);
        group.bench_with_input(
            BenchmarkId::from_parameter(granularity),
            &granularity,
            |b, &granularity| {
                b.iter(|| {
                    generator.generate(black_box(&DayInput {
                        staff_id: "staff",
                        work_start,
                        work_end: work_start + Duration::hours(9),
                        service_duration_min: 45,
                        buffer_before_min: 10,
                        buffer_after_min: 10,
                        granularity_min: granularity,
                        busy: &busy,
                        tz: NY,
                    }))
                })
            },
        );
    }
    group.finish();
}

fn bench_full_horizon(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_horizon");
    let engine = AvailabilityEngine::new(InMemoryStore::default(), EngineConfig::default())
        .unwrap();
    let request = SlotRequest::new(Uuid::nil(), StaffSelector::WholeBusiness, 60).with_buffers(5, 5);
    let schedules: Vec<DaySchedule> = (1..6)
        .map(|d| {
            DaySchedule::open(
                d,
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            )
        })
        .chain([DaySchedule::closed(0), DaySchedule::closed(6)])
        .collect();

    for appointments in [0usize, 50, 250] {
        let snapshot = AvailabilitySnapshot {
            tz: NY,
            booking_lead_days: 1,
            schedules: schedules.clone(),
            busy: busy(appointments),
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(appointments),
            &snapshot,
            |b, snapshot| {
                b.iter(|| engine.compute_from_snapshot(black_box(&request), snapshot, now()))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_single_day, bench_full_horizon);
criterion_main!(benches);
