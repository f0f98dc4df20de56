//! Benchmarks for the in-memory scheduled set.
//!
//! Benchmarks cover:
//! - Scheduling jobs with spread-out run times
//! - Releasing due jobs in run-time order

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use chrono::Duration;
use deferred_jobs::core::{Job, ScheduleStore, ScheduledJob};
use deferred_jobs::infra::queue::InMemoryScheduledSet;
use deferred_jobs::util::clock;
use serde_json::json;

fn fill(set: &mut InMemoryScheduledSet, count: usize) {
    let base = clock::now();
    for i in 0..count {
        // Interleave run times so the heap does real work.
        let offset = i64::try_from((i * 7919) % count).unwrap_or(0);
        set.schedule(ScheduledJob {
            run_at: base + Duration::milliseconds(offset),
            job: Job::new("HelloJob", vec![json!(i)]),
        })
        .unwrap();
    }
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");
    for size in [100_usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut set = InMemoryScheduledSet::new(size);
                fill(&mut set, size);
                black_box(set.len())
            });
        });
    }
    group.finish();
}

fn bench_pop_due(c: &mut Criterion) {
    let mut group = c.benchmark_group("pop_due");
    for size in [100_usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut set = InMemoryScheduledSet::new(size);
                    fill(&mut set, size);
                    set
                },
                |mut set| black_box(set.pop_due(clock::now() + Duration::hours(1)).len()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_schedule, bench_pop_due);
criterion_main!(benches);
