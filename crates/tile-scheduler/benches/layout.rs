//! Benchmarks for the recomputation hot path
//!
//! Run with: cargo bench -p tile-scheduler --bench layout

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tile_scheduler::config::{SchedulerSettings, ViewModeKind};
use tile_scheduler::layout::{self, DEFAULT_ASPECT_RATIO};
use tile_scheduler::participant::{Participant, ParticipantEvent, ParticipantId};
use tile_scheduler::state::{SchedulerState, ViewportEvent};
use tile_scheduler::subscription::{self, Budget, SubscriptionInput, TierMap};
use tile_scheduler::window;

fn remote_ids(count: usize) -> Vec<ParticipantId> {
    (0..count).map(|i| ParticipantId::new(format!("p{i}"))).collect()
}

/// Benchmark: grid search for a range of tile counts
fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_solve");
    for tiles in [1_usize, 4, 9, 25, 49] {
        group.bench_with_input(BenchmarkId::from_parameter(tiles), &tiles, |b, &tiles| {
            b.iter(|| layout::solve(black_box(tiles), 1920, 1080, DEFAULT_ASPECT_RATIO));
        });
    }
    group.finish();
}

/// Benchmark: page size derivation from the viewport
fn bench_page_geometry(c: &mut Criterion) {
    c.bench_function("page_geometry_1080p", |b| {
        b.iter(|| {
            layout::page_geometry(
                black_box(1920),
                black_box(1080),
                DEFAULT_ASPECT_RATIO,
                280,
                25,
            )
        });
    });
}

/// Benchmark: tier assignment for large rosters
fn bench_subscription(c: &mut Criterion) {
    let settings = SchedulerSettings::default();
    let mut group = c.benchmark_group("subscription_recompute");
    for total in [10_usize, 100, 1000] {
        let ids = remote_ids(total);
        let (visible, _) = window::paged_window(total, 12, 2);
        let speaker = ids.last().cloned();
        let (previous, _) = subscription::recompute(
            &SubscriptionInput {
                remote_ids: &ids,
                window: &visible,
                active_speaker: None,
                fixed_ids: &[],
                budget: Budget::Unbounded,
                small_call_threshold: settings.small_call_threshold,
            },
            &TierMap::new(),
        );

        group.bench_with_input(BenchmarkId::from_parameter(total), &total, |b, _| {
            b.iter(|| {
                let input = SubscriptionInput {
                    remote_ids: &ids,
                    window: &visible,
                    active_speaker: speaker.as_ref(),
                    fixed_ids: &[],
                    budget: Budget::Limited(20),
                    small_call_threshold: settings.small_call_threshold,
                };
                black_box(subscription::recompute(black_box(&input), &previous));
            });
        });
    }
    group.finish();
}

/// Benchmark: full state recompute for a 200-person call
fn bench_state_recompute(c: &mut Criterion) {
    let mut state = SchedulerState::new(
        SchedulerSettings::default(),
        Budget::Unbounded,
        ViewModeKind::Paged,
    );
    state.apply(
        ViewportEvent::Resized {
            width: 1920,
            height: 1080,
        }
        .into(),
    );
    for id in remote_ids(200) {
        state.apply(
            ParticipantEvent::Joined {
                participant: Participant::remote(id),
            }
            .into(),
        );
    }
    state.recompute();

    c.bench_function("state_recompute_200", |b| {
        b.iter(|| black_box(state.recompute()));
    });
}

criterion_group!(
    benches,
    bench_solve,
    bench_page_geometry,
    bench_subscription,
    bench_state_recompute
);
criterion_main!(benches);
