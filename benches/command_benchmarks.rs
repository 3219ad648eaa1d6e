//! Benchmarks for command dispatch and event processing.
//!
//! This benchmark suite measures:
//! - Command interpretation through the `/gun/` messenger
//! - `beamOn` throughput for the sequential and multi-threaded run managers
//! - Seed derivation

#![allow(missing_docs)] // Allow missing docs for criterion-generated functions

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use medipix_sim::seed::{FixedClock, derive_seed};
use medipix_sim::{
    Application, CommandInterpreter, Medipix, RandomEngine, RunController, RunManager,
    RunManagerKind,
};
use std::hint::black_box;

fn initialized(kind: RunManagerKind, threads: u16) -> RunManager {
    let application = Medipix::new();
    let mut manager = RunManager::new(kind, RandomEngine::with_seed(1), Vec::new());
    manager.set_worker_threads(threads);
    manager.set_detector_construction(application.detector_construction());
    manager.set_physics_list(application.physics_list());
    manager.set_action_initialization(application.action_initialization());
    manager
        .register_messenger(application.primary_generator_messenger())
        .expect("register gun messenger");
    manager.initialize().expect("initialize");
    manager
        .apply_command("/gun/spread 10 mm")
        .expect("beam spread");
    manager
}

/// Benchmark dispatch of messenger commands
fn bench_command_dispatch(c: &mut Criterion) {
    let mut manager = initialized(RunManagerKind::Serial, 1);
    c.bench_function("gun_commands", |b| {
        b.iter(|| {
            manager
                .apply_command(black_box("/gun/energy 60 keV"))
                .expect("energy");
            manager
                .apply_command(black_box("/gun/position 0 0 -1 cm"))
                .expect("position");
        });
    });
}

/// Benchmark event throughput per execution model
fn bench_beam_on(c: &mut Criterion) {
    let mut group = c.benchmark_group("beam_on");

    for events in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(events));
        for (label, kind, threads) in [
            ("serial", RunManagerKind::Serial, 1),
            ("mt4", RunManagerKind::MultiThreaded, 4),
        ] {
            let mut manager = initialized(kind, threads);
            let command = format!("/run/beamOn {events}");
            group.bench_with_input(BenchmarkId::new(label, events), &command, |b, command| {
                b.iter(|| manager.apply_command(black_box(command)).expect("beamOn"));
            });
        }
    }
    group.finish();
}

/// Benchmark seed derivation with a job identifier
fn bench_seed_derivation(c: &mut Criterion) {
    let clock = FixedClock(1_700_000_000);
    c.bench_function("derive_seed_job_id", |b| {
        b.iter(|| {
            let mut engine = RandomEngine::default();
            black_box(derive_seed(&clock, black_box(Some("42")), &mut engine))
        });
    });
}

criterion_group!(
    benches,
    bench_command_dispatch,
    bench_beam_on,
    bench_seed_derivation
);
criterion_main!(benches);
