//! Scheduler throughput.
//!
//! Run with: cargo bench -p bv-engine
//!
//! A 60 fps host at 120 BPM sees 16 grid ticks per second, so the frame
//! pass dominates. Both passes are measured over a populated world.

use bv_engine::{clock_name, PulseScheduler, PulseSettings, Quantization, QuantizationEvent, World};
use bv_ir::ResponseCurve;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const POPULATIONS: &[usize] = &[16, 256, 1024];

fn populated(count: usize) -> (World, PulseScheduler) {
    let mut world = World::new();
    let mut scheduler = PulseScheduler::default();
    let actors: Vec<_> = (0..8)
        .map(|i| world.spawn_visual(&format!("actor{i}"), |e: &bv_engine::PulseEntry| {
            black_box(e.out_value);
        }))
        .collect();
    for i in 0..count {
        let owner = actors[i % actors.len()];
        let settings = PulseSettings::new("bench", i as i32, 0).with_curve(ResponseCurve::flash());
        // Long windows so nothing retires mid-measurement.
        scheduler
            .add_pulse(&mut world, owner, settings, i32::MAX / 2, 0, false)
            .unwrap();
    }
    (world, scheduler)
}

fn event() -> QuantizationEvent {
    QuantizationEvent {
        clock_name: clock_name("main"),
        quantization: Quantization::FINEST,
        num_bars: 1,
        beat: 1,
        beat_fraction: 0.0,
    }
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/frame");
    for &count in POPULATIONS {
        let (mut world, mut scheduler) = populated(count);
        scheduler.on_quantization(&mut world, &event());
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| scheduler.tick(&mut world, black_box(1.0 / 60.0)))
        });
    }
    group.finish();
}

fn bench_quantization(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler/quantization");
    let ev = event();
    for &count in POPULATIONS {
        let (mut world, mut scheduler) = populated(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| scheduler.on_quantization(&mut world, black_box(&ev)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_frame, bench_quantization);
criterion_main!(benches);
