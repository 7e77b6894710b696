use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tensor_tops::prelude::*;

const REPETITIONS: [usize; 3] = [16, 128, 1024];

fn bench_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("Dense");
    group.sample_size(20);

    let device = HostEmulator::newest();
    for name in [
        "f16f32_sm70wmma_16x16x16",
        "f16f16_sm70wmma_16x16x16",
        "bf16f32_sm80wmma_16x16x16",
        "tf32f32_sm80mma_8x8x4",
        "f64f64_sm80wmma_8x8x4",
        "s8s32_sm75wmma_16x16x16",
        "u4s32_sm89wmma_8x8x32",
    ] {
        let Ok(variant) = find(name) else {
            continue;
        };
        for &reps in REPETITIONS.iter() {
            let cfg = LaunchConfig::new(32, reps);
            group.throughput(Throughput::Elements(variant.macs() * 32 * reps as u64));
            group.bench_with_input(BenchmarkId::new(name, reps), &cfg, |bench, cfg| {
                bench.iter(|| black_box(variant.run(&device, cfg)));
            });
        }
    }

    group.finish();
}

fn bench_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("Binary");
    group.sample_size(20);

    let device = HostEmulator::new(Capability::Ada);
    for name in ["b1i32xor_sm75bmma_8x8x128", "b1i32and_sm80bmma_8x8x128"] {
        let Ok(variant) = find(name) else {
            continue;
        };
        for &reps in REPETITIONS.iter() {
            let cfg = LaunchConfig::new(32, reps);
            group.throughput(Throughput::Elements(variant.macs() * 32 * reps as u64));
            group.bench_with_input(BenchmarkId::new(name, reps), &cfg, |bench, cfg| {
                bench.iter(|| black_box(variant.run(&device, cfg)));
            });
        }
    }

    group.finish();
}

/// Warpgroup-sized tiles at a single repetition count.
fn bench_wgmma(c: &mut Criterion) {
    let mut group = c.benchmark_group("Wgmma");
    group.sample_size(10);

    let device = HostEmulator::newest();
    for variant in registry::matching("wgmma") {
        let cfg = LaunchConfig::new(8, 16);
        group.throughput(Throughput::Elements(variant.macs() * 8 * 16));
        group.bench_with_input(BenchmarkId::new(variant.name(), 16), &cfg, |bench, cfg| {
            bench.iter(|| black_box(variant.run(&device, cfg)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dense, bench_binary, bench_wgmma);
criterion_main!(benches);
