//! Sweep the CUDA micro-kernels the current device can run
//!
//! Run with: cargo run --release --example sweep -p tops-cuda

use tops_core::{Device, LaunchConfig, Sm70, Sm75, Sm80, Sm89, Sm90};
use tops_cuda::{launch_variant, BmmaVariant, CudaContext, CudaError, CudaVariant, WmmaVariant};
use tops_types::{And, Bf16, Tf32, Xor, F16, F32, F64, S32, S4, S8, U4, U8};

const WARMUP_ITERS: usize = 1;
const BENCH_ITERS: usize = 5;

fn bench<V: CudaVariant>(ctx: &CudaContext, cfg: &LaunchConfig) {
    let name = V::KERNEL_NAME.trim_start_matches("tops_");
    let result = (|| -> Result<(f64, bool), CudaError> {
        for _ in 0..WARMUP_ITERS {
            launch_variant::<V>(ctx, cfg)?;
        }
        let mut best = f64::INFINITY;
        let mut fired = false;
        for _ in 0..BENCH_ITERS {
            let report = launch_variant::<V>(ctx, cfg)?;
            best = best.min(report.elapsed.as_secs_f64());
            fired |= report.guard_fired;
        }
        Ok((best, fired))
    })();

    match result {
        Ok((secs, fired)) => {
            let macs = V::macs() as f64 * cfg.groups as f64 * cfg.repetitions as f64;
            let tops = if secs > 0.0 {
                2.0 * macs / secs / 1e12
            } else {
                0.0
            };
            println!(
                "{:<36} {:>10.3} {:>10.2}{}",
                name,
                secs * 1e3,
                tops,
                if fired { "  (sink written!)" } else { "" }
            );
        }
        Err(CudaError::Core(e)) => println!("{:<36} skipped: {}", name, e),
        Err(e) => println!("{:<36} failed: {}", name, e),
    }
}

fn main() {
    let ctx = match CudaContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("CUDA not available: {}", e);
            return;
        }
    };

    let cfg = LaunchConfig::new(1024, 4096);

    println!("Device: {} ({})", ctx.name(), ctx.capability());
    println!("Groups: {}  Repetitions: {}", cfg.groups, cfg.repetitions);
    println!("{}", "=".repeat(60));
    println!("{:<36} {:>10} {:>10}", "Kernel", "Best (ms)", "TOPS");
    println!("{}", "-".repeat(60));

    bench::<WmmaVariant<Sm70, F16, F16, 16, 16, 16>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm70, F16, F32, 16, 16, 16>>(&ctx, &cfg);

    bench::<WmmaVariant<Sm75, U8, S32, 16, 16, 16>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm75, S8, S32, 16, 16, 16>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm75, U4, S32, 8, 8, 32>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm75, S4, S32, 8, 8, 32>>(&ctx, &cfg);
    bench::<BmmaVariant<Sm75, Xor, 8, 8, 4>>(&ctx, &cfg);

    bench::<WmmaVariant<Sm80, Bf16, F32, 16, 16, 16>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm80, Tf32, F32, 16, 16, 8>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm80, F64, F64, 8, 8, 4>>(&ctx, &cfg);
    bench::<BmmaVariant<Sm80, And, 8, 8, 4>>(&ctx, &cfg);

    bench::<WmmaVariant<Sm89, F16, F32, 16, 16, 16>>(&ctx, &cfg);
    bench::<WmmaVariant<Sm90, Bf16, F32, 16, 16, 16>>(&ctx, &cfg);

    println!("{}", "=".repeat(60));
}
