//! tops CLI
//!
//! Lists and runs the tensor-core micro-kernels on a host emulator of a
//! chosen capability tier.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tensor_tops::{
    registry, version_info, Capability, HostEmulator, LaunchConfig, LaunchReport, Variant,
};

#[derive(Parser)]
#[command(name = "tops")]
#[command(author, version, about = "Tensor-core micro-kernel runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered variants
    List {
        /// Mark variants a device of this tier cannot run
        #[arg(short, long, value_name = "CAP")]
        tier: Option<Capability>,
    },

    /// Run variants on a host emulator
    Run {
        /// Capability tier to emulate (volta, sm75, sm_80, 89, ...)
        #[arg(short, long, value_name = "CAP", default_value = "sm_90")]
        tier: Capability,

        /// Only run variants whose name contains this substring
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Execution groups per launch
        #[arg(short, long, default_value_t = LaunchConfig::DEFAULT.groups)]
        groups: usize,

        /// Primitive invocations per group
        #[arg(short, long, default_value_t = LaunchConfig::DEFAULT.repetitions)]
        repetitions: usize,

        /// Timed launches per variant (after one warmup)
        #[arg(short, long, default_value = "5")]
        iters: usize,
    },

    /// Show build and backend information
    Info,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::List { tier } => {
            list(tier);
            Ok(())
        }
        Commands::Run {
            tier,
            filter,
            groups,
            repetitions,
            iters,
        } => {
            let cfg = LaunchConfig::new(groups, repetitions);
            cfg.validate()?;
            bench(tier, &filter, &cfg, iters.max(1))
        }
        Commands::Info => {
            println!("{}", version_info());
            Ok(())
        }
    }
}

fn list(tier: Option<Capability>) {
    println!(
        "{:<36}  {:<16}  {:<6}  {:>5}",
        "Variant", "Tier", "Family", "Lanes"
    );
    for v in registry::variants() {
        let mark = match tier {
            Some(cap) if !v.runnable_on(cap) => "  (unavailable)",
            _ => "",
        };
        println!(
            "{:<36}  {:<16}  {:<6}  {:>5}{}",
            v.name(),
            v.capability().to_string(),
            v.family().name(),
            v.family().group_size(),
            mark
        );
    }
}

fn bench(
    tier: Capability,
    filter: &str,
    cfg: &LaunchConfig,
    iters: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = HostEmulator::new(tier);

    println!("{}", "=".repeat(78));
    println!("Device: {}", tensor_tops::Device::name(&device));
    println!(
        "Groups: {}  Repetitions: {}  Iterations: {}",
        cfg.groups, cfg.repetitions, iters
    );
    println!("{}", "=".repeat(78));
    println!(
        "{:<36}  {:>12}  {:>12}  {:>10}",
        "Variant", "Median (ms)", "Min (ms)", "TOPS"
    );

    let (runnable, skipped) = registry::partition(filter, tier);
    for v in &skipped {
        tracing::debug!(variant = v.name(), "skipped");
    }
    for v in runnable {
        let (median, min, report) = time_variant(v, &device, cfg, iters)?;
        if report.guard_fired {
            return Err(format!("{}: guarded store executed", v).into());
        }
        let tops = if median.is_zero() {
            0.0
        } else {
            2.0 * report.macs as f64 / median.as_secs_f64() / 1e12
        };
        println!(
            "{:<36}  {:>12.3}  {:>12.3}  {:>10.4}",
            v.name(),
            median.as_secs_f64() * 1e3,
            min.as_secs_f64() * 1e3,
            tops
        );
    }

    if !skipped.is_empty() {
        println!("{} variant(s) need a newer tier than {}", skipped.len(), tier);
    }
    Ok(())
}

fn time_variant(
    v: &Variant,
    device: &HostEmulator,
    cfg: &LaunchConfig,
    iters: usize,
) -> Result<(Duration, Duration, LaunchReport), Box<dyn std::error::Error>> {
    // Warmup
    let mut report = v.run(device, cfg)?;

    let mut times = Vec::with_capacity(iters);
    for _ in 0..iters {
        report = v.run(device, cfg)?;
        times.push(report.elapsed);
    }

    times.sort();
    Ok((times[times.len() / 2], times[0], report))
}
