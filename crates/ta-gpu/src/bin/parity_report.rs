//! Device/reference parity report over seeded synthetic series.
//!
//! Runs every indicator (or one, or a YAML sweep spec) through the batch
//! engine and the sequential reference, and prints one line per kernel.
//! Exits 1 when any kernel diverges.

use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use ta_core::config::{load_engine_config, EngineConfig};
use ta_core::indicators::IndicatorKind;
use ta_core::sweep::{generate_combinations, load_sweep_spec};
use ta_gpu::parity::{check_kind, default_combinations, ParityReport};
use ta_gpu::precision::Tier;
use ta_gpu::synthetic::synthetic_batch;
use ta_gpu::Calculator;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
struct Args {
    /// Engine config YAML (block size, memory limit, threads).
    #[arg(long)]
    config: Option<String>,

    /// Sweep spec YAML; overrides --indicator.
    #[arg(long)]
    sweep: Option<String>,

    /// Single indicator to check (default: all).
    #[arg(long)]
    indicator: Option<IndicatorKind>,

    /// RNG seed for the synthetic series.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of synthetic series.
    #[arg(long, default_value_t = 8)]
    series: usize,

    /// Shortest synthetic series.
    #[arg(long, default_value_t = 0)]
    min_len: usize,

    /// Longest synthetic series.
    #[arg(long, default_value_t = 500)]
    max_len: usize,

    /// Precision tier 0-4 (0 = bitwise).
    #[arg(long, default_value_t = 0)]
    tier: u8,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn print_text(report: &ParityReport) {
    let status = if report.passed() { "ok" } else { "FAIL" };
    println!(
        "{:<11} {:>4}  records={:<8} formed_mismatch={:<5} value_mismatch={:<5} \
         max_rel={:.3e} max_ulps={}",
        report.kernel,
        status,
        report.records,
        report.formed_mismatches,
        report.value_mismatches,
        report.max_rel_error,
        report.max_ulps,
    );
    if let Some(d) = &report.first_divergence {
        println!(
            "            first divergence: series={} param={} bar={} line={:?} \
             expected={} actual={}",
            d.series, d.param, d.bar, d.line, d.expected, d.actual
        );
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => load_engine_config(path),
        None => EngineConfig::default(),
    }
    .with_env();

    let Some(tier) = Tier::from_index(args.tier) else {
        eprintln!("--tier must be 0-4, got {}", args.tier);
        return ExitCode::from(2);
    };

    let calc = match Calculator::from_config(&cfg) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to start host device: {e}");
            return ExitCode::from(2);
        }
    };

    let plan: Vec<(IndicatorKind, Vec<Vec<(String, f64)>>)> = match &args.sweep {
        Some(path) => match load_sweep_spec(path) {
            Ok(spec) => vec![(spec.indicator, generate_combinations(&spec.axes))],
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(2);
            }
        },
        None => match args.indicator {
            Some(kind) => vec![(kind, default_combinations(kind))],
            None => IndicatorKind::ALL
                .iter()
                .map(|&k| (k, default_combinations(k)))
                .collect(),
        },
    };

    let batch = synthetic_batch(args.seed, args.series, args.min_len, args.max_len);
    tracing::info!(
        seed = args.seed,
        series = batch.len(),
        bars = batch.iter().map(Vec::len).sum::<usize>(),
        block_size = calc.block_size(),
        "synthetic batch ready"
    );

    let mut reports = Vec::with_capacity(plan.len());
    for (kind, combos) in &plan {
        match check_kind(*kind, &calc, &batch, combos, tier.tolerance()) {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("{kind}: {e}");
                return ExitCode::from(2);
            }
        }
    }

    match args.format {
        Format::Text => reports.iter().for_each(print_text),
        Format::Json => match serde_json::to_string_pretty(&reports) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to serialise report: {e}");
                return ExitCode::from(2);
            }
        },
    }

    if reports.iter().all(ParityReport::passed) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
