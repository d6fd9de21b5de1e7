//! 急诊科单次仿真
//!
//! 加载场景（默认内置急诊科场景），可覆盖种子、时域、预热与资源容量，运行一次并打印汇总。

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use edsim_rs::dept::SimulationEngine;
use edsim_rs::scenario::{ResourceConfig, Scenario, ScenarioSpec};
use edsim_rs::sim::SimTime;
use edsim_rs::{Result, SimError};

#[derive(Debug, Parser)]
#[command(name = "ed_run", about = "Run one emergency department simulation")]
struct Args {
    /// Scenario JSON; defaults to the built-in emergency department
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the horizon (minutes)
    #[arg(long)]
    horizon_minutes: Option<f64>,

    /// Override the warm-up (minutes)
    #[arg(long)]
    warmup_minutes: Option<f64>,

    /// Capacity override NAME=N (repeatable)
    #[arg(long = "capacity", value_parser = parse_capacity)]
    capacity: Vec<(String, u32)>,

    /// Write the full run statistics as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,
}

fn parse_capacity(raw: &str) -> std::result::Result<(String, u32), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=N, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("bad capacity in '{raw}': {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario> {
    match path {
        Some(path) => ScenarioSpec::load(path)?.build(),
        None => Scenario::emergency_department(),
    }
}

fn run(args: Args) -> Result<()> {
    let mut scenario = load_scenario(args.scenario.as_ref())?;
    if let Some(w) = args.warmup_minutes {
        if !(w.is_finite() && w >= 0.0) {
            return Err(SimError::Configuration(format!(
                "warm-up must be non-negative, got {w}"
            )));
        }
        scenario.policy.warmup = SimTime::from_minutes(w);
    }
    let horizon = args
        .horizon_minutes
        .map(SimTime::from_minutes)
        .unwrap_or(scenario.policy.horizon);
    let seed = args.seed.unwrap_or(scenario.seed);
    let config: ResourceConfig = args.capacity.into_iter().collect();

    let engine = SimulationEngine::new(&scenario);
    let stats = engine.run(horizon, &config, seed)?;

    println!(
        "run scenario={:?} seed={} horizon={:.2} warmup={:.2} events={} arrivals={} departures={} excluded_warmup={} in_system_at_end={}",
        scenario.name,
        stats.seed,
        stats.horizon,
        stats.warmup,
        stats.events_processed,
        stats.arrivals,
        stats.departures,
        stats.excluded_warmup,
        stats.in_system_at_end
    );
    match &stats.tat {
        Some(tat) => println!(
            "tat count={} mean={:.4} min={:.4} max={:.4} p50={:.4} p90={:.4} p95={:.4}",
            tat.count, tat.mean, tat.min, tat.max, tat.p50, tat.p90, tat.p95
        ),
        None => println!("tat count=0"),
    }
    for r in &stats.resources {
        println!(
            "resource name={:?} capacity={} utilization={:.4} mean_queue={:.4} max_queue={} mean_wait={:.4}",
            r.name,
            r.capacity,
            r.utilization,
            r.mean_queue_length,
            r.max_queue_length,
            r.mean_wait
        );
    }

    if let Some(path) = args.json_out {
        fs::write(&path, serde_json::to_string_pretty(&stats)?)?;
        eprintln!("wrote run statistics to {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
