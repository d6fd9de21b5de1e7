//! 急诊科容量扫描
//!
//! 对场景中的实验设计做多副本仿真，导出数据集；可选地拟合线性回归、
//! 在预算约束下搜索最优容量组合，并对最优解重新仿真验证。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use edsim_rs::experiment::{
    Dataset, ExhaustiveOptimizer, ExperimentRunner, OptimizationProblem, Optimizer,
    OrdinaryLeastSquares, RegressionModel, designs_from_spec,
};
use edsim_rs::scenario::{ResourceConfig, Scenario, ScenarioSpec};
use edsim_rs::sim::SimTime;
use edsim_rs::{Result, SimError};

#[derive(Debug, Parser)]
#[command(
    name = "ed_sweep",
    about = "Capacity sweep, regression and budget-constrained optimization"
)]
struct Args {
    /// Scenario JSON; defaults to the built-in emergency department
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Replications per config; defaults to the scenario's experiment setting
    #[arg(long)]
    replications: Option<u32>,

    /// Override the horizon (minutes)
    #[arg(long)]
    horizon_minutes: Option<f64>,

    /// Base seed; replication r uses seed + r
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads; defaults to one per core
    #[arg(long)]
    threads: Option<usize>,

    /// Write the dataset as CSV
    #[arg(long)]
    csv_out: Option<PathBuf>,

    /// Write the dataset as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Fit the regression and search for the best capacities
    #[arg(long)]
    optimize: bool,

    /// Re-simulate the recommended capacities (implies --optimize)
    #[arg(long)]
    validate: bool,
}

fn load_scenario(path: Option<&PathBuf>) -> Result<Scenario> {
    match path {
        Some(path) => ScenarioSpec::load(path)?.build(),
        None => Scenario::emergency_department(),
    }
}

fn format_config(config: &ResourceConfig) -> String {
    config
        .iter()
        .map(|(name, cap)| format!("{name:?}={cap}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_dataset(dataset: &Dataset) {
    for row in &dataset.rows {
        println!(
            "config index={} {} mean_tat={:.4} p90_tat={:.4} completed={:.1}",
            row.config_index,
            format_config(&row.capacities),
            row.mean_tat,
            row.p90_tat,
            row.completed
        );
    }
}

fn run(args: Args) -> Result<()> {
    let scenario = load_scenario(args.scenario.as_ref())?;
    let experiment = scenario.experiment.clone().ok_or_else(|| {
        SimError::Configuration("scenario has no experiment section".into())
    })?;
    let configs = designs_from_spec(&experiment)?;
    let replications = args.replications.unwrap_or(experiment.replications);
    let horizon = args
        .horizon_minutes
        .map(SimTime::from_minutes)
        .unwrap_or(scenario.policy.horizon);

    let runner = ExperimentRunner::new(&scenario)
        .with_base_seed(args.seed.unwrap_or(scenario.seed))
        .with_threads(args.threads);
    let outcome = runner.sweep(&configs, horizon, replications)?;

    print_dataset(&outcome.dataset);
    for failure in &outcome.failures {
        println!(
            "failed_config index={} {} error={:?}",
            failure.config_index,
            format_config(&failure.config),
            failure.error
        );
    }
    if let Some(path) = &args.csv_out {
        outcome.dataset.write_csv_file(path)?;
        eprintln!("wrote dataset to {}", path.display());
    }
    if let Some(path) = &args.json_out {
        outcome.dataset.write_json_file(path)?;
        eprintln!("wrote dataset to {}", path.display());
    }

    if !(args.optimize || args.validate) {
        return Ok(());
    }

    let predictor = OrdinaryLeastSquares::new().fit(&outcome.dataset)?;
    println!("coef name=intercept value={:.6}", predictor.intercept);
    for (name, coef) in &predictor.coefficients {
        println!("coef name={name:?} value={coef:.6}");
    }

    let spec = scenario.optimization.clone().ok_or_else(|| {
        SimError::Configuration("scenario has no optimization section".into())
    })?;
    let problem = OptimizationProblem::from_spec(&scenario, &spec)?;
    let best = ExhaustiveOptimizer.solve(&predictor, &problem)?;
    println!(
        "optimal predicted_tat={:.4} cost={:.2} candidates={}",
        best.predicted_tat, best.cost, best.candidates_checked
    );
    for name in problem.bounds.keys() {
        if let Some(cap) = best.capacities.get(name) {
            println!("optimal resource={name:?} capacity={cap}");
        }
    }

    if args.validate {
        let row = runner.evaluate(&best.capacities, horizon, replications)?;
        println!(
            "validated mean_tat={:.4} p90_tat={:.4} completed={:.1} predicted_tat={:.4}",
            row.mean_tat, row.p90_tat, row.completed, best.predicted_tat
        );
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
