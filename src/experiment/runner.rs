//! Parallel replication runs for capacity sweeps.
//!
//! Every (config, replication) pair is an independent run with its own
//! engine state, so the work fans out on a rayon pool. Results come back in
//! input order regardless of thread count.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::dataset::{Dataset, DatasetRow, ReplicationSummary};
use crate::dept::SimulationEngine;
use crate::error::{Result, SimError};
use crate::scenario::{ResourceConfig, Scenario};
use crate::sim::SimTime;

const NO_COMPLETIONS: &str = "no patients completed after warm-up";

/// A config that could not be evaluated. The rest of the sweep still runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigFailure {
    pub config_index: usize,
    pub config: ResourceConfig,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepOutcome {
    pub dataset: Dataset,
    pub failures: Vec<ConfigFailure>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExperimentRunner<'a> {
    scenario: &'a Scenario,
    base_seed: u64,
    threads: Option<usize>,
}

impl<'a> ExperimentRunner<'a> {
    /// Uses the scenario seed as the base seed and rayon's default thread count.
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            base_seed: scenario.seed,
            threads: None,
        }
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Replication `r` runs with `base_seed + r` for every config.
    pub fn seeds(&self, replications: u32) -> Vec<u64> {
        (0..replications as u64)
            .map(|r| self.base_seed.wrapping_add(r))
            .collect()
    }

    /// Mean of `replications` runs of one config.
    pub fn evaluate(
        &self,
        config: &ResourceConfig,
        horizon: SimTime,
        replications: u32,
    ) -> Result<DatasetRow> {
        let mut outcome = self.sweep(std::slice::from_ref(config), horizon, replications)?;
        match outcome.failures.pop() {
            Some(failure) => Err(SimError::config(failure.error)),
            None => outcome
                .dataset
                .rows
                .pop()
                .ok_or_else(|| SimError::invariant("sweep returned no row")),
        }
    }

    #[tracing::instrument(skip(self, configs), fields(configs = configs.len()))]
    pub fn sweep(
        &self,
        configs: &[ResourceConfig],
        horizon: SimTime,
        replications: u32,
    ) -> Result<SweepOutcome> {
        if configs.is_empty() {
            return Err(SimError::config("experiment has no configurations"));
        }
        if replications == 0 {
            return Err(SimError::config("replications must be at least 1"));
        }

        let mut failures = Vec::new();
        let mut resolved = Vec::with_capacity(configs.len());
        for (index, config) in configs.iter().enumerate() {
            match self.scenario.resolve_config(config) {
                Ok(full) => resolved.push((index, full)),
                Err(err) => {
                    warn!(config_index = index, error = %err, "skipping invalid config");
                    failures.push(ConfigFailure {
                        config_index: index,
                        config: config.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        let seeds = self.seeds(replications);
        let jobs: Vec<(usize, u64)> = (0..resolved.len())
            .flat_map(|slot| seeds.iter().map(move |&seed| (slot, seed)))
            .collect();
        info!(
            jobs = jobs.len(),
            threads = ?self.threads,
            "running sweep"
        );

        let engine = SimulationEngine::new(self.scenario);
        let pool = self.build_pool()?;
        let results: Vec<Result<ReplicationSummary>> = pool.install(|| {
            jobs.par_iter()
                .map(|&(slot, seed)| {
                    engine
                        .run(horizon, &resolved[slot].1, seed)
                        .map(|stats| ReplicationSummary::from(&stats))
                })
                .collect()
        });

        let mut dataset = Dataset::new(self.scenario.resource_names());
        let per_config = seeds.len();
        let mut results = results.into_iter();
        for (index, full) in resolved {
            let chunk: Vec<Result<ReplicationSummary>> =
                results.by_ref().take(per_config).collect();
            match chunk.into_iter().collect::<Result<Vec<_>>>() {
                Ok(reps) => {
                    match DatasetRow::from_replications(index, full, &dataset.resources, &reps) {
                        Some(row) => {
                            info!(
                                config_index = index,
                                mean_tat = row.mean_tat,
                                "config evaluated"
                            );
                            dataset.rows.push(row);
                        }
                        None => {
                            warn!(config_index = index, "no patients completed after warm-up");
                            failures.push(ConfigFailure {
                                config_index: index,
                                config: configs[index].clone(),
                                error: NO_COMPLETIONS.to_string(),
                            });
                        }
                    }
                }
                Err(err) => {
                    warn!(config_index = index, error = %err, "config failed");
                    failures.push(ConfigFailure {
                        config_index: index,
                        config: configs[index].clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        failures.sort_by_key(|f| f.config_index);

        Ok(SweepOutcome { dataset, failures })
    }

    fn build_pool(&self) -> Result<rayon::ThreadPool> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        builder
            .build()
            .map_err(|e| SimError::config(format!("failed to build thread pool: {e}")))
    }
}
