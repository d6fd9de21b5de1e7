use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::experiment::LinearConstraint;
use crate::random::DistributionSpec;

/// Resource name -> capacity. Resources not listed keep their base capacity.
pub type ResourceConfig = BTreeMap<String, u32>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub horizon_minutes: f64,
    /// Patients arriving before this point are simulated but not counted.
    #[serde(default)]
    pub warmup_minutes: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub first_arrival: FirstArrival,
    #[serde(default)]
    pub cooldown: Cooldown,
    #[serde(default)]
    pub queue_sample_interval_minutes: Option<f64>,
    pub arrival: DistributionSpec,
    pub resources: Vec<ResourceSpec>,
    pub stages: Vec<StageSpec>,
    #[serde(default)]
    pub experiment: Option<ExperimentSpec>,
    #[serde(default)]
    pub optimization: Option<OptimizationSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub name: String,
    pub capacity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    /// All of these are held for the whole service.
    pub resources: Vec<String>,
    pub service: DistributionSpec,
    #[serde(default = "default_visit_probability")]
    pub visit_probability: f64,
}

fn default_visit_probability() -> f64 {
    1.0
}

fn default_replications() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstArrival {
    /// First patient arrives at t = 0.
    #[default]
    AtStart,
    /// First patient arrives after one inter-arrival draw.
    Drawn,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cooldown {
    /// No arrivals after the horizon; in-flight patients run to departure.
    #[default]
    Drain,
    /// Stop at the horizon; unfinished patients are reported as still in system.
    Truncate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentSpec {
    #[serde(default = "default_replications")]
    pub replications: u32,
    /// Explicit design points.
    #[serde(default)]
    pub designs: Vec<ResourceConfig>,
    /// Capacity levels per resource, expanded as a full factorial.
    #[serde(default)]
    pub grid: BTreeMap<String, Vec<u32>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationSpec {
    /// Inclusive [lo, hi] capacity bounds; unbounded resources stay fixed.
    #[serde(default)]
    pub bounds: BTreeMap<String, (u32, u32)>,
    #[serde(default)]
    pub costs: BTreeMap<String, f64>,
    #[serde(default)]
    pub max_cost: Option<f64>,
    #[serde(default)]
    pub constraints: Vec<LinearConstraint>,
    #[serde(default)]
    pub max_candidates: Option<u64>,
}
