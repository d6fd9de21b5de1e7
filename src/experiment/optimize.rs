//! Capacity recommendation under linear constraints.
//!
//! The objective is the fitted TAT predictor; decision variables are integer
//! capacities inside per-resource bounds. Resources without bounds keep their
//! base capacity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::regression::LinearPredictor;
use crate::error::{Result, SimError};
use crate::scenario::{OptimizationSpec, ResourceConfig, Scenario};

const TOLERANCE: f64 = 1e-9;
const DEFAULT_MAX_CANDIDATES: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// sum(terms) <= rhs
    Le,
    /// sum(terms) >= rhs
    Ge,
}

/// `sum(coef * capacity) (<= | >=) rhs` over named resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    #[serde(default)]
    pub name: Option<String>,
    pub terms: BTreeMap<String, f64>,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn budget(costs: &BTreeMap<String, f64>, max_cost: f64) -> Self {
        Self {
            name: Some("budget".into()),
            terms: costs.clone(),
            relation: Relation::Le,
            rhs: max_cost,
        }
    }

    pub fn lhs(&self, config: &ResourceConfig) -> f64 {
        self.terms
            .iter()
            .map(|(name, coef)| coef * config.get(name).copied().unwrap_or_default() as f64)
            .sum()
    }

    pub fn is_satisfied(&self, config: &ResourceConfig) -> bool {
        let lhs = self.lhs(config);
        match self.relation {
            Relation::Le => lhs <= self.rhs + TOLERANCE,
            Relation::Ge => lhs >= self.rhs - TOLERANCE,
        }
    }

    fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationProblem {
    /// Full config; unbounded resources are held at these values.
    pub base: ResourceConfig,
    pub bounds: BTreeMap<String, (u32, u32)>,
    pub costs: BTreeMap<String, f64>,
    pub constraints: Vec<LinearConstraint>,
    pub max_candidates: u64,
}

impl OptimizationProblem {
    /// Resolve names against the scenario. A `max_cost` becomes a budget
    /// constraint ahead of the user constraints.
    pub fn from_spec(scenario: &Scenario, spec: &OptimizationSpec) -> Result<Self> {
        let known = |name: &str| scenario.resource_id(name).is_some();
        if spec.bounds.is_empty() {
            return Err(SimError::config("optimization needs at least one bounded resource"));
        }
        for (name, &(lo, hi)) in &spec.bounds {
            if !known(name) {
                return Err(SimError::config(format!("bounds name unknown resource '{name}'")));
            }
            if lo == 0 || lo > hi {
                return Err(SimError::config(format!(
                    "bounds for '{name}' must satisfy 1 <= lo <= hi, got ({lo}, {hi})"
                )));
            }
        }
        for (name, cost) in &spec.costs {
            if !known(name) {
                return Err(SimError::config(format!("cost for unknown resource '{name}'")));
            }
            if !cost.is_finite() {
                return Err(SimError::config(format!("cost for '{name}' is not finite")));
            }
        }
        for c in &spec.constraints {
            if let Some(name) = c.terms.keys().find(|n| !known(n)) {
                return Err(SimError::config(format!(
                    "constraint '{}' names unknown resource '{name}'",
                    c.label()
                )));
            }
        }

        let mut constraints = Vec::with_capacity(spec.constraints.len() + 1);
        if let Some(max_cost) = spec.max_cost {
            constraints.push(LinearConstraint::budget(&spec.costs, max_cost));
        }
        constraints.extend(spec.constraints.iter().cloned());

        Ok(Self {
            base: scenario.base_config(),
            bounds: spec.bounds.clone(),
            costs: spec.costs.clone(),
            constraints,
            max_candidates: spec.max_candidates.unwrap_or(DEFAULT_MAX_CANDIDATES),
        })
    }

    pub fn cost(&self, config: &ResourceConfig) -> f64 {
        self.costs
            .iter()
            .map(|(name, c)| c * config.get(name).copied().unwrap_or_default() as f64)
            .sum()
    }

    pub fn is_feasible(&self, config: &ResourceConfig) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(config))
    }

    /// Number of points in the bounded box, or `None` on overflow.
    pub fn candidate_count(&self) -> Option<u64> {
        self.bounds
            .values()
            .try_fold(1u64, |acc, &(lo, hi)| {
                acc.checked_mul(u64::from(hi.saturating_sub(lo)) + 1)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub capacities: ResourceConfig,
    pub predicted_tat: f64,
    pub cost: f64,
    pub candidates_checked: u64,
}

pub trait Optimizer {
    fn solve(
        &self,
        predictor: &LinearPredictor,
        problem: &OptimizationProblem,
    ) -> Result<Recommendation>;
}

/// Enumerates every integer point in the bounds.
///
/// Ties on predicted TAT go to the cheaper config, then to the first config
/// in lexicographic order of the bounded resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveOptimizer;

impl Optimizer for ExhaustiveOptimizer {
    fn solve(
        &self,
        predictor: &LinearPredictor,
        problem: &OptimizationProblem,
    ) -> Result<Recommendation> {
        if let Some((name, (lo, hi))) = problem
            .bounds
            .iter()
            .find(|(_, (lo, hi))| *lo == 0 || lo > hi)
        {
            return Err(SimError::Optimization(format!(
                "invalid bounds for '{name}': ({lo}, {hi})"
            )));
        }
        let total = problem
            .candidate_count()
            .filter(|&n| n <= problem.max_candidates)
            .ok_or_else(|| {
                SimError::Optimization(format!(
                    "search space exceeds {} candidates",
                    problem.max_candidates
                ))
            })?;
        info!(candidates = total, "searching capacity space");

        let names: Vec<&String> = problem.bounds.keys().collect();
        let lows: Vec<u32> = problem.bounds.values().map(|&(lo, _)| lo).collect();
        let highs: Vec<u32> = problem.bounds.values().map(|&(_, hi)| hi).collect();
        let mut point = lows.clone();
        let mut best: Option<Recommendation> = None;
        let mut checked = 0u64;

        loop {
            let mut config = problem.base.clone();
            for (name, &v) in names.iter().zip(&point) {
                config.insert((*name).clone(), v);
            }
            checked += 1;

            if problem.is_feasible(&config) {
                let tat = predictor.predict(&config);
                let cost = problem.cost(&config);
                let better = match &best {
                    None => true,
                    Some(b) => {
                        tat < b.predicted_tat - TOLERANCE
                            || ((tat - b.predicted_tat).abs() <= TOLERANCE
                                && cost < b.cost - TOLERANCE)
                    }
                };
                if better {
                    debug!(?config, tat, cost, "new incumbent");
                    best = Some(Recommendation {
                        capacities: config,
                        predicted_tat: tat,
                        cost,
                        candidates_checked: 0,
                    });
                }
            }

            // Odometer step; the last bounded resource varies fastest.
            let mut i = point.len();
            loop {
                if i == 0 {
                    return best
                        .map(|mut r| {
                            r.candidates_checked = checked;
                            r
                        })
                        .ok_or_else(|| {
                            SimError::Optimization("no feasible capacity configuration".into())
                        });
                }
                i -= 1;
                if point[i] < highs[i] {
                    point[i] += 1;
                    break;
                }
                point[i] = lows[i];
            }
        }
    }
}
