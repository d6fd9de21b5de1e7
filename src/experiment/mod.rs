//! Experiment layer
//!
//! Replicated capacity sweeps, a linear TAT surrogate fitted to the sweep,
//! and a constrained search for the capacity mix it predicts is best.

mod dataset;
mod design;
mod optimize;
mod regression;
mod runner;

pub use dataset::{Dataset, DatasetRow, ReplicationSummary};
pub use design::{designs_from_spec, full_factorial};
pub use optimize::{
    ExhaustiveOptimizer, LinearConstraint, OptimizationProblem, Optimizer, Recommendation,
    Relation,
};
pub use regression::{LinearPredictor, OrdinaryLeastSquares, RegressionModel};
pub use runner::{ConfigFailure, ExperimentRunner, SweepOutcome};
