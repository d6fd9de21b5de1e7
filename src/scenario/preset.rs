//! Built-in emergency-department scenario.
//!
//! Eleven stages over twelve staffed resources, log-normal arrivals and
//! uniform service times, 160 days of warm-up inside a 360-day horizon.

use std::collections::BTreeMap;

use super::spec::{
    Cooldown, ExperimentSpec, FirstArrival, OptimizationSpec, ResourceSpec, ScenarioSpec,
    StageSpec,
};
use crate::random::DistributionSpec;

const DAY_MINUTES: f64 = 24.0 * 60.0;

const RESOURCES: &[(&str, u32)] = &[
    ("Stretcher", 2),
    ("ED Doc", 1),
    ("Para Staff", 2),
    ("Bill Counter", 3),
    ("Lab Eqpt", 2),
    ("UltraSound", 2),
    ("Surgeon", 1),
    ("Surgery Staff", 1),
    ("Specialist", 1),
    ("Specialist Staff", 2),
    ("Orthodoctor", 1),
    ("Doctor", 1),
];

const STAGES: &[(&str, &[&str], f64, f64)] = &[
    ("Stretcher Allocation", &["Stretcher"], 10.0, 15.0),
    ("Patient Doc Check", &["Doctor", "Para Staff"], 10.0, 30.0),
    ("Payment Check", &["Bill Counter"], 5.0, 20.0),
    ("Lab Investigation", &["Lab Eqpt"], 15.0, 120.0),
    ("Ultrasonic Investigation", &["UltraSound"], 10.0, 20.0),
    ("Re-Examination Doc Check", &["ED Doc", "Para Staff"], 10.0, 45.0),
    ("Surgery Ward Allocation", &["Surgery Staff"], 15.0, 25.0),
    ("Surgeon Check", &["Surgeon"], 10.0, 20.0),
    ("Specialist Ward Allocation", &["Specialist Staff"], 5.0, 15.0),
    ("Specialist Check", &["Specialist"], 5.0, 20.0),
    ("Operating Theatre Allocation", &["Orthodoctor"], 20.0, 45.0),
];

/// The department as a `ScenarioSpec`, ready to be tweaked or built.
pub fn emergency_department_spec() -> ScenarioSpec {
    let resources = RESOURCES
        .iter()
        .map(|&(name, capacity)| ResourceSpec {
            name: name.to_string(),
            capacity,
        })
        .collect();
    let stages = STAGES
        .iter()
        .map(|&(name, resources, min, max)| StageSpec {
            name: name.to_string(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            service: DistributionSpec::uniform(min, max),
            visit_probability: 1.0,
        })
        .collect();

    let mut grid = BTreeMap::new();
    grid.insert("Stretcher".to_string(), vec![1, 2, 3]);
    grid.insert("Doctor".to_string(), vec![1, 2, 3]);
    grid.insert("Para Staff".to_string(), vec![1, 2, 3]);

    let mut bounds = BTreeMap::new();
    let mut costs = BTreeMap::new();
    for (name, cost) in [("Stretcher", 500.0), ("Doctor", 1000.0), ("Para Staff", 400.0)] {
        bounds.insert(name.to_string(), (1, 3));
        costs.insert(name.to_string(), cost);
    }

    ScenarioSpec {
        schema_version: 1,
        name: Some("emergency_department".to_string()),
        horizon_minutes: 360.0 * DAY_MINUTES,
        warmup_minutes: 160.0 * DAY_MINUTES,
        seed: 0,
        first_arrival: FirstArrival::Drawn,
        cooldown: Cooldown::Drain,
        queue_sample_interval_minutes: None,
        arrival: DistributionSpec::LogNormal {
            mu: 12.73_f64.ln(),
            sigma: 6.16_f64.ln(),
        },
        resources,
        stages,
        experiment: Some(ExperimentSpec {
            replications: 3,
            designs: Vec::new(),
            grid,
        }),
        optimization: Some(OptimizationSpec {
            bounds,
            costs,
            max_cost: Some(11_000.0),
            constraints: Vec::new(),
            max_candidates: None,
        }),
    }
}
