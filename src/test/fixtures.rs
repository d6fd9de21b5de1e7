use crate::scenario::{Scenario, ScenarioSpec};

pub(crate) fn build(json: &str) -> Scenario {
    ScenarioSpec::from_json_str(json)
        .expect("parse scenario")
        .build()
        .expect("build scenario")
}

/// One station, deterministic gaps and service, first arrival at t = 0.
pub(crate) fn single_station(gap: f64, service: f64, horizon: f64, capacity: u32) -> Scenario {
    build(&format!(
        r#"{{
            "schema_version": 1,
            "name": "single",
            "horizon_minutes": {horizon},
            "arrival": {{ "kind": "deterministic", "value": {gap} }},
            "resources": [ {{ "name": "Desk", "capacity": {capacity} }} ],
            "stages": [
                {{ "name": "desk", "resources": ["Desk"],
                   "service": {{ "kind": "deterministic", "value": {service} }} }}
            ]
        }}"#
    ))
}

/// Exponential arrivals into a two-stage flow where the second stage needs
/// two resources at once and is visited by roughly half of the patients.
pub(crate) fn stochastic_clinic(cooldown: &str) -> Scenario {
    build(&format!(
        r#"{{
            "schema_version": 1,
            "name": "clinic",
            "horizon_minutes": 2000,
            "warmup_minutes": 200,
            "seed": 11,
            "cooldown": "{cooldown}",
            "queue_sample_interval_minutes": 60,
            "arrival": {{ "kind": "exponential", "mean": 6 }},
            "resources": [
                {{ "name": "Nurse", "capacity": 1 }},
                {{ "name": "Doctor", "capacity": 1 }},
                {{ "name": "Bed", "capacity": 2 }}
            ],
            "stages": [
                {{ "name": "triage", "resources": ["Nurse"],
                   "service": {{ "kind": "triangular", "min": 1, "mode": 3, "max": 6 }} }},
                {{ "name": "consult", "resources": ["Doctor", "Bed"],
                   "service": {{ "kind": "uniform", "min": 4, "max": 9 }},
                   "visit_probability": 0.5 }}
            ],
            "experiment": {{
                "replications": 2,
                "grid": {{ "Doctor": [1, 2], "Nurse": [1, 2] }}
            }},
            "optimization": {{
                "bounds": {{ "Doctor": [1, 3], "Nurse": [1, 3] }},
                "costs": {{ "Doctor": 1000, "Nurse": 400 }},
                "max_cost": 2800
            }}
        }}"#
    ))
}
