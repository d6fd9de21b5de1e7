use super::fixtures::stochastic_clinic;
use crate::SimError;
use crate::dept::{ResourceId, VisitRule};
use crate::scenario::{Cooldown, FirstArrival, ResourceConfig, ScenarioSpec};

const MINIMAL: &str = r#"{
    "schema_version": 1,
    "horizon_minutes": 60,
    "arrival": { "kind": "exponential", "mean": 5 },
    "resources": [ { "name": "Desk", "capacity": 1 } ],
    "stages": [ { "name": "desk", "resources": ["Desk"],
                  "service": { "kind": "deterministic", "value": 2 } } ]
}"#;

fn build_err(json: &str) -> SimError {
    ScenarioSpec::from_json_str(json)
        .expect("parse")
        .build()
        .expect_err("build must fail")
}

fn with(key: &str, value: &str) -> String {
    let mut v: serde_json::Value = serde_json::from_str(MINIMAL).expect("minimal");
    v[key] = serde_json::from_str(value).expect("value");
    v.to_string()
}

#[test]
fn defaults_are_filled_in() {
    let scenario = ScenarioSpec::from_json_str(MINIMAL)
        .expect("parse")
        .build()
        .expect("build");
    assert_eq!(scenario.name, "scenario");
    assert_eq!(scenario.seed, 0);
    assert_eq!(scenario.policy.first_arrival, FirstArrival::AtStart);
    assert_eq!(scenario.policy.cooldown, Cooldown::Drain);
    assert_eq!(scenario.policy.warmup.as_minutes(), 0.0);
    assert_eq!(scenario.policy.queue_sample_interval, None);
    assert_eq!(scenario.stages[0].visit, VisitRule::Always);
    assert!(scenario.experiment.is_none());
}

#[test]
fn names_resolve_to_ids() {
    let scenario = stochastic_clinic("drain");
    assert_eq!(scenario.resource_id("Bed"), Some(ResourceId(2)));
    assert_eq!(scenario.resource_id("Porter"), None);
    assert_eq!(
        scenario.stages[1].resources,
        vec![ResourceId(1), ResourceId(2)]
    );
    assert_eq!(scenario.stages[1].visit, VisitRule::WithProbability(0.5));
    assert_eq!(scenario.resource_names(), vec!["Nurse", "Doctor", "Bed"]);
}

#[test]
fn resolve_config_fills_base_capacities() {
    let scenario = stochastic_clinic("drain");
    let partial: ResourceConfig = [("Doctor".to_string(), 3)].into_iter().collect();
    let full = scenario.resolve_config(&partial).expect("resolve");
    assert_eq!(full.len(), 3);
    assert_eq!(full["Doctor"], 3);
    assert_eq!(full["Nurse"], 1);
    assert_eq!(full["Bed"], 2);
    assert_eq!(scenario.capacities(&partial).expect("caps"), vec![1, 3, 2]);
}

#[test]
fn invalid_scenarios_are_configuration_errors() {
    let cases = [
        with("resources", r#"[]"#),
        with("stages", r#"[]"#),
        with("resources", r#"[{ "name": "Desk", "capacity": 0 }]"#),
        with(
            "resources",
            r#"[{ "name": "Desk", "capacity": 1 }, { "name": "Desk", "capacity": 2 }]"#,
        ),
        with("arrival", r#"{ "kind": "exponential", "mean": -3 }"#),
        with("arrival", r#"{ "kind": "deterministic", "value": 0 }"#),
        with(
            "stages",
            r#"[{ "name": "x", "resources": ["Nobody"], "service": { "kind": "deterministic", "value": 1 } }]"#,
        ),
        with(
            "stages",
            r#"[{ "name": "x", "resources": [], "service": { "kind": "deterministic", "value": 1 } }]"#,
        ),
        with(
            "stages",
            r#"[{ "name": "x", "resources": ["Desk", "Desk"], "service": { "kind": "deterministic", "value": 1 } }]"#,
        ),
        with(
            "stages",
            r#"[{ "name": "x", "resources": ["Desk"], "service": { "kind": "uniform", "min": 5, "max": 1 } }]"#,
        ),
        with(
            "stages",
            r#"[{ "name": "x", "resources": ["Desk"], "visit_probability": 1.5, "service": { "kind": "deterministic", "value": 1 } }]"#,
        ),
        with("horizon_minutes", "0"),
        with("warmup_minutes", "60"),
        with("warmup_minutes", "-1"),
        with("queue_sample_interval_minutes", "0"),
    ];
    for json in &cases {
        let err = build_err(json);
        assert!(matches!(err, SimError::Configuration(_)), "{json} -> {err}");
    }
}

#[test]
fn malformed_json_is_reported() {
    let err = ScenarioSpec::from_json_str("{ not json").expect_err("parse");
    assert!(matches!(err, SimError::Json(_)));
}

#[test]
fn preset_matches_department_layout() {
    let spec = crate::scenario::emergency_department_spec();
    let scenario = spec.build().expect("preset");
    assert_eq!(scenario.policy.first_arrival, FirstArrival::Drawn);
    assert_eq!(scenario.policy.warmup.as_days(), 160.0);
    assert_eq!(scenario.policy.horizon.as_days(), 360.0);
    let experiment = scenario.experiment.as_ref().expect("experiment");
    assert_eq!(experiment.grid.len(), 3);
    let opt = scenario.optimization.as_ref().expect("optimization");
    assert_eq!(opt.max_cost, Some(11000.0));

    // Round-trips through JSON unchanged.
    let raw = serde_json::to_string(&spec).expect("serialize");
    let again = ScenarioSpec::from_json_str(&raw).expect("parse");
    assert_eq!(again.build().expect("build").resource_names(), scenario.resource_names());
}
