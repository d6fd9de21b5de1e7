use std::collections::BTreeMap;

use super::fixtures::{build, stochastic_clinic};
use crate::SimError;
use crate::experiment::{
    DatasetRow, ExperimentRunner, ReplicationSummary, designs_from_spec, full_factorial,
};
use crate::scenario::{ExperimentSpec, ResourceConfig, Scenario};
use crate::sim::SimTime;

fn config(pairs: &[(&str, u32)]) -> ResourceConfig {
    pairs.iter().map(|&(n, c)| (n.to_string(), c)).collect()
}

/// Exponential arrivals into one station that a single server cannot keep up with.
fn bottleneck() -> Scenario {
    build(
        r#"{
            "schema_version": 1,
            "horizon_minutes": 1000,
            "seed": 4,
            "arrival": { "kind": "exponential", "mean": 5 },
            "resources": [ { "name": "Desk", "capacity": 1 } ],
            "stages": [ { "name": "desk", "resources": ["Desk"],
                          "service": { "kind": "uniform", "min": 4, "max": 9 } } ]
        }"#,
    )
}

/// Deterministic arrivals every minute into a 10-minute desk, cut at the horizon.
/// One desk never reaches a post-warm-up patient before t = 100.
fn saturated_desk() -> Scenario {
    build(
        r#"{
            "schema_version": 1,
            "horizon_minutes": 100,
            "warmup_minutes": 50,
            "cooldown": "truncate",
            "arrival": { "kind": "deterministic", "value": 1 },
            "resources": [ { "name": "Desk", "capacity": 1 } ],
            "stages": [ { "name": "desk", "resources": ["Desk"],
                          "service": { "kind": "deterministic", "value": 10 } } ]
        }"#,
    )
}

fn replication(mean_tat: Option<f64>, completed: usize, util: f64) -> ReplicationSummary {
    ReplicationSummary {
        seed: 0,
        mean_tat,
        p90_tat: mean_tat,
        completed,
        utilization: vec![util],
    }
}

#[test]
fn full_factorial_expands_in_key_order() {
    let mut grid = BTreeMap::new();
    grid.insert("Nurse".to_string(), vec![1, 2]);
    grid.insert("Doctor".to_string(), vec![1, 2, 3]);
    let configs = full_factorial(&grid).expect("grid");
    assert_eq!(configs.len(), 6);
    assert_eq!(configs[0], config(&[("Doctor", 1), ("Nurse", 1)]));
    assert_eq!(configs[1], config(&[("Doctor", 1), ("Nurse", 2)]));
    assert_eq!(configs[5], config(&[("Doctor", 3), ("Nurse", 2)]));

    assert_eq!(full_factorial(&BTreeMap::new()).expect("empty grid").len(), 1);
    grid.insert("Bed".to_string(), vec![]);
    assert!(full_factorial(&grid).is_err());
}

#[test]
fn explicit_designs_come_first() {
    let spec = ExperimentSpec {
        replications: 1,
        designs: vec![config(&[("Bed", 4)])],
        grid: [("Doctor".to_string(), vec![1, 2])].into_iter().collect(),
    };
    let configs = designs_from_spec(&spec).expect("designs");
    assert_eq!(configs.len(), 3);
    assert_eq!(configs[0], config(&[("Bed", 4)]));
}

#[test]
fn seeds_are_offsets_of_the_base() {
    let scenario = bottleneck();
    let runner = ExperimentRunner::new(&scenario).with_base_seed(10);
    assert_eq!(runner.seeds(3), vec![10, 11, 12]);
    assert_eq!(ExperimentRunner::new(&scenario).seeds(1), vec![4]);
}

#[test]
fn empty_sweep_is_configuration_error() {
    let scenario = bottleneck();
    let runner = ExperimentRunner::new(&scenario);
    let err = runner.sweep(&[], SimTime(100.0), 1).expect_err("empty");
    assert!(matches!(err, SimError::Configuration(_)));
    let err = runner
        .sweep(&[ResourceConfig::new()], SimTime(100.0), 0)
        .expect_err("zero replications");
    assert!(matches!(err, SimError::Configuration(_)));
}

#[test]
fn more_capacity_never_hurts_the_bottleneck() {
    let scenario = bottleneck();
    let runner = ExperimentRunner::new(&scenario);
    let configs = [config(&[("Desk", 1)]), config(&[("Desk", 2)])];
    let outcome = runner.sweep(&configs, SimTime(1000.0), 3).expect("sweep");
    assert!(outcome.failures.is_empty());
    let rows = &outcome.dataset.rows;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].replications, 3);
    assert!(
        rows[1].mean_tat <= rows[0].mean_tat,
        "c=2 {} vs c=1 {}",
        rows[1].mean_tat,
        rows[0].mean_tat
    );
    assert!(rows[0].utilization["Desk"] > rows[1].utilization["Desk"]);
}

#[test]
fn failing_config_is_isolated() {
    let scenario = stochastic_clinic("drain");
    let runner = ExperimentRunner::new(&scenario);
    let configs = [
        config(&[("Doctor", 1)]),
        config(&[("Porter", 2)]),
        config(&[("Doctor", 2)]),
    ];
    let outcome = runner.sweep(&configs, SimTime(1000.0), 1).expect("sweep");
    assert_eq!(outcome.dataset.len(), 2);
    let indices: Vec<usize> = outcome.dataset.rows.iter().map(|r| r.config_index).collect();
    assert_eq!(indices, vec![0, 2]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].config_index, 1);
    assert!(outcome.failures[0].error.contains("Porter"));
}

#[test]
fn thread_count_does_not_change_results() {
    let scenario = stochastic_clinic("drain");
    let configs = designs_from_spec(scenario.experiment.as_ref().expect("experiment"))
        .expect("designs");
    let one = ExperimentRunner::new(&scenario)
        .with_threads(Some(1))
        .sweep(&configs, SimTime(1000.0), 2)
        .expect("sweep");
    let four = ExperimentRunner::new(&scenario)
        .with_threads(Some(4))
        .sweep(&configs, SimTime(1000.0), 2)
        .expect("sweep");
    assert_eq!(one, four);
    assert_eq!(one.dataset.len(), 4);
}

#[test]
fn evaluate_matches_a_one_config_sweep() {
    let scenario = bottleneck();
    let runner = ExperimentRunner::new(&scenario);
    let cfg = config(&[("Desk", 2)]);
    let row = runner.evaluate(&cfg, SimTime(500.0), 2).expect("evaluate");
    let outcome = runner
        .sweep(std::slice::from_ref(&cfg), SimTime(500.0), 2)
        .expect("sweep");
    assert_eq!(row, outcome.dataset.rows[0]);
    assert!(runner.evaluate(&config(&[("Desk", 0)]), SimTime(500.0), 2).is_err());
}

#[test]
fn dataset_csv_has_one_line_per_row() {
    let scenario = stochastic_clinic("drain");
    let runner = ExperimentRunner::new(&scenario);
    let configs = [config(&[("Doctor", 1)]), config(&[("Doctor", 2)])];
    let outcome = runner.sweep(&configs, SimTime(1000.0), 1).expect("sweep");

    let mut buf = Vec::new();
    outcome.dataset.write_csv(&mut buf).expect("csv");
    let text = String::from_utf8(buf).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "config,Nurse,Doctor,Bed,mean_tat,p90_tat,completed,util_Nurse,util_Doctor,util_Bed"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("1,1,2,2,"));
}

#[test]
fn config_with_no_completions_is_a_failure_not_a_zero_row() {
    let scenario = saturated_desk();
    let runner = ExperimentRunner::new(&scenario);
    let configs = [config(&[("Desk", 1)]), config(&[("Desk", 20)])];
    let outcome = runner.sweep(&configs, SimTime(100.0), 2).expect("sweep");

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].config_index, 0);
    assert!(outcome.failures[0].error.contains("no patients completed"));

    let rows = &outcome.dataset.rows;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].config_index, 1);
    assert_eq!(rows[0].mean_tat, 10.0);
    assert_eq!(rows[0].completed, 40.0);
}

#[test]
fn row_tat_is_weighted_by_completions() {
    let resources = vec!["Desk".to_string()];
    let reps = [
        replication(None, 0, 1.0),
        replication(Some(5.0), 10, 0.5),
        replication(Some(9.0), 30, 0.6),
    ];
    let row = DatasetRow::from_replications(0, config(&[("Desk", 1)]), &resources, &reps)
        .expect("row");
    assert_eq!(row.replications, 3);
    assert_eq!(row.mean_tat, 8.0);
    assert_eq!(row.p90_tat, 8.0);
    assert_eq!(row.completed, 40.0 / 3.0);
    assert!((row.utilization["Desk"] - 0.7).abs() < 1e-12);

    let empty = [replication(None, 0, 1.0), replication(None, 0, 1.0)];
    assert!(DatasetRow::from_replications(0, config(&[("Desk", 1)]), &resources, &empty).is_none());
}
