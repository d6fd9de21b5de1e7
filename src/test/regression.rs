use std::collections::BTreeMap;

use crate::SimError;
use crate::experiment::{Dataset, DatasetRow, OrdinaryLeastSquares, RegressionModel};
use crate::scenario::ResourceConfig;

fn row(index: usize, caps: &[(&str, u32)], mean_tat: f64) -> DatasetRow {
    let capacities: ResourceConfig = caps.iter().map(|&(n, c)| (n.to_string(), c)).collect();
    DatasetRow {
        config_index: index,
        capacities,
        replications: 1,
        mean_tat,
        p90_tat: mean_tat,
        completed: 10.0,
        utilization: BTreeMap::new(),
    }
}

fn planar_dataset() -> Dataset {
    let mut ds = Dataset::new(vec!["Doctor".into(), "Nurse".into(), "Bed".into()]);
    let mut i = 0;
    for d in 1..=3 {
        for n in 1..=2 {
            let tat = 100.0 - 10.0 * d as f64 - 5.0 * n as f64;
            ds.rows.push(row(i, &[("Doctor", d), ("Nurse", n), ("Bed", 4)], tat));
            i += 1;
        }
    }
    ds
}

#[test]
fn recovers_an_exact_plane() {
    let fit = OrdinaryLeastSquares::new()
        .fit(&planar_dataset())
        .expect("fit");
    assert!((fit.intercept - 100.0).abs() < 1e-8, "{fit:?}");
    assert!((fit.coefficients["Doctor"] + 10.0).abs() < 1e-8);
    assert!((fit.coefficients["Nurse"] + 5.0).abs() < 1e-8);
    // Constant column cannot be told apart from the intercept.
    assert_eq!(fit.coefficients["Bed"], 0.0);

    let cfg: ResourceConfig = [("Doctor".to_string(), 2), ("Nurse".to_string(), 2)]
        .into_iter()
        .collect();
    assert!((fit.predict(&cfg) - 70.0).abs() < 1e-8);
}

#[test]
fn feature_subset_is_respected() {
    let fit = OrdinaryLeastSquares::with_features(vec!["Doctor".into()])
        .fit(&planar_dataset())
        .expect("fit");
    assert_eq!(fit.coefficients.len(), 1);
    // Nurse effect averages into the intercept.
    assert!((fit.coefficients["Doctor"] + 10.0).abs() < 1e-8);
    assert!((fit.intercept - 92.5).abs() < 1e-8);

    let err = OrdinaryLeastSquares::with_features(vec!["Porter".into()])
        .fit(&planar_dataset())
        .expect_err("unknown feature");
    assert!(matches!(err, SimError::Regression(_)));
}

#[test]
fn too_few_rows_fail() {
    let mut ds = Dataset::new(vec!["Doctor".into(), "Nurse".into()]);
    ds.rows.push(row(0, &[("Doctor", 1), ("Nurse", 1)], 50.0));
    ds.rows.push(row(1, &[("Doctor", 2), ("Nurse", 2)], 40.0));
    let err = OrdinaryLeastSquares::new().fit(&ds).expect_err("2 rows, 3 params");
    assert!(matches!(err, SimError::Regression(_)));
}

#[test]
fn collinear_columns_fail() {
    let mut ds = Dataset::new(vec!["Doctor".into(), "Nurse".into()]);
    for (i, k) in (1..=4).enumerate() {
        ds.rows
            .push(row(i, &[("Doctor", k), ("Nurse", k)], 60.0 - k as f64));
    }
    let err = OrdinaryLeastSquares::new().fit(&ds).expect_err("singular");
    assert!(matches!(err, SimError::Regression(_)));
}
