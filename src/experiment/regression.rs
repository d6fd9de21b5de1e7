//! Linear surrogate for mean TAT as a function of capacities.

use std::collections::BTreeMap;

use serde::Serialize;

use super::dataset::Dataset;
use crate::error::{Result, SimError};
use crate::scenario::ResourceConfig;

const PIVOT_EPS: f64 = 1e-10;

/// Fitted `tat = intercept + sum(coef * capacity)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearPredictor {
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
}

impl LinearPredictor {
    /// Resources missing from `config` contribute nothing.
    pub fn predict(&self, config: &ResourceConfig) -> f64 {
        self.coefficients
            .iter()
            .filter_map(|(name, coef)| config.get(name).map(|&cap| coef * cap as f64))
            .fold(self.intercept, |acc, term| acc + term)
    }
}

pub trait RegressionModel {
    fn fit(&self, dataset: &Dataset) -> Result<LinearPredictor>;
}

/// Least squares via the normal equations.
///
/// Columns that never vary in the dataset cannot be separated from the
/// intercept; they get a zero coefficient.
#[derive(Debug, Clone, Default)]
pub struct OrdinaryLeastSquares {
    /// Restrict the fit to these resources. `None` means every resource.
    pub features: Option<Vec<String>>,
}

impl OrdinaryLeastSquares {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(features: Vec<String>) -> Self {
        Self {
            features: Some(features),
        }
    }
}

impl RegressionModel for OrdinaryLeastSquares {
    fn fit(&self, dataset: &Dataset) -> Result<LinearPredictor> {
        let candidates = self
            .features
            .clone()
            .unwrap_or_else(|| dataset.resources.clone());
        for name in &candidates {
            if !dataset.resources.contains(name) {
                return Err(SimError::Regression(format!("unknown feature '{name}'")));
            }
        }

        let column = |name: &str| -> Vec<f64> {
            dataset
                .rows
                .iter()
                .map(|row| row.capacity(name).unwrap_or_default() as f64)
                .collect()
        };
        let mut coefficients: BTreeMap<String, f64> = BTreeMap::new();
        let mut active = Vec::new();
        for name in candidates {
            let col = column(&name);
            let varies = col.windows(2).any(|w| w[0] != w[1]);
            if varies {
                active.push((name, col));
            } else {
                coefficients.insert(name, 0.0);
            }
        }

        let n = dataset.rows.len();
        let p = active.len() + 1;
        if n < p {
            return Err(SimError::Regression(format!(
                "{n} rows cannot fit {p} parameters"
            )));
        }

        // Design matrix with a leading column of ones.
        let x: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                std::iter::once(1.0)
                    .chain(active.iter().map(|(_, col)| col[i]))
                    .collect()
            })
            .collect();
        let y: Vec<f64> = dataset.rows.iter().map(|row| row.mean_tat).collect();

        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &target) in x.iter().zip(&y) {
            for a in 0..p {
                xty[a] += row[a] * target;
                for b in 0..p {
                    xtx[a][b] += row[a] * row[b];
                }
            }
        }

        let beta = solve(xtx, xty)?;
        for ((name, _), &b) in active.iter().zip(&beta[1..]) {
            coefficients.insert(name.clone(), b);
        }
        Ok(LinearPredictor {
            intercept: beta[0],
            coefficients,
        })
    }
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= PIVOT_EPS * scale {
            return Err(SimError::Regression("design matrix is singular".into()));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        let pivot_row = a[col].clone();
        let pivot_b = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_b;
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solve_small_system() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(a, vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn solve_rejects_singular() {
        let a = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve(a, vec![1.0, 2.0]).is_err());
    }
}
