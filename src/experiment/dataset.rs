//! Tabular output handed to the regression stage.
//!
//! One row per evaluated configuration: the capacities, the mean TAT over
//! replications and the mean utilization of every resource. TAT columns
//! are weighted by completed patients; replications where nobody finished
//! after warm-up contribute no TAT at all.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::dept::RunStatistics;
use crate::error::Result;
use crate::scenario::ResourceConfig;

/// The handful of numbers kept from one replication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationSummary {
    pub seed: u64,
    /// `None` when no patient completed after warm-up.
    pub mean_tat: Option<f64>,
    pub p90_tat: Option<f64>,
    pub completed: usize,
    /// Indexed like the scenario's resources.
    pub utilization: Vec<f64>,
}

impl From<&RunStatistics> for ReplicationSummary {
    fn from(stats: &RunStatistics) -> Self {
        Self {
            seed: stats.seed,
            mean_tat: stats.tat.as_ref().map(|t| t.mean),
            p90_tat: stats.tat.as_ref().map(|t| t.p90),
            completed: stats.completed(),
            utilization: stats.resources.iter().map(|r| r.utilization).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetRow {
    pub config_index: usize,
    /// Fully resolved: one entry per resource.
    pub capacities: ResourceConfig,
    pub replications: u32,
    pub mean_tat: f64,
    pub p90_tat: f64,
    /// Mean completed patients per replication.
    pub completed: f64,
    pub utilization: BTreeMap<String, f64>,
}

impl DatasetRow {
    /// Average replications of one config. Returns `None` when no
    /// replication completed a single patient after warm-up.
    pub fn from_replications(
        config_index: usize,
        capacities: ResourceConfig,
        resources: &[String],
        reps: &[ReplicationSummary],
    ) -> Option<Self> {
        let mean_tat = weighted_by_completed(reps, |r| r.mean_tat)?;
        let p90_tat = weighted_by_completed(reps, |r| r.p90_tat)?;
        let utilization = resources
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let u = mean_of(reps, |r| r.utilization.get(i).copied().unwrap_or_default());
                (name.clone(), u)
            })
            .collect();
        Some(Self {
            config_index,
            capacities,
            replications: reps.len() as u32,
            mean_tat,
            p90_tat,
            completed: mean_of(reps, |r| r.completed as f64),
            utilization,
        })
    }

    pub fn capacity(&self, resource: &str) -> Option<u32> {
        self.capacities.get(resource).copied()
    }
}

fn mean_of(reps: &[ReplicationSummary], f: impl Fn(&ReplicationSummary) -> f64) -> f64 {
    if reps.is_empty() {
        return 0.0;
    }
    reps.iter().map(f).sum::<f64>() / reps.len() as f64
}

fn weighted_by_completed(
    reps: &[ReplicationSummary],
    f: impl Fn(&ReplicationSummary) -> Option<f64>,
) -> Option<f64> {
    let (sum, weight) = reps
        .iter()
        .filter(|r| r.completed > 0)
        .filter_map(|r| f(r).map(|v| (v, r.completed as f64)))
        .fold((0.0, 0.0), |(s, w), (v, n)| (s + v * n, w + n));
    (weight > 0.0).then(|| sum / weight)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    /// Column order for capacity and utilization columns.
    pub resources: Vec<String>,
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(resources: Vec<String>) -> Self {
        Self {
            resources,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["config".to_string()];
        header.extend(self.resources.iter().cloned());
        header.extend(
            ["mean_tat", "p90_tat", "completed"]
                .iter()
                .map(|s| s.to_string()),
        );
        header.extend(self.resources.iter().map(|r| format!("util_{r}")));
        header
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.header())?;
        for row in &self.rows {
            let mut record = vec![row.config_index.to_string()];
            for r in &self.resources {
                record.push(row.capacity(r).unwrap_or_default().to_string());
            }
            record.push(row.mean_tat.to_string());
            record.push(row.p90_tat.to_string());
            record.push(row.completed.to_string());
            for r in &self.resources {
                let u = row.utilization.get(r).copied().unwrap_or_default();
                record.push(u.to_string());
            }
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    pub fn write_json_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
