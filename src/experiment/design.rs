//! Design matrices for capacity sweeps.

use std::collections::BTreeMap;

use crate::error::{Result, SimError};
use crate::scenario::{ExperimentSpec, ResourceConfig};

/// Cartesian product of per-resource capacity levels.
///
/// Resources absent from `grid` are left out of every config, so they keep
/// their base capacity when the config is resolved against a scenario.
pub fn full_factorial(grid: &BTreeMap<String, Vec<u32>>) -> Result<Vec<ResourceConfig>> {
    let mut configs = vec![ResourceConfig::new()];
    for (name, levels) in grid {
        if levels.is_empty() {
            return Err(SimError::config(format!(
                "grid for resource '{name}' has no levels"
            )));
        }
        configs = configs
            .into_iter()
            .flat_map(|partial| {
                levels.iter().map(move |&level| {
                    let mut next = partial.clone();
                    next.insert(name.clone(), level);
                    next
                })
            })
            .collect();
    }
    Ok(configs)
}

/// Explicit designs first, then the expanded grid (if any).
pub fn designs_from_spec(spec: &ExperimentSpec) -> Result<Vec<ResourceConfig>> {
    let mut configs = spec.designs.clone();
    if !spec.grid.is_empty() {
        configs.extend(full_factorial(&spec.grid)?);
    }
    Ok(configs)
}
