//! 场景构建
//!
//! 校验 `ScenarioSpec` 并把名字解析为资源/阶段编号，得到运行时使用的 `Scenario`。

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use super::spec::{
    Cooldown, ExperimentSpec, FirstArrival, OptimizationSpec, ResourceConfig, ScenarioSpec,
};
use crate::dept::{ResourceId, StageId, VisitRule};
use crate::error::{Result, SimError};
use crate::random::DistributionSpec;
use crate::sim::SimTime;

/// 资源定义（基准容量）
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub id: ResourceId,
    pub name: String,
    pub capacity: u32,
}

/// 阶段定义
#[derive(Debug, Clone)]
pub struct StageDef {
    pub id: StageId,
    pub name: String,
    pub resources: Vec<ResourceId>,
    pub service: DistributionSpec,
    pub visit: VisitRule,
}

/// 单次运行的策略参数
#[derive(Debug, Clone, Copy)]
pub struct RunPolicy {
    pub horizon: SimTime,
    pub warmup: SimTime,
    pub first_arrival: FirstArrival,
    pub cooldown: Cooldown,
    /// 队长时间序列的采样间隔（分钟）；None 表示不采样
    pub queue_sample_interval: Option<f64>,
}

/// 运行时场景：已校验、已解析
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub arrival: DistributionSpec,
    pub resources: Vec<ResourceDef>,
    pub stages: Vec<StageDef>,
    pub policy: RunPolicy,
    pub experiment: Option<ExperimentSpec>,
    pub optimization: Option<OptimizationSpec>,
}

impl ScenarioSpec {
    /// 从 JSON 文本解析
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 从 JSON 文件读取
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// 校验并解析为运行时场景；任何问题都在仿真开始前报告
    pub fn build(&self) -> Result<Scenario> {
        if self.resources.is_empty() {
            return Err(SimError::config("scenario has no resources"));
        }
        if self.stages.is_empty() {
            return Err(SimError::config("scenario has no stages"));
        }

        let mut by_name = BTreeMap::new();
        let mut resources = Vec::with_capacity(self.resources.len());
        for (idx, r) in self.resources.iter().enumerate() {
            if r.capacity == 0 {
                return Err(SimError::config(format!(
                    "resource '{}' must have positive capacity",
                    r.name
                )));
            }
            if by_name.insert(r.name.clone(), ResourceId(idx)).is_some() {
                return Err(SimError::config(format!("duplicate resource '{}'", r.name)));
            }
            resources.push(ResourceDef {
                id: ResourceId(idx),
                name: r.name.clone(),
                capacity: r.capacity,
            });
        }

        self.arrival
            .validate()
            .map_err(|e| SimError::config(format!("arrival process: {e}")))?;
        if self.arrival.mean() <= 0.0 {
            return Err(SimError::config(
                "arrival process must have a positive mean inter-arrival time",
            ));
        }

        let mut stages = Vec::with_capacity(self.stages.len());
        for (idx, s) in self.stages.iter().enumerate() {
            if s.resources.is_empty() {
                return Err(SimError::config(format!("stage '{}' uses no resources", s.name)));
            }
            let mut seen = HashSet::new();
            let mut ids = Vec::with_capacity(s.resources.len());
            for name in &s.resources {
                let id = *by_name.get(name).ok_or_else(|| {
                    SimError::config(format!("stage '{}' uses unknown resource '{name}'", s.name))
                })?;
                if !seen.insert(id) {
                    return Err(SimError::config(format!(
                        "stage '{}' lists resource '{name}' twice",
                        s.name
                    )));
                }
                ids.push(id);
            }
            s.service
                .validate()
                .map_err(|e| SimError::config(format!("stage '{}' service: {e}", s.name)))?;
            let p = s.visit_probability;
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::config(format!(
                    "stage '{}' visit_probability {p} outside [0, 1]",
                    s.name
                )));
            }
            stages.push(StageDef {
                id: StageId(idx),
                name: s.name.clone(),
                resources: ids,
                service: s.service.clone(),
                visit: VisitRule::from_probability(p),
            });
        }

        let horizon = SimTime::from_minutes(self.horizon_minutes);
        if !(horizon.is_valid() && horizon > SimTime::ZERO) {
            return Err(SimError::config(format!(
                "horizon must be positive, got {}",
                self.horizon_minutes
            )));
        }
        let warmup = SimTime::from_minutes(self.warmup_minutes);
        if !warmup.is_valid() || warmup >= horizon {
            return Err(SimError::config(format!(
                "warmup {} must be non-negative and shorter than the horizon {}",
                self.warmup_minutes, self.horizon_minutes
            )));
        }
        if let Some(dt) = self.queue_sample_interval_minutes {
            if !(dt.is_finite() && dt > 0.0) {
                return Err(SimError::config(format!(
                    "queue sample interval must be positive, got {dt}"
                )));
            }
        }

        Ok(Scenario {
            name: self.name.clone().unwrap_or_else(|| "scenario".to_string()),
            seed: self.seed,
            arrival: self.arrival.clone(),
            resources,
            stages,
            policy: RunPolicy {
                horizon,
                warmup,
                first_arrival: self.first_arrival,
                cooldown: self.cooldown,
                queue_sample_interval: self.queue_sample_interval_minutes,
            },
            experiment: self.experiment.clone(),
            optimization: self.optimization.clone(),
        })
    }
}

impl Scenario {
    /// 按名字查找资源
    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resources.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn resource_names(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.name.clone()).collect()
    }

    /// 基准容量配置
    pub fn base_config(&self) -> ResourceConfig {
        self.resources
            .iter()
            .map(|r| (r.name.clone(), r.capacity))
            .collect()
    }

    /// 把容量覆盖解析为按资源编号排列的容量向量
    pub fn capacities(&self, config: &ResourceConfig) -> Result<Vec<u32>> {
        let mut caps: Vec<u32> = self.resources.iter().map(|r| r.capacity).collect();
        for (name, &cap) in config {
            let id = self
                .resource_id(name)
                .ok_or_else(|| SimError::config(format!("unknown resource '{name}'")))?;
            if cap == 0 {
                return Err(SimError::config(format!(
                    "resource '{name}' must have positive capacity"
                )));
            }
            caps[id.0] = cap;
        }
        Ok(caps)
    }

    /// 基准配置叠加覆盖后的完整配置（每个资源一项）
    pub fn resolve_config(&self, config: &ResourceConfig) -> Result<ResourceConfig> {
        let caps = self.capacities(config)?;
        Ok(self
            .resources
            .iter()
            .zip(caps)
            .map(|(r, c)| (r.name.clone(), c))
            .collect())
    }

    /// 每个阶段的访问规则（按阶段编号排列）
    pub fn visit_rules(&self) -> Vec<VisitRule> {
        self.stages.iter().map(|s| s.visit).collect()
    }
}
