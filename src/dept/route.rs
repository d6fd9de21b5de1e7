//! 病人路由计划
//!
//! 到达时抽取一次、之后确定性执行的阶段序列（例如化验/留观是否需要）。

use serde::{Deserialize, Serialize};

use super::id::StageId;
use crate::random::RandomVariateSource;

/// 阶段访问规则
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitRule {
    Always,
    /// 以给定概率访问
    WithProbability(f64),
}

impl VisitRule {
    pub fn from_probability(p: f64) -> Self {
        if p >= 1.0 {
            VisitRule::Always
        } else {
            VisitRule::WithProbability(p)
        }
    }
}

/// 一个病人要依次经过的阶段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutePlan {
    stages: Vec<StageId>,
}

impl RoutePlan {
    pub fn new(stages: Vec<StageId>) -> Self {
        Self { stages }
    }

    /// 按规则抽取路由。`Always` 的阶段不消耗随机数。
    ///
    /// 若所有阶段都被跳过，则只访问第一个阶段（病人至少要被分诊一次）。
    pub fn draw(rules: &[VisitRule], rng: &mut RandomVariateSource) -> Self {
        let mut stages = Vec::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            let visit = match rule {
                VisitRule::Always => true,
                VisitRule::WithProbability(p) => rng.uniform01() < *p,
            };
            if visit {
                stages.push(StageId(idx));
            }
        }
        if stages.is_empty() && !rules.is_empty() {
            stages.push(StageId(0));
        }
        Self { stages }
    }

    pub fn stages(&self) -> &[StageId] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<StageId> {
        self.stages.get(idx).copied()
    }
}
