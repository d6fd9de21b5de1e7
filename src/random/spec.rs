//! 分布描述
//!
//! 描述一个概率分布族及其参数，可由 JSON 配置反序列化。

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// 分布族 + 参数。所有分布都用于时长（分钟），因此取值必须非负。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// 指数分布（均值）
    Exponential { mean: f64 },
    /// 对数正态：底层正态分布的 mu/sigma
    LogNormal { mu: f64, sigma: f64 },
    Triangular { min: f64, mode: f64, max: f64 },
    Uniform { min: f64, max: f64 },
    /// 常数
    Deterministic { value: f64 },
    /// 经验表：按权重抽取 `values` 中的某一项；权重为空表示等概率
    Empirical {
        values: Vec<f64>,
        #[serde(default)]
        weights: Vec<f64>,
    },
}

fn finite_non_negative(x: f64) -> bool {
    x.is_finite() && x >= 0.0
}

impl DistributionSpec {
    pub fn deterministic(value: f64) -> Self {
        DistributionSpec::Deterministic { value }
    }

    pub fn exponential(mean: f64) -> Self {
        DistributionSpec::Exponential { mean }
    }

    pub fn uniform(min: f64, max: f64) -> Self {
        DistributionSpec::Uniform { min, max }
    }

    /// 分布族名称（用于日志与错误信息）
    pub fn family(&self) -> &'static str {
        match self {
            DistributionSpec::Exponential { .. } => "exponential",
            DistributionSpec::LogNormal { .. } => "log_normal",
            DistributionSpec::Triangular { .. } => "triangular",
            DistributionSpec::Uniform { .. } => "uniform",
            DistributionSpec::Deterministic { .. } => "deterministic",
            DistributionSpec::Empirical { .. } => "empirical",
        }
    }

    /// 检查参数是否落在分布的定义域内
    pub fn validate(&self) -> Result<()> {
        let bad = |why: String| Err(SimError::Sampling(format!("{}: {why}", self.family())));
        match self {
            DistributionSpec::Exponential { mean } => {
                if !(mean.is_finite() && *mean > 0.0) {
                    return bad(format!("mean must be positive, got {mean}"));
                }
            }
            DistributionSpec::LogNormal { mu, sigma } => {
                if !mu.is_finite() {
                    return bad(format!("mu must be finite, got {mu}"));
                }
                if !finite_non_negative(*sigma) {
                    return bad(format!("sigma must be non-negative, got {sigma}"));
                }
            }
            DistributionSpec::Triangular { min, mode, max } => {
                if !(finite_non_negative(*min) && mode.is_finite() && max.is_finite()) {
                    return bad(format!("bounds must be finite and non-negative: {min}/{mode}/{max}"));
                }
                if !(min < max && min <= mode && mode <= max) {
                    return bad(format!("need min <= mode <= max and min < max: {min}/{mode}/{max}"));
                }
            }
            DistributionSpec::Uniform { min, max } => {
                if !(finite_non_negative(*min) && max.is_finite()) {
                    return bad(format!("bounds must be finite and non-negative: {min}/{max}"));
                }
                if min > max {
                    return bad(format!("min {min} exceeds max {max}"));
                }
            }
            DistributionSpec::Deterministic { value } => {
                if !finite_non_negative(*value) {
                    return bad(format!("value must be non-negative, got {value}"));
                }
            }
            DistributionSpec::Empirical { values, weights } => {
                if values.is_empty() {
                    return bad("empty value table".to_string());
                }
                if let Some(v) = values.iter().find(|v| !finite_non_negative(**v)) {
                    return bad(format!("table value must be non-negative, got {v}"));
                }
                if !weights.is_empty() {
                    if weights.len() != values.len() {
                        return bad(format!(
                            "{} weights for {} values",
                            weights.len(),
                            values.len()
                        ));
                    }
                    if weights.iter().any(|w| !finite_non_negative(*w)) {
                        return bad("weights must be non-negative".to_string());
                    }
                    if weights.iter().sum::<f64>() <= 0.0 {
                        return bad("weights sum to zero".to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// 理论均值
    pub fn mean(&self) -> f64 {
        match self {
            DistributionSpec::Exponential { mean } => *mean,
            DistributionSpec::LogNormal { mu, sigma } => (mu + sigma * sigma / 2.0).exp(),
            DistributionSpec::Triangular { min, mode, max } => (min + mode + max) / 3.0,
            DistributionSpec::Uniform { min, max } => (min + max) / 2.0,
            DistributionSpec::Deterministic { value } => *value,
            DistributionSpec::Empirical { values, weights } => {
                if weights.is_empty() {
                    values.iter().sum::<f64>() / values.len().max(1) as f64
                } else {
                    let total: f64 = weights.iter().sum();
                    values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>() / total
                }
            }
        }
    }
}
