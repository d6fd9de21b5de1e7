//! 随机变量源
//!
//! 可设种子的独立同分布抽样器：相同种子 + 相同调用序列 => 相同抽样序列。

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, LogNormal, Triangular, Uniform};

use super::spec::DistributionSpec;
use crate::error::{Result, SimError};

// 子流种子间隔，避免 `seed + 1` 的主流与 `seed` 的 1 号子流重合。
const STREAM_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
pub struct RandomVariateSource {
    rng: StdRng,
    draws: u64,
}

impl RandomVariateSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// 由同一个运行种子派生出独立的子流（到达、路由、各阶段服务各用一条）
    pub fn stream(seed: u64, stream_id: u64) -> Self {
        Self::new(seed.wrapping_add(stream_id.wrapping_add(1).wrapping_mul(STREAM_STRIDE)))
    }

    /// 已抽样次数
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// [0, 1) 上的均匀抽样
    pub fn uniform01(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen_range(0.0..1.0)
    }

    /// 从给定分布抽样；参数越界直接返回 `Sampling` 错误，不做修正
    pub fn sample(&mut self, dist: &DistributionSpec) -> Result<f64> {
        dist.validate()?;
        let rng = &mut self.rng;
        let value = match dist {
            DistributionSpec::Exponential { mean } => Exp::new(1.0 / mean)
                .map_err(|e| sampling(dist, e))?
                .sample(rng),
            DistributionSpec::LogNormal { mu, sigma } => LogNormal::new(*mu, *sigma)
                .map_err(|e| sampling(dist, e))?
                .sample(rng),
            DistributionSpec::Triangular { min, mode, max } => Triangular::new(*min, *max, *mode)
                .map_err(|e| sampling(dist, e))?
                .sample(rng),
            DistributionSpec::Uniform { min, max } => Uniform::new_inclusive(*min, *max).sample(rng),
            DistributionSpec::Deterministic { value } => *value,
            DistributionSpec::Empirical { values, weights } => {
                if weights.is_empty() {
                    values[rng.gen_range(0..values.len())]
                } else {
                    let idx = WeightedIndex::new(weights)
                        .map_err(|e| sampling(dist, e))?
                        .sample(rng);
                    values[idx]
                }
            }
        };
        self.draws += 1;
        Ok(value)
    }
}

fn sampling(dist: &DistributionSpec, e: impl std::fmt::Display) -> SimError {
    SimError::Sampling(format!("{}: {e}", dist.family()))
}
