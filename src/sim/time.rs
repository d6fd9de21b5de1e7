//! 仿真时间类型
//!
//! 定义仿真时间（分钟）及其单位转换。

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

const MINUTES_PER_HOUR: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 24.0 * MINUTES_PER_HOUR;

/// 仿真时间（自运行开始以来的分钟数，非负实数）。
///
/// 使用 `f64::total_cmp` 实现全序，便于放入 `BinaryHeap`。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn from_minutes(m: f64) -> SimTime {
        SimTime(m)
    }
    pub fn from_hours(h: f64) -> SimTime {
        SimTime(h * MINUTES_PER_HOUR)
    }
    pub fn from_days(d: f64) -> SimTime {
        SimTime(d * MINUTES_PER_DAY)
    }

    pub fn as_minutes(self) -> f64 {
        self.0
    }

    pub fn as_days(self) -> f64 {
        self.0 / MINUTES_PER_DAY
    }

    /// 合法的仿真时间：有限且非负
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// `self + minutes`
    pub fn after(self, minutes: f64) -> SimTime {
        SimTime(self.0 + minutes)
    }

    /// `self - earlier`，不会为负
    pub fn since(self, earlier: SimTime) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn max(self, other: SimTime) -> SimTime {
        if other > self { other } else { self }
    }

    pub fn min(self, other: SimTime) -> SimTime {
        if other < self { other } else { self }
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}min", self.0)
    }
}
