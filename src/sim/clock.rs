//! 仿真时钟
//!
//! 单调不减，只在引擎取出事件之后推进到该事件的时间。

use super::time::SimTime;
use crate::error::{Result, SimError};

#[derive(Debug, Default, Clone, Copy)]
pub struct Clock {
    now: SimTime,
}

impl Clock {
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 推进到 `at`；时间倒退视为不变量破坏
    pub fn advance_to(&mut self, at: SimTime) -> Result<()> {
        if at < self.now {
            return Err(SimError::invariant(format!(
                "clock moved backwards: now={} target={}",
                self.now, at
            )));
        }
        self.now = at;
        Ok(())
    }
}
