//! 资源（工位）模型
//!
//! 有限容量、FIFO 排队、非抢占的服务台。只由引擎在处理事件时修改。

use std::collections::VecDeque;

use super::id::{PatientId, ResourceId};
use crate::error::{Result, SimError};
use crate::sim::SimTime;

/// 资源请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grant {
    pub granted: bool,
}

/// 有限容量的 FIFO 资源
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    capacity: u32,
    busy_count: u32,
    queue: VecDeque<PatientId>,
    /// 累计忙碌时间（忙碌服务台数 × 时间）
    cumulative_busy_time: f64,
    /// 队列长度对时间的积分，用于计算平均队长
    queue_area: f64,
    last_change: SimTime,
    max_queue_len: usize,
    requests: u64,
}

impl Resource {
    /// 创建资源；容量为 0 是配置错误
    pub fn new(id: ResourceId, name: impl Into<String>, capacity: u32) -> Result<Self> {
        let name = name.into();
        if capacity == 0 {
            return Err(SimError::config(format!(
                "resource '{name}' must have positive capacity"
            )));
        }
        Ok(Self {
            id,
            name,
            capacity,
            busy_count: 0,
            queue: VecDeque::new(),
            cumulative_busy_time: 0.0,
            queue_area: 0.0,
            last_change: SimTime::ZERO,
            max_queue_len: 0,
            requests: 0,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn busy_count(&self) -> u32 {
        self.busy_count
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn max_queue_len(&self) -> usize {
        self.max_queue_len
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn cumulative_busy_time(&self) -> f64 {
        self.cumulative_busy_time
    }

    pub fn queue_area(&self) -> f64 {
        self.queue_area
    }

    pub fn is_queued(&self, patient: PatientId) -> bool {
        self.queue.contains(&patient)
    }

    /// 把忙碌时间与队长积分累计到 `now`。
    ///
    /// 早于上次状态变化的 `now` 不做任何事（快照时间可能落在最后一次变化之前）。
    pub fn accrue(&mut self, now: SimTime) {
        if now <= self.last_change {
            return;
        }
        let dt = now.since(self.last_change);
        self.cumulative_busy_time += dt * self.busy_count as f64;
        self.queue_area += dt * self.queue.len() as f64;
        self.last_change = now;
    }

    /// 请求一个服务台：有空闲立即授予，否则进入队尾
    pub fn request(&mut self, patient: PatientId, now: SimTime) -> Result<Grant> {
        if self.queue.contains(&patient) {
            return Err(SimError::invariant(format!(
                "patient {} requested '{}' while already queued there",
                patient.0, self.name
            )));
        }
        self.accrue(now);
        self.requests += 1;
        if self.busy_count < self.capacity {
            self.busy_count += 1;
            return Ok(Grant { granted: true });
        }
        self.queue.push_back(patient);
        self.max_queue_len = self.max_queue_len.max(self.queue.len());
        Ok(Grant { granted: false })
    }

    /// 释放一个服务台；队列非空时把队首立即授予并返回其 id
    pub fn release(&mut self, now: SimTime) -> Result<Option<PatientId>> {
        if self.busy_count == 0 {
            return Err(SimError::invariant(format!(
                "release on idle resource '{}'",
                self.name
            )));
        }
        self.accrue(now);
        self.busy_count -= 1;
        let next = self.queue.pop_front();
        if next.is_some() {
            self.busy_count += 1;
        }
        if self.busy_count > self.capacity {
            return Err(SimError::invariant(format!(
                "resource '{}' busy_count {} exceeds capacity {}",
                self.name, self.busy_count, self.capacity
            )));
        }
        Ok(next)
    }

    /// 时间平均利用率：busy_time / (capacity × horizon)
    pub fn utilization(&self, busy_time: f64, horizon: SimTime) -> f64 {
        let denom = self.capacity as f64 * horizon.as_minutes();
        if denom <= 0.0 {
            return 0.0;
        }
        busy_time / denom
    }
}
