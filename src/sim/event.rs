//! 仿真事件
//!
//! 定义事件类型及同一时刻下的处理优先级。

use super::time::SimTime;
use crate::dept::{PatientId, ResourceId};
use serde::Serialize;

/// 事件种类。
///
/// 同一时刻的处理顺序：Departure > ServiceEnd > ServiceStart > Arrival，
/// 先关闭状态再打开状态，避免容量计数瞬时溢出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Arrival,
    ServiceStart,
    ServiceEnd,
    Departure,
}

impl EventKind {
    /// 数值越大越先处理
    pub fn priority(self) -> u8 {
        match self {
            EventKind::Departure => 3,
            EventKind::ServiceEnd => 2,
            EventKind::ServiceStart => 1,
            EventKind::Arrival => 0,
        }
    }
}

/// 事件：创建后不可变，由引擎恰好消费一次。
///
/// `resource` 对 Arrival 而言：`None` 表示外部新到达的病人，
/// `Some(r)` 表示已有病人进入下一阶段（r 为该阶段的首个资源）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub at: SimTime,
    pub kind: EventKind,
    pub patient: PatientId,
    pub resource: Option<ResourceId>,
}

impl Event {
    pub fn new(at: SimTime, kind: EventKind, patient: PatientId, resource: Option<ResourceId>) -> Self {
        Self {
            at,
            kind,
            patient,
            resource,
        }
    }
}
