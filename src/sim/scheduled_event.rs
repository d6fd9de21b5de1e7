//! 调度事件
//!
//! 定义调度事件结构及其优先级比较。

use super::event::Event;
use std::cmp::Ordering;

/// 调度事件，包含事件本身与插入序列号。
#[derive(Debug)]
pub struct ScheduledEvent {
    pub(crate) seq: u64,
    pub(crate) ev: Event,
}

// BinaryHeap 是 max-heap：时间越小越先出；同一时刻按种类优先级，再按插入顺序。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .ev
            .at
            .cmp(&self.ev.at)
            .then_with(|| self.ev.kind.priority().cmp(&other.ev.kind.priority()))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.ev.at == other.ev.at && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}
