//! 事件队列
//!
//! 按仿真时间排序的优先队列，支持插入与取最小。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use std::collections::BinaryHeap;
use tracing::trace;

/// 事件队列：时间最小者先出，同一时刻按种类优先级与插入顺序打破平局。
#[derive(Debug, Default)]
pub struct EventQueue {
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入事件（不检查时间合法性，由 `Simulator::schedule` 负责）
    pub fn schedule(&mut self, ev: Event) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        trace!(seq, at = %ev.at, kind = ?ev.kind, "事件入队");
        self.q.push(ScheduledEvent { seq, ev });
    }

    /// 取出时间最小的事件
    pub fn next(&mut self) -> Option<Event> {
        self.q.pop().map(|item| item.ev)
    }

    /// 查看下一个事件的时间
    pub fn peek_time(&self) -> Option<SimTime> {
        self.q.peek().map(|item| item.ev.at)
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// 丢弃所有待处理事件，返回丢弃数量
    pub fn clear(&mut self) -> usize {
        let n = self.q.len();
        self.q.clear();
        n
    }
}
