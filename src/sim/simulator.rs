//! 仿真上下文
//!
//! 把时钟与事件队列打包成一个显式传递的上下文对象，
//! 每次运行各自持有一份，互不共享。

use super::clock::Clock;
use super::event::{Event, EventKind};
use super::event_queue::EventQueue;
use super::time::SimTime;
use crate::dept::{PatientId, ResourceId};
use crate::error::{Result, SimError};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Simulator {
    clock: Clock,
    queue: EventQueue,
    processed: u64,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// 已取出并交给引擎处理的事件数
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek_time()
    }

    /// 调度事件；早于当前时间（或非法时间）的事件是致命错误
    #[tracing::instrument(level = "trace", skip(self), fields(now = %self.clock.now()))]
    pub fn schedule(&mut self, ev: Event) -> Result<()> {
        if !ev.at.is_valid() {
            return Err(SimError::invariant(format!(
                "event scheduled at invalid time {:?}",
                ev.at
            )));
        }
        if ev.at < self.clock.now() {
            return Err(SimError::invariant(format!(
                "event {:?} for patient {} scheduled at {} before now={}",
                ev.kind,
                ev.patient.0,
                ev.at,
                self.clock.now()
            )));
        }
        self.queue.schedule(ev);
        Ok(())
    }

    /// 便捷方法：在 `at` 调度一个事件
    pub fn schedule_at(
        &mut self,
        at: SimTime,
        kind: EventKind,
        patient: PatientId,
        resource: Option<ResourceId>,
    ) -> Result<()> {
        self.schedule(Event::new(at, kind, patient, resource))
    }

    /// 取出下一个事件并把时钟推进到它的时间
    pub fn next(&mut self) -> Result<Option<Event>> {
        let Some(ev) = self.queue.next() else {
            return Ok(None);
        };
        self.clock.advance_to(ev.at)?;
        self.processed += 1;
        debug!(
            event_num = self.processed,
            now = %ev.at,
            kind = ?ev.kind,
            patient = ev.patient.0,
            remaining_queue = self.queue.len(),
            "取出事件"
        );
        Ok(Some(ev))
    }

    /// 丢弃剩余事件（截断策略）
    pub fn discard_pending(&mut self) -> usize {
        self.queue.clear()
    }
}
