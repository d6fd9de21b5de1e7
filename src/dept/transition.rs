//! 病人状态机转移表
//!
//! 每个阶段一轮：Arrived -> Queued -> InService -> Completed，
//! 若还有后续阶段则 Completed -> Arrived 重新进入状态机。

use serde::Serialize;

/// 病人在当前阶段的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientState {
    Arrived,
    Queued,
    InService,
    Completed,
}

/// 驱动状态转移的输入
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// 向本阶段所需资源发起请求
    Request,
    /// 所有资源已授予，ServiceStart 事件触发
    StartService,
    /// ServiceEnd 事件触发
    EndService,
    /// 进入下一阶段
    NextStage,
}

/// 转移表；非法转移返回 `None`
pub fn next_state(from: PatientState, trigger: Trigger) -> Option<PatientState> {
    use PatientState::*;
    match (from, trigger) {
        (Arrived, Trigger::Request) => Some(Queued),
        (Queued, Trigger::StartService) => Some(InService),
        (InService, Trigger::EndService) => Some(Completed),
        (Completed, Trigger::NextStage) => Some(Arrived),
        _ => None,
    }
}
