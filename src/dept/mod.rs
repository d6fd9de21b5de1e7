//! 急诊科模型
//!
//! 资源（工位）、病人状态机、路由计划、运行统计与仿真引擎。

// 子模块声明
mod engine;
mod id;
mod patient;
mod resource;
mod route;
mod stats;
mod transition;

// 重新导出公共接口
pub use engine::SimulationEngine;
pub use id::{PatientId, ResourceId, StageId};
pub use patient::{Patient, ResourceRequest, StageRecord};
pub use resource::{Grant, Resource};
pub use route::{RoutePlan, VisitRule};
pub use stats::{
    PatientRecord, QueueSample, ResourceStats, RunStatistics, StageStats, StageTiming,
    TatSummary, percentile,
};
pub use transition::{PatientState, Trigger, next_state};
