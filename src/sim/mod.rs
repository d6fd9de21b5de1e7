//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的核心组件：仿真时间、事件、事件队列、时钟与仿真上下文。

// 子模块声明
mod clock;
mod event;
mod event_queue;
mod scheduled_event;
mod simulator;
mod time;

// 重新导出公共接口
pub use clock::Clock;
pub use event::{Event, EventKind};
pub use event_queue::EventQueue;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use time::SimTime;
