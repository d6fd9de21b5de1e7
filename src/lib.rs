//! edsim-rs
//!
//! 急诊科离散事件仿真：事件驱动引擎、带容量的 FIFO 资源、病人路由，
//! 以及围绕它的容量扫描、线性回归与受约束的容量优化。

pub mod dept;
pub mod error;
pub mod experiment;
pub mod random;
pub mod scenario;
pub mod sim;

pub use error::{Result, SimError};

#[cfg(test)]
mod test;
