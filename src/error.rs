//! 错误类型
//!
//! 仿真引擎、配置解析与外部协作者（回归/优化）共用的错误定义。

use thiserror::Error;

/// 统一的错误类型。
///
/// - `Configuration`：配置非法，在任何仿真时间推进之前失败，不重试
/// - `InvariantViolation`：引擎内部不变量被破坏（引擎 bug），立即中止本次运行
/// - `Sampling`：分布参数越界，直接向调用方传播，不做参数修正
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("sampling error: {0}")]
    Sampling(String),

    #[error("regression failed: {0}")]
    Regression(String),

    #[error("optimization failed: {0}")]
    Optimization(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SimError::Configuration(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        SimError::InvariantViolation(msg.into())
    }

    /// 是否为致命的引擎不变量错误
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SimError::InvariantViolation(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
