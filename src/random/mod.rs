//! 随机变量模块
//!
//! 分布描述与可复现的抽样源。

mod source;
mod spec;

pub use source::RandomVariateSource;
pub use spec::DistributionSpec;
