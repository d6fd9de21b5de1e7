//! 场景配置模块
//!
//! JSON 场景描述、校验与解析，以及内置的急诊科场景。

mod build;
mod preset;
mod spec;

pub use build::{ResourceDef, RunPolicy, Scenario, StageDef};
pub use preset::emergency_department_spec;
pub use spec::{
    Cooldown, ExperimentSpec, FirstArrival, OptimizationSpec, ResourceConfig, ResourceSpec,
    ScenarioSpec, StageSpec,
};

use crate::error::Result;

impl Scenario {
    /// 内置急诊科场景
    pub fn emergency_department() -> Result<Scenario> {
        emergency_department_spec().build()
    }
}
