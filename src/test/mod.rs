mod experiments;
pub(crate) mod fixtures;
mod regression;
mod scenario_spec;
mod sim_time;
