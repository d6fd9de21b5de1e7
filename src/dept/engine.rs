//! 仿真引擎
//!
//! 单线程的事件分发循环：取出事件、推进时钟、按种类分发，
//! 修改资源与病人状态，最后汇总为 `RunStatistics`。

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use super::id::{PatientId, ResourceId, StageId};
use super::patient::Patient;
use super::resource::Resource;
use super::route::{RoutePlan, VisitRule};
use super::stats::{HorizonSnapshot, RunStatistics, RunTotals, StatsCollector};
use crate::error::{Result, SimError};
use crate::random::RandomVariateSource;
use crate::scenario::{Cooldown, FirstArrival, ResourceConfig, RunPolicy, Scenario};
use crate::sim::{Event, EventKind, SimTime, Simulator};

// 随机子流编号：到达、路由，其后每个阶段一条服务子流
const ARRIVAL_STREAM: u64 = 0;
const ROUTING_STREAM: u64 = 1;
const FIRST_SERVICE_STREAM: u64 = 2;

/// 仿真引擎：对同一场景可反复运行，每次运行都重新构造资源与病人。
#[derive(Debug, Clone, Copy)]
pub struct SimulationEngine<'a> {
    scenario: &'a Scenario,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &'a Scenario {
        self.scenario
    }

    /// 使用场景自带的时域运行一次
    pub fn run_default(&self, config: &ResourceConfig, seed: u64) -> Result<RunStatistics> {
        self.run(self.scenario.policy.horizon, config, seed)
    }

    /// 运行一次完整仿真
    #[tracing::instrument(skip(self, config), fields(scenario = %self.scenario.name))]
    pub fn run(
        &self,
        horizon: SimTime,
        config: &ResourceConfig,
        seed: u64,
    ) -> Result<RunStatistics> {
        let mut policy = self.scenario.policy;
        if !(horizon.is_valid() && horizon > SimTime::ZERO) {
            return Err(SimError::config(format!("horizon must be positive, got {horizon:?}")));
        }
        if policy.warmup >= horizon {
            return Err(SimError::config(format!(
                "warmup {} must be shorter than the horizon {}",
                policy.warmup, horizon
            )));
        }
        policy.horizon = horizon;

        let caps = self.scenario.capacities(config)?;
        let resources = self
            .scenario
            .resources
            .iter()
            .zip(&caps)
            .map(|(def, &cap)| Resource::new(def.id, def.name.clone(), cap))
            .collect::<Result<Vec<_>>>()?;

        info!(seed, horizon = %horizon, capacities = ?caps, "▶️  开始运行仿真");
        let run = Run::new(self.scenario, policy, resources, seed);
        let stats = run.execute()?;
        info!(
            total_events = stats.events_processed,
            arrivals = stats.arrivals,
            departures = stats.departures,
            completed = stats.completed(),
            mean_tat = ?stats.mean_tat(),
            "✅ 仿真完成"
        );
        Ok(stats)
    }
}

/// 一次运行的全部可变状态；不跨运行共享
struct Run<'a> {
    scenario: &'a Scenario,
    policy: RunPolicy,
    sim: Simulator,
    resources: Vec<Resource>,
    patients: BTreeMap<PatientId, Patient>,
    rules: Vec<VisitRule>,
    arrival_rng: RandomVariateSource,
    routing_rng: RandomVariateSource,
    service_rngs: Vec<RandomVariateSource>,
    stats: StatsCollector,
    seed: u64,
    next_patient: u64,
    arrivals: u64,
    next_sample_at: Option<SimTime>,
    snapshot: Option<HorizonSnapshot>,
}

impl<'a> Run<'a> {
    fn new(scenario: &'a Scenario, policy: RunPolicy, resources: Vec<Resource>, seed: u64) -> Self {
        let service_rngs = (0..scenario.stages.len() as u64)
            .map(|i| RandomVariateSource::stream(seed, FIRST_SERVICE_STREAM + i))
            .collect();
        Self {
            scenario,
            policy,
            sim: Simulator::default(),
            resources,
            patients: BTreeMap::new(),
            rules: scenario.visit_rules(),
            arrival_rng: RandomVariateSource::stream(seed, ARRIVAL_STREAM),
            routing_rng: RandomVariateSource::stream(seed, ROUTING_STREAM),
            service_rngs,
            stats: StatsCollector::new(scenario, &policy),
            seed,
            next_patient: 0,
            arrivals: 0,
            next_sample_at: policy.queue_sample_interval.map(|_| SimTime::ZERO),
            snapshot: None,
        }
    }

    fn execute(mut self) -> Result<RunStatistics> {
        let horizon = self.policy.horizon;
        let first_at = match self.policy.first_arrival {
            FirstArrival::AtStart => SimTime::ZERO,
            FirstArrival::Drawn => {
                let gap = self.arrival_rng.sample(&self.scenario.arrival)?;
                SimTime::ZERO.after(gap)
            }
        };
        self.schedule_external_arrival(first_at)?;

        while let Some(at) = self.sim.peek_time() {
            if at >= horizon {
                self.take_snapshot();
                if self.policy.cooldown == Cooldown::Truncate {
                    let dropped = self.sim.discard_pending();
                    debug!(dropped, "到达时域，丢弃剩余事件");
                    break;
                }
            } else {
                self.sample_queues_until(at);
            }
            let Some(ev) = self.sim.next()? else {
                break;
            };
            self.dispatch(ev)?;
        }
        self.take_snapshot();

        let in_system_at_end = self.patients.len() as u64;
        if self.policy.cooldown == Cooldown::Drain && in_system_at_end != 0 {
            // 只可能是多资源阶段互相等待
            warn!(in_system_at_end, "事件队列已清空但仍有病人滞留");
        }
        let snapshot = match self.snapshot.take() {
            Some(snapshot) => snapshot,
            None => HorizonSnapshot::take(&mut self.resources, horizon),
        };
        let totals = RunTotals {
            seed: self.seed,
            events_processed: self.sim.processed(),
            arrivals: self.arrivals,
            in_system_at_end,
        };
        let stats = self
            .stats
            .finish(self.scenario, &self.resources, &snapshot, totals);
        stats.check_utilization()?;
        Ok(stats)
    }

    fn take_snapshot(&mut self) {
        if self.snapshot.is_some() {
            return;
        }
        let horizon = self.policy.horizon;
        self.sample_queues_until(horizon);
        self.snapshot = Some(HorizonSnapshot::take(&mut self.resources, horizon));
    }

    /// 事件之间状态不变，因此在处理 `until` 处的事件前补齐此前的采样点
    fn sample_queues_until(&mut self, until: SimTime) {
        let Some(interval) = self.policy.queue_sample_interval else {
            return;
        };
        while let Some(at) = self.next_sample_at {
            if at > until || at > self.policy.horizon {
                break;
            }
            self.stats.sample_queues(at, &self.resources);
            self.next_sample_at = Some(at.after(interval));
        }
    }

    fn dispatch(&mut self, ev: Event) -> Result<()> {
        trace!(now = %ev.at, kind = ?ev.kind, patient = ev.patient.0, "分发事件");
        match ev.kind {
            EventKind::Arrival => match ev.resource {
                None => self.on_external_arrival(ev.patient),
                Some(resource) => self.on_stage_arrival(ev.patient, resource),
            },
            EventKind::ServiceStart => self.on_service_start(ev.patient),
            EventKind::ServiceEnd => self.on_service_end(ev.patient),
            EventKind::Departure => self.on_departure(ev.patient),
        }
    }

    fn stage_resources(&self, stage: StageId) -> Vec<ResourceId> {
        self.scenario.stages[stage.0].resources.clone()
    }

    fn primary_resource(&self, stage: StageId) -> ResourceId {
        self.scenario.stages[stage.0].resources[0]
    }

    fn patient_mut(&mut self, id: PatientId) -> Result<&mut Patient> {
        self.patients.get_mut(&id).ok_or_else(|| {
            SimError::invariant(format!("event for unknown or departed patient {}", id.0))
        })
    }

    /// 外部到达只在时域之内生成
    fn schedule_external_arrival(&mut self, at: SimTime) -> Result<()> {
        if at >= self.policy.horizon {
            trace!(at = %at, "下一次到达超出时域，不再生成");
            return Ok(());
        }
        let id = PatientId(self.next_patient);
        self.next_patient += 1;
        self.sim.schedule_at(at, EventKind::Arrival, id, None)
    }

    fn on_external_arrival(&mut self, id: PatientId) -> Result<()> {
        let now = self.sim.now();
        let route = RoutePlan::draw(&self.rules, &mut self.routing_rng);
        let patient = Patient::new(id, now, route)?;
        if self.patients.insert(id, patient).is_some() {
            return Err(SimError::invariant(format!("patient {} arrived twice", id.0)));
        }
        self.arrivals += 1;
        debug!(patient = id.0, now = %now, "🚑 病人到达");
        self.enter_stage(id)?;

        let gap = self.arrival_rng.sample(&self.scenario.arrival)?;
        self.schedule_external_arrival(now.after(gap))
    }

    fn on_stage_arrival(&mut self, id: PatientId, resource: ResourceId) -> Result<()> {
        let now = self.sim.now();
        let stage = self.patient_mut(id)?.advance(now)?;
        let expected = self.primary_resource(stage);
        if expected != resource {
            return Err(SimError::invariant(format!(
                "patient {} arrival event targets {:?} but stage {:?} starts at {:?}",
                id.0, resource, stage, expected
            )));
        }
        self.enter_stage(id)
    }

    /// Arrived -> Queued，并向本阶段的所有资源发起请求
    fn enter_stage(&mut self, id: PatientId) -> Result<()> {
        let now = self.sim.now();
        let stage = self.patient_mut(id)?.current_stage();
        let needed = self.stage_resources(stage);
        self.patient_mut(id)?.request(&needed, now)?;

        let mut ready = false;
        for &r in &needed {
            let grant = self.resources[r.0].request(id, now)?;
            trace!(patient = id.0, resource = %self.resources[r.0].name, granted = grant.granted, "资源请求");
            if grant.granted {
                ready = self.patient_mut(id)?.grant(r, now)?;
            }
        }
        if ready {
            self.sim
                .schedule_at(now, EventKind::ServiceStart, id, Some(needed[0]))?;
        }
        Ok(())
    }

    fn on_service_start(&mut self, id: PatientId) -> Result<()> {
        let now = self.sim.now();
        let patient = self.patient_mut(id)?;
        patient.start_service(now)?;
        let stage = patient.current_stage();
        let scenario = self.scenario;
        let def = &scenario.stages[stage.0];
        let duration = self.service_rngs[stage.0].sample(&def.service)?;
        debug!(patient = id.0, stage = %def.name, duration, "开始服务");
        self.sim.schedule_at(
            now.after(duration),
            EventKind::ServiceEnd,
            id,
            Some(def.resources[0]),
        )
    }

    fn on_service_end(&mut self, id: PatientId) -> Result<()> {
        let now = self.sim.now();
        let patient = self.patient_mut(id)?;
        patient.end_service(now)?;
        let stage = patient.current_stage();
        let next_stage = patient.next_stage();

        for r in self.stage_resources(stage) {
            let Some(waiting) = self.resources[r.0].release(now)? else {
                continue;
            };
            let other = self.patient_mut(waiting)?;
            let ready = other.grant(r, now)?;
            let other_stage = other.current_stage();
            if ready {
                let primary = self.primary_resource(other_stage);
                self.sim
                    .schedule_at(now, EventKind::ServiceStart, waiting, Some(primary))?;
            }
        }

        match next_stage {
            Some(next) => {
                let primary = self.primary_resource(next);
                self.sim
                    .schedule_at(now, EventKind::Arrival, id, Some(primary))
            }
            None => self.sim.schedule_at(now, EventKind::Departure, id, None),
        }
    }

    fn on_departure(&mut self, id: PatientId) -> Result<()> {
        let now = self.sim.now();
        let patient = self.patients.remove(&id).ok_or_else(|| {
            SimError::invariant(format!(
                "departure for patient {} who already departed or never arrived",
                id.0
            ))
        })?;
        if !patient.is_finished() {
            return Err(SimError::invariant(format!(
                "departure for patient {} in state {:?} with stages remaining",
                id.0,
                patient.state()
            )));
        }
        debug!(patient = id.0, tat = patient.tat(now), "🏁 病人离开");
        self.stats.record_departure(&patient, now, self.scenario);
        Ok(())
    }
}
