//! 运行统计
//!
//! 单次运行结束后对外唯一可见的输出：周转时间、资源利用率、队长等。

use serde::Serialize;

use super::id::PatientId;
use super::patient::Patient;
use super::resource::Resource;
use crate::error::{Result, SimError};
use crate::scenario::{RunPolicy, Scenario};
use crate::sim::SimTime;

const UTILIZATION_EPS: f64 = 1e-9;

/// 周转时间汇总；只在至少有一个病人计入统计时存在
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TatSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
}

impl TatSummary {
    /// 空样本返回 `None`，不用 0 冒充均值
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        Some(Self {
            count: n,
            mean: sorted.iter().sum::<f64>() / n as f64,
            min: sorted[0],
            max: sorted[n - 1],
            p50: percentile(&sorted, 0.5),
            p90: percentile(&sorted, 0.9),
            p95: percentile(&sorted, 0.95),
        })
    }
}

/// 已排序样本的分位数：取下标 floor(q * (n - 1))
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * q.clamp(0.0, 1.0)) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// 病人在某一阶段的时间戳
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub enter: f64,
    pub start: Option<f64>,
    pub exit: Option<f64>,
    pub wait: f64,
}

/// 一个已离开病人的归档记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub arrival: f64,
    pub departure: f64,
    pub tat: f64,
    pub stages: Vec<StageTiming>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceStats {
    pub name: String,
    pub capacity: u32,
    /// 截止到仿真时域的累计忙碌时间
    pub busy_time: f64,
    pub utilization: f64,
    /// 时域内的时间平均队长
    pub mean_queue_length: f64,
    pub max_queue_length: usize,
    pub requests: u64,
    /// 请求到授予的平均等待（仅统计预热后到达的病人）
    pub mean_wait: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageStats {
    pub name: String,
    pub visits: u64,
    pub mean_wait: f64,
    pub mean_service: f64,
}

/// 队长采样点（按资源编号排列）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSample {
    pub at: f64,
    pub lengths: Vec<usize>,
}

/// 单次运行的统计结果；运行结束后只读
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub seed: u64,
    pub horizon: f64,
    pub warmup: f64,
    pub events_processed: u64,
    pub arrivals: u64,
    pub departures: u64,
    /// 预热期内到达、未计入统计的病人数
    pub excluded_warmup: u64,
    /// 运行结束时仍未离开的病人数
    pub in_system_at_end: u64,
    /// 预热后无人完成时为 `None`
    pub tat: Option<TatSummary>,
    pub patients: Vec<PatientRecord>,
    pub resources: Vec<ResourceStats>,
    pub stages: Vec<StageStats>,
    pub queue_series: Vec<QueueSample>,
}

impl RunStatistics {
    pub fn mean_tat(&self) -> Option<f64> {
        self.tat.as_ref().map(|t| t.mean)
    }

    /// 计入统计的完成病人数
    pub fn completed(&self) -> usize {
        self.tat.as_ref().map_or(0, |t| t.count)
    }

    /// 利用率超出 [0, 1] 说明忙碌时间记账有误
    pub fn check_utilization(&self) -> Result<()> {
        match self
            .resources
            .iter()
            .find(|r| !(r.utilization >= 0.0 && r.utilization <= 1.0 + UTILIZATION_EPS))
        {
            Some(r) => Err(SimError::invariant(format!(
                "resource '{}' utilization {} outside [0, 1]",
                r.name, r.utilization
            ))),
            None => Ok(()),
        }
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceStats> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Accum {
    n: u64,
    sum: f64,
}

impl Accum {
    fn add(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
    }

    fn mean(&self) -> f64 {
        if self.n == 0 { 0.0 } else { self.sum / self.n as f64 }
    }
}

/// 时域截止时刻各资源的累计量（按资源编号排列）
#[derive(Debug, Clone)]
pub(crate) struct HorizonSnapshot {
    pub(crate) busy_time: Vec<f64>,
    pub(crate) queue_area: Vec<f64>,
}

impl HorizonSnapshot {
    /// 把每个资源累计到 `horizon` 并记录
    pub(crate) fn take(resources: &mut [Resource], horizon: SimTime) -> Self {
        for r in resources.iter_mut() {
            r.accrue(horizon);
        }
        Self {
            busy_time: resources.iter().map(Resource::cumulative_busy_time).collect(),
            queue_area: resources.iter().map(Resource::queue_area).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RunTotals {
    pub(crate) seed: u64,
    pub(crate) events_processed: u64,
    pub(crate) arrivals: u64,
    pub(crate) in_system_at_end: u64,
}

/// 运行期间逐步收集统计
#[derive(Debug)]
pub(crate) struct StatsCollector {
    horizon: SimTime,
    warmup: SimTime,
    patients: Vec<PatientRecord>,
    excluded_warmup: u64,
    departures: u64,
    stage_wait: Vec<Accum>,
    stage_service: Vec<Accum>,
    resource_wait: Vec<Accum>,
    queue_series: Vec<QueueSample>,
}

impl StatsCollector {
    pub(crate) fn new(scenario: &Scenario, policy: &RunPolicy) -> Self {
        Self {
            horizon: policy.horizon,
            warmup: policy.warmup,
            patients: Vec::new(),
            excluded_warmup: 0,
            departures: 0,
            stage_wait: vec![Accum::default(); scenario.stages.len()],
            stage_service: vec![Accum::default(); scenario.stages.len()],
            resource_wait: vec![Accum::default(); scenario.resources.len()],
            queue_series: Vec::new(),
        }
    }

    /// 病人离开：归档其周转时间与各阶段时间戳
    pub(crate) fn record_departure(&mut self, patient: &Patient, at: SimTime, scenario: &Scenario) {
        self.departures += 1;
        if patient.arrival_time < self.warmup {
            self.excluded_warmup += 1;
            return;
        }
        let mut stages = Vec::with_capacity(patient.stages().len());
        for rec in patient.stages() {
            let wait = rec.wait().unwrap_or(0.0);
            self.stage_wait[rec.stage.0].add(wait);
            if let Some(service) = rec.service() {
                self.stage_service[rec.stage.0].add(service);
            }
            for req in &rec.requests {
                if let Some(granted) = req.granted_at {
                    self.resource_wait[req.resource.0].add(granted.since(req.requested_at));
                }
            }
            stages.push(StageTiming {
                stage: scenario.stages[rec.stage.0].name.clone(),
                enter: rec.enter.as_minutes(),
                start: rec.start.map(SimTime::as_minutes),
                exit: rec.exit.map(SimTime::as_minutes),
                wait,
            });
        }
        self.patients.push(PatientRecord {
            id: patient.id,
            arrival: patient.arrival_time.as_minutes(),
            departure: at.as_minutes(),
            tat: patient.tat(at),
            stages,
        });
    }

    pub(crate) fn sample_queues(&mut self, at: SimTime, resources: &[Resource]) {
        self.queue_series.push(QueueSample {
            at: at.as_minutes(),
            lengths: resources.iter().map(Resource::queue_len).collect(),
        });
    }

    /// 汇总统计；忙碌时间与队长积分取时域截止时刻的快照
    pub(crate) fn finish(
        self,
        scenario: &Scenario,
        resources: &[Resource],
        snapshot: &HorizonSnapshot,
        totals: RunTotals,
    ) -> RunStatistics {
        let horizon = self.horizon;
        let tats: Vec<f64> = self.patients.iter().map(|p| p.tat).collect();
        let resource_stats = resources
            .iter()
            .enumerate()
            .map(|(i, r)| ResourceStats {
                name: r.name.clone(),
                capacity: r.capacity(),
                busy_time: snapshot.busy_time[i],
                utilization: r.utilization(snapshot.busy_time[i], horizon),
                mean_queue_length: snapshot.queue_area[i] / horizon.as_minutes(),
                max_queue_length: r.max_queue_len(),
                requests: r.requests(),
                mean_wait: self.resource_wait[i].mean(),
            })
            .collect();
        let stage_stats = scenario
            .stages
            .iter()
            .enumerate()
            .map(|(i, s)| StageStats {
                name: s.name.clone(),
                visits: self.stage_wait[i].n,
                mean_wait: self.stage_wait[i].mean(),
                mean_service: self.stage_service[i].mean(),
            })
            .collect();

        RunStatistics {
            seed: totals.seed,
            horizon: horizon.as_minutes(),
            warmup: self.warmup.as_minutes(),
            events_processed: totals.events_processed,
            arrivals: totals.arrivals,
            departures: self.departures,
            excluded_warmup: self.excluded_warmup,
            in_system_at_end: totals.in_system_at_end,
            tat: TatSummary::from_values(&tats),
            patients: self.patients,
            resources: resource_stats,
            stages: stage_stats,
            queue_series: self.queue_series,
        }
    }
}
