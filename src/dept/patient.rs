//! 病人实体
//!
//! 记录自身的阶段时间戳，并通过转移表推进状态。

use super::id::{PatientId, ResourceId, StageId};
use super::route::RoutePlan;
use super::transition::{PatientState, Trigger, next_state};
use crate::error::{Result, SimError};
use crate::sim::SimTime;

/// 某个阶段内对单个资源的请求记录
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub resource: ResourceId,
    pub requested_at: SimTime,
    pub granted_at: Option<SimTime>,
}

/// 单个阶段的时间戳
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub stage: StageId,
    pub enter: SimTime,
    pub start: Option<SimTime>,
    pub exit: Option<SimTime>,
    pub requests: Vec<ResourceRequest>,
}

impl StageRecord {
    fn new(stage: StageId, enter: SimTime) -> Self {
        Self {
            stage,
            enter,
            start: None,
            exit: None,
            requests: Vec::new(),
        }
    }

    /// 阶段等待时间 = ServiceStart - Arrived
    pub fn wait(&self) -> Option<f64> {
        self.start.map(|s| s.since(self.enter))
    }

    /// 服务时长 = ServiceEnd - ServiceStart
    pub fn service(&self) -> Option<f64> {
        match (self.start, self.exit) {
            (Some(s), Some(e)) => Some(e.since(s)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Patient {
    pub id: PatientId,
    pub arrival_time: SimTime,
    route: RoutePlan,
    cursor: usize,
    state: PatientState,
    pending_grants: usize,
    stages: Vec<StageRecord>,
}

impl Patient {
    /// 新到达的病人处于第一个阶段的 Arrived 状态
    pub fn new(id: PatientId, arrival_time: SimTime, route: RoutePlan) -> Result<Self> {
        let Some(first) = route.get(0) else {
            return Err(SimError::invariant(format!(
                "patient {} created with an empty route",
                id.0
            )));
        };
        Ok(Self {
            id,
            arrival_time,
            route,
            cursor: 0,
            state: PatientState::Arrived,
            pending_grants: 0,
            stages: vec![StageRecord::new(first, arrival_time)],
        })
    }

    pub fn state(&self) -> PatientState {
        self.state
    }

    pub fn route(&self) -> &RoutePlan {
        &self.route
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    pub fn pending_grants(&self) -> usize {
        self.pending_grants
    }

    /// 当前阶段
    pub fn current_stage(&self) -> StageId {
        self.stages[self.stages.len() - 1].stage
    }

    pub fn has_next_stage(&self) -> bool {
        self.cursor + 1 < self.route.len()
    }

    /// 路由中的下一个阶段
    pub fn next_stage(&self) -> Option<StageId> {
        self.route.get(self.cursor + 1)
    }

    /// 已完成最后一个阶段
    pub fn is_finished(&self) -> bool {
        self.state == PatientState::Completed && !self.has_next_stage()
    }

    fn apply(&mut self, trigger: Trigger) -> Result<()> {
        match next_state(self.state, trigger) {
            Some(next) => {
                self.state = next;
                Ok(())
            }
            None => Err(SimError::invariant(format!(
                "patient {}: illegal transition {:?} from {:?}",
                self.id.0, trigger, self.state
            ))),
        }
    }

    fn current_mut(&mut self) -> &mut StageRecord {
        let last = self.stages.len() - 1;
        &mut self.stages[last]
    }

    /// Arrived -> Queued：登记本阶段需要的资源
    pub fn request(&mut self, resources: &[ResourceId], now: SimTime) -> Result<()> {
        self.apply(Trigger::Request)?;
        self.pending_grants = resources.len();
        let record = self.current_mut();
        record.requests = resources
            .iter()
            .map(|&resource| ResourceRequest {
                resource,
                requested_at: now,
                granted_at: None,
            })
            .collect();
        Ok(())
    }

    /// 某个资源已授予；返回是否所有资源都已到手
    pub fn grant(&mut self, resource: ResourceId, now: SimTime) -> Result<bool> {
        if self.state != PatientState::Queued {
            return Err(SimError::invariant(format!(
                "patient {} granted {:?} while {:?}",
                self.id.0, resource, self.state
            )));
        }
        let id = self.id;
        let slot = self
            .current_mut()
            .requests
            .iter_mut()
            .find(|r| r.resource == resource && r.granted_at.is_none())
            .ok_or_else(|| {
                SimError::invariant(format!(
                    "patient {} granted {:?} which it never requested",
                    id.0, resource
                ))
            })?;
        slot.granted_at = Some(now);
        self.pending_grants -= 1;
        Ok(self.pending_grants == 0)
    }

    /// Queued -> InService：必须所有资源都已授予
    pub fn start_service(&mut self, now: SimTime) -> Result<()> {
        if self.pending_grants != 0 {
            return Err(SimError::invariant(format!(
                "patient {} started service with {} grants outstanding",
                self.id.0, self.pending_grants
            )));
        }
        self.apply(Trigger::StartService)?;
        self.current_mut().start = Some(now);
        Ok(())
    }

    /// InService -> Completed（本阶段）
    pub fn end_service(&mut self, now: SimTime) -> Result<()> {
        self.apply(Trigger::EndService)?;
        self.current_mut().exit = Some(now);
        Ok(())
    }

    /// Completed -> 下一阶段的 Arrived
    pub fn advance(&mut self, now: SimTime) -> Result<StageId> {
        let Some(next) = self.next_stage() else {
            return Err(SimError::invariant(format!(
                "patient {} has no stage after {:?}",
                self.id.0,
                self.current_stage()
            )));
        };
        self.apply(Trigger::NextStage)?;
        self.cursor += 1;
        self.stages.push(StageRecord::new(next, now));
        Ok(next)
    }

    /// 周转时间 = 离开时间 - 首次到达时间
    pub fn tat(&self, departure: SimTime) -> f64 {
        departure.since(self.arrival_time)
    }
}
