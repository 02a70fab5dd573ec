//! A colonist: identity, location, condition and a mind.

use std::sync::Arc;

use colony_types::{AgentCondition, AgentId, JobKind};
use rand::Rng;

use crate::collab::AgentProfile;
use crate::mind::{AgentMind, MindContext, PulseReport};
use crate::task::{TaskCatalog, TaskSelector};

/// One simulated colonist.
#[derive(Debug)]
pub struct Agent {
    /// Unique identifier.
    id: AgentId,
    /// Display name.
    name: String,
    /// Settlement the agent lives in.
    location: String,
    /// Physical and mental state.
    condition: AgentCondition,
    /// Decision state.
    mind: AgentMind,
}

impl Agent {
    /// Create an agent drawing tasks from `tasks`.
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        job: JobKind,
        condition: AgentCondition,
        tasks: Arc<TaskCatalog>,
    ) -> Self {
        Self::with_id(AgentId::new(), name, location, job, condition, tasks)
    }

    /// Create an agent with a caller-chosen identifier.
    pub fn with_id(
        id: AgentId,
        name: impl Into<String>,
        location: impl Into<String>,
        job: JobKind,
        condition: AgentCondition,
        tasks: Arc<TaskCatalog>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
            condition,
            mind: AgentMind::new(id, job, TaskSelector::new(tasks)),
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settlement the agent lives in.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Physical and mental state.
    pub const fn condition(&self) -> &AgentCondition {
        &self.condition
    }

    /// Decision state.
    pub const fn mind(&self) -> &AgentMind {
        &self.mind
    }

    /// Mutable decision state.
    pub const fn mind_mut(&mut self) -> &mut AgentMind {
        &mut self.mind
    }

    /// Current read-only view for collaborators and mission weighting.
    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            id: self.id,
            name: self.name.clone(),
            job: self.mind.job(),
            location: self.location.clone(),
            performance: self.condition.performance_rating(),
            condition: self.condition,
        }
    }

    /// Live through `time` millisols: the mind spends the time, then the
    /// condition drifts for the whole span.
    pub fn time_passing<R: Rng>(&mut self, time: f64, ctx: &mut MindContext<'_, R>) -> PulseReport {
        let profile = self.profile();
        let report = self
            .mind
            .time_passing(&profile, &mut self.condition, time, ctx);
        self.condition.elapse(time);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_reflects_condition_and_job() {
        let agent = Agent::new(
            "Ada",
            "Schiaparelli Point",
            JobKind::Doctor,
            AgentCondition::new(1000.0, 0.0, 0.0),
            Arc::new(TaskCatalog::standard()),
        );
        let profile = agent.profile();
        assert_eq!(profile.id, agent.id());
        assert_eq!(profile.job, JobKind::Doctor);
        assert_eq!(profile.location, "Schiaparelli Point");
        assert!((profile.performance - 0.5).abs() < 1e-9);
        assert_eq!(agent.mind().agent_id(), agent.id());
    }
}
