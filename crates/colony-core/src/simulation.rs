//! One settlement's worth of simulation state and the per-pulse cycle.
//!
//! Each pulse runs every agent's mind in turn against the shared mission
//! registry and event log:
//!
//! 1. **Minds** -- agents are processed one after another, so shared
//!    mission state always has a single writer. An agent with nothing to
//!    do is logged and skipped; it never stalls the others.
//! 2. **Prune** -- finished missions no mind still refers to are dropped.
//!
//! Given the same seed and configuration, runs are reproducible.

use std::collections::BTreeSet;
use std::sync::Arc;

use colony_types::{AgentCondition, AgentId, JobKind, SimTime};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::clock::{ClockError, ClockPulse, MasterClock};
use crate::collab::Collaborators;
use crate::config::SimulationConfig;
use crate::event_log::{EventLog, EventLogError};
use crate::mind::{JobChange, MindContext, Outcome};
use crate::registry::{MissionCatalog, MissionRegistry};
use crate::task::TaskCatalog;

/// Errors raised while building or stepping a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The event log could not be created.
    #[error("event log error: {source}")]
    EventLog {
        /// The underlying event log error.
        #[from]
        source: EventLogError,
    },
}

/// What happened during one pulse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseSummary {
    /// Pulse sequence number.
    pub pulse: u64,
    /// Simulated time after the pulse.
    pub time: SimTime,
    /// Agents that spent their time.
    pub agents_acted: usize,
    /// Agents that found nothing to do.
    pub agents_idle: usize,
    /// Millisols consumed across all agents.
    pub consumed: f64,
    /// Job changes made this pulse.
    pub job_changes: Vec<JobChange>,
    /// Finished missions dropped this pulse.
    pub missions_pruned: usize,
    /// Missions still running after the pulse.
    pub active_missions: usize,
}

/// The full simulation state.
#[derive(Debug)]
pub struct Simulation {
    /// Source of pulses.
    clock: MasterClock,
    /// Noteworthy occurrences.
    event_log: EventLog,
    /// Every mission.
    registry: MissionRegistry,
    /// Every colonist, in processing order.
    agents: Vec<Agent>,
    /// Task descriptions shared by all minds.
    tasks: Arc<TaskCatalog>,
    /// External decision makers.
    collaborators: Collaborators,
    /// Seeded randomness for every draw.
    rng: SmallRng,
    /// Configuration the simulation was built from.
    config: SimulationConfig,
}

impl Simulation {
    /// Build a simulation with the built-in task and mission catalogs.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        Self::with_catalogs(config, TaskCatalog::standard(), MissionCatalog::standard())
    }

    /// Build a simulation with custom catalogs.
    pub fn with_catalogs(
        config: SimulationConfig,
        tasks: TaskCatalog,
        missions: MissionCatalog,
    ) -> Result<Self, SimulationError> {
        let clock = MasterClock::new(&config.clock)?;
        let event_log = EventLog::new(config.event_log.capacity)?;
        let registry = MissionRegistry::new(missions, &config.mission);
        Ok(Self {
            clock,
            event_log,
            registry,
            agents: Vec::new(),
            tasks: Arc::new(tasks),
            collaborators: Collaborators::default(),
            rng: SmallRng::seed_from_u64(config.world.seed),
            config,
        })
    }

    /// Replace the collaborators.
    #[must_use]
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Add a colonist living in the configured settlement.
    ///
    /// The id is drawn from the seeded generator, so spawning the same crew
    /// under the same seed yields the same ids.
    pub fn spawn_agent(
        &mut self,
        name: impl Into<String>,
        job: JobKind,
        condition: AgentCondition,
    ) -> AgentId {
        let id = AgentId::from_random_bytes(self.rng.random());
        let agent = Agent::with_id(
            id,
            name,
            self.config.world.name.clone(),
            job,
            condition,
            Arc::clone(&self.tasks),
        );
        debug!(agent_id = %id, name = agent.name(), %job, "Agent spawned");
        self.agents.push(agent);
        id
    }

    /// Add a prepared colonist.
    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        let id = agent.id();
        self.agents.push(agent);
        id
    }

    /// Every colonist, in processing order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up a colonist.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    /// Look up a colonist mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    /// Task descriptions shared by all minds.
    pub const fn tasks(&self) -> &Arc<TaskCatalog> {
        &self.tasks
    }

    /// The clock.
    pub const fn clock(&self) -> &MasterClock {
        &self.clock
    }

    /// The clock, mutably.
    pub const fn clock_mut(&mut self) -> &mut MasterClock {
        &mut self.clock
    }

    /// The event log.
    pub const fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// The event log, mutably.
    pub const fn event_log_mut(&mut self) -> &mut EventLog {
        &mut self.event_log
    }

    /// The mission registry.
    pub const fn registry(&self) -> &MissionRegistry {
        &self.registry
    }

    /// The mission registry, mutably.
    pub const fn registry_mut(&mut self) -> &mut MissionRegistry {
        &mut self.registry
    }

    /// Configuration the simulation was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every agent through `pulse`.
    pub fn run_pulse(&mut self, pulse: &ClockPulse) -> PulseSummary {
        let mut ctx = MindContext {
            registry: &mut self.registry,
            event_log: &mut self.event_log,
            collaborators: &self.collaborators,
            config: &self.config.mind,
            rng: &mut self.rng,
            now: pulse.time,
        };

        let mut agents_acted: usize = 0;
        let mut agents_idle: usize = 0;
        let mut consumed = 0.0;
        let mut job_changes = Vec::new();

        for agent in &mut self.agents {
            let report = agent.time_passing(pulse.elapsed, &mut ctx);
            consumed += report.consumed;
            job_changes.extend(report.job_change);
            match report.outcome {
                Outcome::Consumed(_) => agents_acted = agents_acted.saturating_add(1),
                Outcome::NoAction { consumed: partial } => {
                    warn!(
                        pulse = pulse.id,
                        agent_id = %agent.id(),
                        consumed = partial,
                        "Agent had no available action, skipping"
                    );
                    agents_idle = agents_idle.saturating_add(1);
                }
            }
        }

        let referenced: BTreeSet<_> = self
            .agents
            .iter()
            .filter_map(|a| a.mind().mission())
            .collect();
        let missions_pruned = self.registry.prune_finished(&referenced);
        let active_missions = self.registry.active_missions().len();

        debug!(
            pulse = pulse.id,
            time = %pulse.time,
            agents_acted,
            agents_idle,
            missions_pruned,
            active_missions,
            "Pulse complete"
        );

        PulseSummary {
            pulse: pulse.id,
            time: pulse.time,
            agents_acted,
            agents_idle,
            consumed,
            job_changes,
            missions_pruned,
            active_missions,
        }
    }

    /// Wait for the next clock tick and run it. `None` while paused.
    pub async fn step(&mut self) -> Result<Option<PulseSummary>, SimulationError> {
        let Some(pulse) = self.clock.tick().await? else {
            return Ok(None);
        };
        Ok(Some(self.run_pulse(&pulse)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.clock.tick_interval_ms = 0;
        config
    }

    #[test]
    fn every_agent_acts_each_pulse() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        for name in ["Ada", "Grace", "Linus"] {
            sim.spawn_agent(name, JobKind::Engineer, AgentCondition::default());
        }
        let pulse = sim.clock_mut().pulse().unwrap().unwrap();
        let summary = sim.run_pulse(&pulse);
        assert_eq!(summary.pulse, 1);
        assert_eq!(summary.agents_acted, 3);
        assert_eq!(summary.agents_idle, 0);
        assert!((summary.consumed - 3.0 * pulse.elapsed).abs() < 1e-6);
    }

    #[test]
    fn spawned_agents_live_in_the_settlement() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let id = sim.spawn_agent("Ada", JobKind::Doctor, AgentCondition::default());
        assert_eq!(sim.agent(id).unwrap().location(), sim.config().world.name);
    }

    #[test]
    fn zero_capacity_log_is_rejected() {
        let mut config = quiet_config();
        config.event_log.capacity = 0;
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::EventLog { .. })
        ));
    }

    #[tokio::test]
    async fn step_skips_while_paused() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        sim.spawn_agent("Ada", JobKind::Pilot, AgentCondition::default());
        sim.clock_mut().set_paused(true);
        assert!(sim.step().await.unwrap().is_none());
        sim.clock_mut().set_paused(false);
        assert_eq!(sim.step().await.unwrap().unwrap().pulse, 1);
    }
}
