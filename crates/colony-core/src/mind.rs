//! The agent mind: what an agent does with each pulse of time.
//!
//! Every pulse the mind is handed a time budget and spends all of it:
//!
//! 1. **Cleanup** -- a binding to a finished or unknown mission is dropped.
//! 2. **Job** -- unless the job is locked, the [`JobAssigner`] may replace
//!    the agent's job designation.
//! 3. **Relationships** -- the [`RelationshipTracker`] is told about the
//!    elapsed time.
//! 4. **Spend** -- the budget goes to the bound task, else the bound
//!    mission, else to a freshly drawn task or mission. Whatever a
//!    task phase or mission phase does not use is spent on the next
//!    binding in the same pulse.
//!
//! The spend loop is iterative and bounded by
//! [`MindConfig::max_decisions_per_pulse`], so it always terminates, even
//! with a zero budget or tasks that finish instantly.
//!
//! [`JobAssigner`]: crate::collab::JobAssigner
//! [`RelationshipTracker`]: crate::collab::RelationshipTracker

use colony_types::{
    AgentCondition, AgentId, EventCategory, HistoricalEvent, JobKind, MissionId, MissionKind,
    MissionPhase, SimTime, TaskKind,
};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collab::{AgentProfile, Collaborators};
use crate::config::MindConfig;
use crate::event_log::EventLog;
use crate::mission::Mission;
use crate::registry::MissionRegistry;
use crate::select;
use crate::task::TaskSelector;

/// Budget below this is treated as spent.
const TIME_EPSILON: f64 = 1e-9;

/// Shared state a mind needs while it runs.
pub struct MindContext<'a, R: Rng> {
    /// Every mission in the simulation.
    pub registry: &'a mut MissionRegistry,
    /// Where noteworthy occurrences are recorded.
    pub event_log: &'a mut EventLog,
    /// External decision makers.
    pub collaborators: &'a Collaborators,
    /// Tunables.
    pub config: &'a MindConfig,
    /// Randomness for draws.
    pub rng: &'a mut R,
    /// Simulated time at the start of the pulse.
    pub now: SimTime,
}

/// A job designation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobChange {
    /// The agent whose job changed.
    pub agent: AgentId,
    /// Previous job.
    pub from: JobKind,
    /// New job.
    pub to: JobKind,
}

/// How a pulse ended for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Outcome {
    /// The budget was spent; carries the millisols consumed.
    Consumed(f64),
    /// Nothing had any weight; the rest of the budget went unused.
    NoAction {
        /// Millisols consumed before running out of options.
        consumed: f64,
    },
}

/// What one mind did with one pulse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseReport {
    /// Millisols consumed.
    pub consumed: f64,
    /// How the pulse ended.
    pub outcome: Outcome,
    /// Job change made at the start of the pulse.
    pub job_change: Option<JobChange>,
    /// Number of new bindings drawn.
    pub decisions: u32,
}

/// Something the mind can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Task(TaskKind),
    Mission(MissionKind),
}

/// Decision state of one agent.
#[derive(Debug)]
pub struct AgentMind {
    /// The agent this mind belongs to.
    agent_id: AgentId,
    /// Current job designation.
    job: JobKind,
    /// When set, the job is never reassigned.
    job_locked: bool,
    /// Task choice and execution.
    task_selector: TaskSelector,
    /// Mission the agent is on, by id.
    mission: Option<MissionId>,
}

impl AgentMind {
    /// Create a mind with no bindings.
    pub const fn new(agent_id: AgentId, job: JobKind, task_selector: TaskSelector) -> Self {
        Self {
            agent_id,
            job,
            job_locked: false,
            task_selector,
            mission: None,
        }
    }

    /// The agent this mind belongs to.
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Current job designation.
    pub const fn job(&self) -> JobKind {
        self.job
    }

    /// Set the job designation directly.
    pub const fn set_job(&mut self, job: JobKind) {
        self.job = job;
    }

    /// Whether the job is locked against reassignment.
    pub const fn is_job_locked(&self) -> bool {
        self.job_locked
    }

    /// Lock or unlock the job.
    pub const fn set_job_locked(&mut self, locked: bool) {
        self.job_locked = locked;
    }

    /// Task choice and execution state.
    pub const fn task_selector(&self) -> &TaskSelector {
        &self.task_selector
    }

    /// Mission the agent is on, if any.
    pub const fn mission(&self) -> Option<MissionId> {
        self.mission
    }

    /// Spend `time` millisols.
    ///
    /// `profile` is the agent's state at the start of the pulse.
    /// `condition` is relieved as tasks are performed.
    pub fn time_passing<R: Rng>(
        &mut self,
        profile: &AgentProfile,
        condition: &mut AgentCondition,
        time: f64,
        ctx: &mut MindContext<'_, R>,
    ) -> PulseReport {
        if self.mission.is_some_and(|id| ctx.registry.is_done(id)) {
            debug!(agent_id = %self.agent_id, "Dropping finished mission");
            self.mission = None;
        }

        let job_change = self.reassess_job(profile, ctx.collaborators);
        let profile = AgentProfile {
            job: self.job,
            ..profile.clone()
        };

        ctx.collaborators
            .relationships
            .on_time_passing(self.agent_id, time.max(0.0));

        let mut remaining = time.max(0.0);
        let mut consumed = 0.0;
        let mut decisions: u32 = 0;

        while remaining > TIME_EPSILON {
            if let Some(kind) = self.task_selector.active_kind() {
                let leftover = self.task_selector.perform_task(remaining, profile.performance);
                let used = remaining - leftover;
                condition.relieve(kind, used);
                consumed += used;
                remaining = leftover;
                if !self.task_selector.has_active() {
                    self.task_finished(kind, &profile, ctx);
                }
                continue;
            }

            if let Some(id) = self.mission {
                let leftover = self.work_on_mission(id, &profile, remaining, ctx);
                consumed += remaining - leftover;
                remaining = leftover;
                continue;
            }

            if decisions >= ctx.config.max_decisions_per_pulse {
                debug!(
                    agent_id = %self.agent_id,
                    decisions,
                    remaining,
                    "Decision budget exhausted, idling"
                );
                break;
            }
            decisions = decisions.saturating_add(1);

            let Some(choice) = self.choose(&profile, condition, ctx) else {
                return PulseReport {
                    consumed,
                    outcome: Outcome::NoAction { consumed },
                    job_change,
                    decisions,
                };
            };
            self.bind(choice, &profile, ctx);
        }

        PulseReport {
            consumed,
            outcome: Outcome::Consumed(consumed),
            job_change,
            decisions,
        }
    }

    fn reassess_job(
        &mut self,
        profile: &AgentProfile,
        collaborators: &Collaborators,
    ) -> Option<JobChange> {
        if self.job_locked {
            return None;
        }
        let decided = collaborators.jobs.decide_job(&AgentProfile {
            job: self.job,
            ..profile.clone()
        });
        if decided == self.job {
            return None;
        }
        let change = JobChange {
            agent: self.agent_id,
            from: self.job,
            to: decided,
        };
        info!(
            agent_id = %self.agent_id,
            from = %change.from,
            to = %change.to,
            "Job changed"
        );
        self.job = decided;
        Some(change)
    }

    /// Spend up to `time` on mission `id`, returning the unused time.
    fn work_on_mission<R: Rng>(
        &mut self,
        id: MissionId,
        profile: &AgentProfile,
        time: f64,
        ctx: &mut MindContext<'_, R>,
    ) -> f64 {
        let Some(kind) = ctx.registry.get(id).map(Mission::kind) else {
            self.mission = None;
            return time;
        };
        if ctx.registry.is_done(id) {
            self.mission = None;
            return time;
        }

        match ctx
            .registry
            .perform_mission(id, self.agent_id, time, profile.performance, &mut *ctx.rng)
        {
            Ok(leftover) => {
                if ctx.registry.get(id).map(Mission::phase) == Some(MissionPhase::Done) {
                    info!(agent_id = %self.agent_id, mission_id = %id, %kind, "Mission completed");
                    ctx.event_log.register(
                        HistoricalEvent::new(
                            EventCategory::Mission,
                            format!("The {kind} mission returned home"),
                            profile.name.clone(),
                        ),
                        ctx.now,
                    );
                    self.mission = None;
                }
                leftover
            }
            Err(failure) => {
                warn!(
                    agent_id = %self.agent_id,
                    mission_id = %id,
                    %kind,
                    reason = %failure,
                    "Mission failed"
                );
                ctx.event_log.register(
                    HistoricalEvent::new(
                        failure.category(),
                        format!("The {kind} mission failed: {failure}"),
                        profile.name.clone(),
                    ),
                    ctx.now,
                );
                self.mission = None;
                time
            }
        }
    }

    fn task_finished<R: Rng>(
        &self,
        kind: TaskKind,
        profile: &AgentProfile,
        ctx: &mut MindContext<'_, R>,
    ) {
        debug!(agent_id = %self.agent_id, task = %kind, "Task finished");
        if let Some(category) = self.task_selector.noteworthy(kind) {
            ctx.event_log.register(
                HistoricalEvent::new(
                    category,
                    format!("{} finished {kind}", profile.name),
                    profile.name.clone(),
                ),
                ctx.now,
            );
        }
    }

    /// Whether the agent may take on missions right now.
    fn mission_eligible(
        profile: &AgentProfile,
        collaborators: &Collaborators,
        config: &MindConfig,
    ) -> bool {
        profile.performance >= config.min_mission_performance
            && !collaborators
                .policy
                .is_mission_creation_overridden(&profile.location)
    }

    /// Draw across task candidates then mission candidates.
    fn choose<R: Rng>(
        &self,
        profile: &AgentProfile,
        condition: &AgentCondition,
        ctx: &mut MindContext<'_, R>,
    ) -> Option<Choice> {
        let mut candidates: Vec<(Choice, f64)> = self
            .task_selector
            .candidates(condition, self.job)
            .into_iter()
            .map(|(kind, w)| (Choice::Task(kind), w))
            .collect();
        if Self::mission_eligible(profile, ctx.collaborators, ctx.config) {
            candidates.extend(
                ctx.registry
                    .mission_candidates(profile)
                    .into_iter()
                    .map(|(kind, w)| (Choice::Mission(kind), w)),
            );
        }

        let picked = select::weighted_pick(&candidates, &mut *ctx.rng).copied();
        if picked.is_none() {
            warn!(agent_id = %self.agent_id, "No task or mission available");
        }
        picked
    }

    fn bind<R: Rng>(
        &mut self,
        choice: Choice,
        profile: &AgentProfile,
        ctx: &mut MindContext<'_, R>,
    ) {
        match choice {
            Choice::Task(kind) => {
                if let Err(e) = self.task_selector.add_task(kind) {
                    warn!(agent_id = %self.agent_id, error = %e, "Task could not be started");
                } else {
                    debug!(agent_id = %self.agent_id, task = %kind, "Task started");
                }
            }
            Choice::Mission(kind) => {
                let Some(id) = ctx.registry.start_or_join(kind, self.agent_id, ctx.now) else {
                    warn!(agent_id = %self.agent_id, %kind, "Mission kind not in catalog");
                    return;
                };
                let founded = ctx
                    .registry
                    .get(id)
                    .is_some_and(|m| m.founder() == self.agent_id);
                info!(
                    agent_id = %self.agent_id,
                    mission_id = %id,
                    %kind,
                    founded,
                    "Joined mission"
                );
                let description = if founded {
                    format!("{} organised a {kind} mission", profile.name)
                } else {
                    format!("{} signed on to a {kind} mission", profile.name)
                };
                ctx.event_log.register(
                    HistoricalEvent::new(EventCategory::Mission, description, profile.name.clone()),
                    ctx.now,
                );
                self.task_selector.clear();
                self.mission = Some(id);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use colony_types::TaskPhase;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::collab::{AptitudeJobAssigner, LockdownPolicy, TimeTogether};
    use crate::config::MissionConfig;
    use crate::registry::MissionCatalog;
    use crate::task::{TaskCatalog, TaskMeta};

    struct FixedTask {
        kind: TaskKind,
        weight: f64,
        duration: f64,
    }

    impl TaskMeta for FixedTask {
        fn kind(&self) -> TaskKind {
            self.kind
        }
        fn probability(&self, _condition: &AgentCondition, _job: JobKind) -> f64 {
            self.weight
        }
        fn phases(&self) -> Vec<(TaskPhase, f64)> {
            vec![(TaskPhase::Working, self.duration)]
        }
    }

    struct Fixture {
        registry: MissionRegistry,
        event_log: EventLog,
        collaborators: Collaborators,
        config: MindConfig,
        rng: SmallRng,
    }

    impl Fixture {
        fn new(missions: MissionCatalog) -> Self {
            Self {
                registry: MissionRegistry::new(missions, &MissionConfig::default()),
                event_log: EventLog::with_default_capacity(),
                collaborators: Collaborators::default(),
                config: MindConfig::default(),
                rng: SmallRng::seed_from_u64(42),
            }
        }

        fn ctx(&mut self) -> MindContext<'_, SmallRng> {
            MindContext {
                registry: &mut self.registry,
                event_log: &mut self.event_log,
                collaborators: &self.collaborators,
                config: &self.config,
                rng: &mut self.rng,
                now: SimTime::ZERO,
            }
        }
    }

    fn mind_with(tasks: Vec<Arc<dyn TaskMeta>>, job: JobKind) -> AgentMind {
        let selector = TaskSelector::new(Arc::new(TaskCatalog::new(tasks)));
        AgentMind::new(AgentId::new(), job, selector)
    }

    fn profile_for(mind: &AgentMind, performance: f64) -> AgentProfile {
        AgentProfile {
            id: mind.agent_id(),
            name: "Ada".to_owned(),
            job: mind.job(),
            location: "Schiaparelli Point".to_owned(),
            performance,
            condition: AgentCondition::default(),
        }
    }

    #[test]
    fn short_tasks_are_chained_within_a_pulse() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        let mut mind = mind_with(
            vec![Arc::new(FixedTask {
                kind: TaskKind::Walk,
                weight: 1.0,
                duration: 3.0,
            })],
            JobKind::Pilot,
        );
        let profile = profile_for(&mind, 1.0);
        let mut condition = AgentCondition::default();

        let report = mind.time_passing(&profile, &mut condition, 10.0, &mut fx.ctx());
        assert!((report.consumed - 10.0).abs() < 1e-9);
        assert_eq!(report.outcome, Outcome::Consumed(report.consumed));
        assert_eq!(report.decisions, 4);
        assert_eq!(mind.task_selector().active_kind(), Some(TaskKind::Walk));
    }

    #[test]
    fn nothing_weighted_means_no_action() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        let mut mind = mind_with(
            vec![Arc::new(FixedTask {
                kind: TaskKind::Walk,
                weight: 0.0,
                duration: 3.0,
            })],
            JobKind::Pilot,
        );
        let profile = profile_for(&mind, 1.0);
        let mut condition = AgentCondition::default();

        let report = mind.time_passing(&profile, &mut condition, 10.0, &mut fx.ctx());
        assert_eq!(report.outcome, Outcome::NoAction { consumed: 0.0 });
        assert_eq!(report.decisions, 1);
    }

    #[test]
    fn instant_tasks_hit_the_decision_bound() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        let mut mind = mind_with(
            vec![Arc::new(FixedTask {
                kind: TaskKind::Walk,
                weight: 1.0,
                duration: 0.0,
            })],
            JobKind::Pilot,
        );
        let profile = profile_for(&mind, 1.0);
        let mut condition = AgentCondition::default();

        let report = mind.time_passing(&profile, &mut condition, 10.0, &mut fx.ctx());
        assert_eq!(report.decisions, fx.config.max_decisions_per_pulse);
        assert!(report.consumed.abs() < f64::EPSILON);
    }

    #[test]
    fn zero_budget_terminates_immediately() {
        let mut fx = Fixture::new(MissionCatalog::standard());
        let mut mind = mind_with(
            vec![Arc::new(FixedTask {
                kind: TaskKind::Walk,
                weight: 1.0,
                duration: 3.0,
            })],
            JobKind::Pilot,
        );
        let profile = profile_for(&mind, 1.0);
        let report =
            mind.time_passing(&profile, &mut AgentCondition::default(), 0.0, &mut fx.ctx());
        assert_eq!(report.decisions, 0);
        assert_eq!(report.outcome, Outcome::Consumed(0.0));
    }

    #[test]
    fn only_missions_available_binds_a_mission() {
        let mut fx = Fixture::new(MissionCatalog::standard());
        let mut mind = mind_with(Vec::new(), JobKind::Engineer);
        let profile = profile_for(&mind, 1.0);
        let mut condition = AgentCondition::default();

        mind.time_passing(&profile, &mut condition, 5.0, &mut fx.ctx());
        let id = mind.mission().unwrap();
        assert!(fx.registry.get(id).unwrap().is_member(mind.agent_id()));
        assert!(fx.event_log.by_category(EventCategory::Mission).count() >= 1);
    }

    #[test]
    fn poor_performers_skip_missions() {
        let mut fx = Fixture::new(MissionCatalog::standard());
        let mut mind = mind_with(Vec::new(), JobKind::Engineer);
        let profile = profile_for(&mind, 0.4);

        let report =
            mind.time_passing(&profile, &mut AgentCondition::default(), 5.0, &mut fx.ctx());
        assert!(matches!(report.outcome, Outcome::NoAction { .. }));
        assert!(fx.registry.is_empty());
    }

    #[test]
    fn lockdown_blocks_missions() {
        let mut fx = Fixture::new(MissionCatalog::standard());
        fx.collaborators = Collaborators::default()
            .with_policy(Arc::new(LockdownPolicy::new(["Schiaparelli Point"])));
        let mut mind = mind_with(Vec::new(), JobKind::Engineer);
        let profile = profile_for(&mind, 1.0);

        let report =
            mind.time_passing(&profile, &mut AgentCondition::default(), 5.0, &mut fx.ctx());
        assert!(matches!(report.outcome, Outcome::NoAction { .. }));
    }

    #[test]
    fn failed_mission_is_dropped_and_logged() {
        let mut fx = Fixture::new(MissionCatalog::standard());
        let mut mind = mind_with(Vec::new(), JobKind::Scientist);
        let founder = mind.agent_id();
        let id = fx
            .registry
            .start_or_join(MissionKind::Exploration, founder, SimTime::ZERO)
            .unwrap();
        mind.mission = Some(id);
        let profile = profile_for(&mind, 1.0);

        // A lone explorer cannot leave: embarking ends short-handed.
        mind.time_passing(&profile, &mut AgentCondition::default(), 25.0, &mut fx.ctx());
        assert!(fx.registry.get(id).unwrap().is_aborted());
        assert_ne!(mind.mission(), Some(id));
        assert!(
            fx.event_log
                .iter()
                .any(|e| e.description().contains("not enough members"))
        );
    }

    #[test]
    fn unlocked_jobs_are_reassigned_once() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        fx.collaborators = Collaborators::default()
            .with_jobs(Arc::new(AptitudeJobAssigner::default()));
        let mut mind = mind_with(
            vec![Arc::new(FixedTask {
                kind: TaskKind::Walk,
                weight: 1.0,
                duration: 3.0,
            })],
            JobKind::Unassigned,
        );
        let profile = profile_for(&mind, 1.0);
        let mut condition = AgentCondition::default();

        let report = mind.time_passing(&profile, &mut condition, 1.0, &mut fx.ctx());
        let change = report.job_change.unwrap();
        assert_eq!(change.from, JobKind::Unassigned);
        assert_eq!(mind.job(), change.to);

        let profile = profile_for(&mind, 1.0);
        let report = mind.time_passing(&profile, &mut condition, 1.0, &mut fx.ctx());
        assert!(report.job_change.is_none());
    }

    #[test]
    fn locked_jobs_stay_put() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        fx.collaborators = Collaborators::default()
            .with_jobs(Arc::new(AptitudeJobAssigner::default()));
        let mut mind = mind_with(Vec::new(), JobKind::Unassigned);
        mind.set_job_locked(true);
        let profile = profile_for(&mind, 1.0);
        let report =
            mind.time_passing(&profile, &mut AgentCondition::default(), 1.0, &mut fx.ctx());
        assert!(report.job_change.is_none());
        assert_eq!(mind.job(), JobKind::Unassigned);
    }

    #[test]
    fn relationships_hear_about_every_pulse() {
        let mut fx = Fixture::new(MissionCatalog::empty());
        let tracker = Arc::new(TimeTogether::new());
        fx.collaborators = Collaborators::default().with_relationships(tracker.clone());
        let mut mind = mind_with(Vec::new(), JobKind::Pilot);
        let profile = profile_for(&mind, 1.0);
        mind.time_passing(&profile, &mut AgentCondition::default(), 7.0, &mut fx.ctx());
        assert!((tracker.time_for(mind.agent_id()) - 7.0).abs() < f64::EPSILON);
    }
}
