//! Short-lived, single-agent tasks and the per-agent task selector.
//!
//! A task is a sequence of timed phases. Performing a task consumes the
//! caller's time up to the end of the current phase and hands back the
//! rest, so a caller holding a budget keeps re-entering until the budget
//! is spent or the task finishes.
//!
//! Which tasks exist, how attractive each is to an agent, and how long
//! each phase lasts are described by [`TaskMeta`] implementations
//! collected in a [`TaskCatalog`]. Every agent owns its own
//! [`TaskSelector`]; the catalog is shared read-only.

use std::sync::Arc;

use colony_types::{AgentCondition, EventCategory, JobKind, TaskKind, TaskPhase};
use rand::Rng;

use crate::select;

/// Remaining phase time below this counts as finished.
const PHASE_EPSILON: f64 = 1e-9;

/// Errors raised by task selection.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    /// Every candidate task has zero weight.
    #[error("no eligible task: all task weights are zero")]
    NoEligibleTask,

    /// The requested kind is not in the catalog.
    #[error("task {kind:?} is not in the catalog")]
    UnknownTask {
        /// The requested task kind.
        kind: TaskKind,
    },
}

// ---------------------------------------------------------------------------
// TaskMeta / TaskCatalog
// ---------------------------------------------------------------------------

/// Describes one kind of task: its attractiveness and its phases.
pub trait TaskMeta: Send + Sync {
    /// The kind of task this describes.
    fn kind(&self) -> TaskKind;

    /// Selection weight (≥ 0) for an agent in `condition` holding `job`.
    fn probability(&self, condition: &AgentCondition, job: JobKind) -> f64;

    /// Ordered phases with their durations in millisols.
    fn phases(&self) -> Vec<(TaskPhase, f64)>;

    /// Category to log when the task completes, if completion is
    /// noteworthy.
    fn noteworthy(&self) -> Option<EventCategory> {
        None
    }
}

/// The built-in task descriptions.
#[derive(Debug, Clone, Copy)]
pub struct StandardTask(pub TaskKind);

impl StandardTask {
    /// Weight of job work: high for the matching job, low otherwise,
    /// scaled by how well the agent is performing.
    fn work_weight(
        condition: &AgentCondition,
        job: JobKind,
        specialist: JobKind,
        base: f64,
    ) -> f64 {
        let affinity = if job == specialist {
            base * 3.0
        } else if job == JobKind::Unassigned {
            base
        } else {
            base * 0.5
        };
        affinity * condition.performance_rating()
    }
}

impl TaskMeta for StandardTask {
    fn kind(&self) -> TaskKind {
        self.0
    }

    fn probability(&self, condition: &AgentCondition, job: JobKind) -> f64 {
        match self.0 {
            TaskKind::Sleep => ((condition.fatigue() - 400.0) / 4.0).max(0.0),
            TaskKind::EatMeal => ((condition.hunger() - 300.0) / 3.0).max(0.0),
            TaskKind::Relax => 5.0 + condition.stress() / 20.0,
            TaskKind::Walk => 3.0 + condition.stress() / 50.0,
            TaskKind::Maintenance => Self::work_weight(condition, job, JobKind::Engineer, 10.0),
            TaskKind::Research => Self::work_weight(condition, job, JobKind::Scientist, 10.0),
            TaskKind::TendGreenhouse => {
                Self::work_weight(condition, job, JobKind::Botanist, 10.0)
            }
            TaskKind::MedicalCheckup => {
                if job == JobKind::Doctor {
                    20.0 * condition.performance_rating()
                } else {
                    0.0
                }
            }
        }
    }

    fn phases(&self) -> Vec<(TaskPhase, f64)> {
        match self.0 {
            TaskKind::Sleep => vec![(TaskPhase::Preparing, 10.0), (TaskPhase::Resting, 240.0)],
            TaskKind::EatMeal => vec![
                (TaskPhase::Preparing, 20.0),
                (TaskPhase::Eating, 30.0),
                (TaskPhase::CleaningUp, 10.0),
            ],
            TaskKind::Relax => vec![(TaskPhase::Resting, 60.0)],
            TaskKind::Walk => vec![(TaskPhase::Walking, 40.0)],
            TaskKind::Maintenance => vec![
                (TaskPhase::Walking, 10.0),
                (TaskPhase::Working, 90.0),
                (TaskPhase::CleaningUp, 10.0),
            ],
            TaskKind::Research => vec![(TaskPhase::Preparing, 15.0), (TaskPhase::Working, 120.0)],
            TaskKind::TendGreenhouse => {
                vec![(TaskPhase::Walking, 10.0), (TaskPhase::Working, 100.0)]
            }
            TaskKind::MedicalCheckup => {
                vec![(TaskPhase::Preparing, 10.0), (TaskPhase::Working, 60.0)]
            }
        }
    }

    fn noteworthy(&self) -> Option<EventCategory> {
        match self.0 {
            TaskKind::Maintenance | TaskKind::Research => Some(EventCategory::Task),
            TaskKind::MedicalCheckup => Some(EventCategory::Medical),
            _ => None,
        }
    }
}

/// An ordered collection of task descriptions.
///
/// Candidate order is catalog order, which makes weighted draws
/// reproducible for a given random seed.
pub struct TaskCatalog {
    metas: Vec<Arc<dyn TaskMeta>>,
}

impl TaskCatalog {
    /// Build a catalog from descriptions. Later duplicates of a kind are
    /// ignored.
    pub fn new(metas: Vec<Arc<dyn TaskMeta>>) -> Self {
        let mut unique: Vec<Arc<dyn TaskMeta>> = Vec::with_capacity(metas.len());
        for meta in metas {
            if unique.iter().all(|m| m.kind() != meta.kind()) {
                unique.push(meta);
            }
        }
        Self { metas: unique }
    }

    /// The built-in catalog of every [`TaskKind`].
    pub fn standard() -> Self {
        let kinds = [
            TaskKind::Sleep,
            TaskKind::EatMeal,
            TaskKind::Relax,
            TaskKind::Maintenance,
            TaskKind::Research,
            TaskKind::TendGreenhouse,
            TaskKind::MedicalCheckup,
            TaskKind::Walk,
        ];
        Self::new(
            kinds
                .into_iter()
                .map(|k| Arc::new(StandardTask(k)) as Arc<dyn TaskMeta>)
                .collect(),
        )
    }

    /// Look up the description of `kind`.
    pub fn find(&self, kind: TaskKind) -> Option<&Arc<dyn TaskMeta>> {
        self.metas.iter().find(|m| m.kind() == kind)
    }

    /// Number of described task kinds.
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// Whether the catalog describes no tasks.
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Iterate over descriptions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn TaskMeta>> {
        self.metas.iter()
    }
}

impl core::fmt::Debug for TaskCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.metas.iter().map(|m| m.kind()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A task bound to one agent, progressing through its phases.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// What kind of task this is.
    kind: TaskKind,
    /// Phases with their durations.
    phases: Vec<(TaskPhase, f64)>,
    /// Index of the current phase; equals `phases.len()` when done.
    phase_index: usize,
    /// Millisols left in the current phase.
    remaining_in_phase: f64,
    /// Work credited so far (time scaled by performance).
    effort: f64,
    /// Millisols spent so far.
    time_spent: f64,
}

impl Task {
    /// Create a task. Phases without a positive duration are dropped.
    pub fn new(kind: TaskKind, phases: Vec<(TaskPhase, f64)>) -> Self {
        let phases: Vec<_> = phases
            .into_iter()
            .filter(|(_, d)| d.is_finite() && *d > 0.0)
            .collect();
        let remaining_in_phase = phases.first().map_or(0.0, |(_, d)| *d);
        Self {
            kind,
            phases,
            phase_index: 0,
            remaining_in_phase,
            effort: 0.0,
            time_spent: 0.0,
        }
    }

    /// What kind of task this is.
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The current phase, or `None` once finished.
    pub fn phase(&self) -> Option<TaskPhase> {
        self.phases.get(self.phase_index).map(|(p, _)| *p)
    }

    /// Whether every phase has been completed.
    pub fn is_done(&self) -> bool {
        self.phase_index >= self.phases.len()
    }

    /// Work credited so far.
    pub const fn effort(&self) -> f64 {
        self.effort
    }

    /// Millisols spent so far.
    pub const fn time_spent(&self) -> f64 {
        self.time_spent
    }

    /// Work on the task for up to `time` millisols.
    ///
    /// Stops at the end of the current phase and returns the unused time.
    /// A finished task consumes nothing.
    pub fn perform(&mut self, time: f64, performance: f64) -> f64 {
        let time = time.max(0.0);
        if self.is_done() || time <= 0.0 {
            return time;
        }
        let consumed = time.min(self.remaining_in_phase);
        self.remaining_in_phase -= consumed;
        self.time_spent += consumed;
        self.effort += consumed * performance.clamp(0.0, 1.0);

        if self.remaining_in_phase <= PHASE_EPSILON {
            self.phase_index = self.phase_index.saturating_add(1);
            self.remaining_in_phase = self.phases.get(self.phase_index).map_or(0.0, |(_, d)| *d);
        }
        time - consumed
    }
}

// ---------------------------------------------------------------------------
// TaskSelector
// ---------------------------------------------------------------------------

/// Per-agent task choice and execution.
#[derive(Debug)]
pub struct TaskSelector {
    /// Shared task descriptions.
    catalog: Arc<TaskCatalog>,
    /// The task currently bound, if any.
    active: Option<Task>,
}

impl TaskSelector {
    /// Create a selector with no bound task.
    pub const fn new(catalog: Arc<TaskCatalog>) -> Self {
        Self {
            catalog,
            active: None,
        }
    }

    /// Every catalog task with its weight for this agent, in catalog order.
    pub fn candidates(&self, condition: &AgentCondition, job: JobKind) -> Vec<(TaskKind, f64)> {
        self.catalog
            .iter()
            .map(|meta| {
                let weight = meta.probability(condition, job);
                let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
                (meta.kind(), weight)
            })
            .collect()
    }

    /// Sum of all candidate weights.
    pub fn total_weight(&self, condition: &AgentCondition, job: JobKind) -> f64 {
        select::total_weight(&self.candidates(condition, job))
    }

    /// Whether a task is bound.
    pub const fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Kind of the bound task, if any.
    pub fn active_kind(&self) -> Option<TaskKind> {
        self.active.as_ref().map(Task::kind)
    }

    /// The bound task, if any.
    pub const fn active_task(&self) -> Option<&Task> {
        self.active.as_ref()
    }

    /// Bind a new task of `kind`, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::UnknownTask`] if the catalog has no such kind.
    pub fn add_task(&mut self, kind: TaskKind) -> Result<(), TaskError> {
        let meta = self
            .catalog
            .find(kind)
            .ok_or(TaskError::UnknownTask { kind })?;
        self.active = Some(Task::new(kind, meta.phases()));
        Ok(())
    }

    /// Drop the bound task, if any.
    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Perform the bound task for up to `time` millisols.
    ///
    /// Returns the leftover time (≥ 0). The binding is cleared once the
    /// task completes. With no bound task all of `time` is returned.
    pub fn perform_task(&mut self, time: f64, performance: f64) -> f64 {
        let Some(task) = self.active.as_mut() else {
            return time.max(0.0);
        };
        let leftover = task.perform(time, performance);
        if task.is_done() {
            self.active = None;
        }
        leftover
    }

    /// Draw a new task kind by weight.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NoEligibleTask`] when every weight is zero.
    pub fn choose_new_task<R: Rng>(
        &self,
        condition: &AgentCondition,
        job: JobKind,
        rng: &mut R,
    ) -> Result<TaskKind, TaskError> {
        let candidates = self.candidates(condition, job);
        select::weighted_pick(&candidates, rng)
            .copied()
            .ok_or(TaskError::NoEligibleTask)
    }

    /// Category to log when a task of `kind` completes, if any.
    pub fn noteworthy(&self, kind: TaskKind) -> Option<EventCategory> {
        self.catalog.find(kind).and_then(|m| m.noteworthy())
    }
}
