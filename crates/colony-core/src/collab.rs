//! External collaborators consulted by an agent's mind.
//!
//! The mind never decides jobs, settlement rules or social bookkeeping on
//! its own. It asks a [`JobAssigner`], a [`SettlementPolicy`] and a
//! [`RelationshipTracker`], bundled in [`Collaborators`]. Each seam ships
//! with a do-nothing default and one working implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use colony_types::{AgentCondition, AgentId, JobKind};
use serde::Serialize;

/// Read-only view of an agent handed to collaborators and to mission
/// weighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentProfile {
    /// The agent.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current job designation.
    pub job: JobKind,
    /// Name of the settlement the agent is in.
    pub location: String,
    /// Performance rating in `[0, 1]`.
    pub performance: f64,
    /// Condition snapshot at the start of the pulse.
    pub condition: AgentCondition,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Decides an agent's job designation when it is not locked.
pub trait JobAssigner: Send + Sync {
    /// The job the agent should hold. Returning the current job means no
    /// change.
    fn decide_job(&self, profile: &AgentProfile) -> JobKind;
}

/// Never changes anyone's job.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepCurrentJob;

impl JobAssigner for KeepCurrentJob {
    fn decide_job(&self, profile: &AgentProfile) -> JobKind {
        profile.job
    }
}

/// Gives unassigned agents a job.
///
/// Unassigned agents under heavy stress are put in the greenhouse. The
/// rest receive a job derived from their id, so repeated decisions for the
/// same agent agree. Assigned agents keep their job.
#[derive(Debug, Clone, Copy)]
pub struct AptitudeJobAssigner {
    /// Stress level at or above which an unassigned agent becomes a
    /// botanist.
    pub stress_threshold: f64,
}

impl Default for AptitudeJobAssigner {
    fn default() -> Self {
        Self {
            stress_threshold: 700.0,
        }
    }
}

/// Jobs an unassigned agent can be given.
const ASSIGNABLE: [JobKind; 6] = [
    JobKind::Engineer,
    JobKind::Botanist,
    JobKind::Doctor,
    JobKind::Pilot,
    JobKind::Scientist,
    JobKind::Trader,
];

impl JobAssigner for AptitudeJobAssigner {
    fn decide_job(&self, profile: &AgentProfile) -> JobKind {
        if profile.job != JobKind::Unassigned {
            return profile.job;
        }
        if profile.condition.stress() >= self.stress_threshold {
            return JobKind::Botanist;
        }
        let len = u128::try_from(ASSIGNABLE.len()).unwrap_or(1);
        profile
            .id
            .into_inner()
            .as_u128()
            .checked_rem(len)
            .and_then(|slot| usize::try_from(slot).ok())
            .and_then(|i| ASSIGNABLE.get(i).copied())
            .unwrap_or(JobKind::Engineer)
    }
}

// ---------------------------------------------------------------------------
// Settlement policy
// ---------------------------------------------------------------------------

/// Settlement-level rules that can forbid starting missions.
pub trait SettlementPolicy: Send + Sync {
    /// Whether agents at `location` are barred from missions.
    fn is_mission_creation_overridden(&self, location: &str) -> bool;
}

/// Allows missions everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenPolicy;

impl SettlementPolicy for OpenPolicy {
    fn is_mission_creation_overridden(&self, _location: &str) -> bool {
        false
    }
}

/// Bars missions from a fixed set of locked-down settlements.
#[derive(Debug, Clone, Default)]
pub struct LockdownPolicy {
    locked: BTreeSet<String>,
}

impl LockdownPolicy {
    /// Lock down every named settlement.
    pub fn new<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locked: locations.into_iter().map(Into::into).collect(),
        }
    }
}

impl SettlementPolicy for LockdownPolicy {
    fn is_mission_creation_overridden(&self, location: &str) -> bool {
        self.locked.contains(location)
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Told about every agent's passing time.
pub trait RelationshipTracker: Send + Sync {
    /// `agent` experienced `millisols` of simulated time.
    fn on_time_passing(&self, agent: AgentId, millisols: f64);
}

/// Ignores time passing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelationships;

impl RelationshipTracker for NoRelationships {
    fn on_time_passing(&self, _agent: AgentId, _millisols: f64) {}
}

/// Accumulates how long each agent has spent in the settlement.
#[derive(Debug, Default)]
pub struct TimeTogether {
    elapsed: Mutex<BTreeMap<AgentId, f64>>,
}

impl TimeTogether {
    /// Create an empty tracker.
    pub const fn new() -> Self {
        Self {
            elapsed: Mutex::new(BTreeMap::new()),
        }
    }

    /// Total millisols recorded for `agent`.
    pub fn time_for(&self, agent: AgentId) -> f64 {
        let elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        elapsed.get(&agent).copied().unwrap_or(0.0)
    }
}

impl RelationshipTracker for TimeTogether {
    fn on_time_passing(&self, agent: AgentId, millisols: f64) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed.entry(agent).or_insert(0.0) += millisols.max(0.0);
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// The collaborators every mind consults.
#[derive(Clone)]
pub struct Collaborators {
    /// Job designation decisions.
    pub jobs: Arc<dyn JobAssigner>,
    /// Settlement-level mission rules.
    pub policy: Arc<dyn SettlementPolicy>,
    /// Relationship bookkeeping.
    pub relationships: Arc<dyn RelationshipTracker>,
}

impl Collaborators {
    /// Replace the job assigner.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Arc<dyn JobAssigner>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Replace the settlement policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn SettlementPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the relationship tracker.
    #[must_use]
    pub fn with_relationships(mut self, relationships: Arc<dyn RelationshipTracker>) -> Self {
        self.relationships = relationships;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            jobs: Arc::new(KeepCurrentJob),
            policy: Arc::new(OpenPolicy),
            relationships: Arc::new(NoRelationships),
        }
    }
}

impl core::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
