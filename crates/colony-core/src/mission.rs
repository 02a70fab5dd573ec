//! Shared, multi-agent missions.
//!
//! A [`Mission`] walks a kind-specific ordered list of phases from
//! [`MissionPhase::Embarking`] to [`MissionPhase::Done`]. Every member's
//! time advances the same shared progress counter, so a crew of three
//! finishes a phase three times faster than a lone member.
//! [`MissionPhase::Aborted`] is reachable from any non-terminal phase via
//! [`Mission::end_mission`].
//!
//! # Design Principles
//!
//! - Missions are owned by the [`MissionRegistry`]. Agents refer to them
//!   by [`MissionId`] only.
//! - Domain failures are values ([`MissionFailure`]), never panics.
//! - Phases never regress. Terminal missions never change again.
//!
//! [`MissionRegistry`]: crate::registry::MissionRegistry

use std::collections::BTreeSet;

use colony_types::{AgentId, EventCategory, JobKind, MissionId, MissionKind, MissionPhase, SimTime};
use rand::Rng;
use serde::Serialize;

use crate::collab::AgentProfile;

/// Remaining phase progress below this counts as finished.
const PHASE_EPSILON: f64 = 1e-9;

/// Members always contribute at least this fraction of their time.
const MIN_PROGRESS_FACTOR: f64 = 0.1;

/// End reason recorded when the last member leaves.
pub const NO_MEMBERS_REMAINING: &str = "no members remaining";

// ---------------------------------------------------------------------------
// Outcomes and failures
// ---------------------------------------------------------------------------

/// Result of asking to join a mission. Only [`Joined`](Self::Joined)
/// changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinOutcome {
    /// The agent is now a member.
    Joined,
    /// The agent was already a member.
    AlreadyMember,
    /// The mission is at capacity.
    Full,
    /// The mission has ended.
    Closed,
}

/// A recoverable mission-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissionFailure {
    /// No mission has this id.
    #[error("mission {mission} does not exist")]
    Unknown {
        /// The missing mission.
        mission: MissionId,
    },

    /// The caller is not on the crew.
    #[error("agent {agent} is not a member of the mission")]
    NotAMember {
        /// The calling agent.
        agent: AgentId,
    },

    /// The mission already ended.
    #[error("mission is already {phase}")]
    Terminal {
        /// The terminal phase.
        phase: MissionPhase,
    },

    /// Embarking finished without a large enough crew.
    #[error("not enough members ({members} of {required})")]
    NotEnoughMembers {
        /// Crew size when embarking finished.
        members: usize,
        /// Minimum crew size.
        required: usize,
    },

    /// The vehicle broke down while travelling.
    #[error("vehicle malfunction while {phase}")]
    VehicleMalfunction {
        /// The travel phase the breakdown happened in.
        phase: MissionPhase,
    },
}

impl MissionFailure {
    /// Whether this failure ends the mission for the whole crew.
    pub const fn ends_mission(&self) -> bool {
        matches!(
            self,
            Self::NotEnoughMembers { .. } | Self::VehicleMalfunction { .. }
        )
    }

    /// Event category used when logging this failure.
    pub const fn category(&self) -> EventCategory {
        match self {
            Self::VehicleMalfunction { .. } => EventCategory::Malfunction,
            _ => EventCategory::Mission,
        }
    }
}

// ---------------------------------------------------------------------------
// Profiles and metadata
// ---------------------------------------------------------------------------

/// Static shape of a mission kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionProfile {
    /// Maximum crew size.
    pub capacity: usize,
    /// Crew size required when embarking finishes.
    pub min_members: usize,
    /// Ordered non-terminal phases with the crew-millisols each needs.
    pub phases: Vec<(MissionPhase, f64)>,
    /// Whether travel phases use a vehicle that can break down.
    pub uses_vehicle: bool,
}

impl MissionProfile {
    /// The built-in profile of `kind`.
    pub fn standard(kind: MissionKind) -> Self {
        use MissionPhase::{
            Constructing, Disembarking, Embarking, Exploring, Loading, Rescuing, Returning,
            Trading, Travelling, Unloading,
        };
        let (capacity, min_members, uses_vehicle, phases) = match kind {
            MissionKind::Exploration => (
                4,
                2,
                true,
                vec![
                    (Embarking, 20.0),
                    (Travelling, 60.0),
                    (Exploring, 150.0),
                    (Returning, 60.0),
                    (Disembarking, 20.0),
                ],
            ),
            MissionKind::Construction => (
                6,
                2,
                false,
                vec![(Embarking, 20.0), (Constructing, 200.0), (Disembarking, 10.0)],
            ),
            MissionKind::Resupply => (
                3,
                1,
                true,
                vec![
                    (Embarking, 15.0),
                    (Travelling, 80.0),
                    (Loading, 20.0),
                    (Returning, 80.0),
                    (Unloading, 30.0),
                    (Disembarking, 10.0),
                ],
            ),
            MissionKind::Trade => (
                2,
                1,
                true,
                vec![
                    (Embarking, 15.0),
                    (Travelling, 100.0),
                    (Trading, 60.0),
                    (Returning, 100.0),
                    (Disembarking, 10.0),
                ],
            ),
            MissionKind::Rescue => (
                3,
                2,
                true,
                vec![
                    (Embarking, 10.0),
                    (Travelling, 50.0),
                    (Rescuing, 40.0),
                    (Returning, 50.0),
                    (Disembarking, 10.0),
                ],
            ),
        };
        Self {
            capacity,
            min_members,
            phases,
            uses_vehicle,
        }
    }
}

/// Describes one kind of mission: its appeal and its shape.
pub trait MissionMeta: Send + Sync {
    /// The kind of mission this describes.
    fn kind(&self) -> MissionKind;

    /// Selection weight (≥ 0) of this mission for `agent`.
    fn probability(&self, agent: &AgentProfile) -> f64;

    /// Capacity, crew minimum and phases.
    fn profile(&self) -> MissionProfile;
}

/// The built-in mission descriptions.
#[derive(Debug, Clone, Copy)]
pub struct StandardMission(pub MissionKind);

impl MissionMeta for StandardMission {
    fn kind(&self) -> MissionKind {
        self.0
    }

    fn probability(&self, agent: &AgentProfile) -> f64 {
        let affinity = match (self.0, agent.job) {
            (MissionKind::Exploration, JobKind::Scientist)
            | (MissionKind::Construction, JobKind::Engineer)
            | (MissionKind::Trade, JobKind::Trader) => 8.0,
            (MissionKind::Exploration | MissionKind::Resupply, JobKind::Pilot) => 6.0,
            (MissionKind::Rescue, JobKind::Doctor) => 5.0,
            (MissionKind::Rescue, JobKind::Pilot) | (MissionKind::Resupply, JobKind::Trader) => {
                4.0
            }
            (MissionKind::Trade, _) => 0.5,
            (MissionKind::Exploration | MissionKind::Construction, _) => 2.0,
            (MissionKind::Resupply | MissionKind::Rescue, _) => 1.0,
        };
        affinity * agent.performance
    }

    fn profile(&self) -> MissionProfile {
        MissionProfile::standard(self.0)
    }
}

// ---------------------------------------------------------------------------
// Mission
// ---------------------------------------------------------------------------

/// One running mission and its crew.
#[derive(Debug, Clone)]
pub struct Mission {
    /// Unique identifier.
    id: MissionId,
    /// What kind of mission this is.
    kind: MissionKind,
    /// Shape of the mission.
    profile: MissionProfile,
    /// Index into `profile.phases`; equals its length once done.
    phase_index: usize,
    /// Progress accumulated in the current phase.
    progress: f64,
    /// Current crew.
    members: BTreeSet<AgentId>,
    /// The agent that started the mission.
    founder: AgentId,
    /// When the mission was started.
    created_at: SimTime,
    /// Why the mission was aborted, if it was.
    end_reason: Option<String>,
}

impl Mission {
    /// Start a mission with `founder` as its only member.
    pub fn new(kind: MissionKind, profile: MissionProfile, founder: AgentId, now: SimTime) -> Self {
        let phases = profile
            .phases
            .into_iter()
            .filter(|(p, d)| !p.is_terminal() && d.is_finite() && *d > 0.0)
            .collect();
        let profile = MissionProfile {
            capacity: profile.capacity.max(1),
            min_members: profile.min_members,
            phases,
            uses_vehicle: profile.uses_vehicle,
        };
        Self {
            id: MissionId::new(),
            kind,
            profile,
            phase_index: 0,
            progress: 0.0,
            members: BTreeSet::from([founder]),
            founder,
            created_at: now,
            end_reason: None,
        }
    }

    /// Start a mission of `kind` with its built-in profile.
    pub fn standard(kind: MissionKind, founder: AgentId, now: SimTime) -> Self {
        Self::new(kind, MissionProfile::standard(kind), founder, now)
    }

    /// Unique identifier.
    pub const fn id(&self) -> MissionId {
        self.id
    }

    /// What kind of mission this is.
    pub const fn kind(&self) -> MissionKind {
        self.kind
    }

    /// Shape of the mission.
    pub const fn profile(&self) -> &MissionProfile {
        &self.profile
    }

    /// Current phase.
    pub fn phase(&self) -> MissionPhase {
        if self.end_reason.is_some() {
            return MissionPhase::Aborted;
        }
        self.profile
            .phases
            .get(self.phase_index)
            .map_or(MissionPhase::Done, |(p, _)| *p)
    }

    /// Whether the mission reached `Done` or `Aborted`.
    pub fn is_done(&self) -> bool {
        self.phase().is_terminal()
    }

    /// Whether the mission was aborted.
    pub const fn is_aborted(&self) -> bool {
        self.end_reason.is_some()
    }

    /// Why the mission was aborted, if it was.
    pub fn end_reason(&self) -> Option<&str> {
        self.end_reason.as_deref()
    }

    /// Current crew.
    pub const fn members(&self) -> &BTreeSet<AgentId> {
        &self.members
    }

    /// Whether `agent` is on the crew.
    pub fn is_member(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    /// Whether the crew is at capacity.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.profile.capacity
    }

    /// The agent that started the mission.
    pub const fn founder(&self) -> AgentId {
        self.founder
    }

    /// When the mission was started.
    pub const fn created_at(&self) -> SimTime {
        self.created_at
    }

    /// Progress accumulated in the current phase.
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    /// Add `agent` to the crew if there is room and the mission is open.
    pub fn join(&mut self, agent: AgentId) -> JoinOutcome {
        if self.is_done() {
            JoinOutcome::Closed
        } else if self.members.contains(&agent) {
            JoinOutcome::AlreadyMember
        } else if self.is_full() {
            JoinOutcome::Full
        } else {
            self.members.insert(agent);
            JoinOutcome::Joined
        }
    }

    /// Remove `agent` from the crew. Returns whether it was a member.
    ///
    /// A non-terminal mission left without members is aborted.
    pub fn leave(&mut self, agent: AgentId) -> bool {
        let removed = self.members.remove(&agent);
        if removed && self.members.is_empty() {
            self.end_mission(NO_MEMBERS_REMAINING);
        }
        removed
    }

    /// Abort the mission. Returns whether it transitioned; terminal
    /// missions are left untouched.
    pub fn end_mission(&mut self, reason: impl Into<String>) -> bool {
        if self.is_done() {
            return false;
        }
        self.end_reason = Some(reason.into());
        true
    }

    /// Spend up to `time` millisols of `agent`'s time on the current phase.
    ///
    /// Progress is scaled by `performance` (never below a tenth); consumed
    /// time is not. Returns the unused time when the phase completes, and
    /// zero otherwise. While travelling in a vehicle each millisol carries
    /// `risk` chance of a breakdown.
    ///
    /// # Errors
    ///
    /// Returns a [`MissionFailure`] when the caller is not a member, the
    /// mission already ended, the crew is too small once embarking
    /// finishes, or the vehicle breaks down.
    pub fn perform<R: Rng>(
        &mut self,
        agent: AgentId,
        time: f64,
        performance: f64,
        rng: &mut R,
        risk: f64,
    ) -> Result<f64, MissionFailure> {
        let phase = self.phase();
        if phase.is_terminal() {
            return Err(MissionFailure::Terminal { phase });
        }
        if !self.is_member(agent) {
            return Err(MissionFailure::NotAMember { agent });
        }
        let time = time.max(0.0);
        let Some(&(_, duration)) = self.profile.phases.get(self.phase_index) else {
            return Ok(time);
        };

        let factor = performance.clamp(0.0, 1.0).max(MIN_PROGRESS_FACTOR);
        let needed = (duration - self.progress).max(0.0) / factor;
        let consumed = time.min(needed);

        if self.profile.uses_vehicle && phase.is_travel() && risk > 0.0 && consumed > 0.0 {
            let chance = 1.0 - (1.0 - risk.min(1.0)).powf(consumed);
            if rng.random::<f64>() < chance {
                return Err(MissionFailure::VehicleMalfunction { phase });
            }
        }

        self.progress += consumed * factor;
        if duration - self.progress > PHASE_EPSILON {
            return Ok(0.0);
        }

        if phase == MissionPhase::Embarking && self.members.len() < self.profile.min_members {
            return Err(MissionFailure::NotEnoughMembers {
                members: self.members.len(),
                required: self.profile.min_members,
            });
        }
        self.phase_index = self.phase_index.saturating_add(1);
        self.progress = 0.0;
        Ok(time - consumed)
    }

    /// Read-only view of this mission.
    pub fn snapshot(&self) -> MissionSnapshot {
        MissionSnapshot {
            id: self.id,
            kind: self.kind,
            phase: self.phase(),
            progress: self.progress,
            members: self.members.iter().copied().collect(),
            founder: self.founder,
            created_at: self.created_at,
            end_reason: self.end_reason.clone(),
        }
    }
}

/// Point-in-time view of a mission for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionSnapshot {
    /// Mission id.
    pub id: MissionId,
    /// Mission kind.
    pub kind: MissionKind,
    /// Phase at snapshot time.
    pub phase: MissionPhase,
    /// Progress in that phase.
    pub progress: f64,
    /// Crew at snapshot time.
    pub members: Vec<AgentId>,
    /// The agent that started the mission.
    pub founder: AgentId,
    /// When the mission was started.
    pub created_at: SimTime,
    /// Why the mission was aborted, if it was.
    pub end_reason: Option<String>,
}
