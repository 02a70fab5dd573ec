//! The mission registry: single owner of every mission.
//!
//! Agents hold [`MissionId`]s, never references. The simulation hands the
//! registry to one agent at a time, so shared mission state is only ever
//! mutated by a single writer.

use std::collections::BTreeSet;
use std::sync::Arc;

use colony_types::{AgentId, MissionId, MissionKind, MissionPhase, SimTime};
use rand::Rng;
use tracing::{debug, info};

use crate::collab::AgentProfile;
use crate::config::MissionConfig;
use crate::mission::{
    JoinOutcome, Mission, MissionFailure, MissionMeta, MissionSnapshot, StandardMission,
};
use crate::select;

/// An ordered collection of mission descriptions.
pub struct MissionCatalog {
    metas: Vec<Arc<dyn MissionMeta>>,
}

impl MissionCatalog {
    /// Build a catalog. Later duplicates of a kind are ignored.
    pub fn new(metas: Vec<Arc<dyn MissionMeta>>) -> Self {
        let mut unique: Vec<Arc<dyn MissionMeta>> = Vec::with_capacity(metas.len());
        for meta in metas {
            if unique.iter().all(|m| m.kind() != meta.kind()) {
                unique.push(meta);
            }
        }
        Self { metas: unique }
    }

    /// The built-in catalog of every [`MissionKind`].
    pub fn standard() -> Self {
        Self::new(
            MissionKind::ALL
                .into_iter()
                .map(|k| Arc::new(StandardMission(k)) as Arc<dyn MissionMeta>)
                .collect(),
        )
    }

    /// A catalog with no missions.
    pub const fn empty() -> Self {
        Self { metas: Vec::new() }
    }

    /// Look up the description of `kind`.
    pub fn find(&self, kind: MissionKind) -> Option<&Arc<dyn MissionMeta>> {
        self.metas.iter().find(|m| m.kind() == kind)
    }
}

impl core::fmt::Debug for MissionCatalog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.metas.iter().map(|m| m.kind()))
            .finish()
    }
}

/// Owns every mission, running or finished, until pruned.
#[derive(Debug)]
pub struct MissionRegistry {
    /// Mission descriptions.
    catalog: MissionCatalog,
    /// Missions in registration order.
    missions: Vec<Mission>,
    /// Vehicle breakdown chance per millisol of travel.
    malfunction_risk: f64,
}

impl MissionRegistry {
    /// Create an empty registry.
    pub fn new(catalog: MissionCatalog, config: &MissionConfig) -> Self {
        Self {
            catalog,
            missions: Vec::new(),
            malfunction_risk: config.malfunction_risk_per_millisol.clamp(0.0, 1.0),
        }
    }

    /// Every catalog mission kind with its weight for `agent`, in catalog
    /// order.
    pub fn mission_candidates(&self, agent: &AgentProfile) -> Vec<(MissionKind, f64)> {
        self.catalog
            .metas
            .iter()
            .map(|meta| {
                let weight = meta.probability(agent);
                let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
                (meta.kind(), weight)
            })
            .collect()
    }

    /// Sum of the weights of missions `agent` could start.
    pub fn total_mission_probability(&self, agent: &AgentProfile) -> f64 {
        select::total_weight(&self.mission_candidates(agent))
    }

    /// Draw a mission kind by weight and instantiate it with `agent` as
    /// founder. Nothing is registered. `None` when every weight is zero.
    pub fn select_new_mission<R: Rng>(
        &self,
        agent: &AgentProfile,
        rng: &mut R,
        now: SimTime,
    ) -> Option<Mission> {
        let candidates = self.mission_candidates(agent);
        let kind = *select::weighted_pick(&candidates, rng)?;
        self.instantiate(kind, agent.id, now)
    }

    fn instantiate(&self, kind: MissionKind, founder: AgentId, now: SimTime) -> Option<Mission> {
        let meta = self.catalog.find(kind)?;
        Some(Mission::new(kind, meta.profile(), founder, now))
    }

    /// Take ownership of `mission` and return its id.
    pub fn register(&mut self, mission: Mission) -> MissionId {
        let id = mission.id();
        info!(
            mission_id = %id,
            kind = %mission.kind(),
            founder = %mission.founder(),
            "Mission registered"
        );
        self.missions.push(mission);
        id
    }

    /// Put `agent` on the oldest forming mission of `kind` that has room.
    pub fn recruit(&mut self, kind: MissionKind, agent: AgentId) -> Option<MissionId> {
        let mission = self.missions.iter_mut().find(|m| {
            m.kind() == kind
                && m.phase() == MissionPhase::Embarking
                && !m.is_full()
                && !m.is_member(agent)
        })?;
        match mission.join(agent) {
            JoinOutcome::Joined => {
                debug!(mission_id = %mission.id(), agent_id = %agent, "Recruited to mission");
                Some(mission.id())
            }
            outcome => {
                debug!(
                    mission_id = %mission.id(),
                    agent_id = %agent,
                    ?outcome,
                    "Recruitment refused"
                );
                None
            }
        }
    }

    /// Join a forming mission of `kind`, or found and register a new one.
    ///
    /// Returns `None` only when the catalog does not describe `kind`.
    pub fn start_or_join(
        &mut self,
        kind: MissionKind,
        agent: AgentId,
        now: SimTime,
    ) -> Option<MissionId> {
        if let Some(id) = self.recruit(kind, agent) {
            return Some(id);
        }
        let mission = self.instantiate(kind, agent, now)?;
        Some(self.register(mission))
    }

    /// Add `agent` to mission `id`.
    pub fn join(&mut self, id: MissionId, agent: AgentId) -> JoinOutcome {
        let Some(mission) = self.get_mut(id) else {
            return JoinOutcome::Closed;
        };
        let outcome = mission.join(agent);
        debug!(mission_id = %id, agent_id = %agent, ?outcome, "Join requested");
        outcome
    }

    /// Spend `agent`'s time on mission `id`. A failure that ends the
    /// mission aborts it for the whole crew before it is returned.
    ///
    /// # Errors
    ///
    /// Returns the [`MissionFailure`] for the caller to log.
    pub fn perform_mission<R: Rng>(
        &mut self,
        id: MissionId,
        agent: AgentId,
        time: f64,
        performance: f64,
        rng: &mut R,
    ) -> Result<f64, MissionFailure> {
        let risk = self.malfunction_risk;
        let mission = self
            .get_mut(id)
            .ok_or(MissionFailure::Unknown { mission: id })?;
        match mission.perform(agent, time, performance, rng, risk) {
            Ok(leftover) => Ok(leftover),
            Err(failure) => {
                if failure.ends_mission() && mission.end_mission(failure.to_string()) {
                    info!(mission_id = %id, reason = %failure, "Mission aborted");
                }
                Err(failure)
            }
        }
    }

    /// Remove `agent` from mission `id`. Returns whether it was a member.
    pub fn leave(&mut self, id: MissionId, agent: AgentId) -> bool {
        self.get_mut(id).is_some_and(|m| m.leave(agent))
    }

    /// Abort mission `id`. Returns whether it transitioned.
    pub fn end_mission(&mut self, id: MissionId, reason: impl Into<String>) -> bool {
        self.get_mut(id).is_some_and(|m| m.end_mission(reason))
    }

    /// Look up a mission.
    pub fn get(&self, id: MissionId) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id() == id)
    }

    fn get_mut(&mut self, id: MissionId) -> Option<&mut Mission> {
        self.missions.iter_mut().find(|m| m.id() == id)
    }

    /// Whether mission `id` has finished. Unknown ids count as finished.
    pub fn is_done(&self, id: MissionId) -> bool {
        self.get(id).is_none_or(Mission::is_done)
    }

    /// Snapshots of every mission that has not finished.
    pub fn active_missions(&self) -> Vec<MissionSnapshot> {
        self.missions
            .iter()
            .filter(|m| !m.is_done())
            .map(Mission::snapshot)
            .collect()
    }

    /// Number of missions held, finished or not.
    pub fn len(&self) -> usize {
        self.missions.len()
    }

    /// Whether the registry holds no missions.
    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }

    /// Drop finished missions that no agent still refers to. Returns how
    /// many were dropped.
    pub fn prune_finished(&mut self, referenced: &BTreeSet<MissionId>) -> usize {
        let before = self.missions.len();
        self.missions
            .retain(|m| !m.is_done() || referenced.contains(&m.id()));
        before.saturating_sub(self.missions.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_types::{AgentCondition, JobKind};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn profile(job: JobKind, performance: f64) -> AgentProfile {
        AgentProfile {
            id: AgentId::new(),
            name: "Ada".to_owned(),
            job,
            location: "Schiaparelli Point".to_owned(),
            performance,
            condition: AgentCondition::default(),
        }
    }

    fn registry() -> MissionRegistry {
        MissionRegistry::new(MissionCatalog::standard(), &MissionConfig::default())
    }

    #[test]
    fn candidates_follow_catalog_order() {
        let reg = registry();
        let kinds: Vec<_> = reg
            .mission_candidates(&profile(JobKind::Pilot, 1.0))
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(kinds, MissionKind::ALL.to_vec());
    }

    #[test]
    fn exhausted_agents_have_no_mission_weight() {
        let reg = registry();
        assert!(reg.total_mission_probability(&profile(JobKind::Pilot, 0.0)).abs() < f64::EPSILON);
        assert!(reg.total_mission_probability(&profile(JobKind::Pilot, 1.0)) > 0.0);
    }

    #[test]
    fn selected_mission_has_founder_as_member() {
        let reg = registry();
        let agent = profile(JobKind::Scientist, 1.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let mission = reg.select_new_mission(&agent, &mut rng, SimTime::ZERO).unwrap();
        assert_eq!(mission.founder(), agent.id);
        assert!(mission.is_member(agent.id));
        assert_eq!(mission.phase(), MissionPhase::Embarking);
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let reg = MissionRegistry::new(MissionCatalog::empty(), &MissionConfig::default());
        let mut rng = SmallRng::seed_from_u64(42);
        assert!(
            reg.select_new_mission(&profile(JobKind::Pilot, 1.0), &mut rng, SimTime::ZERO)
                .is_none()
        );
    }

    #[test]
    fn start_or_join_recruits_oldest_forming_mission() {
        let mut reg = registry();
        let a = AgentId::new();
        let b = AgentId::new();
        let c = AgentId::new();
        let first = reg.start_or_join(MissionKind::Trade, a, SimTime::ZERO).unwrap();
        let joined = reg.start_or_join(MissionKind::Trade, b, SimTime::ZERO).unwrap();
        assert_eq!(first, joined);

        // Trade missions seat two, so the third agent founds another.
        let second = reg.start_or_join(MissionKind::Trade, c, SimTime::ZERO).unwrap();
        assert_ne!(first, second);
        assert_eq!(reg.active_missions().len(), 2);
    }

    #[test]
    fn failure_that_ends_mission_aborts_it() {
        let mut reg = registry();
        let a = AgentId::new();
        let id = reg.start_or_join(MissionKind::Exploration, a, SimTime::ZERO).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let failure = reg.perform_mission(id, a, 100.0, 1.0, &mut rng).unwrap_err();
        assert!(matches!(failure, MissionFailure::NotEnoughMembers { .. }));
        assert!(reg.is_done(id));
        assert_eq!(reg.get(id).unwrap().phase(), MissionPhase::Aborted);
    }

    #[test]
    fn outsider_failure_leaves_mission_running() {
        let mut reg = registry();
        let id = reg
            .start_or_join(MissionKind::Construction, AgentId::new(), SimTime::ZERO)
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let failure = reg.perform_mission(id, AgentId::new(), 5.0, 1.0, &mut rng).unwrap_err();
        assert!(matches!(failure, MissionFailure::NotAMember { .. }));
        assert!(!reg.is_done(id));
    }

    #[test]
    fn unknown_missions_count_as_done() {
        let mut reg = registry();
        let ghost = MissionId::new();
        assert!(reg.is_done(ghost));
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(
            reg.perform_mission(ghost, AgentId::new(), 1.0, 1.0, &mut rng),
            Err(MissionFailure::Unknown { mission: ghost })
        );
        assert_eq!(reg.join(ghost, AgentId::new()), JoinOutcome::Closed);
    }

    #[test]
    fn leaving_last_member_aborts_and_prune_drops_it() {
        let mut reg = registry();
        let a = AgentId::new();
        let id = reg.start_or_join(MissionKind::Rescue, a, SimTime::ZERO).unwrap();
        assert!(reg.leave(id, a));
        assert!(reg.is_done(id));
        assert!(reg.active_missions().is_empty());

        assert_eq!(reg.prune_finished(&BTreeSet::from([id])), 0);
        assert_eq!(reg.prune_finished(&BTreeSet::new()), 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn end_mission_reports_transition() {
        let mut reg = registry();
        let id = reg.start_or_join(MissionKind::Resupply, AgentId::new(), SimTime::ZERO).unwrap();
        assert!(reg.end_mission(id, "recalled"));
        assert!(!reg.end_mission(id, "recalled again"));
        assert_eq!(reg.get(id).unwrap().end_reason(), Some("recalled"));
    }
}
