//! Colonist spawner for seeding the simulation.
//!
//! At startup the spawner creates the configured number of colonists with
//! unique names, random job designations and a random starting condition.
//! Draws come from a generator seeded with the world seed, so the same
//! configuration always produces the same crew.

use colony_core::simulation::Simulation;
use colony_types::{AgentCondition, AgentId, JobKind};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the colonist spawner, read from the `agents` section
/// of `colony-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnerConfig {
    /// Upper bound of each starting fatigue, hunger and stress level.
    #[serde(default = "default_max_initial_level")]
    pub max_initial_level: f64,

    /// Fraction of colonists that arrive without a job.
    #[serde(default = "default_unassigned_share")]
    pub unassigned_share: f64,

    /// Whether starting jobs are locked against reassignment.
    #[serde(default)]
    pub lock_jobs: bool,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            max_initial_level: default_max_initial_level(),
            unassigned_share: default_unassigned_share(),
            lock_jobs: false,
        }
    }
}

const fn default_max_initial_level() -> f64 {
    300.0
}

const fn default_unassigned_share() -> f64 {
    0.25
}

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Built-in pool of colonist names. Picked without replacement.
const NAME_POOL: &[&str] = &[
    "Ada", "Buzz", "Chiara", "Dmitri", "Eileen", "Farid", "Gennady", "Hana",
    "Ilan", "Jessica", "Kalpana", "Leland", "Mae", "Nicole", "Oleg", "Peggy",
    "Qian", "Rakesh", "Sally", "Thomas", "Ulf", "Valentina", "Wally", "Xiaoming",
    "Yuri", "Zena", "Anousheh", "Bernard", "Claude", "Dorothy", "Ellison", "Franz",
];

/// Jobs a colonist can arrive with.
const STARTING_JOBS: [JobKind; 6] = [
    JobKind::Engineer,
    JobKind::Botanist,
    JobKind::Doctor,
    JobKind::Pilot,
    JobKind::Scientist,
    JobKind::Trader,
];

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Spawn `count` colonists into `sim`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the name pool is too small for
/// `count`.
pub fn spawn_colonists(
    sim: &mut Simulation,
    config: &SpawnerConfig,
    count: u32,
    seed: u64,
) -> Result<Vec<AgentId>, EngineError> {
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    if count > NAME_POOL.len() {
        return Err(EngineError::Spawner {
            message: format!(
                "requested {count} colonists but name pool only has {} entries",
                NAME_POOL.len()
            ),
        });
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut names: Vec<&str> = NAME_POOL.to_vec();
    let max_level = config.max_initial_level.clamp(0.0, colony_types::condition::MAX_LEVEL);
    let unassigned_share = config.unassigned_share.clamp(0.0, 1.0);

    let mut spawned = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = rng.random_range(0..names.len());
        let name = names.swap_remove(idx);

        let job = if rng.random_bool(unassigned_share) {
            JobKind::Unassigned
        } else {
            let idx = rng.random_range(0..STARTING_JOBS.len());
            STARTING_JOBS.get(idx).copied().unwrap_or(JobKind::Unassigned)
        };

        let condition = AgentCondition::new(
            rng.random_range(0.0..=max_level),
            rng.random_range(0.0..=max_level),
            rng.random_range(0.0..=max_level),
        );

        let id = sim.spawn_agent(name, job, condition);
        if config.lock_jobs {
            if let Some(agent) = sim.agent_mut(id) {
                agent.mind_mut().set_job_locked(true);
            }
        }
        info!(agent_id = %id, name, %job, "Spawned colonist");
        spawned.push(id);
    }
    Ok(spawned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use colony_core::config::SimulationConfig;

    use super::*;

    #[test]
    fn names_are_unique() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let ids = spawn_colonists(&mut sim, &SpawnerConfig::default(), 20, 42).unwrap();
        assert_eq!(ids.len(), 20);
        let names: BTreeSet<_> = sim.agents().iter().map(|a| a.name().to_owned()).collect();
        assert_eq!(names.len(), 20);
    }

    #[test]
    fn oversized_crew_is_rejected() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let too_many = u32::try_from(NAME_POOL.len()).unwrap() + 1;
        assert!(matches!(
            spawn_colonists(&mut sim, &SpawnerConfig::default(), too_many, 42),
            Err(EngineError::Spawner { .. })
        ));
    }

    #[test]
    fn same_seed_same_crew() {
        let crew = |seed| {
            let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
            spawn_colonists(&mut sim, &SpawnerConfig::default(), 8, seed).unwrap();
            sim.agents()
                .iter()
                .map(|a| (a.name().to_owned(), a.mind().job()))
                .collect::<Vec<_>>()
        };
        assert_eq!(crew(7), crew(7));
    }

    #[test]
    fn locked_jobs_and_condition_bounds() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        let config = SpawnerConfig {
            max_initial_level: 100.0,
            unassigned_share: 0.0,
            lock_jobs: true,
        };
        spawn_colonists(&mut sim, &config, 10, 3).unwrap();
        for agent in sim.agents() {
            assert!(agent.mind().is_job_locked());
            assert_ne!(agent.mind().job(), JobKind::Unassigned);
            assert!(agent.condition().fatigue() <= 100.0);
            assert!(agent.condition().stress() <= 100.0);
        }
    }
}
