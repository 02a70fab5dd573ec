//! Cross-module scenarios for the Colony simulation engine.
//!
//! These exercise the clock, minds, mission registry and event log
//! together through the public API only.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use colony_core::clock::{ClockListener, ClockPulse};
use colony_core::collab::{AptitudeJobAssigner, Collaborators};
use colony_core::config::{MissionConfig, SimulationConfig};
use colony_core::mind::Outcome;
use colony_core::mission::{JoinOutcome, NO_MEMBERS_REMAINING};
use colony_core::registry::{MissionCatalog, MissionRegistry};
use colony_core::runner::{NoOpCallback, RunControl, SimulationEndReason, run_simulation};
use colony_core::simulation::Simulation;
use colony_core::task::{TaskCatalog, TaskMeta};
use colony_types::{
    AgentCondition, AgentId, JobKind, MissionKind, MissionPhase, SimTime, TaskKind, TaskPhase,
};

fn quiet_config(seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.world.seed = seed;
    config.clock.tick_interval_ms = 0;
    config
}

fn crew(sim: &mut Simulation) {
    let roster = [
        ("Ada", JobKind::Engineer),
        ("Grace", JobKind::Scientist),
        ("Linus", JobKind::Pilot),
        ("Mae", JobKind::Doctor),
        ("Katherine", JobKind::Botanist),
        ("Margaret", JobKind::Trader),
    ];
    for (name, job) in roster {
        sim.spawn_agent(name, job, AgentCondition::default());
    }
}

struct Unwanted;

impl TaskMeta for Unwanted {
    fn kind(&self) -> TaskKind {
        TaskKind::Relax
    }
    fn probability(&self, _condition: &AgentCondition, _job: JobKind) -> f64 {
        0.0
    }
    fn phases(&self) -> Vec<(TaskPhase, f64)> {
        vec![(TaskPhase::Resting, 10.0)]
    }
}

#[test]
fn every_pulse_spends_exactly_its_time() {
    let mut sim = Simulation::new(quiet_config(42)).unwrap();
    crew(&mut sim);
    let agents = sim.agents().len();

    for _ in 0..300 {
        let pulse = sim.clock_mut().pulse().unwrap().unwrap();
        let summary = sim.run_pulse(&pulse);
        assert_eq!(summary.agents_idle, 0);
        let expected = pulse.elapsed * agents as f64;
        assert!(
            (summary.consumed - expected).abs() < 1e-6,
            "pulse {} consumed {} of {}",
            summary.pulse,
            summary.consumed,
            expected
        );
    }
}

#[test]
fn missions_form_over_a_long_run() {
    let mut sim = Simulation::new(quiet_config(7)).unwrap();
    crew(&mut sim);
    for _ in 0..500 {
        let pulse = sim.clock_mut().pulse().unwrap().unwrap();
        sim.run_pulse(&pulse);
    }
    let mission_events = sim
        .event_log()
        .by_category(colony_types::EventCategory::Mission)
        .count();
    assert!(mission_events > 0);
}

#[test]
fn nothing_to_do_is_reported_not_fatal() {
    let tasks = TaskCatalog::new(vec![Arc::new(Unwanted)]);
    let mut sim =
        Simulation::with_catalogs(quiet_config(1), tasks, MissionCatalog::empty()).unwrap();
    crew(&mut sim);

    let pulse = sim.clock_mut().pulse().unwrap().unwrap();
    let summary = sim.run_pulse(&pulse);
    assert_eq!(summary.agents_idle, sim.agents().len());
    assert_eq!(summary.agents_acted, 0);
    assert!(summary.consumed.abs() < f64::EPSILON);

    // The next pulse is attempted as usual.
    let pulse = sim.clock_mut().pulse().unwrap().unwrap();
    assert_eq!(sim.run_pulse(&pulse).pulse, 2);
}

#[test]
fn idle_agent_report_carries_no_action() {
    let tasks = Arc::new(TaskCatalog::new(vec![Arc::new(Unwanted)]));
    let mut agent = colony_core::agent::Agent::new(
        "Ada",
        "Schiaparelli Point",
        JobKind::Engineer,
        AgentCondition::default(),
        tasks,
    );
    let mut registry = MissionRegistry::new(MissionCatalog::standard(), &MissionConfig::default());
    let mut event_log = colony_core::event_log::EventLog::with_default_capacity();
    let collaborators = Collaborators::default();
    let config = colony_core::config::MindConfig {
        min_mission_performance: 2.0,
        ..Default::default()
    };
    let mut rng = <rand::rngs::SmallRng as rand::SeedableRng>::seed_from_u64(3);
    let mut ctx = colony_core::mind::MindContext {
        registry: &mut registry,
        event_log: &mut event_log,
        collaborators: &collaborators,
        config: &config,
        rng: &mut rng,
        now: SimTime::ZERO,
    };
    let report = agent.time_passing(10.0, &mut ctx);
    assert_eq!(report.outcome, Outcome::NoAction { consumed: 0.0 });
}

#[test]
fn two_seat_mission_turns_away_a_third() {
    let mut registry = MissionRegistry::new(MissionCatalog::standard(), &MissionConfig::default());
    let x = AgentId::new();
    let y = AgentId::new();
    let z = AgentId::new();

    let id = registry
        .start_or_join(MissionKind::Trade, x, SimTime::ZERO)
        .unwrap();
    assert_eq!(registry.join(id, y), JoinOutcome::Joined);
    assert_eq!(registry.join(id, z), JoinOutcome::Full);

    let members = registry.get(id).unwrap().members();
    assert_eq!(members.len(), 2);
    assert!(members.contains(&x) && members.contains(&y));
    assert!(!members.contains(&z));
}

#[test]
fn emptied_mission_is_aborted_and_pruned() {
    let mut registry = MissionRegistry::new(MissionCatalog::standard(), &MissionConfig::default());
    let x = AgentId::new();
    let y = AgentId::new();
    let id = registry
        .start_or_join(MissionKind::Construction, x, SimTime::ZERO)
        .unwrap();
    registry.join(id, y);

    registry.leave(id, x);
    assert_eq!(registry.get(id).unwrap().phase(), MissionPhase::Embarking);
    registry.leave(id, y);

    let mission = registry.get(id).unwrap();
    assert_eq!(mission.phase(), MissionPhase::Aborted);
    assert_eq!(mission.end_reason(), Some(NO_MEMBERS_REMAINING));
    assert_eq!(registry.prune_finished(&std::collections::BTreeSet::new()), 1);
}

#[test]
fn same_seed_same_history() {
    fn history(seed: u64) -> Vec<String> {
        let mut sim = Simulation::new(quiet_config(seed)).unwrap();
        crew(&mut sim);
        for _ in 0..200 {
            let pulse = sim.clock_mut().pulse().unwrap().unwrap();
            sim.run_pulse(&pulse);
        }
        sim.event_log()
            .iter()
            .map(|e| e.description().to_owned())
            .collect()
    }
    assert_eq!(history(99), history(99));
}

#[test]
fn same_seed_assigns_same_jobs() {
    fn first_pulse_jobs(seed: u64) -> Vec<(AgentId, JobKind)> {
        let collaborators = Collaborators::default()
            .with_jobs(Arc::new(AptitudeJobAssigner::default()));
        let mut sim = Simulation::new(quiet_config(seed))
            .unwrap()
            .with_collaborators(collaborators);
        let names = ["Ada", "Grace", "Linus", "Mae", "Katherine", "Margaret", "Valentina", "Yuri"];
        for name in names {
            sim.spawn_agent(name, JobKind::Unassigned, AgentCondition::default());
        }
        let pulse = sim.clock_mut().pulse().unwrap().unwrap();
        sim.run_pulse(&pulse);
        sim.agents()
            .iter()
            .map(|a| (a.id(), a.mind().job()))
            .collect()
    }

    let first = first_pulse_jobs(42);
    assert!(first.iter().all(|(_, job)| *job != JobKind::Unassigned));
    assert_eq!(first, first_pulse_jobs(42));
    assert_eq!(first, first_pulse_jobs(42));
}

struct PulseCounter(AtomicU64);

impl ClockListener for PulseCounter {
    fn clock_pulse(&self, _pulse: &ClockPulse) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
    fn pause_change(&self, _paused: bool) {}
}

#[tokio::test]
async fn bounded_run_notifies_clock_listeners() {
    let mut config = quiet_config(5);
    config.simulation.max_pulses = 25;
    let control = Arc::new(RunControl::new(&config.simulation));
    let mut sim = Simulation::new(config).unwrap();
    crew(&mut sim);

    let counter = Arc::new(PulseCounter(AtomicU64::new(0)));
    sim.clock_mut().add_listener(counter.clone());

    let result = run_simulation(&mut sim, &control, &mut NoOpCallback)
        .await
        .unwrap();
    assert_eq!(result.end_reason, SimulationEndReason::MaxPulsesReached);
    assert_eq!(counter.0.load(Ordering::Relaxed), 25);
    assert!((sim.clock().current_time().millisols() - 250.0).abs() < 1e-6);
}
