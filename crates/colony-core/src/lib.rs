//! Agent scheduling and decision engine for the Colony simulation.
//!
//! On every simulated time pulse this crate decides what each agent does,
//! advances shared multi-agent missions through their phase machines, and
//! records notable occurrences in a bounded event log.
//!
//! # Modules
//!
//! - [`clock`] -- [`MasterClock`], fixed-size pulses with pause/resume and
//!   listener fan-out.
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`event_log`] -- [`EventLog`], the capacity-bounded, newest-first
//!   history of [`HistoricalEvent`]s.
//! - [`select`] -- Probability-weighted choice among candidates.
//! - [`task`] -- [`TaskSelector`], per-agent task choice and execution.
//! - [`mission`] -- [`Mission`], the shared multi-agent phase machine.
//! - [`registry`] -- [`MissionRegistry`], the arena owning every mission.
//! - [`collab`] -- Traits for the job, settlement, and relationship
//!   collaborators.
//! - [`agent`] -- [`Agent`], a settler owning exactly one mind.
//! - [`mind`] -- [`AgentMind`], the per-agent decision loop.
//! - [`simulation`] -- [`Simulation`], one pulse across all agents.
//! - [`runner`] -- The bounded, stoppable pulse loop.
//!
//! [`MasterClock`]: clock::MasterClock
//! [`EventLog`]: event_log::EventLog
//! [`HistoricalEvent`]: colony_types::HistoricalEvent
//! [`TaskSelector`]: task::TaskSelector
//! [`Mission`]: mission::Mission
//! [`MissionRegistry`]: registry::MissionRegistry
//! [`Agent`]: agent::Agent
//! [`AgentMind`]: mind::AgentMind
//! [`Simulation`]: simulation::Simulation

pub mod agent;
pub mod clock;
pub mod collab;
pub mod config;
pub mod event_log;
mod listeners;
pub mod mind;
pub mod mission;
pub mod registry;
pub mod runner;
pub mod select;
pub mod simulation;
pub mod task;
