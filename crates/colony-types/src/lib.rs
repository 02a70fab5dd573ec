//! Shared type definitions for the Colony agent scheduling engine.
//!
//! This crate holds the plain values that flow between the clock, the
//! event log, the task and mission machinery, and the agent minds. Nothing
//! here owns behavior beyond simple derivations on the values themselves.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents, missions, and events
//! - [`time`] -- [`SimTime`], simulated time measured in millisols
//! - [`enums`] -- Event categories, jobs, task and mission vocabularies
//! - [`event`] -- [`HistoricalEvent`], the immutable event log entry
//! - [`condition`] -- [`AgentCondition`], fatigue/hunger/stress and the
//!   derived performance rating

pub mod condition;
pub mod enums;
pub mod event;
pub mod ids;
pub mod time;

// Re-export all public types at crate root for convenience.
pub use condition::AgentCondition;
pub use enums::{EventCategory, JobKind, MissionKind, MissionPhase, TaskKind, TaskPhase};
pub use event::HistoricalEvent;
pub use ids::{AgentId, EventId, MissionId};
pub use time::{MILLISOLS_PER_SOL, SimTime};
