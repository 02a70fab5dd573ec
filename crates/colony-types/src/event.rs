//! Historical events: the immutable entries of the event log.

use serde::{Deserialize, Serialize};

use crate::enums::EventCategory;
use crate::ids::EventId;
use crate::time::SimTime;

/// A notable occurrence reported by any component.
///
/// Events are values: once built they are never mutated. An event is
/// created unstamped and receives its timestamp when the event log
/// registers it, unless the reporter already stamped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    /// Unique event identifier.
    id: EventId,
    /// Simulated time of the occurrence, if stamped.
    timestamp: Option<SimTime>,
    /// What kind of occurrence this is.
    category: EventCategory,
    /// Human-readable description.
    description: String,
    /// Name of the reporting entity (agent, mission, subsystem).
    source: String,
}

impl HistoricalEvent {
    /// Build a new, unstamped event.
    pub fn new(
        category: EventCategory,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: EventId::new(),
            timestamp: None,
            category,
            description: description.into(),
            source: source.into(),
        }
    }

    /// Return this event stamped with `at`, replacing any prior stamp.
    #[must_use]
    pub fn at(self, at: SimTime) -> Self {
        Self {
            timestamp: Some(at),
            ..self
        }
    }

    /// Return this event stamped with `now` unless it already carries a
    /// timestamp.
    #[must_use]
    pub fn stamped(self, now: SimTime) -> Self {
        if self.timestamp.is_some() {
            self
        } else {
            self.at(now)
        }
    }

    /// The event identifier.
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// The simulated time of the occurrence, if stamped.
    pub const fn timestamp(&self) -> Option<SimTime> {
        self.timestamp
    }

    /// The event category.
    pub const fn category(&self) -> EventCategory {
        self.category
    }

    /// The human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The reporting entity.
    pub fn source(&self) -> &str {
        &self.source
    }
}
