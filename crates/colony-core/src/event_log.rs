//! Capacity-bounded, most-recent-first record of notable occurrences.
//!
//! The log is a trailing window, not a durable store: throughput can reach
//! around a hundred events per pulse, so once the log is full the oldest
//! entries are evicted to make room. Consumers that need the full history
//! must persist events from [`EventListener::on_added`] as they arrive.
//!
//! # Notification order
//!
//! When an insert overflows the capacity, listeners first receive
//! [`on_removed`](EventListener::on_removed) for the evicted range (indices
//! as they were before eviction), then
//! [`on_added`](EventListener::on_added) for the new event at index 0.

use std::collections::VecDeque;
use std::sync::Arc;

use colony_types::{EventCategory, EventId, HistoricalEvent, SimTime};
use tracing::{debug, info};

use crate::listeners::ListenerSet;

/// Capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Errors raised by event log operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventLogError {
    /// The log was constructed with room for nothing.
    #[error("event log capacity must be at least 1")]
    ZeroCapacity,

    /// An index outside `[0, len)` was requested.
    #[error("event index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The log length at the time of the request.
        len: usize,
    },
}

/// Receives insertions and evictions from an [`EventLog`].
pub trait EventListener: Send + Sync {
    /// An event was inserted at `index` (always 0 for new events).
    fn on_added(&self, index: usize, event: &HistoricalEvent);

    /// Events at indices `from..to` were evicted.
    fn on_removed(&self, from: usize, to: usize);
}

/// Newest-first, capacity-bounded sequence of [`HistoricalEvent`]s.
#[derive(Debug)]
pub struct EventLog {
    /// Events, newest at the front.
    events: VecDeque<HistoricalEvent>,

    /// Maximum number of retained events.
    capacity: usize,

    /// Registered listeners, in registration order.
    listeners: ListenerSet<dyn EventListener>,
}

impl EventLog {
    /// Create an empty log holding at most `capacity` events.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::ZeroCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self, EventLogError> {
        if capacity == 0 {
            return Err(EventLogError::ZeroCapacity);
        }
        Ok(Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
            listeners: ListenerSet::new(),
        })
    }

    /// Create an empty log with [`DEFAULT_CAPACITY`].
    pub fn with_default_capacity() -> Self {
        Self {
            events: VecDeque::with_capacity(DEFAULT_CAPACITY),
            capacity: DEFAULT_CAPACITY,
            listeners: ListenerSet::new(),
        }
    }

    /// Record an event as the most recent entry.
    ///
    /// The event is stamped with `now` unless it already carries a
    /// timestamp. If the log is full, the oldest entries are evicted
    /// first. Returns the event's identifier.
    pub fn register(&mut self, event: HistoricalEvent, now: SimTime) -> EventId {
        let event = event.stamped(now);
        let id = event.id();

        let len = self.events.len();
        if len >= self.capacity {
            let keep = self.capacity.saturating_sub(1);
            self.events.truncate(keep);
            for listener in self.listeners.iter() {
                listener.on_removed(keep, len);
            }
            debug!(
                evicted = len.saturating_sub(keep),
                capacity = self.capacity,
                "Event log evicted oldest entries"
            );
        }

        self.events.push_front(event);
        if let Some(inserted) = self.events.front() {
            for listener in self.listeners.iter() {
                listener.on_added(0, inserted);
            }
        }
        id
    }

    /// The event at `index` (0 = most recent).
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::IndexOutOfRange`] outside `[0, len)`.
    pub fn get(&self, index: usize) -> Result<&HistoricalEvent, EventLogError> {
        self.events
            .get(index)
            .ok_or(EventLogError::IndexOutOfRange {
                index,
                len: self.events.len(),
            })
    }

    /// The most recent event, if any.
    pub fn latest(&self) -> Option<&HistoricalEvent> {
        self.events.front()
    }

    /// Iterate from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoricalEvent> {
        self.events.iter()
    }

    /// Iterate over events of one category, newest first.
    pub fn by_category(&self, category: EventCategory) -> impl Iterator<Item = &HistoricalEvent> {
        self.events.iter().filter(move |e| e.category() == category)
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of retained events.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a listener. Registering the same listener twice is a no-op.
    ///
    /// Returns `true` if the listener was newly added.
    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Removing an unknown listener is a no-op.
    ///
    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn EventListener>) -> bool {
        self.listeners.remove(listener)
    }
}

/// An [`EventListener`] that writes every new event to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventListener;

impl EventListener for TracingEventListener {
    fn on_added(&self, _index: usize, event: &HistoricalEvent) {
        let time = event
            .timestamp()
            .map_or_else(|| "unstamped".to_owned(), |t| t.to_string());
        info!(
            category = %event.category(),
            source = event.source(),
            time = %time,
            "{}",
            event.description()
        );
    }

    fn on_removed(&self, from: usize, to: usize) {
        debug!(from, to, "Events evicted from log");
    }
}
