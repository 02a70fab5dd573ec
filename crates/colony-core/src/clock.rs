//! Master clock for the Colony simulation.
//!
//! The clock is the single source of truth for simulated time. Each pulse
//! advances time by a fixed number of millisols and is fanned out to every
//! registered [`ClockListener`] in registration order. No other component
//! advances time.
//!
//! # Design Principles
//!
//! - Pulse magnitude is fixed for the whole run; only the wall-clock
//!   cadence between pulses is adjustable.
//! - A paused clock still sleeps on [`tick`](MasterClock::tick) but emits
//!   nothing and leaves time untouched.
//! - Listener notification happens synchronously, inside the pulse.

use std::sync::Arc;
use std::time::Duration;

use colony_types::SimTime;
use serde::Serialize;

use crate::config::ClockConfig;
use crate::listeners::ListenerSet;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Pulse counter would overflow.
    #[error("pulse counter overflow: cannot advance beyond u64::MAX")]
    PulseOverflow,

    /// Invalid clock configuration (e.g. zero pulse size).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// One discrete advance of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClockPulse {
    /// Sequence number of this pulse, starting at 1.
    pub id: u64,
    /// Millisols this pulse adds.
    pub elapsed: f64,
    /// Simulated time after the pulse.
    pub time: SimTime,
}

/// Receives pulses and pause changes from the [`MasterClock`].
///
/// Methods take `&self`; listeners that record state use interior
/// mutability.
pub trait ClockListener: Send + Sync {
    /// Called once per pulse, after time has advanced.
    fn clock_pulse(&self, pulse: &ClockPulse);

    /// Called when the clock is paused (`true`) or resumed (`false`),
    /// before the pause state changes.
    fn pause_change(&self, paused: bool);
}

/// Generates fixed-size pulses of simulated time.
#[derive(Debug)]
pub struct MasterClock {
    /// Current simulated time.
    current_time: SimTime,

    /// Millisols added by each pulse.
    pulse_millisols: f64,

    /// Real-time sleep before each pulse.
    tick_interval: Duration,

    /// Number of pulses emitted so far.
    pulse_count: u64,

    /// Whether pulses are suppressed.
    paused: bool,

    /// Registered listeners, in registration order.
    listeners: ListenerSet<dyn ClockListener>,
}

impl MasterClock {
    /// Create a clock from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `pulse_millisols` is not a
    /// positive finite number.
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        if !(config.pulse_millisols.is_finite() && config.pulse_millisols > 0.0) {
            return Err(ClockError::InvalidConfig {
                reason: format!(
                    "pulse_millisols must be positive, got {}",
                    config.pulse_millisols
                ),
            });
        }
        Ok(Self {
            current_time: SimTime::from_millisols(config.start_millisols),
            pulse_millisols: config.pulse_millisols,
            tick_interval: Duration::from_millis(config.tick_interval_ms),
            pulse_count: 0,
            paused: false,
            listeners: ListenerSet::new(),
        })
    }

    /// Current simulated time.
    pub const fn current_time(&self) -> SimTime {
        self.current_time
    }

    /// Number of pulses emitted so far.
    pub const fn pulse_count(&self) -> u64 {
        self.pulse_count
    }

    /// Millisols added by each pulse.
    pub const fn pulse_millisols(&self) -> f64 {
        self.pulse_millisols
    }

    /// Whether the clock is paused.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current wall-clock sleep before each pulse.
    pub const fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Change the wall-clock sleep before each pulse.
    pub const fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval;
    }

    /// Register a listener. Registering the same listener twice is a no-op.
    ///
    /// Returns `true` if the listener was newly added.
    pub fn add_listener(&mut self, listener: Arc<dyn ClockListener>) -> bool {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Removing an unknown listener is a no-op.
    ///
    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&mut self, listener: &Arc<dyn ClockListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Pause or resume the clock.
    ///
    /// Every listener's [`pause_change`](ClockListener::pause_change) runs
    /// before the state toggles. Setting the current state again does
    /// nothing and notifies nobody.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused == paused {
            return;
        }
        for listener in self.listeners.iter() {
            listener.pause_change(paused);
        }
        self.paused = paused;
        tracing::info!(paused, time = %self.current_time, "Clock pause state changed");
    }

    /// Emit one pulse immediately, without sleeping.
    ///
    /// Returns `Ok(None)` while paused.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::PulseOverflow`] if the pulse counter would
    /// exceed `u64::MAX`.
    pub fn pulse(&mut self) -> Result<Option<ClockPulse>, ClockError> {
        if self.paused {
            return Ok(None);
        }
        let id = self
            .pulse_count
            .checked_add(1)
            .ok_or(ClockError::PulseOverflow)?;
        self.pulse_count = id;
        self.current_time = self.current_time.plus(self.pulse_millisols);

        let pulse = ClockPulse {
            id,
            elapsed: self.pulse_millisols,
            time: self.current_time,
        };
        for listener in self.listeners.iter() {
            listener.clock_pulse(&pulse);
        }
        tracing::trace!(pulse = id, time = %pulse.time, "Clock pulse");
        Ok(Some(pulse))
    }

    /// Sleep for the tick interval, then emit a pulse unless paused.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::PulseOverflow`] if the pulse counter would
    /// exceed `u64::MAX`.
    pub async fn tick(&mut self) -> Result<Option<ClockPulse>, ClockError> {
        if !self.tick_interval.is_zero() {
            tokio::time::sleep(self.tick_interval).await;
        }
        self.pulse()
    }
}
