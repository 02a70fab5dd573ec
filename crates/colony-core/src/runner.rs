//! Simulation loop runner with run controls.
//!
//! [`run_simulation`] drives [`Simulation::step`] until a boundary is hit:
//!
//! - **Bounded run**: stop after `max_pulses` or `max_real_time_seconds`
//! - **Pause/resume**: the loop parks until resumed, and the clock is
//!   paused alongside it so clock listeners see the change
//! - **Stop**: an external stop request ends the run cleanly
//!
//! The clock's tick interval supplies the real-time pacing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::config::SimulationBoundsConfig;
use crate::simulation::{PulseSummary, Simulation, SimulationError};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A simulation step failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },
}

/// Reason why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_pulses` limit.
    MaxPulsesReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// A stop was requested.
    Stopped,
}

/// Shared run control state.
///
/// Wrapped in [`Arc`] and shared between the run loop and whoever steers
/// it (signal handlers, tests). Flags are atomics so the loop reads them
/// without locking.
#[derive(Debug)]
pub struct RunControl {
    /// Whether the run is paused.
    paused: AtomicBool,

    /// Wakes the loop on resume or stop.
    wake: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Wall-clock time when the run started.
    started_at: DateTime<Utc>,

    /// Maximum number of pulses (0 = unlimited).
    max_pulses: u64,

    /// Maximum wall-clock seconds (0 = unlimited).
    max_real_time_seconds: u64,
}

impl RunControl {
    /// Create run control from configured bounds.
    pub fn new(bounds: &SimulationBoundsConfig) -> Self {
        Self {
            paused: AtomicBool::new(false),
            wake: Notify::new(),
            stop_requested: AtomicBool::new(false),
            started_at: Utc::now(),
            max_pulses: bounds.max_pulses,
            max_real_time_seconds: bounds.max_real_time_seconds,
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume / Stop
    // -----------------------------------------------------------------------

    /// Whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the run. The loop parks until resumed or stopped.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the run and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    /// Request a clean stop and wake the loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Wait until resumed or stopped.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.wake.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Bounds
    // -----------------------------------------------------------------------

    /// Whether `pulses` has reached the pulse limit.
    pub const fn pulse_limit_reached(&self, pulses: u64) -> bool {
        self.max_pulses > 0 && pulses >= self.max_pulses
    }

    /// Whether the wall-clock limit has been reached.
    pub fn time_limit_reached(&self) -> bool {
        self.max_real_time_seconds > 0 && self.elapsed_seconds() >= self.max_real_time_seconds
    }

    /// Seconds since the run started.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Configured pulse limit.
    pub const fn max_pulses(&self) -> u64 {
        self.max_pulses
    }

    /// Configured wall-clock limit in seconds.
    pub const fn max_real_time_seconds(&self) -> u64 {
        self.max_real_time_seconds
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct SimulationResult {
    /// Why the run ended.
    pub end_reason: SimulationEndReason,
    /// The last pulse summary, if any pulse ran.
    pub final_summary: Option<PulseSummary>,
    /// Pulses executed during this run.
    pub total_pulses: u64,
}

/// Called after each pulse.
pub trait PulseCallback: Send {
    /// A pulse completed.
    fn on_pulse(&mut self, summary: &PulseSummary, sim: &Simulation);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl PulseCallback for NoOpCallback {
    fn on_pulse(&mut self, _summary: &PulseSummary, _sim: &Simulation) {}
}

/// Run the simulation until a boundary is reached or a stop is requested.
///
/// # Errors
///
/// Returns [`RunnerError`] if a step fails unrecoverably.
pub async fn run_simulation(
    sim: &mut Simulation,
    control: &Arc<RunControl>,
    callback: &mut dyn PulseCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<PulseSummary> = None;
    let mut total_pulses: u64 = 0;

    info!(
        max_pulses = control.max_pulses(),
        max_real_time_seconds = control.max_real_time_seconds(),
        agents = sim.agents().len(),
        start = %sim.clock().current_time(),
        "Simulation starting"
    );

    let end_reason = loop {
        if control.is_paused() {
            info!("Simulation paused, waiting for resume...");
            sim.clock_mut().set_paused(true);
            control.wait_if_paused().await;
            sim.clock_mut().set_paused(false);
            info!("Simulation resumed");
        }

        if control.is_stop_requested() {
            info!("Stop requested");
            break SimulationEndReason::Stopped;
        }

        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        let Some(summary) = sim.step().await? else {
            tokio::task::yield_now().await;
            continue;
        };
        total_pulses = total_pulses.saturating_add(1);
        callback.on_pulse(&summary, sim);

        if control.pulse_limit_reached(total_pulses) {
            info!(
                pulse = summary.pulse,
                max_pulses = control.max_pulses(),
                "Pulse limit reached"
            );
            last_summary = Some(summary);
            break SimulationEndReason::MaxPulsesReached;
        }
        last_summary = Some(summary);
    };

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_pulses,
    })
}

/// Log how a run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_pulses = result.total_pulses,
        final_pulse = result.final_summary.as_ref().map(|s| s.pulse),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            pulse = summary.pulse,
            time = %summary.time,
            active_missions = summary.active_missions,
            "Final pulse summary"
        );
    } else {
        warn!("Simulation ended with no pulses executed");
    }
}
