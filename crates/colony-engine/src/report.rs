//! Pulse callback that reports simulation progress through `tracing`.

use colony_core::runner::PulseCallback;
use colony_core::simulation::{PulseSummary, Simulation};
use tracing::{debug, info, warn};

/// Logs a progress line every `every` pulses and each job change as it
/// happens.
pub struct ProgressReport {
    every: u64,
}

impl ProgressReport {
    /// Report every `every` pulses (at least every pulse).
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl PulseCallback for ProgressReport {
    fn on_pulse(&mut self, summary: &PulseSummary, sim: &Simulation) {
        for change in &summary.job_changes {
            info!(
                agent_id = %change.agent,
                from = %change.from,
                to = %change.to,
                "Colonist reassigned"
            );
        }
        if summary.agents_idle > 0 {
            debug!(pulse = summary.pulse, idle = summary.agents_idle, "Idle colonists");
        }
        if summary.pulse.checked_rem(self.every) != Some(0) {
            return;
        }
        info!(
            pulse = summary.pulse,
            time = %summary.time,
            acted = summary.agents_acted,
            idle = summary.agents_idle,
            active_missions = summary.active_missions,
            events = sim.event_log().len(),
            "Progress"
        );
        match serde_json::to_string(&sim.registry().active_missions()) {
            Ok(json) => debug!(missions = %json, "Active missions"),
            Err(e) => warn!(error = %e, "Failed to serialize mission snapshot"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_core::config::SimulationConfig;
    use colony_types::{AgentCondition, JobKind};

    use super::*;

    #[test]
    fn reports_without_panicking_on_any_pulse() {
        let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
        sim.spawn_agent("Ada", JobKind::Engineer, AgentCondition::default());
        let mut report = ProgressReport::new(0);
        for _ in 0..3 {
            let pulse = sim.clock_mut().pulse().unwrap().unwrap();
            let summary = sim.run_pulse(&pulse);
            report.on_pulse(&summary, &sim);
        }
        assert_eq!(report.every, 1);
    }
}
