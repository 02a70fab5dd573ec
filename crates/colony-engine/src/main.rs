//! Engine binary for the Colony simulation.
//!
//! Wires together configuration, structured logging, the colonist
//! spawner and the pulse loop, then runs the simulation until a boundary
//! is reached or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `colony-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation and attach the event log listener
//! 4. Spawn colonists
//! 5. Create run control and hook Ctrl-C to a clean stop
//! 6. Run the pulse loop
//! 7. Log the result

mod error;
mod report;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use colony_core::collab::{AptitudeJobAssigner, Collaborators, TimeTogether};
use colony_core::config::{LoggingConfig, SimulationConfig};
use colony_core::event_log::TracingEventListener;
use colony_core::runner::{self, RunControl};
use colony_core::simulation::Simulation;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::ProgressReport;
use crate::spawner::SpawnerConfig;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "colony-config.yaml";

/// Pulses between progress lines.
const REPORT_EVERY: u64 = 100;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        agent_count = config.world.agent_count,
        pulse_millisols = config.clock.pulse_millisols,
        tick_interval_ms = config.clock.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let collaborators = Collaborators::default()
        .with_jobs(Arc::new(AptitudeJobAssigner::default()))
        .with_relationships(Arc::new(TimeTogether::new()));
    let mut sim = Simulation::new(config.clone())?.with_collaborators(collaborators);
    sim.event_log_mut()
        .add_listener(Arc::new(TracingEventListener));

    // 4. Spawn colonists.
    let spawner_config = load_spawner_config()?;
    let spawned = spawner::spawn_colonists(
        &mut sim,
        &spawner_config,
        config.world.agent_count,
        config.world.seed,
    )?;
    info!(colonists = spawned.len(), "Colonists spawned");

    // 5. Run control and Ctrl-C.
    let control = Arc::new(RunControl::new(&config.simulation));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current pulse");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the simulation.
    let mut report = ProgressReport::new(REPORT_EVERY);
    let result = runner::run_simulation(&mut sim, &control, &mut report)
        .await
        .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_pulses = result.total_pulses,
        events_logged = sim.event_log().len(),
        "colony-engine shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the main configuration from `colony-config.yaml`, falling back to
/// defaults (with environment overrides) when the file is absent.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Load spawner configuration from the `agents` section of
/// `colony-config.yaml`. Defaults are used when the file or section is
/// missing.
fn load_spawner_config() -> Result<SpawnerConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(SpawnerConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;

    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;

    raw.get("agents").map_or_else(
        || Ok(SpawnerConfig::default()),
        |agents| {
            serde_yml::from_value(agents.clone()).map_err(|e| EngineError::Spawner {
                message: format!("failed to parse agents config: {e}"),
            })
        },
    )
}
