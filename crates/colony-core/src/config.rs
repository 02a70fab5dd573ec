//! Configuration loading and typed config structures for the Colony engine.
//!
//! The canonical configuration lives in `colony-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every section and field is optional; missing values take the defaults
//! documented on each field.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `colony-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, population).
    #[serde(default)]
    pub world: WorldConfig,

    /// Pulse size and cadence.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Event log retention.
    #[serde(default)]
    pub event_log: EventLogConfig,

    /// Agent decision loop tuning.
    #[serde(default)]
    pub mind: MindConfig,

    /// Mission tuning.
    #[serde(default)]
    pub mission: MissionConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `COLONY_SEED` overrides `world.seed`
    /// - `COLONY_TICK_INTERVAL_MS` overrides `clock.tick_interval_ms`
    /// - `COLONY_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides and validating the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_overrides_from(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("COLONY_SEED") {
            match val.parse() {
                Ok(seed) => self.world.seed = seed,
                Err(_) => tracing::warn!(value = %val, "ignoring unparseable COLONY_SEED"),
            }
        }
        if let Some(val) = lookup("COLONY_TICK_INTERVAL_MS") {
            match val.parse() {
                Ok(ms) => self.clock.tick_interval_ms = ms,
                Err(_) => {
                    tracing::warn!(value = %val, "ignoring unparseable COLONY_TICK_INTERVAL_MS");
                }
            }
        }
        if let Some(val) = lookup("COLONY_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Check that every value is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.clock.pulse_millisols.is_finite() && self.clock.pulse_millisols > 0.0) {
            return Err(invalid("clock.pulse_millisols must be positive"));
        }
        if self.event_log.capacity == 0 {
            return Err(invalid("event_log.capacity must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mind.min_mission_performance) {
            return Err(invalid("mind.min_mission_performance must be within [0, 1]"));
        }
        if self.mind.max_decisions_per_pulse == 0 {
            return Err(invalid("mind.max_decisions_per_pulse must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.mission.malfunction_risk_per_millisol) {
            return Err(invalid(
                "mission.malfunction_risk_per_millisol must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable settlement name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of settlers spawned at start.
    #[serde(default = "default_agent_count")]
    pub agent_count: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            agent_count: default_agent_count(),
        }
    }
}

/// Master clock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClockConfig {
    /// Simulated millisols added by each pulse.
    #[serde(default = "default_pulse_millisols")]
    pub pulse_millisols: f64,

    /// Real-time milliseconds slept before each pulse (0 = no sleep).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Simulated time at which the run starts.
    #[serde(default)]
    pub start_millisols: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            pulse_millisols: default_pulse_millisols(),
            tick_interval_ms: default_tick_interval_ms(),
            start_millisols: 0.0,
        }
    }
}

/// Event log configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventLogConfig {
    /// Maximum number of retained events.
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

/// Agent decision loop configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MindConfig {
    /// Performance rating below which an agent may not take on missions.
    #[serde(default = "default_min_mission_performance")]
    pub min_mission_performance: f64,

    /// Upper bound on new task/mission bindings per agent per pulse.
    #[serde(default = "default_max_decisions_per_pulse")]
    pub max_decisions_per_pulse: u32,
}

impl Default for MindConfig {
    fn default() -> Self {
        Self {
            min_mission_performance: default_min_mission_performance(),
            max_decisions_per_pulse: default_max_decisions_per_pulse(),
        }
    }
}

/// Mission configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MissionConfig {
    /// Chance per millisol of a vehicle malfunction while travelling.
    #[serde(default = "default_malfunction_risk")]
    pub malfunction_risk_per_millisol: f64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            malfunction_risk_per_millisol: default_malfunction_risk(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many pulses (0 = unlimited).
    #[serde(default = "default_max_pulses")]
    pub max_pulses: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_pulses: default_max_pulses(),
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_world_name() -> String {
    "Schiaparelli Point".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_agent_count() -> u32 {
    8
}

const fn default_pulse_millisols() -> f64 {
    10.0
}

const fn default_tick_interval_ms() -> u64 {
    250
}

const fn default_event_capacity() -> usize {
    1000
}

const fn default_min_mission_performance() -> f64 {
    0.5
}

const fn default_max_decisions_per_pulse() -> u32 {
    16
}

const fn default_malfunction_risk() -> f64 {
    0.000_05
}

const fn default_max_pulses() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.event_log.capacity, 1000);
        assert_eq!(config.mind.max_decisions_per_pulse, 16);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  name: "Test Base"
  seed: 123
  agent_count: 3

clock:
  pulse_millisols: 5.0
  tick_interval_ms: 0
  start_millisols: 2000.0

event_log:
  capacity: 50

mind:
  min_mission_performance: 0.6
  max_decisions_per_pulse: 8

mission:
  malfunction_risk_per_millisol: 0.0

simulation:
  max_pulses: 20
  max_real_time_seconds: 60

logging:
  level: "debug"
  json: true
"#;

        let config = SimulationConfig::parse(yaml);
        assert!(config.is_ok(), "{config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.world.name, "Test Base");
        assert_eq!(config.world.agent_count, 3);
        assert_eq!(config.clock.tick_interval_ms, 0);
        assert_eq!(config.event_log.capacity, 50);
        assert_eq!(config.mind.max_decisions_per_pulse, 8);
        assert_eq!(config.simulation.max_pulses, 20);
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("event_log:\n  capacity: 7\n");
        assert!(config.is_ok());
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.event_log.capacity, 7);
        assert_eq!(config.mind.max_decisions_per_pulse, 16);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let result = SimulationConfig::parse("event_log:\n  capacity: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn non_positive_pulse_is_rejected() {
        let result = SimulationConfig::parse("clock:\n  pulse_millisols: 0.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn overrides_apply_from_lookup() {
        let mut config = SimulationConfig::default();
        config.apply_overrides_from(|key| match key {
            "COLONY_SEED" => Some("7".to_owned()),
            "COLONY_TICK_INTERVAL_MS" => Some("not-a-number".to_owned()),
            "COLONY_LOG_LEVEL" => Some("trace".to_owned()),
            _ => None,
        });
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.clock.tick_interval_ms, 250);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("colony-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
