//! Configuration loading
//!
//! Bootstrap configuration is resolved in priority order:
//! 1. Explicit config path (command-line argument or `SLP_CONFIG`)
//! 2. Platform config file (`<config_dir>/signlink/config.toml`)
//! 3. Compiled defaults
//!
//! A missing platform file is not an error: the service logs a warning and
//! starts on defaults. An explicit path that is missing or malformed is an
//! error, because the operator asked for that file specifically.

use crate::detector::DetectorConfig;
use crate::symbol::Alphabet;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SLP_CONFIG";

/// Default HTTP port for slp-gs
pub const DEFAULT_PORT: u16 = 5760;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Broadcast channel capacity for the event bus
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Stability-gated detector parameters
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Simulated gesture source parameters
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Parameters of the simulated gesture source and the polling loop
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Chance that a tick observes a gesture in frame
    #[serde(default = "default_presence_probability")]
    pub presence_probability: f64,

    /// Lower bound of the stability increment for a present sample
    #[serde(default = "default_increment_min")]
    pub increment_min: f64,

    /// Upper bound of the stability increment for a present sample
    #[serde(default = "default_increment_max")]
    pub increment_max: f64,

    /// Polling cadence while simulation is active
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Alphabet the simulator draws from
    #[serde(default)]
    pub alphabet: AlphabetSetting,

    /// Fixed RNG seed for reproducible sessions
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Alphabet selection: a named preset or an explicit list of labels
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AlphabetSetting {
    Named(String),
    Labels(Vec<String>),
}

impl AlphabetSetting {
    pub fn resolve(&self) -> Result<Alphabet> {
        match self {
            AlphabetSetting::Named(name) => match name.to_ascii_lowercase().as_str() {
                "standard" => Ok(Alphabet::standard()),
                "extended" => Ok(Alphabet::extended()),
                other => Err(Error::Config(format!(
                    "Unknown alphabet preset '{}' (expected 'standard' or 'extended')",
                    other
                ))),
            },
            AlphabetSetting::Labels(labels) => Alphabet::from_labels(labels),
        }
    }
}

impl Default for AlphabetSetting {
    fn default() -> Self {
        AlphabetSetting::Named("standard".to_string())
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_event_bus_capacity() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_presence_probability() -> f64 {
    0.4
}

fn default_increment_min() -> f64 {
    0.2
}

fn default_increment_max() -> f64 {
    0.4
}

fn default_tick_interval_ms() -> u64 {
    500
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            event_bus_capacity: default_event_bus_capacity(),
            logging: LoggingConfig::default(),
            detector: DetectorConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            presence_probability: default_presence_probability(),
            increment_min: default_increment_min(),
            increment_max: default_increment_max(),
            tick_interval_ms: default_tick_interval_ms(),
            alphabet: AlphabetSetting::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.presence_probability) {
            return Err(Error::Config(format!(
                "simulation.presence_probability must be within [0, 1], got {}",
                self.presence_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.increment_min)
            || !(0.0..=1.0).contains(&self.increment_max)
            || self.increment_min > self.increment_max
        {
            return Err(Error::Config(format!(
                "simulation increments must satisfy 0 <= min <= max <= 1, got [{}, {}]",
                self.increment_min, self.increment_max
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config(
                "simulation.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.alphabet.resolve()?;
        Ok(())
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        if self.event_bus_capacity == 0 {
            return Err(Error::Config(
                "event_bus_capacity must be greater than zero".to_string(),
            ));
        }
        self.detector.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

/// Resolves and loads the bootstrap configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Explicit path from the command line or the environment, if any
    pub fn explicit_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }
        std::env::var_os(CONFIG_ENV_VAR)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    /// Load configuration following the priority order above
    pub fn load(&self) -> Result<TomlConfig> {
        if let Some(path) = self.explicit_path() {
            info!("Loading configuration from {}", path.display());
            return TomlConfig::from_file(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "No config file at {}, using compiled defaults",
                    path.display()
                );
                Ok(TomlConfig::default())
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("signlink").join("config.toml"))
}
