//! Configuration for the pet simulation.
//!
//! Maps directly to the `[pet]` tables of `pomopet.toml`. Every field has a
//! default, so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mood::DecayRates;

/// Top-level core configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PetConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Tick, decay and animation timing.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Where pet state is saved.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl PetConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PetError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PetError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error. Overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Simulation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Update scheduler period in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Delay before a celebration reverts to idle, in milliseconds.
    #[serde(default = "default_celebration_revert")]
    pub celebration_revert_ms: u64,
    /// Per-minute gauge decay.
    #[serde(default)]
    pub decay: DecayRates,
}

impl SimulationConfig {
    /// Scheduler period as a [`Duration`]. Never zero.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Celebration revert delay as a [`Duration`].
    #[must_use]
    pub fn celebration_revert(&self) -> Duration {
        Duration::from_millis(self.celebration_revert_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            celebration_revert_ms: 3000,
            decay: DecayRates::default(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Keep pets in process memory only.
    #[default]
    Memory,
    /// Local SQLite file.
    Sqlite,
}

/// Persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Which store to open.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Database path for the SQLite backend.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Use WAL mode for the SQLite backend.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store a CRC-32 checksum next to each saved pet.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Pending operations the background queue holds before dropping.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            path: default_db_path(),
            wal_mode: true,
            checksum_enabled: true,
            queue_capacity: default_queue_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_tick_interval() -> u64 { 1000 }
fn default_celebration_revert() -> u64 { 3000 }
fn default_db_path() -> PathBuf { PathBuf::from("pomopet.db") }
fn default_queue_capacity() -> usize { 1024 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PetConfig::from_toml("").expect("parse");
        assert_eq!(config.simulation.tick_interval_ms, 1000);
        assert_eq!(config.simulation.celebration_revert_ms, 3000);
        assert_eq!(config.persistence.backend, StoreBackend::Memory);
        assert!((config.simulation.decay.happiness_per_minute - 0.5).abs() < 1e-9);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = PetConfig::from_toml(
            r#"
            [simulation]
            tick_interval_ms = 250

            [simulation.decay]
            energy_per_minute = 1.0

            [persistence]
            backend = "sqlite"
            path = "/tmp/pets.db"
            "#,
        )
        .expect("parse");
        assert_eq!(config.simulation.tick_interval(), Duration::from_millis(250));
        assert!((config.simulation.decay.energy_per_minute - 1.0).abs() < 1e-9);
        assert!((config.simulation.decay.happiness_per_minute - 0.5).abs() < 1e-9);
        assert_eq!(config.persistence.backend, StoreBackend::Sqlite);
        assert!(config.persistence.checksum_enabled);
    }

    #[test]
    fn zero_interval_is_bumped() {
        let sim = SimulationConfig {
            tick_interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(sim.tick_interval(), Duration::from_millis(1));
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PetConfig::from_toml("simulation = 5").expect_err("invalid");
        assert!(matches!(err, crate::PetError::Config(_)));
    }
}
