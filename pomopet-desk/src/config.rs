//! `pomopet.toml` — the full desktop configuration.
//!
//! The `[pet.*]` tables go straight to `pomopet_core`, `[lms]` to
//! `pomopet_lms`; the rest is owned here.

use std::path::Path;
use std::time::Duration;

use pomopet_core::{PetConfig, Species};
use pomopet_lms::LmsConfig;
use serde::{Deserialize, Serialize};

use crate::error::{DeskError, Result};

/// Top-level desktop configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    /// Pet simulation, logging and storage.
    #[serde(default)]
    pub pet: PetConfig,
    /// The pet created on first launch.
    #[serde(default)]
    pub starter: StarterConfig,
    /// Pomodoro timings.
    #[serde(default)]
    pub focus: FocusConfig,
    /// Point awards.
    #[serde(default)]
    pub rewards: RewardsConfig,
    /// Coursework import.
    #[serde(default)]
    pub lms: LmsConfig,
}

impl DeskConfig {
    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns [`DeskError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| DeskError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// First-launch pet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarterConfig {
    /// Display name.
    #[serde(default = "default_starter_name")]
    pub name: String,
    /// Species.
    #[serde(default = "default_starter_species")]
    pub species: Species,
}

impl Default for StarterConfig {
    fn default() -> Self {
        Self {
            name: default_starter_name(),
            species: default_starter_species(),
        }
    }
}

/// Pomodoro timings. Durations are in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Length of a focus block.
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: u64,
    /// Length of a short break.
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u64,
    /// Length of a long break.
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    /// Every Nth completed focus block earns a long break.
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    /// Start the break as soon as a focus block ends.
    #[serde(default = "default_true")]
    pub auto_start_breaks: bool,
    /// Start the next focus block as soon as a break ends.
    #[serde(default)]
    pub auto_start_focus: bool,
}

impl FocusConfig {
    /// Focus block as a [`Duration`].
    #[must_use]
    pub fn focus(&self) -> Duration {
        minutes(self.focus_minutes)
    }

    /// Short break as a [`Duration`].
    #[must_use]
    pub fn short_break(&self) -> Duration {
        minutes(self.short_break_minutes)
    }

    /// Long break as a [`Duration`].
    #[must_use]
    pub fn long_break(&self) -> Duration {
        minutes(self.long_break_minutes)
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_before_long_break: default_sessions_before_long_break(),
            auto_start_breaks: true,
            auto_start_focus: false,
        }
    }
}

/// Points awarded per completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsConfig {
    /// Points for finishing a task.
    #[serde(default = "default_task_points")]
    pub task_points: u32,
    /// Points for finishing a focus block.
    #[serde(default = "default_session_points")]
    pub session_points: u32,
    /// Balance on first launch.
    #[serde(default)]
    pub starting_balance: u32,
}

impl Default for RewardsConfig {
    fn default() -> Self {
        Self {
            task_points: default_task_points(),
            session_points: default_session_points(),
            starting_balance: 0,
        }
    }
}

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.max(1).saturating_mul(60))
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_starter_name() -> String { "Mochi".to_string() }
fn default_starter_species() -> Species { Species::Cat }
fn default_focus_minutes() -> u64 { 25 }
fn default_short_break_minutes() -> u64 { 5 }
fn default_long_break_minutes() -> u64 { 15 }
fn default_sessions_before_long_break() -> u32 { 4 }
fn default_task_points() -> u32 { 10 }
fn default_session_points() -> u32 { 25 }

#[cfg(test)]
mod tests {
    use pomopet_core::config::StoreBackend;
    use pomopet_lms::ProviderKind;

    use super::*;

    #[test]
    fn empty_file_is_valid() {
        let config = DeskConfig::from_toml("").expect("parse");
        assert_eq!(config.focus.focus(), Duration::from_secs(25 * 60));
        assert_eq!(config.focus.sessions_before_long_break, 4);
        assert_eq!(config.rewards.task_points, 10);
        assert_eq!(config.starter.species, Species::Cat);
        assert_eq!(config.lms.provider, ProviderKind::None);
    }

    #[test]
    fn nested_tables_reach_each_crate() {
        let config = DeskConfig::from_toml(
            r#"
            [pet.simulation]
            celebration_revert_ms = 1500

            [pet.persistence]
            backend = "sqlite"

            [starter]
            name = "Ember"
            species = "dragon"

            [focus]
            focus_minutes = 50
            short_break_minutes = 10

            [lms]
            provider = "canvas"
            base_url = "https://school.instructure.com"
            token = "t"
            "#,
        )
        .expect("parse");
        assert_eq!(config.pet.simulation.celebration_revert_ms, 1500);
        assert_eq!(config.pet.persistence.backend, StoreBackend::Sqlite);
        assert_eq!(config.starter.name, "Ember");
        assert_eq!(config.starter.species, Species::Dragon);
        assert_eq!(config.focus.short_break(), Duration::from_secs(600));
        assert_eq!(config.focus.long_break(), Duration::from_secs(900));
        assert_eq!(config.lms.provider, ProviderKind::Canvas);
    }

    #[test]
    fn zero_minutes_is_bumped() {
        let focus = FocusConfig {
            focus_minutes: 0,
            ..FocusConfig::default()
        };
        assert_eq!(focus.focus(), Duration::from_secs(60));
    }

    #[test]
    fn huge_minutes_saturate() {
        let config = DeskConfig::from_toml("[focus]\nfocus_minutes = 9223372036854775807")
            .expect("parse");
        assert_eq!(config.focus.focus(), Duration::from_secs(u64::MAX));
        assert_eq!(config.focus.short_break(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(DeskConfig::from_toml("focus = 3"), Err(DeskError::Config(_))));
    }
}
