//! `[lms]` configuration table.

use serde::{Deserialize, Serialize};

use crate::client::LmsProvider;
use crate::error::LmsError;

/// Which LMS to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Import disabled.
    #[default]
    None,
    /// Instructure Canvas REST API.
    Canvas,
}

/// LMS import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmsConfig {
    /// Provider selection.
    #[serde(default)]
    pub provider: ProviderKind,
    /// Base URL of the LMS instance, e.g. `https://school.instructure.com`.
    #[serde(default)]
    pub base_url: String,
    /// Personal access token.
    #[serde(default)]
    pub token: String,
    /// Retries after the first failed request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::None,
            base_url: String::new(),
            token: String::new(),
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LmsConfig {
    /// Load from a TOML string.
    ///
    /// # Errors
    /// Returns [`LmsError::ConfigError`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self, LmsError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Resolve the provider described by this config.
    ///
    /// # Errors
    /// Returns [`LmsError::ConfigError`] if Canvas is selected without a base
    /// URL or token.
    pub fn provider(&self) -> Result<LmsProvider, LmsError> {
        match self.provider {
            ProviderKind::None => Ok(LmsProvider::None),
            ProviderKind::Canvas => {
                if self.base_url.trim().is_empty() {
                    return Err(LmsError::ConfigError("canvas provider needs base_url".into()));
                }
                if self.token.trim().is_empty() {
                    return Err(LmsError::ConfigError("canvas provider needs token".into()));
                }
                Ok(LmsProvider::Canvas {
                    base_url: self.base_url.trim_end_matches('/').to_string(),
                    token: self.token.clone(),
                })
            }
        }
    }
}

fn default_max_retries() -> u32 { 2 }
fn default_timeout_ms() -> u64 { 10_000 }
