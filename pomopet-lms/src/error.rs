//! LMS error types.

use thiserror::Error;

/// Errors that can occur while talking to a learning-management system.
#[derive(Debug, Error)]
pub enum LmsError {
    /// HTTP request failed.
    #[error("LMS request failed: {0}")]
    RequestFailed(String),

    /// Response body was not the expected JSON.
    #[error("Failed to parse LMS response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("LMS request timed out after {0}ms")]
    Timeout(u64),

    /// No provider configured, or the provider cannot be reached.
    #[error("LMS provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected the access token.
    #[error("LMS rejected the access token (HTTP {0})")]
    Unauthorized(u16),

    /// All retry attempts exhausted.
    #[error("All LMS retry attempts exhausted after {attempts} tries: {last_error}")]
    RetriesExhausted {
        /// How many requests were sent.
        attempts: u32,
        /// The final failure.
        last_error: String,
    },

    /// Configuration error.
    #[error("LMS configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for LmsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LmsError::Timeout(0)
        } else if err.is_connect() {
            LmsError::Unavailable(err.to_string())
        } else if err.is_decode() {
            LmsError::ParseError(err.to_string())
        } else {
            LmsError::RequestFailed(err.to_string())
        }
    }
}

impl From<toml::de::Error> for LmsError {
    fn from(err: toml::de::Error) -> Self {
        LmsError::ConfigError(err.to_string())
    }
}
