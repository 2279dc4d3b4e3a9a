//! LMS Client — course and assignment import over the provider's REST API.

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::LmsConfig;
use crate::error::LmsError;
use crate::types::{Assignment, CanvasAssignment, CanvasCourse, Course};

const PAGE_SIZE: &str = "100";

/// Backend the client talks to.
#[derive(Debug, Clone)]
pub enum LmsProvider {
    /// Canvas REST API with a personal access token.
    Canvas { base_url: String, token: String },
    /// No LMS configured — every call returns [`LmsError::Unavailable`].
    None,
}

/// Client for importing coursework.
pub struct LmsClient {
    provider: LmsProvider,
    http: Client,
    max_retries: u32,
    timeout: Duration,
}

impl std::fmt::Debug for LmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let provider = match &self.provider {
            LmsProvider::Canvas { base_url, .. } => format!("Canvas({base_url})"),
            LmsProvider::None => "None".to_string(),
        };
        f.debug_struct("LmsClient")
            .field("provider", &provider)
            .field("max_retries", &self.max_retries)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl LmsClient {
    /// Create a new client.
    #[must_use]
    pub fn new(provider: LmsProvider, max_retries: u32, timeout: Duration) -> Self {
        Self {
            provider,
            http: Client::new(),
            max_retries,
            timeout,
        }
    }

    /// Create a client with no backend.
    #[must_use]
    pub fn none() -> Self {
        Self::new(LmsProvider::None, 0, Duration::from_secs(1))
    }

    /// Build a client from the `[lms]` config table.
    ///
    /// # Errors
    /// Returns [`LmsError::ConfigError`] if the selected provider is
    /// incompletely configured.
    pub fn from_config(config: &LmsConfig) -> Result<Self, LmsError> {
        Ok(Self::new(
            config.provider()?,
            config.max_retries,
            Duration::from_millis(config.timeout_ms),
        ))
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LmsProvider::None)
    }

    /// Courses with an active enrollment.
    ///
    /// # Errors
    /// Returns `Err` if no provider is configured or all retries fail.
    pub async fn list_courses(&self) -> Result<Vec<Course>, LmsError> {
        match &self.provider {
            LmsProvider::None => Err(unavailable()),
            LmsProvider::Canvas { base_url, token } => {
                let url = format!("{base_url}/api/v1/courses");
                let query = [("enrollment_state", "active"), ("per_page", PAGE_SIZE)];
                let raw: Vec<CanvasCourse> = self.get_json(&url, token, &query).await?;
                Ok(raw.into_iter().map(CanvasCourse::into_course).collect())
            }
        }
    }

    /// Every assignment in `course`.
    ///
    /// # Errors
    /// Returns `Err` if no provider is configured or all retries fail.
    pub async fn list_assignments(&self, course: &Course) -> Result<Vec<Assignment>, LmsError> {
        match &self.provider {
            LmsProvider::None => Err(unavailable()),
            LmsProvider::Canvas { base_url, token } => {
                let url = format!("{base_url}/api/v1/courses/{}/assignments", course.id);
                let raw: Vec<CanvasAssignment> = self
                    .get_json(&url, token, &[("order_by", "due_at"), ("per_page", PAGE_SIZE)])
                    .await?;
                Ok(raw.into_iter().map(|a| a.into_assignment(course)).collect())
            }
        }
    }

    /// Upcoming assignments across all active courses, soonest first.
    ///
    /// A course whose assignment list cannot be fetched is skipped with a
    /// warning; the course list itself must succeed.
    ///
    /// # Errors
    /// Returns `Err` if no provider is configured or the course list fails.
    pub async fn fetch_upcoming(&self) -> Result<Vec<Assignment>, LmsError> {
        let courses = self.list_courses().await?;
        let now = Utc::now();

        let mut upcoming = Vec::new();
        for course in &courses {
            match self.list_assignments(course).await {
                Ok(assignments) => {
                    upcoming.extend(assignments.into_iter().filter(|a| a.is_upcoming(now)));
                }
                Err(e) => warn!(course = %course.name, error = %e, "Skipping course"),
            }
        }
        upcoming.sort_by_key(|a| (a.due_at.is_none(), a.due_at));

        info!(
            courses = courses.len(),
            assignments = upcoming.len(),
            "Fetched upcoming assignments"
        );
        Ok(upcoming)
    }

    /// GET `url` with bearer auth and decode the JSON body, retrying
    /// transport and server failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LmsError> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retrying LMS call (attempt {}/{})", attempt + 1, self.max_retries + 1);
            }

            let start = Instant::now();
            let result = self
                .http
                .get(url)
                .bearer_auth(token)
                .query(query)
                .timeout(self.timeout)
                .send()
                .await;
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        debug!(url, latency_ms, "LMS request succeeded");
                        return resp
                            .json::<T>()
                            .await
                            .map_err(|e| LmsError::ParseError(e.to_string()));
                    }
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(LmsError::Unauthorized(status.as_u16()));
                    }
                    last_error = format!("HTTP {status}");
                    warn!(url, "LMS returned error: {}", last_error);
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!(url, "LMS request timed out after {}ms", self.timeout.as_millis());
                    } else {
                        warn!(url, "LMS request failed: {}", last_error);
                    }
                }
            }
        }

        Err(LmsError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

fn unavailable() -> LmsError {
    LmsError::Unavailable("No LMS provider configured".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn none_provider_is_unavailable() {
        let client = LmsClient::none();
        assert!(!client.is_available());
        assert!(matches!(client.list_courses().await, Err(LmsError::Unavailable(_))));
        assert!(matches!(client.fetch_upcoming().await, Err(LmsError::Unavailable(_))));
    }

    #[test]
    fn debug_hides_token() {
        let client = LmsClient::new(
            LmsProvider::Canvas {
                base_url: "https://school.instructure.com".into(),
                token: "secret-token".into(),
            },
            1,
            Duration::from_secs(1),
        );
        let rendered = format!("{client:?}");
        assert!(rendered.contains("school.instructure.com"));
        assert!(!rendered.contains("secret-token"));
    }
}
