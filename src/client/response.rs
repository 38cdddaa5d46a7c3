//! HTTP response wrapper.

use serde_json::Value;

use crate::error::FetchError;
use crate::utils::truncate;

/// Fully-read response from the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response is HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// First 200 characters of the body, for log lines.
    pub fn snippet(&self) -> &str {
        truncate(&self.body, 200)
    }

    /// Uniform fetcher triage: 429 is a rate limit, other failures and
    /// undecodable bodies make the sub-resource unavailable.
    pub fn into_json(self) -> Result<Value, FetchError> {
        if self.is_rate_limited() {
            return Err(FetchError::RateLimited);
        }
        if !self.is_success() {
            return Err(FetchError::Unavailable(format!(
                "HTTP {}: {}",
                self.status,
                self.snippet()
            )));
        }
        self.json()
            .map_err(|e| FetchError::Unavailable(format!("invalid JSON: {}", e)))
    }
}
