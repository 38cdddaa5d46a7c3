//! Error taxonomy for authentication, search and enrichment.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Incorrect username or password")]
    BadCredentials,
    #[error("Captcha blob not found on challenge page")]
    BlobNotFound,
    #[error("LinkedIn is requiring a more secure password; reset it and try again")]
    InsecurePassword,
    #[error("Captcha hit but no solver API key is configured")]
    SolverUnavailable,
    #[error("Captcha solver failed: {0}")]
    SolverFailed(String),
    #[error("Challenge verification rejected (HTTP {status})")]
    ChallengeRejected { status: u16 },
    #[error("JSESSIONID cookie missing from session")]
    MissingCsrf,
    #[error("Session rejected by liveness probe (HTTP {status}); delete the session file and log in again")]
    SessionRejected { status: u16 },
    #[error("Outdated login; delete the session file to log in again")]
    BadCookies,
    #[error("429 Too Many Requests")]
    RateLimited,
    #[error("Account is on cooldown after a 429 (Too Many Requests); create a new scraper to proceed")]
    Halted,
    #[error("Geo id not found for location '{0}'")]
    GeoNotFound(String),
    #[error("Company not found: {0}")]
    CompanyNotFound(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    #[error("Browser login failed: {0}")]
    Browser(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// Signals that concern the whole account rather than one request.
    pub fn is_account_level(&self) -> bool {
        matches!(
            self,
            ScrapeError::RateLimited
                | ScrapeError::Halted
                | ScrapeError::BadCookies
                | ScrapeError::SessionRejected { .. }
        )
    }
}

/// Outcome of a single sub-resource fetch that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// HTTP 429. Must halt the whole batch.
    #[error("rate limited")]
    RateLimited,
    /// The sub-resource is unavailable for this identity.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl From<FetchError> for ScrapeError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::RateLimited => ScrapeError::RateLimited,
            FetchError::Unavailable(msg) => ScrapeError::UnexpectedResponse(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_level_errors() {
        assert!(ScrapeError::RateLimited.is_account_level());
        assert!(ScrapeError::BadCookies.is_account_level());
        assert!(ScrapeError::SessionRejected { status: 401 }.is_account_level());
        assert!(!ScrapeError::GeoNotFound("Mars".into()).is_account_level());
        assert!(!ScrapeError::BlobNotFound.is_account_level());
    }

    #[test]
    fn test_fetch_error_conversion() {
        let err: ScrapeError = FetchError::RateLimited.into();
        assert!(matches!(err, ScrapeError::RateLimited));
    }
}
