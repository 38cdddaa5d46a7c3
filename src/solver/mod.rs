//! Captcha solving backends.
//!
//! Both services expose the same task protocol: create a task carrying the
//! challenge blob, then poll its result until it is ready or failed.

mod capsolver;
mod task;
mod two_captcha;

pub use capsolver::CapSolver;
pub use two_captcha::TwoCaptcha;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::Transport;
use crate::error::Result;

/// Public key of the challenge widget.
pub const CHALLENGE_PUBLIC_KEY: &str = "3117BF26-4762-4F5A-8ED9-A85E69209A46";

/// Origin that hosts the challenge widget.
pub const CHALLENGE_PAGE_URL: &str = "https://iframe.arkoselabs.com";

/// Turns a challenge blob into a verification token.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Service name for log lines.
    fn name(&self) -> &'static str;

    /// Solve the challenge presented at `page_url`.
    async fn solve(&self, blob: &str, page_url: &str) -> Result<String>;
}

/// Available solving services.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    CapSolver,
    #[serde(alias = "2captcha")]
    TwoCaptcha,
}

impl SolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CapSolver => "capsolver",
            Self::TwoCaptcha => "twocaptcha",
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "capsolver" => Ok(Self::CapSolver),
            "twocaptcha" | "2captcha" => Ok(Self::TwoCaptcha),
            other => Err(format!(
                "unknown solver '{}', expected capsolver or twocaptcha",
                other
            )),
        }
    }
}

impl std::fmt::Display for SolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retry and polling bounds shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Whole create-and-poll cycles before giving up.
    pub max_attempts: u32,
    /// Status polls per cycle.
    pub max_polls: u32,
    pub interval: Duration,
}

impl PollSettings {
    /// Default bounds for a backend.
    pub fn for_kind(kind: SolverKind) -> Self {
        let max_attempts = match kind {
            SolverKind::CapSolver => 10,
            SolverKind::TwoCaptcha => 5,
        };
        Self {
            max_attempts,
            max_polls: 120,
            interval: Duration::from_secs(1),
        }
    }
}

/// Build the configured backend.
pub fn build_solver(
    kind: SolverKind,
    api_key: String,
    transport: Arc<dyn Transport>,
    settings: PollSettings,
) -> Arc<dyn CaptchaSolver> {
    match kind {
        SolverKind::CapSolver => Arc::new(CapSolver::new(api_key, transport, settings)),
        SolverKind::TwoCaptcha => Arc::new(TwoCaptcha::new(api_key, transport, settings)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_kind_parse() {
        assert_eq!("capsolver".parse::<SolverKind>(), Ok(SolverKind::CapSolver));
        assert_eq!("2captcha".parse::<SolverKind>(), Ok(SolverKind::TwoCaptcha));
        assert_eq!("two_captcha".parse::<SolverKind>(), Ok(SolverKind::TwoCaptcha));
        assert!("anticaptcha".parse::<SolverKind>().is_err());
    }

    #[test]
    fn test_default_attempt_bounds() {
        assert_eq!(PollSettings::for_kind(SolverKind::CapSolver).max_attempts, 10);
        assert_eq!(PollSettings::for_kind(SolverKind::TwoCaptcha).max_attempts, 5);
    }
}
