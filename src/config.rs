//! Configuration management for staffscout using the prefer crate.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::{BrowserLoginOptions, Credentials};
use crate::client::ClientOptions;
use crate::scraper::{ScraperOptions, DEFAULT_IDENTITY_TIMEOUT};
use crate::search::RESULT_CEILING;
use crate::solver::{PollSettings, SolverKind};

/// Session file used when nothing else is configured.
pub const DEFAULT_SESSION_FILE: &str = "~/.staffscout/session.json";

impl prefer::FromValue for SolverKind {
    fn from_value(value: &prefer::ConfigValue) -> prefer::Result<Self> {
        match value.as_str() {
            Some(name) => name.parse().map_err(|e: String| prefer::Error::ConversionError {
                key: String::new(),
                type_name: "SolverKind".to_string(),
                source: e.into(),
            }),
            None => Err(prefer::Error::ConversionError {
                key: String::new(),
                type_name: "SolverKind".to_string(),
                source: "expected string".into(),
            }),
        }
    }
}

/// Captcha solving service settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct SolverConfig {
    /// Which backend to use.
    #[serde(default)]
    #[prefer(default)]
    pub service: SolverKind,
    /// Backend API key. Without one, a captcha aborts the login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Create-and-poll cycles before giving up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Pause between status polls in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_polls: Option<u32>,
}

impl SolverConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn poll_settings(&self) -> PollSettings {
        let mut settings = PollSettings::for_kind(self.service);
        if let Some(attempts) = self.max_attempts {
            settings.max_attempts = attempts.max(1);
        }
        if let Some(polls) = self.max_polls {
            settings.max_polls = polls.max(1);
        }
        if let Some(ms) = self.poll_interval_ms {
            settings.interval = Duration::from_millis(ms);
        }
        settings
    }
}

/// Interactive browser login settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, prefer::FromValue)]
pub struct BrowserLoginConfig {
    /// Chrome or Chromium binary; discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
    /// Seconds to wait for the user to finish logging in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_secs: Option<u64>,
}

impl BrowserLoginConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Where the authenticated session is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Captcha solver configuration.
    #[serde(default, skip_serializing_if = "SolverConfig::is_default")]
    #[prefer(default)]
    pub solver: SolverConfig,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Upper bound on one identity's enrichment, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_timeout: Option<u64>,
    /// Concurrent sub-resource fetches per identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    /// Default result cap per query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u64>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "BrowserLoginConfig::is_default")]
    #[prefer(default)]
    pub browser: BrowserLoginConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery, then apply
    /// environment overrides.
    pub async fn load() -> Self {
        let config = match prefer::load("staffscout").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `STAFFSCOUT_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(username) = var("STAFFSCOUT_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = var("STAFFSCOUT_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(path) = var("STAFFSCOUT_SESSION_FILE") {
            self.session_file = Some(path);
        }
        if let Some(service) = var("STAFFSCOUT_SOLVER") {
            match service.parse() {
                Ok(kind) => self.solver.service = kind,
                Err(e) => tracing::warn!("Ignoring STAFFSCOUT_SOLVER: {}", e),
            }
        }
        if let Some(key) = var("STAFFSCOUT_SOLVER_API_KEY") {
            self.solver.api_key = Some(key);
        }
        self
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved against `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn session_path(&self) -> PathBuf {
        let base_dir = self
            .base_dir()
            .or_else(|| env::current_dir().ok())
            .unwrap_or_default();
        let path = self.session_file.as_deref().unwrap_or(DEFAULT_SESSION_FILE);
        self.resolve_path(path, &base_dir)
    }

    /// Username and password, when both are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            timeout: self
                .request_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            request_delay: self
                .request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_delay),
        }
    }

    pub fn scraper_options(&self) -> ScraperOptions {
        let defaults = ScraperOptions::default();
        ScraperOptions {
            workers: self
                .workers
                .and_then(|w| usize::try_from(w).ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.workers),
            identity_timeout: self
                .identity_timeout
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_IDENTITY_TIMEOUT),
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
            .and_then(|m| usize::try_from(m).ok())
            .unwrap_or(RESULT_CEILING)
    }

    pub fn browser_options(&self) -> BrowserLoginOptions {
        let mut options = BrowserLoginOptions::default();
        if let Some(path) = &self.browser.chrome_path {
            let base_dir = self.base_dir().unwrap_or_default();
            options.chrome_path = Some(self.resolve_path(path, &base_dir));
        }
        if let Some(url) = &self.browser.login_url {
            options.login_url = url.clone();
        }
        if let Some(secs) = self.browser.wait_secs {
            options.wait = Duration::from_secs(secs);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("staffscout.toml");
        std::fs::write(
            &path,
            r#"
session_file = "sessions/me.json"
username = "ada@example.com"
password = "hunter2"
workers = 4
request_delay_ms = 250

[solver]
service = "2captcha"
api_key = "KEY"
poll_interval_ms = 0
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.solver.service, SolverKind::TwoCaptcha);
        assert_eq!(config.session_path(), dir.path().join("sessions/me.json"));
        assert_eq!(config.scraper_options().workers, 4);
        assert_eq!(config.client_options().request_delay, Duration::from_millis(250));
        assert_eq!(config.solver.poll_settings().interval, Duration::ZERO);
        assert_eq!(config.solver.poll_settings().max_attempts, 5);
        assert_eq!(config.credentials().unwrap().username, "ada@example.com");
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("staffscout.yaml");
        std::fs::write(&yaml, "max_results: 200\nbrowser:\n  wait_secs: 10\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.max_results(), 200);
        assert_eq!(config.browser_options().wait, Duration::from_secs(10));

        let json = dir.path().join("staffscout.json");
        std::fs::write(&json, r#"{"identity_timeout": 5}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.scraper_options().identity_timeout, Duration::from_secs(5));
        assert_eq!(config.max_results(), RESULT_CEILING);
    }

    #[tokio::test]
    async fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "workers = [").unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STAFFSCOUT_USERNAME", "env-user"),
            ("STAFFSCOUT_PASSWORD", "env-pass"),
            ("STAFFSCOUT_SOLVER", "twocaptcha"),
            ("STAFFSCOUT_SOLVER_API_KEY", "env-key"),
            ("STAFFSCOUT_SESSION_FILE", ""),
        ]
        .into_iter()
        .collect();

        let config = Config {
            username: Some("file-user".into()),
            session_file: Some("/tmp/s.json".into()),
            ..Default::default()
        }
        .with_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.username.as_deref(), Some("env-user"));
        assert_eq!(config.solver.service, SolverKind::TwoCaptcha);
        assert_eq!(config.solver.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.session_file.as_deref(), Some("/tmp/s.json"));
    }

    #[test]
    fn test_credentials_need_both_parts() {
        let config = Config {
            username: Some("ada".into()),
            ..Default::default()
        };
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scraper_options().workers, 7);
        assert_eq!(config.client_options().timeout, Duration::from_secs(30));
        assert!(config.session_path().ends_with(".staffscout/session.json"));
    }
}
