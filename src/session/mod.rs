//! Authenticated session state: cookies plus the headers stamped at login.

mod store;

pub use store::SessionStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::user_agent::api_headers;
use crate::error::{Result, ScrapeError};

/// Name of the cookie carrying the anti-forgery token.
pub const CSRF_COOKIE: &str = "JSESSIONID";

/// Cookie domain used when persisting and reloading sessions.
pub const COOKIE_DOMAIN: &str = ".linkedin.com";

/// One persisted cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_domain() -> String {
    COOKIE_DOMAIN.to_string()
}

fn default_path() -> String {
    "/".to_string()
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: default_domain(),
            path: default_path(),
        }
    }

    /// `Set-Cookie` style string accepted by the cookie jar.
    pub fn to_cookie_str(&self) -> String {
        format!(
            "{}={}; Domain={}; Path={}",
            self.name, self.value, self.domain, self.path
        )
    }
}

/// Cookies plus the default headers every authenticated request carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub cookies: Vec<SessionCookie>,
    /// Lowercase header name to value.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Session {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            headers: BTreeMap::new(),
        }
    }

    /// Value of a cookie by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// Anti-forgery token: the `JSESSIONID` value with quotes stripped.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie(CSRF_COOKIE)
            .map(|v| v.trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    }

    /// Stamp the standard API headers and the `csrf-token` header.
    pub fn stamp_headers(&mut self, user_agent: &str) -> Result<()> {
        let token = self.csrf_token().ok_or(ScrapeError::MissingCsrf)?;
        for (name, value) in api_headers(user_agent) {
            self.headers.insert(name, value);
        }
        self.headers.insert("csrf-token".to_string(), token);
        Ok(())
    }

    /// Whether [`Session::stamp_headers`] has run.
    pub fn is_stamped(&self) -> bool {
        self.headers.contains_key("csrf-token")
    }
}
