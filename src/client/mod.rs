//! HTTP transport with a shared cookie jar and per-request headers.
//!
//! Every request is built from an immutable set of session headers plus
//! the headers passed for that call, so concurrent fetchers never observe
//! each other's header overrides.

mod response;
#[cfg(test)]
pub mod testing;
pub mod user_agent;

pub use response::ApiResponse;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ScrapeError};
use crate::session::{Session, SessionCookie};

/// Origin every request and cookie is scoped to.
pub const BASE_URL: &str = "https://www.linkedin.com";

/// Request body variants used by the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
    /// `application/json`.
    Json(Value),
}

impl Body {
    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Body::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Seam between the scraping logic and the network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET with extra headers for this request only.
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ApiResponse>;

    /// POST with extra headers for this request only.
    async fn post(&self, url: &str, body: Body, headers: &[(&str, &str)]) -> Result<ApiResponse>;

    /// Cookies currently held for [`BASE_URL`].
    fn cookies(&self) -> Vec<SessionCookie>;

    /// Look up one cookie by name.
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }
}

/// Timing knobs for [`HttpClient`].
#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub timeout: Duration,
    /// Pause after every request.
    pub request_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            request_delay: Duration::ZERO,
        }
    }
}

/// reqwest-backed [`Transport`].
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
    base_headers: Arc<HeaderMap>,
    request_delay: Duration,
}

impl HttpClient {
    /// Create a client seeded with the session's cookies and headers.
    pub fn new(session: &Session, options: ClientOptions) -> Result<Self> {
        let base_url = base_url();
        let jar = Arc::new(Jar::default());
        for cookie in &session.cookies {
            jar.add_cookie_str(&cookie.to_cookie_str(), &base_url);
        }

        let mut base_headers = HeaderMap::new();
        for (name, value) in &session.headers {
            insert_header(&mut base_headers, name, value)?;
        }

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(options.timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            jar,
            base_headers: Arc::new(base_headers),
            request_delay: options.request_delay,
        })
    }

    /// Session headers merged with this call's extras. Extras win.
    fn request_headers(&self, extra: &[(&str, &str)]) -> Result<HeaderMap> {
        let mut headers = (*self.base_headers).clone();
        for (name, value) in extra {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    async fn finish(&self, method: &str, url: &str, response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("{} {} -> {}", method, url, status);

        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        Ok(ApiResponse::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ApiResponse> {
        let headers = self.request_headers(headers)?;
        let response = self.client.get(url).headers(headers).send().await?;
        self.finish("GET", url, response).await
    }

    async fn post(&self, url: &str, body: Body, headers: &[(&str, &str)]) -> Result<ApiResponse> {
        let headers = self.request_headers(headers)?;
        let request = self.client.post(url).headers(headers);
        let request = match &body {
            Body::Form(pairs) => request.form(pairs),
            Body::Json(value) => request.json(value),
        };
        let response = request.send().await?;
        self.finish("POST", url, response).await
    }

    fn cookies(&self) -> Vec<SessionCookie> {
        self.jar
            .cookies(&base_url())
            .and_then(|header| header.to_str().ok().map(parse_cookie_header))
            .unwrap_or_default()
    }
}

fn base_url() -> Url {
    Url::parse(BASE_URL).expect("BASE_URL is a valid URL")
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_str(name)
        .map_err(|e| ScrapeError::InvalidHeader(format!("{}: {}", name, e)))?;
    let value = HeaderValue::from_str(value)
        .map_err(|e| ScrapeError::InvalidHeader(format!("{}: {}", name, e)))?;
    headers.insert(name, value);
    Ok(())
}

/// Split a `Cookie` request header into individual cookies.
fn parse_cookie_header(header: &str) -> Vec<SessionCookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (!name.is_empty()).then(|| SessionCookie::new(name, value))
        })
        .collect()
}
