//! In-memory [`Transport`] that replays scripted responses.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiResponse, Body, Transport};
use crate::error::Result;
use crate::session::SessionCookie;

/// One request seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        match &self.body {
            Some(Body::Form(pairs)) => pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

type Responder = Box<dyn Fn(&RecordedRequest) -> ApiResponse + Send + Sync>;

enum Reply {
    Fixed(ApiResponse),
    /// Pops in order; the last response repeats.
    Sequence(Mutex<VecDeque<ApiResponse>>),
    Dynamic(Responder),
}

struct Route {
    pattern: String,
    reply: Reply,
    delay: Duration,
}

/// Routes requests by URL substring; first match wins, unmatched URLs get 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Vec<Route>,
    requests: Mutex<Vec<RecordedRequest>>,
    cookies: Mutex<Vec<SessionCookie>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, pattern: &str, status: u16, body: Value) -> Self {
        self.push(pattern, Reply::Fixed(ApiResponse::new(status, body.to_string())), Duration::ZERO)
    }

    pub fn respond_text(self, pattern: &str, status: u16, body: &str) -> Self {
        self.push(pattern, Reply::Fixed(ApiResponse::new(status, body)), Duration::ZERO)
    }

    /// Like [`FakeTransport::respond`] but the reply is held back for `delay`.
    pub fn respond_after(self, pattern: &str, delay: Duration, status: u16, body: Value) -> Self {
        self.push(pattern, Reply::Fixed(ApiResponse::new(status, body.to_string())), delay)
    }

    pub fn respond_seq(self, pattern: &str, responses: Vec<ApiResponse>) -> Self {
        self.push(pattern, Reply::Sequence(Mutex::new(responses.into())), Duration::ZERO)
    }

    pub fn respond_with<F>(self, pattern: &str, f: F) -> Self
    where
        F: Fn(&RecordedRequest) -> ApiResponse + Send + Sync + 'static,
    {
        self.push(pattern, Reply::Dynamic(Box::new(f)), Duration::ZERO)
    }

    pub fn with_cookie(self, name: &str, value: &str) -> Self {
        self.cookies
            .lock()
            .unwrap()
            .push(SessionCookie::new(name, value));
        self
    }

    fn push(mut self, pattern: &str, reply: Reply, delay: Duration) -> Self {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            reply,
            delay,
        });
        self
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose URL contains `pattern`.
    pub fn requests_to(&self, pattern: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(pattern))
            .collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.requests_to(pattern).len()
    }

    async fn dispatch(&self, request: RecordedRequest) -> ApiResponse {
        self.requests.lock().unwrap().push(request.clone());

        let Some(route) = self.routes.iter().find(|r| request.url.contains(&r.pattern)) else {
            return ApiResponse::new(404, "");
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }

        match &route.reply {
            Reply::Fixed(response) => response.clone(),
            Reply::Sequence(queue) => {
                let mut queue = queue.lock().unwrap();
                if queue.len() > 1 {
                    queue.pop_front().unwrap()
                } else {
                    queue.front().cloned().unwrap_or_else(|| ApiResponse::new(404, ""))
                }
            }
            Reply::Dynamic(f) => f(&request),
        }
    }
}

fn owned_headers(headers: &[(&str, &str)]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect()
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ApiResponse> {
        let request = RecordedRequest {
            method: "GET",
            url: url.to_string(),
            headers: owned_headers(headers),
            body: None,
        };
        Ok(self.dispatch(request).await)
    }

    async fn post(&self, url: &str, body: Body, headers: &[(&str, &str)]) -> Result<ApiResponse> {
        let request = RecordedRequest {
            method: "POST",
            url: url.to_string(),
            headers: owned_headers(headers),
            body: Some(body),
        };
        Ok(self.dispatch(request).await)
    }

    fn cookies(&self) -> Vec<SessionCookie> {
        self.cookies.lock().unwrap().clone()
    }
}
