//! createTask / getTaskResult protocol shared by the solving services.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::PollSettings;
use crate::client::{Body, Transport};
use crate::error::{Result, ScrapeError};
use crate::json;

/// One solving service speaking the task protocol.
pub(super) struct TaskApi<'a> {
    pub service: &'static str,
    pub base_url: &'a str,
    pub api_key: &'a str,
    pub transport: &'a dyn Transport,
    pub settings: PollSettings,
}

impl TaskApi<'_> {
    /// Run up to `max_attempts` create-and-poll cycles for `task`.
    pub async fn solve(&self, task: Value) -> Result<String> {
        let mut last_error = ScrapeError::SolverFailed(format!("{}: no attempts made", self.service));

        for attempt in 1..=self.settings.max_attempts.max(1) {
            info!(
                "Waiting on {} to solve captcha (attempt {}/{})",
                self.service, attempt, self.settings.max_attempts
            );
            match self.attempt(task.clone()).await {
                Ok(token) => {
                    info!("{} finished solving captcha", self.service);
                    return Ok(token);
                }
                Err(e) => {
                    warn!("{} attempt {} failed: {}", self.service, attempt, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }

    async fn attempt(&self, task: Value) -> Result<String> {
        let task_id = self.create_task(task).await?;
        debug!("{} task id {}", self.service, task_id);

        for _ in 0..self.settings.max_polls {
            if !self.settings.interval.is_zero() {
                tokio::time::sleep(self.settings.interval).await;
            }

            let body = self
                .call("getTaskResult", json!({"clientKey": self.api_key, "taskId": task_id}))
                .await?;

            match json::str_at(&body, "status") {
                Some("ready") => {
                    return json::string_at(&body, "solution.token").ok_or_else(|| {
                        ScrapeError::SolverFailed(format!("{}: ready without token", self.service))
                    });
                }
                Some("failed") => {
                    return Err(ScrapeError::SolverFailed(format!(
                        "{}: {}",
                        self.service,
                        error_description(&body)
                    )));
                }
                _ => {}
            }
        }

        Err(ScrapeError::SolverFailed(format!(
            "{}: no result after {} polls",
            self.service, self.settings.max_polls
        )))
    }

    /// The task id is echoed back exactly as issued: a string for some
    /// services, an integer for others.
    async fn create_task(&self, task: Value) -> Result<Value> {
        let body = self
            .call("createTask", json!({"clientKey": self.api_key, "task": task}))
            .await?;

        match json::path(&body, "taskId") {
            Some(id @ (Value::String(_) | Value::Number(_))) => Ok(id.clone()),
            _ => Err(ScrapeError::SolverFailed(format!(
                "{} failed to create task: {}",
                self.service,
                error_description(&body)
            ))),
        }
    }

    /// POST one protocol call; a non-zero `errorId` is a failure.
    async fn call(&self, method: &str, payload: Value) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.transport.post(&url, Body::Json(payload), &[]).await?;
        if !response.is_success() {
            return Err(ScrapeError::SolverFailed(format!(
                "{} {} returned HTTP {}",
                self.service, method, response.status
            )));
        }

        let body = response.json()?;
        if json::u64_at(&body, "errorId").unwrap_or(0) != 0 {
            return Err(ScrapeError::SolverFailed(format!(
                "{}: {}",
                self.service,
                error_description(&body)
            )));
        }
        Ok(body)
    }
}

fn error_description(body: &Value) -> String {
    json::string_at(body, "errorDescription")
        .or_else(|| json::string_at(body, "errorCode"))
        .unwrap_or_else(|| body.to_string())
}
