use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::task::TaskApi;
use super::{CaptchaSolver, PollSettings, CHALLENGE_PAGE_URL, CHALLENGE_PUBLIC_KEY};
use crate::client::Transport;
use crate::error::Result;

const API_URL: &str = "https://api.capsolver.com";

/// <https://www.capsolver.com/>
pub struct CapSolver {
    api_key: String,
    transport: Arc<dyn Transport>,
    settings: PollSettings,
}

impl CapSolver {
    pub fn new(api_key: String, transport: Arc<dyn Transport>, settings: PollSettings) -> Self {
        Self {
            api_key,
            transport,
            settings,
        }
    }
}

#[async_trait]
impl CaptchaSolver for CapSolver {
    fn name(&self) -> &'static str {
        "CapSolver"
    }

    async fn solve(&self, blob: &str, _page_url: &str) -> Result<String> {
        let data = if blob.is_empty() {
            String::new()
        } else {
            json!({"blob": blob}).to_string()
        };
        let task = json!({
            "type": "FunCaptchaTaskProxyLess",
            "websitePublicKey": CHALLENGE_PUBLIC_KEY,
            "websiteURL": CHALLENGE_PAGE_URL,
            "data": data,
        });

        TaskApi {
            service: self.name(),
            base_url: API_URL,
            api_key: &self.api_key,
            transport: self.transport.as_ref(),
            settings: self.settings,
        }
        .solve(task)
        .await
    }
}
