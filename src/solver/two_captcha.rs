use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::task::TaskApi;
use super::{CaptchaSolver, PollSettings, CHALLENGE_PAGE_URL, CHALLENGE_PUBLIC_KEY};
use crate::client::Transport;
use crate::error::Result;

const API_URL: &str = "https://api.2captcha.com";

/// <https://2captcha.com/>
pub struct TwoCaptcha {
    api_key: String,
    transport: Arc<dyn Transport>,
    settings: PollSettings,
}

impl TwoCaptcha {
    pub fn new(api_key: String, transport: Arc<dyn Transport>, settings: PollSettings) -> Self {
        Self {
            api_key,
            transport,
            settings,
        }
    }
}

#[async_trait]
impl CaptchaSolver for TwoCaptcha {
    fn name(&self) -> &'static str {
        "2Captcha"
    }

    async fn solve(&self, blob: &str, page_url: &str) -> Result<String> {
        let task = json!({
            "type": "FunCaptchaTaskProxyless",
            "websiteURL": page_url,
            "websitePublicKey": CHALLENGE_PUBLIC_KEY,
            "funcaptchaApiJSSubdomain": CHALLENGE_PAGE_URL,
            "data": json!({"blob": blob}).to_string(),
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
