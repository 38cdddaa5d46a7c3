//! Challenge page parsing.

use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::{Result, ScrapeError};

static BLOB_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("code#securedDataExchange").expect("valid selector"));
static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[name]").expect("valid selector"));

const INSECURE_PASSWORD_MARKER: &str = "Please choose a more secure password.";

/// Hidden form fields echoed back to the verification endpoint.
pub const ECHOED_FIELDS: &[&str] = &[
    "captchaSiteKey",
    "challengeId",
    "challengeData",
    "challengeDetails",
    "challengeType",
    "challengeSource",
    "requestSubmissionId",
    "displayTime",
    "pageInstance",
    "failureRedirectUri",
    "signInLink",
    "joinNowLink",
];

/// Blob and form state scraped from a challenge page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePage {
    pub blob: String,
    fields: HashMap<String, String>,
}

impl ChallengePage {
    /// Parse the page, failing with [`ScrapeError::BlobNotFound`] when the
    /// blob is absent and [`ScrapeError::InsecurePassword`] when the page
    /// demands a password reset instead.
    pub fn parse(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);

        let blob = document
            .select(&BLOB_SELECTOR)
            .next()
            .map(|code| strip_comment(&code.inner_html()))
            .filter(|blob| !blob.is_empty());

        let Some(blob) = blob else {
            if html.contains(INSECURE_PASSWORD_MARKER) {
                return Err(ScrapeError::InsecurePassword);
            }
            return Err(ScrapeError::BlobNotFound);
        };

        let fields = document
            .select(&INPUT_SELECTOR)
            .filter_map(|input| {
                let name = input.value().attr("name")?;
                let value = input.value().attr("value").unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        Ok(Self { blob, fields })
    }

    /// Value of a hidden input, empty when missing.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Verification form: the echoed fields plus the solved token.
    pub fn verify_form(&self, csrf_token: &str, captcha_token: &str) -> Vec<(String, String)> {
        let mut form = vec![
            ("csrfToken".to_string(), csrf_token.to_string()),
            ("language".to_string(), "en-US".to_string()),
            (
                "captchaUserResponseToken".to_string(),
                captcha_token.to_string(),
            ),
        ];
        form.extend(
            ECHOED_FIELDS
                .iter()
                .map(|name| (name.to_string(), self.field(name).to_string())),
        );
        form.push(("_s".to_string(), "CONSUMER_LOGIN".to_string()));
        form
    }
}

/// The blob sits inside an HTML comment, optionally quoted.
fn strip_comment(inner: &str) -> String {
    let inner = inner.trim();
    let inner = inner.strip_prefix("<!--").unwrap_or(inner);
    let inner = inner.strip_suffix("-->").unwrap_or(inner);
    inner.trim().trim_matches('"').trim().to_string()
}
