//! Interactive browser login.
//!
//! A human completes the login (and any challenge) in a real browser
//! window; the resulting cookies seed a regular HTTP session.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::SessionCookie;

/// Cookie present only once a login has completed.
pub const AUTH_COOKIE: &str = "li_at";

/// Something that yields logged-in cookies without the password flow.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> Result<Vec<SessionCookie>>;
}

/// Browser login settings.
#[derive(Debug, Clone)]
pub struct BrowserLoginOptions {
    pub chrome_path: Option<std::path::PathBuf>,
    pub login_url: String,
    /// How long to wait for the user to finish logging in.
    pub wait: std::time::Duration,
}

impl Default for BrowserLoginOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            login_url: "https://www.linkedin.com/login".to_string(),
            wait: std::time::Duration::from_secs(300),
        }
    }
}

#[cfg(feature = "browser")]
pub use enabled::BrowserLogin;

#[cfg(feature = "browser")]
mod enabled {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use chromiumoxide::{Browser, BrowserConfig};
    use futures::StreamExt;
    use tracing::{debug, info, warn};

    use super::{BrowserLoginOptions, CredentialSource, AUTH_COOKIE};
    use crate::error::{Result, ScrapeError};
    use crate::session::SessionCookie;

    const CHROME_PATHS: &[&str] = &[
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/opt/google/chrome/google-chrome",
    ];

    /// Headful Chrome driven over CDP.
    pub struct BrowserLogin {
        options: BrowserLoginOptions,
    }

    impl BrowserLogin {
        pub fn new(options: BrowserLoginOptions) -> Self {
            Self { options }
        }

        fn find_chrome(&self) -> Result<PathBuf> {
            if let Some(path) = &self.options.chrome_path {
                return Ok(path.clone());
            }
            CHROME_PATHS
                .iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or_else(|| {
                    ScrapeError::Browser(
                        "Chrome/Chromium not found; set browser.chrome_path".to_string(),
                    )
                })
        }
    }

    #[async_trait]
    impl CredentialSource for BrowserLogin {
        async fn acquire(&self) -> Result<Vec<SessionCookie>> {
            let chrome = self.find_chrome()?;
            info!("Launching browser for interactive login ({:?})", chrome);

            let config = BrowserConfig::builder()
                .chrome_executable(chrome)
                .with_head()
                .arg("--no-first-run")
                .arg("--no-default-browser-check")
                .build()
                .map_err(ScrapeError::Browser)?;

            let (mut browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| ScrapeError::Browser(e.to_string()))?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let result = async {
                browser
                    .new_page(self.options.login_url.as_str())
                    .await
                    .map_err(|e| ScrapeError::Browser(e.to_string()))?;

                info!("Log in using the browser window; waiting for the session cookie");
                let deadline = Instant::now() + self.options.wait;
                loop {
                    let cookies = browser
                        .get_cookies()
                        .await
                        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

                    if cookies.iter().any(|c| c.name == AUTH_COOKIE) {
                        debug!("Collected {} browser cookies", cookies.len());
                        return Ok(cookies
                            .into_iter()
                            .filter(|c| c.domain.ends_with("linkedin.com"))
                            .map(|c| SessionCookie {
                                name: c.name,
                                value: c.value,
                                domain: c.domain,
                                path: c.path,
                            })
                            .collect());
                    }

                    if Instant::now() >= deadline {
                        return Err(ScrapeError::Browser(
                            "timed out waiting for login".to_string(),
                        ));
                    }
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
            .await;

            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            handle.abort();
            result
        }
    }
}
