//! Credential login, challenge solving and session verification.

mod browser;
mod challenge;

#[cfg(feature = "browser")]
pub use browser::BrowserLogin;
pub use browser::{BrowserLoginOptions, CredentialSource, AUTH_COOKIE};
pub use challenge::{ChallengePage, ECHOED_FIELDS};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::user_agent::login_headers;
use crate::client::{Body, Transport};
use crate::error::{Result, ScrapeError};
use crate::session::{Session, SessionStore, CSRF_COOKIE};
use crate::solver::CaptchaSolver;

pub const AUTH_URL: &str = "https://www.linkedin.com/uas/authenticate";
pub const VERIFY_URL: &str = "https://www.linkedin.com/checkpoint/challenge/verify";
/// Lightweight authenticated request used as a liveness check.
pub const PROBE_URL: &str =
    "https://www.linkedin.com/voyager/api/organization/companies?q=universalName&universalName=amazon";

/// Full login retries when the challenge blob is missing.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Builds a transport seeded with a session's cookies and headers.
pub type Connector = Arc<dyn Fn(&Session) -> Result<Arc<dyn Transport>> + Send + Sync>;

/// Login progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    CredentialSubmitted,
    ChallengeIssued,
    ChallengeSolved,
    Authenticated,
    Verified,
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Drives one account from no session to a verified one.
pub struct Authenticator {
    connect: Connector,
    solver: Option<Arc<dyn CaptchaSolver>>,
    user_agent: String,
    max_attempts: u32,
    state: AuthState,
}

impl Authenticator {
    pub fn new(connect: Connector, user_agent: impl Into<String>) -> Self {
        Self {
            connect,
            solver: None,
            user_agent: user_agent.into(),
            max_attempts: MAX_LOGIN_ATTEMPTS,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn with_solver(mut self, solver: Arc<dyn CaptchaSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Reuse the stored session if present, otherwise log in with the
    /// credentials or the browser source, then verify and persist.
    pub async fn authenticate(
        &mut self,
        store: Option<&SessionStore>,
        credentials: Option<&Credentials>,
        browser: Option<&dyn CredentialSource>,
    ) -> Result<Session> {
        if let Some(mut session) = store.and_then(SessionStore::load) {
            info!("Using saved session");
            if !session.is_stamped() {
                session.stamp_headers(&self.user_agent)?;
            }
            self.state = AuthState::Authenticated;
            self.verify(&session).await?;
            return Ok(session);
        }

        let session = match (credentials, browser) {
            (Some(credentials), _) => self.login(credentials).await?,
            (None, Some(source)) => {
                info!("No credentials supplied, using browser login");
                let mut session = Session::new(source.acquire().await?);
                session.stamp_headers(&self.user_agent)?;
                self.state = AuthState::Authenticated;
                session
            }
            (None, None) => {
                return Err(ScrapeError::Browser(
                    "no credentials and no browser login available".to_string(),
                ))
            }
        };

        self.verify(&session).await?;

        if let Some(store) = store {
            store.save(&session)?;
        }
        Ok(session)
    }

    /// Password login, retried from scratch while the challenge blob is missing.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Session> {
        let mut attempt = 1;
        loop {
            match self.login_once(credentials).await {
                Err(ScrapeError::BlobNotFound) if attempt < self.max_attempts => {
                    warn!(
                        "Captcha blob missing, retrying login ({}/{})",
                        attempt, self.max_attempts
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn login_once(&mut self, credentials: &Credentials) -> Result<Session> {
        self.state = AuthState::Unauthenticated;

        let mut seed = Session::default();
        seed.headers.extend(login_headers());
        let transport = (self.connect)(&seed)?;

        let response = transport.get(AUTH_URL, &[]).await?;
        if !response.is_success() {
            return Err(ScrapeError::UnexpectedResponse(format!(
                "failed to begin auth process: HTTP {} {}",
                response.status,
                response.snippet()
            )));
        }

        let csrf = transport
            .cookie(CSRF_COOKIE)
            .map(|v| v.trim_matches('"').to_string())
            .ok_or(ScrapeError::MissingCsrf)?;

        let login_form = vec![
            ("session_key".to_string(), credentials.username.clone()),
            ("session_password".to_string(), credentials.password.clone()),
            ("JSESSIONID".to_string(), format!("\"{}\"", csrf)),
        ];
        let response = transport
            .post(AUTH_URL, Body::Form(login_form.clone()), &[])
            .await?;
        self.state = AuthState::CredentialSubmitted;

        if response.is_rate_limited() {
            return Err(ScrapeError::RateLimited);
        }
        let data = response.json()?;
        let login_result = data
            .get("login_result")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        debug!("Login result: {}", login_result);

        match login_result {
            "BAD_USERNAME_OR_PASSWORD" => return Err(ScrapeError::BadCredentials),
            "CHALLENGE" => {
                self.state = AuthState::ChallengeIssued;
                let challenge_url = data
                    .get("challenge_url")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ScrapeError::UnexpectedResponse("challenge without challenge_url".into())
                    })?;
                self.solve_challenge(transport.as_ref(), challenge_url, login_form, &csrf)
                    .await?;
                self.state = AuthState::ChallengeSolved;
            }
            _ => {}
        }

        let mut session = Session::new(transport.cookies());
        session.stamp_headers(&self.user_agent)?;
        self.state = AuthState::Authenticated;
        info!("Logged in as {}", credentials.username);
        Ok(session)
    }

    async fn solve_challenge(
        &self,
        transport: &dyn Transport,
        challenge_url: &str,
        login_form: Vec<(String, String)>,
        csrf: &str,
    ) -> Result<()> {
        let response = transport
            .post(challenge_url, Body::Form(login_form), &[])
            .await?;

        info!("Searching for captcha blob to begin captcha solving");
        let page = ChallengePage::parse(&response.body)?;
        debug!("Extracted captcha blob ({} bytes)", page.blob.len());

        let solver = self.solver.as_ref().ok_or(ScrapeError::SolverUnavailable)?;
        let token = solver.solve(&page.blob, challenge_url).await?;

        let response = transport
            .post(VERIFY_URL, Body::Form(page.verify_form(csrf, &token)), &[])
            .await?;
        if !response.is_success() {
            warn!("Captcha verification failed: {}", response.snippet());
            return Err(ScrapeError::ChallengeRejected {
                status: response.status,
            });
        }
        Ok(())
    }

    /// Issue the liveness probe; anything but 200 rejects the session.
    pub async fn verify(&mut self, session: &Session) -> Result<()> {
        info!("Testing if logged in by checking an arbitrary company page");
        let transport = (self.connect)(session)?;
        let response = transport.get(PROBE_URL, &[]).await?;
        if response.status != 200 {
            warn!("Liveness probe returned HTTP {}", response.status);
            return Err(ScrapeError::SessionRejected {
                status: response.status,
            });
        }
        self.state = AuthState::Verified;
        Ok(())
    }
}
