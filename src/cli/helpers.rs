//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use console::style;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use staffscout::auth::{Authenticator, Connector, CredentialSource};
use staffscout::client::user_agent::resolve_user_agent;
use staffscout::client::{HttpClient, Transport};
use staffscout::config::Config;
use staffscout::export::{self, OutputFormat};
use staffscout::scraper::{ScrapeOutcome, StaffScraper};
use staffscout::session::{Session, SessionStore};
use staffscout::solver::build_solver;

use super::commands::OutputArgs;
use super::progress;

/// Settings resolved once per invocation: file, then environment, then flags.
pub struct Context {
    pub config: Config,
    session_file: Option<PathBuf>,
}

impl Context {
    pub async fn load(config_path: Option<&Path>, session_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => Config::load_from_path(path)
                .await
                .map_err(anyhow::Error::msg)?
                .with_env_overrides(),
            None => Config::load().await,
        };
        Ok(Self {
            config,
            session_file,
        })
    }

    pub fn session_store(&self) -> SessionStore {
        match &self.session_file {
            Some(path) => SessionStore::new(path),
            None => SessionStore::new(self.config.session_path()),
        }
    }

    fn connector(&self) -> Connector {
        let options = self.config.client_options();
        Arc::new(move |session: &Session| -> staffscout::Result<Arc<dyn Transport>> {
            Ok(Arc::new(HttpClient::new(session, options)?))
        })
    }

    /// Reuse the saved session or log in, then verify it.
    pub async fn authenticate(&self) -> anyhow::Result<Session> {
        let user_agent = resolve_user_agent(self.config.user_agent.as_deref());
        let mut authenticator = Authenticator::new(self.connector(), user_agent);

        if let Some(api_key) = &self.config.solver.api_key {
            let transport: Arc<dyn Transport> = Arc::new(HttpClient::new(
                &Session::default(),
                self.config.client_options(),
            )?);
            authenticator = authenticator.with_solver(build_solver(
                self.config.solver.service,
                api_key.clone(),
                transport,
                self.config.solver.poll_settings(),
            ));
        }

        #[cfg(feature = "browser")]
        let browser = staffscout::auth::BrowserLogin::new(self.config.browser_options());
        #[cfg(feature = "browser")]
        let source: Option<&dyn CredentialSource> = Some(&browser);
        #[cfg(not(feature = "browser"))]
        let source: Option<&dyn CredentialSource> = None;

        let store = self.session_store();
        let credentials = self.config.credentials();
        let session = authenticator
            .authenticate(Some(&store), credentials.as_ref(), source)
            .await
            .context("Authentication failed")?;
        Ok(session)
    }

    /// Authenticate and build a scraper whose events drive a progress display.
    pub async fn scraper(&self) -> anyhow::Result<(StaffScraper, JoinHandle<()>)> {
        let session = self.authenticate().await?;
        let transport = HttpClient::new(&session, self.config.client_options())?;
        let (tx, rx) = mpsc::channel(100);
        let scraper = StaffScraper::new(Arc::new(transport))
            .with_options(self.config.scraper_options())
            .with_events(tx);
        Ok((scraper, progress::spawn(rx)))
    }
}

/// Wait for the progress display to drain once the scraper is gone.
pub async fn finish_progress(scraper: StaffScraper, handle: JoinHandle<()>) {
    drop(scraper);
    let _ = handle.await;
}

/// Report how a run ended. Goes to stderr since rows may be on stdout.
pub fn report_outcome<T>(outcome: &ScrapeOutcome<T>, noun: &str) {
    match &outcome.halted {
        Some(e) => eprintln!(
            "{} Stopped early ({}); keeping {} {}",
            style("!").yellow(),
            e,
            outcome.items.len(),
            noun
        ),
        None => eprintln!("{} Collected {} {}", style("✓").green(), outcome.items.len(), noun),
    }
}

/// Write rows to the requested file, or stdout.
pub fn write_output<T: Serialize>(rows: &[T], output: &OutputArgs) -> anyhow::Result<()> {
    match output.output() {
        Some(path) => {
            let format = output.format().unwrap_or_else(|| OutputFormat::from_path(path));
            export::write_file(path, format, rows)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} rows to {}",
                style("✓").green(),
                rows.len(),
                path.display()
            );
        }
        None => {
            let format = output.format().unwrap_or_default();
            export::write_rows(std::io::stdout().lock(), format, rows)?;
        }
    }
    Ok(())
}
