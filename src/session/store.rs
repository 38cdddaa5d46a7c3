//! Session persistence as a JSON file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Session;
use crate::error::Result;

/// Reads and writes a [`Session`] at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session. A missing file is not an error.
    ///
    /// Unreadable or corrupt files are logged and treated as absent so the
    /// caller falls through to a fresh login.
    pub fn load(&self) -> Option<Session> {
        if !self.path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read session file {:?}: {}", self.path, e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => {
                debug!(
                    "Loaded session with {} cookies from {:?}",
                    session.cookies.len(),
                    self.path
                );
                Some(session)
            }
            Err(e) => {
                warn!("Ignoring corrupt session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Write the session, creating parent directories as needed.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, content)?;
        debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Delete the saved session, if any.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
