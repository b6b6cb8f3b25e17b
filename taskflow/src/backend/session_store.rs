//! Session persistence
//!
//! Keeps the signed-in session as JSON in the app data directory so a new
//! process can pick it up again.

use super::models::Session;
use crate::config;
use crate::error::{AppError, Result};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct SessionStore {
    session_path: PathBuf,
}

impl SessionStore {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            session_path: app_data_dir.join(config::SESSION_FILE),
        }
    }

    /// Load the stored session, if one was saved
    pub async fn load(&self) -> Result<Option<Session>> {
        if !self.session_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.session_path).await?;
        let session: Session = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse stored session: {}", e)))?;

        Ok(Some(session))
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.session_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.session_path, content).await?;
        tracing::debug!("Session saved to {:?}", self.session_path);

        Ok(())
    }

    /// Remove the stored session. A missing file is not an error.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.session_path).await {
            Ok(()) => {
                tracing::debug!("Stored session removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
