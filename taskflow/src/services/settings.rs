//! Settings service
//!
//! Manages client settings persistence using JSON file storage.

use crate::backend::Preferences;
use crate::config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Connection details for the hosted backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the backend project, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,
    /// Public (anonymous) api key
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    config::DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub backend: BackendSettings,
    /// Origin used to build auth redirect URLs
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default)]
    pub preferences: Preferences,
}

fn default_site_url() -> String {
    config::DEFAULT_SITE_URL.to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            site_url: default_site_url(),
            preferences: Preferences::default(),
        }
    }
}

impl ClientSettings {
    /// Where OAuth and confirmation emails send the user back to
    pub fn auth_redirect_url(&self) -> String {
        format!(
            "{}{}",
            self.site_url.trim_end_matches('/'),
            config::AUTH_CALLBACK_PATH
        )
    }
}

/// Service for managing client settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(app_data_dir: PathBuf) -> Self {
        Self {
            settings_path: app_data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<ClientSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = ClientSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: ClientSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &ClientSettings) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| AppError::Generic(format!("Failed to serialize settings: {}", e)))?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn get_backend(&self) -> Result<BackendSettings> {
        let settings = self.load().await?;
        Ok(settings.backend)
    }

    pub async fn update_backend(&self, backend: BackendSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.backend = backend;
        self.save(&settings).await?;
        Ok(())
    }

    /// Get display preferences (dark mode, notifications)
    pub async fn get_preferences(&self) -> Result<Preferences> {
        let settings = self.load().await?;
        Ok(settings.preferences)
    }

    pub async fn update_preferences(&self, preferences: Preferences) -> Result<()> {
        let mut settings = self.load().await?;
        settings.preferences = preferences;
        self.save(&settings).await?;
        Ok(())
    }
}
