use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

pub const DEFAULT_API_URL: &str = "https://ifinance-p4vg.onrender.com";
pub const API_URL_ENV: &str = "LEDGERDESK_API_URL";
/// Overrides the config directory; used by tests and portable installs.
pub const CONFIG_DIR_ENV: &str = "LEDGERDESK_CONFIG_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_url(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Resolve the API origin: explicit flag, then environment, then file.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        let url = flag
            .map(str::to_string)
            .or(env.filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| self.api_base_url.clone());
        url.trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ledgerdesk")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn session_path() -> PathBuf {
    config_dir().join("session.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LedgerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn validate_api_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|e| LedgerError::Settings(format!("invalid API URL {trimmed:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(LedgerError::Settings(format!(
            "unsupported URL scheme: {other}"
        ))),
    }
}
