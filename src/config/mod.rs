use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::DEFAULT_API_URL;

/// Environment override for the backend base URL
pub const API_URL_ENV: &str = "MODELFORM_API_URL";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the prediction service
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { api_url: default_api_url() }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("modelform");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(&self.cleaned())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Normalized copy: no trailing slash, empty URL falls back to the default
    fn cleaned(&self) -> Self {
        let url = self.api_url.trim().trim_end_matches('/');
        Self {
            api_url: if url.is_empty() { default_api_url() } else { url.to_string() },
        }
    }

    /// Effective base URL: CLI flag, then environment, then this file
    pub fn resolve_api_url(&self, cli: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        pick_api_url(cli, env.as_deref(), &self.cleaned().api_url)
    }
}

fn pick_api_url(cli: Option<&str>, env: Option<&str>, file: &str) -> String {
    [cli, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(file)
        .trim_end_matches('/')
        .to_string()
}
