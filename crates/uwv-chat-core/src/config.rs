use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::backend::{BackendClient, DEFAULT_BASE_URL};
use crate::texts::Texts;

/// Environment variable that overrides the configured backend URL
pub const API_URL_ENV: &str = "UWV_CHAT_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: Option<String>,
    pub render_markdown: bool,
    pub maintenance: bool,
    pub request_timeout_secs: Option<u64>,
    pub texts: Texts,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: None,
            render_markdown: true,
            maintenance: false,
            request_timeout_secs: None,
            texts: Texts::default(),
        }
    }

    /// Load the user's config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Backend URL with precedence: explicit override, then the environment,
    /// then the file, then the built-in default.
    pub fn base_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        resolve_base_url(cli_override, env_value.as_deref(), self.base_url.as_deref())
    }

    pub fn build_client(&self, cli_override: Option<&str>) -> Result<BackendClient> {
        let base_url = self.base_url(cli_override);
        match self.request_timeout_secs {
            Some(secs) => Ok(BackendClient::with_timeout(
                &base_url,
                Duration::from_secs(secs),
            )?),
            None => Ok(BackendClient::new(&base_url)),
        }
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("uwv-chat").join("config.json"))
    }
}

fn resolve_base_url(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .to_string()
}
