use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub anthropic_api_key: Option<String>,

    #[serde(default = "default_model")]
    pub annotation_model: String,

    #[serde(default = "default_listing_base_url")]
    pub listing_base_url: String,

    #[serde(default = "default_listing_path")]
    pub listing_path: String,

    #[serde(default = "default_source_name")]
    pub source_name: String,

    #[serde(default = "default_pages")]
    pub pages: u32,

    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    #[serde(default = "default_annotate_retries")]
    pub annotate_retries: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("semi-weekly");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("articles.db").to_string_lossy().to_string()
}

fn default_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_listing_base_url() -> String {
    "https://www.eet-china.com".to_string()
}

fn default_listing_path() -> String {
    "/news/".to_string()
}

fn default_source_name() -> String {
    "EET-China".to_string()
}

fn default_pages() -> u32 {
    1
}

fn default_batch_limit() -> usize {
    20
}

fn default_annotate_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            anthropic_api_key: None,
            annotation_model: default_model(),
            listing_base_url: default_listing_base_url(),
            listing_path: default_listing_path(),
            source_name: default_source_name(),
            pages: default_pages(),
            batch_limit: default_batch_limit(),
            annotate_retries: default_annotate_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("semi-weekly")
            .join("config.toml")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
