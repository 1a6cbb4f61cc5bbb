//! Client configuration loading
//!
//! Config precedence: env vars > config file > defaults. The base URL must
//! be present before any request goes out — an unset base URL fails the
//! request with a configuration error rather than producing a malformed URL.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::codes;

/// Root configuration file shape.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
}

/// Backend API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the bill-tracking backend, e.g. `https://bills.example.com`
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    codes::DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Build a config programmatically from a base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file, then overlay environment
    /// variables (`BILL_API_BASE_URL`).
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = toml::from_str(&contents)?;

        if let Ok(base_url) = std::env::var("BILL_API_BASE_URL") {
            config.api.base_url = base_url;
        }

        // Validate base_url is a URL with an http(s) scheme
        if !config.api.base_url.starts_with("http://")
            && !config.api.base_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "base_url must start with http:// or https://, got: {}",
                config.api.base_url
            )));
        }

        // Validate timeout_secs is non-zero
        if config.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(config)
    }

    /// Resolve the config file path from an explicit argument or the
    /// `BILL_CLIENT_CONFIG` env var.
    pub fn resolve_path(explicit: Option<&str>) -> PathBuf {
        if let Some(p) = explicit {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("BILL_CLIENT_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("bill-client.toml")
    }
}
