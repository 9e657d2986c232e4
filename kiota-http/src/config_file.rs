//! Declarative configuration loading from TOML and environment variables.
//!
//! [`FileConfig`] mirrors [`AdapterConfig`](crate::config::AdapterConfig)
//! with serde-friendly types and converts into it through the builder.
//!
//! # Supported Formats
//!
//! - **TOML** (requires `config-file` feature): `AdapterConfig::from_toml("client.toml")`
//! - **Environment Variables** (always available): `AdapterConfig::from_env()`
//!
//! # Example TOML
//!
//! ```toml
//! base-url = "https://registry.example.com/apis/registry/v2"
//! timeout-ms = 30000
//! user-agent = "registry-cli/1.0"
//! backing-store = true
//!
//! [default-headers]
//! x-tenant = "acme"
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{AdapterConfig, AdapterConfigBuilder, ConfigError};

/// File-based adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileConfig {
    /// Base URL requests are resolved against.
    pub base_url: Option<String>,
    /// Timeout for one HTTP exchange in milliseconds.
    pub timeout_ms: Option<u64>,
    /// `User-Agent` header value.
    pub user_agent: Option<String>,
    /// Headers sent with every request.
    pub default_headers: Option<BTreeMap<String, String>>,
    /// Whether decoded models track changes.
    pub backing_store: Option<bool>,
}

impl TryFrom<FileConfig> for AdapterConfig {
    type Error = ConfigError;

    fn try_from(file: FileConfig) -> Result<Self, Self::Error> {
        let mut builder = AdapterConfigBuilder::new();

        if let Some(url) = file.base_url {
            builder = builder.base_url(url);
        }

        if let Some(ms) = file.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        if let Some(agent) = file.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = file.default_headers {
            for (name, value) in headers {
                builder = builder.default_header(&name, value);
            }
        }

        if let Some(enabled) = file.backing_store {
            builder = builder.backing_store(enabled);
        }

        builder.build()
    }
}

impl AdapterConfig {
    /// Loads configuration from a TOML file.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("failed to read TOML config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file_config: FileConfig = toml_crate::from_str(content)
            .map_err(|e| ConfigError::new(format!("failed to parse TOML config: {e}")))?;
        file_config.try_into()
    }

    /// Loads configuration from environment variables.
    ///
    /// This method is always available (no feature flag required).
    ///
    /// # Supported Environment Variables
    ///
    /// | Variable | Maps to |
    /// |----------|---------|
    /// | `KIOTA_BASE_URL` | `base_url` |
    /// | `KIOTA_TIMEOUT_MS` | Timeout in milliseconds |
    /// | `KIOTA_USER_AGENT` | `user_agent` |
    /// | `KIOTA_BACKING_STORE` | `"true"` or `"false"` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut file_config = FileConfig::default();

        if let Ok(val) = std::env::var("KIOTA_BASE_URL") {
            file_config.base_url = Some(val);
        }

        if let Ok(val) = std::env::var("KIOTA_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                file_config.timeout_ms = Some(ms);
            }
        }

        if let Ok(val) = std::env::var("KIOTA_USER_AGENT") {
            file_config.user_agent = Some(val);
        }

        if let Ok(val) = std::env::var("KIOTA_BACKING_STORE") {
            file_config.backing_store = Some(val.eq_ignore_ascii_case("true"));
        }

        file_config.try_into()
    }
}
