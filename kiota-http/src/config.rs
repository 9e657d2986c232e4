//! Request adapter configuration.

use std::time::Duration;

use kiota_core::{Headers, KiotaError};
use url::Url;

/// Default timeout for a single HTTP exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("kiota-rust/", env!("CARGO_PKG_VERSION"));

/// Error returned when configuration validation fails.
#[derive(Debug, Clone)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for KiotaError {
    fn from(err: ConfigError) -> Self {
        KiotaError::Configuration(err.message)
    }
}

/// Settings for an [`HttpRequestAdapter`](crate::HttpRequestAdapter).
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: String,
    default_headers: Headers,
    backing_store: bool,
}

impl AdapterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::new()
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns the timeout for one HTTP exchange.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns headers sent with every request.
    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Returns whether decoded models track changes for partial updates.
    pub fn backing_store(&self) -> bool {
        self.backing_store
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: Headers::new(),
            backing_store: false,
        }
    }
}

/// Builder for [`AdapterConfig`].
#[derive(Debug, Clone, Default)]
pub struct AdapterConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: Headers,
    backing_store: Option<bool>,
}

impl AdapterConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL, e.g. `https://registry.example.com/apis/registry/v2`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the timeout for one HTTP exchange.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header value.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds a header sent with every request.
    pub fn default_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.default_headers.add(name, value);
        self
    }

    /// Enables change tracking on decoded models.
    pub fn backing_store(mut self, enabled: bool) -> Self {
        self.backing_store = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the base URL is not an absolute URL
    /// - the timeout is zero
    pub fn build(self) -> Result<AdapterConfig, ConfigError> {
        if let Some(url) = &self.base_url {
            Url::parse(url).map_err(|e| ConfigError::new(format!("invalid base url {url}: {e}")))?;
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::new("timeout must be greater than zero"));
        }

        Ok(AdapterConfig {
            base_url: self.base_url,
            timeout,
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            default_headers: self.default_headers,
            backing_store: self.backing_store.unwrap_or(false),
        })
    }
}

impl From<AdapterConfig> for AdapterConfigBuilder {
    fn from(config: AdapterConfig) -> Self {
        Self {
            base_url: config.base_url,
            timeout: Some(config.timeout),
            user_agent: Some(config.user_agent),
            default_headers: config.default_headers,
            backing_store: Some(config.backing_store),
        }
    }
}
