//! Async HTTP runtime for generated API clients.
//!
//! Generated request builders describe a call as a [`RequestInformation`]
//! (method, URL template, parameters, headers, body and options). The
//! [`HttpRequestAdapter`] authenticates it, sends it through an
//! [`HttpTransport`], maps failure status codes to typed errors and decodes
//! the body with the codecs from [`kiota_core`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kiota_http::{AdapterConfig, AnonymousAuthenticationProvider, HttpMethod, HttpRequestAdapter, RequestInformation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AdapterConfig::builder()
//!         .base_url("http://localhost:8080/apis/registry/v2")
//!         .build()?;
//!     let adapter = HttpRequestAdapter::from_config(&config, AnonymousAuthenticationProvider)?;
//!
//!     let request = RequestInformation::new(HttpMethod::Get, "{+baseurl}/system/info")
//!         .header("Accept", "application/json");
//!     let name = adapter.send_primitive::<String>(request, None).await?;
//!     println!("{name:?}");
//!     Ok(())
//! }
//! ```
//!
//! # Status Codes
//!
//! | Response | Result |
//! |----------|--------|
//! | 204 | `Ok(None)` from every `send_*` method |
//! | other 2xx | decoded body, or `Ok(None)` without body or content type |
//! | mapped failure | [`ApiError`](kiota_core::ApiError) carrying the decoded error body |
//! | unmapped failure | [`ApiError`](kiota_core::ApiError) with status code and headers only |
//!
//! Error bodies are mapped through [`ErrorMappings`], keyed by exact status
//! code or by `"4XX"` / `"5XX"`.
//!
//! # Configuration
//!
//! [`AdapterConfig`] is built programmatically, from environment variables
//! with [`AdapterConfig::from_env`], or from a TOML file with
//! `AdapterConfig::from_toml` (requires the `config-file` feature).

#![warn(missing_docs)]

pub mod adapter;
pub mod auth;
pub mod config;
pub mod config_file;
pub mod error_mappings;
pub mod options;
pub mod request_information;
pub mod transport;
mod uri_template;

pub use adapter::HttpRequestAdapter;
pub use auth::{
    AccessTokenProvider, AllowedHostsValidator, AnonymousAuthenticationProvider,
    AuthenticationContext, AuthenticationProvider, BaseBearerTokenAuthenticationProvider,
    RefreshTokenAccessTokenProvider,
};
pub use config::{AdapterConfig, AdapterConfigBuilder, ConfigError};
pub use config_file::FileConfig;
pub use error_mappings::{ErrorFactory, ErrorMappings};
pub use kiota_core as core;
pub use options::{RequestOption, ResponseHandler, ResponseHandlerOption};
pub use request_information::{HttpMethod, ParameterValue, RequestInformation};
pub use transport::{HttpResponse, HttpTransport, NativeRequest, ReqwestTransport};
