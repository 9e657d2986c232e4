//! The HTTP exchange beneath the request adapter.
//!
//! [`HttpTransport`] is the seam between the adapter and the network. The
//! production implementation is [`ReqwestTransport`]; tests substitute
//! their own.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use kiota_core::{Headers, KiotaError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;
use url::Url;

use crate::config::AdapterConfig;
use crate::options::RequestOption;
use crate::request_information::HttpMethod;

/// A fully built request, ready for the transport.
#[derive(Debug, Clone)]
pub struct NativeRequest {
    method: HttpMethod,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
    options: Vec<Arc<dyn RequestOption>>,
}

impl NativeRequest {
    /// Creates a request; an empty body counts as no body.
    pub fn new(method: HttpMethod, url: Url, headers: Headers, body: Option<Bytes>) -> Self {
        Self {
            method,
            url,
            headers,
            body: body.filter(|b| !b.is_empty()),
            options: Vec::new(),
        }
    }

    /// Attaches request options for the transport.
    pub fn with_options(mut self, options: Vec<Arc<dyn RequestOption>>) -> Self {
        self.options = options;
        self
    }

    /// Returns the method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the request options.
    pub fn options(&self) -> &[Arc<dyn RequestOption>] {
        &self.options
    }
}

/// A fully read response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status: u16,
    headers: Headers,
    body: Option<Bytes>,
}

impl HttpResponse {
    /// Creates a response; an empty body counts as no body.
    pub fn new(status: u16, headers: Headers, body: Option<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.filter(|b| !b.is_empty()),
        }
    }

    /// Returns the status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns `true` for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the body.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Takes the body out of the response.
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// Returns the media type of the `Content-Type` header without parameters.
    pub fn content_type(&self) -> Option<&str> {
        let raw = self.headers.first("content-type")?;
        let media = raw.split(';').next().unwrap_or(raw).trim();
        (!media.is_empty()).then_some(media)
    }
}

/// Sends native requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and reads the whole response.
    ///
    /// Network failures are [`KiotaError::Transport`]; a failure status is
    /// still a successful exchange.
    async fn send(&self, request: NativeRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn send(&self, request: NativeRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}

/// [`HttpTransport`] backed by a `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Wraps an existing client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the adapter configuration.
    pub fn from_config(config: &AdapterConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        for (name, values) in config.default_headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| KiotaError::Configuration(format!("invalid header name {name}: {e}")))?;
            for value in values {
                let value = HeaderValue::from_str(value).map_err(|e| {
                    KiotaError::Configuration(format!("invalid value for header {name}: {e}"))
                })?;
                default_headers.append(name.clone(), value);
            }
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent())
            .default_headers(default_headers)
            .build()
            .map_err(|e| KiotaError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Builds a client with only a request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KiotaError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: NativeRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| KiotaError::Transport(format!("invalid method: {e}")))?;
        let mut builder = self.client.request(method, request.url.clone());
        for (name, values) in &request.headers {
            for value in values {
                builder = builder.header(name, value.as_str());
            }
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KiotaError::Transport(format!("request to {} failed: {e}", request.url)))?;

        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            match value.to_str() {
                Ok(value) => headers.add(name.as_str(), value),
                Err(_) => debug!(header = %name, "skipping non-text response header"),
            }
        }

        // The body is drained in every branch so the connection can be reused.
        let body = response
            .bytes()
            .await
            .map_err(|e| KiotaError::Transport(format!("failed to read response body: {e}")))?;
        debug!(status, len = body.len(), "received response");

        Ok(HttpResponse::new(status, headers, Some(body)))
    }
}
