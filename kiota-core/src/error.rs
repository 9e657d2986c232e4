//! Error types for serialization and request execution.

use std::any::Any;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::headers::Headers;
use crate::serialization::Parsable;

/// The main error type for client runtime operations.
#[derive(Debug, Error)]
pub enum KiotaError {
    /// A payload could not be decoded or encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A requested value type has no decoder or encoder.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// An operation was invoked on a node or writer in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A content type was missing, empty or not registered.
    #[error("content type error: {0}")]
    ContentType(String),

    /// The service answered with a failure status code.
    #[error(transparent)]
    Api(Box<ApiError>),

    /// The underlying HTTP exchange failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Credentials could not be obtained or applied.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Invalid settings.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A request URL could not be built from its template.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Malformed JSON text.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl KiotaError {
    /// Returns the service failure carried by this error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            KiotaError::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ApiError> for KiotaError {
    fn from(err: ApiError) -> Self {
        KiotaError::Api(Box::new(err))
    }
}

/// A specialized `Result` type for client runtime operations.
pub type Result<T> = std::result::Result<T, KiotaError>;

/// A decoded error payload returned by the service.
///
/// Any [`Parsable`] model that is `Debug + Send + Sync` can be carried as an
/// error body; [`ApiError::body_as`] recovers the concrete type.
pub trait ApiErrorBody: Parsable + fmt::Debug + Send + Sync + 'static {
    /// Returns `self` as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> ApiErrorBody for T
where
    T: Parsable + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A failure reported by the service through its response status code.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    message: String,
    status_code: u16,
    headers: Headers,
    body: Option<Box<dyn ApiErrorBody>>,
}

impl ApiError {
    /// Creates an error without a decoded body.
    pub fn new(message: impl Into<String>, status_code: u16, headers: Headers) -> Self {
        Self {
            message: message.into(),
            status_code,
            headers,
            body: None,
        }
    }

    /// Attaches the decoded error payload.
    pub fn with_body(mut self, body: Box<dyn ApiErrorBody>) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code of the failed response.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Returns the headers of the failed response.
    pub fn response_headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the decoded error payload, if one was mapped and present.
    pub fn body(&self) -> Option<&dyn ApiErrorBody> {
        self.body.as_deref()
    }

    /// Returns the decoded error payload as `T`.
    pub fn body_as<T: 'static>(&self) -> Option<&T> {
        self.body.as_ref()?.as_any().downcast_ref::<T>()
    }
}
