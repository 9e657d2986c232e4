//! The request adapter: sends request descriptions and decodes responses.
//!
//! Every `send_*` method follows the same path: authenticate, send, classify
//! the status code, then either return `None` (204), decode the body, or
//! fail with an [`ApiError`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use kiota_core::serialization::stream_value;
use kiota_core::{
    ApiError, ContentCodecRegistry, KiotaError, Parsable, ParseNode, Primitive, PrimitiveKind,
    Result, ValuedEnum,
};
use tracing::{debug, warn};

use crate::auth::{AuthenticationContext, AuthenticationProvider};
use crate::config::AdapterConfig;
use crate::error_mappings::ErrorMappings;
use crate::options::find_response_handler;
use crate::request_information::{RequestInformation, BASE_URL_KEY};
use crate::transport::{HttpResponse, HttpTransport, NativeRequest, ReqwestTransport};

const NO_CONTENT: u16 = 204;

enum Outcome {
    Handled(Option<Box<dyn Any + Send>>),
    Response(HttpResponse),
}

/// Executes requests built by generated clients.
///
/// The adapter is configured once and then shared, typically behind an
/// `Arc`; sending takes `&self`.
pub struct HttpRequestAdapter {
    transport: Arc<dyn HttpTransport>,
    auth: Arc<dyn AuthenticationProvider>,
    registry: Arc<ContentCodecRegistry>,
    base_url: String,
}

impl HttpRequestAdapter {
    /// Creates an adapter with the default codec registry.
    pub fn new(
        auth: impl AuthenticationProvider + 'static,
        transport: impl HttpTransport + 'static,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            auth: Arc::new(auth),
            registry: Arc::new(ContentCodecRegistry::with_defaults()),
            base_url: String::new(),
        }
    }

    /// Creates an adapter backed by `reqwest` from `config`.
    pub fn from_config(
        config: &AdapterConfig,
        auth: impl AuthenticationProvider + 'static,
    ) -> Result<Self> {
        let mut adapter = Self::new(auth, ReqwestTransport::from_config(config)?);
        if let Some(url) = config.base_url() {
            adapter.set_base_url(url);
        }
        if config.backing_store() {
            adapter.enable_backing_store();
        }
        Ok(adapter)
    }

    /// Replaces the codec registry.
    pub fn with_registry(mut self, registry: impl Into<Arc<ContentCodecRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    /// Returns the base URL substituted for `{+baseurl}`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets the base URL substituted for `{+baseurl}`.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    /// Returns the codec registry used for request and response bodies.
    pub fn registry(&self) -> &ContentCodecRegistry {
        &self.registry
    }

    /// Switches to a registry whose codecs track backing store changes.
    pub fn enable_backing_store(&mut self) {
        self.registry = Arc::new(self.registry.with_backing_store());
    }

    /// Resolves the URL, authenticates and builds the transport request.
    pub async fn convert_to_native_request(
        &self,
        mut request: RequestInformation,
    ) -> Result<NativeRequest> {
        request.set_path_parameter(BASE_URL_KEY, self.base_url.as_str());
        self.auth
            .authenticate_request(&mut request, &AuthenticationContext::new())
            .await?;
        let url = request.uri()?;
        let (method, headers, body, options) = request.into_parts();
        Ok(NativeRequest::new(method, url, headers, body).with_options(options))
    }

    /// Sends a request and decodes a model.
    pub async fn send<T, F>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
        factory: F,
    ) -> Result<Option<T>>
    where
        T: Parsable + 'static,
        F: FnOnce(&dyn ParseNode) -> Result<T>,
    {
        self.send_with(request, error_mappings, |adapter, response| {
            match adapter.root_parse_node(&response)? {
                Some(root) => root.get_object_value(factory).map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// Sends a request and decodes an array of models.
    pub async fn send_collection<T, F>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
        factory: F,
    ) -> Result<Option<Vec<T>>>
    where
        T: Parsable + 'static,
        F: Fn(&dyn ParseNode) -> Result<T>,
    {
        self.send_with(request, error_mappings, |adapter, response| {
            match adapter.root_parse_node(&response)? {
                Some(root) => root.get_collection_of_object_values(factory),
                None => Ok(None),
            }
        })
        .await
    }

    /// Sends a request and decodes a scalar.
    ///
    /// `()` discards the body and [`bytes::Bytes`] returns it undecoded.
    pub async fn send_primitive<T>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Option<T>>
    where
        T: Primitive + 'static,
    {
        if T::KIND == PrimitiveKind::Void {
            self.send_no_content(request, error_mappings).await?;
            return Ok(None);
        }
        self.send_with(request, error_mappings, |adapter, mut response| match T::KIND {
            PrimitiveKind::Stream => Ok(response
                .take_body()
                .and_then(|body| T::from_primitive(stream_value(body)))),
            _ => match adapter.root_parse_node(&response)? {
                Some(root) => root.get_primitive::<T>(),
                None => Ok(None),
            },
        })
        .await
    }

    /// Sends a request and decodes an array of scalars.
    pub async fn send_primitive_collection<T>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Option<Vec<Option<T>>>>
    where
        T: Primitive + 'static,
    {
        self.send_with(request, error_mappings, |adapter, response| {
            match adapter.root_parse_node(&response)? {
                Some(root) => root.get_collection_of_primitives::<T>(),
                None => Ok(None),
            }
        })
        .await
    }

    /// Sends a request and decodes an enum member.
    pub async fn send_enum<E>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Option<E>>
    where
        E: ValuedEnum + 'static,
    {
        self.send_with(request, error_mappings, |adapter, response| {
            Ok(adapter
                .root_parse_node(&response)?
                .and_then(|root| root.get_enum_value::<E>()))
        })
        .await
    }

    /// Sends a request and decodes an array of enum members.
    pub async fn send_enum_collection<E>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Option<Vec<Option<E>>>>
    where
        E: ValuedEnum + 'static,
    {
        self.send_with(request, error_mappings, |adapter, response| {
            match adapter.root_parse_node(&response)? {
                Some(root) => root.get_collection_of_enum_values::<E>(),
                None => Ok(None),
            }
        })
        .await
    }

    /// Sends a request whose response body is ignored.
    ///
    /// A value returned by a response handler option is dropped as well.
    pub async fn send_no_content(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<()> {
        match self.execute(request, error_mappings).await? {
            Outcome::Handled(Some(_)) => debug!("discarding response handler value"),
            Outcome::Handled(None) | Outcome::Response(_) => {}
        }
        Ok(())
    }

    async fn send_with<R, D>(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
        decode: D,
    ) -> Result<Option<R>>
    where
        R: 'static,
        D: FnOnce(&Self, HttpResponse) -> Result<Option<R>>,
    {
        let response = match self.execute(request, error_mappings).await? {
            Outcome::Handled(value) => return downcast_handled(value),
            Outcome::Response(response) => response,
        };
        if response.status() == NO_CONTENT {
            return Ok(None);
        }
        decode(self, response)
    }

    async fn execute(
        &self,
        request: RequestInformation,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<Outcome> {
        let native = self.convert_to_native_request(request).await?;
        let handler = find_response_handler(native.options());
        debug!(method = %native.method(), url = %native.url(), "sending request");
        let response = self.transport.send(native).await?;

        if let Some(handler) = handler {
            let value = handler.handle_response(response, error_mappings).await?;
            return Ok(Outcome::Handled(value));
        }
        self.throw_if_failed_response(&response, error_mappings)?;
        Ok(Outcome::Response(response))
    }

    fn root_parse_node(&self, response: &HttpResponse) -> Result<Option<Box<dyn ParseNode>>> {
        let Some(body) = response.body() else {
            return Ok(None);
        };
        let Some(content_type) = response.content_type() else {
            debug!(status = response.status(), "response has a body but no content type");
            return Ok(None);
        };
        self.registry.get_parse_node(content_type, body).map(Some)
    }

    fn throw_if_failed_response(
        &self,
        response: &HttpResponse,
        error_mappings: Option<&ErrorMappings>,
    ) -> Result<()> {
        if response.is_success() {
            return Ok(());
        }
        let status = response.status();
        let headers = response.headers().clone();

        let Some(factory) = error_mappings.and_then(|m| m.resolve(status)) else {
            warn!(status, "no error mapping registered for status code");
            return Err(ApiError::new(
                format!(
                    "the server returned an unexpected status code and no error class is registered for this code {status}"
                ),
                status,
                headers,
            )
            .into());
        };

        let decoded = self
            .root_parse_node(response)
            .and_then(|root| root.map(|node| factory(node.as_ref())).transpose());
        let err = match decoded {
            Ok(Some(body)) => {
                ApiError::new(format!("service returned status code {status}"), status, headers)
                    .with_body(body)
            }
            Ok(None) => ApiError::new(
                format!("service returned status code {status} but no response body was found"),
                status,
                headers,
            ),
            Err(e) => {
                warn!(status, error = %e, "failed to decode error response body");
                ApiError::new(
                    format!("service returned status code {status} with an undecodable body: {e}"),
                    status,
                    headers,
                )
            }
        };
        Err(err.into())
    }
}

fn downcast_handled<R: 'static>(value: Option<Box<dyn Any + Send>>) -> Result<Option<R>> {
    match value {
        None => Ok(None),
        Some(value) => value.downcast::<R>().map(|v| Some(*v)).map_err(|_| {
            KiotaError::UnsupportedType(format!(
                "response handler returned a value that is not a {}",
                std::any::type_name::<R>()
            ))
        }),
    }
}

impl fmt::Debug for HttpRequestAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequestAdapter")
            .field("base_url", &self.base_url)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AnonymousAuthenticationProvider;
    use crate::request_information::HttpMethod;
    use async_trait::async_trait;
    use kiota_core::Headers;

    struct Unreachable;

    #[async_trait]
    impl HttpTransport for Unreachable {
        async fn send(&self, _: NativeRequest) -> Result<HttpResponse> {
            Err(KiotaError::Transport("unreachable".to_string()))
        }
    }

    struct FailingAuth;

    #[async_trait]
    impl AuthenticationProvider for FailingAuth {
        async fn authenticate_request(
            &self,
            _: &mut RequestInformation,
            _: &AuthenticationContext,
        ) -> Result<()> {
            Err(KiotaError::Authentication("no credentials".to_string()))
        }
    }

    fn adapter() -> HttpRequestAdapter {
        let mut adapter = HttpRequestAdapter::new(AnonymousAuthenticationProvider, Unreachable);
        adapter.set_base_url("https://registry.example.com/apis/registry/v2");
        adapter
    }

    #[tokio::test]
    async fn test_convert_to_native_request_substitutes_base_url() {
        let mut info = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups/{groupId}")
            .path_parameter("groupId", "default")
            .header("Accept", "application/json");
        info.set_stream_content(&b"{}"[..]);

        let native = adapter().convert_to_native_request(info).await.unwrap();
        assert_eq!(native.method(), HttpMethod::Post);
        assert_eq!(
            native.url().as_str(),
            "https://registry.example.com/apis/registry/v2/groups/default"
        );
        assert_eq!(native.headers().first("accept"), Some("application/json"));
        assert_eq!(native.body().map(|b| &b[..]), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_authentication_failure_aborts_before_send() {
        let adapter = HttpRequestAdapter::new(FailingAuth, Unreachable);
        let info = RequestInformation::new(HttpMethod::Get, "https://example.com/x");
        let err = adapter.send_no_content(info, None).await.unwrap_err();
        assert!(matches!(err, KiotaError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_an_api_error() {
        let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/system/info");
        let err = adapter().send_primitive::<String>(info, None).await.unwrap_err();
        assert!(matches!(err, KiotaError::Transport(_)));
        assert!(err.api_error().is_none());
    }

    #[test]
    fn test_enable_backing_store_keeps_content_types() {
        let mut adapter = adapter();
        adapter.enable_backing_store();
        assert!(adapter.registry().can_parse("application/json"));
        assert!(format!("{adapter:?}").contains("registry.example.com"));
    }

    #[test]
    fn test_from_config() {
        let config = AdapterConfig::builder()
            .base_url("http://localhost:8080/apis")
            .backing_store(true)
            .build()
            .unwrap();
        let adapter = HttpRequestAdapter::from_config(&config, AnonymousAuthenticationProvider).unwrap();
        assert_eq!(adapter.base_url(), "http://localhost:8080/apis");
    }

    #[test]
    fn test_downcast_handled() {
        let value: Option<Box<dyn Any + Send>> = Some(Box::new(7i32));
        assert_eq!(downcast_handled::<i32>(value).unwrap(), Some(7));

        let value: Option<Box<dyn Any + Send>> = Some(Box::new("x"));
        assert!(matches!(
            downcast_handled::<i32>(value),
            Err(KiotaError::UnsupportedType(_))
        ));
        assert_eq!(downcast_handled::<i32>(None).unwrap(), None);
    }

    #[test]
    fn test_root_parse_node_requires_body_and_content_type() {
        let adapter = adapter();
        let mut headers = Headers::new();
        headers.add("Content-Type", "application/json");

        let empty = HttpResponse::new(200, headers.clone(), None);
        assert!(adapter.root_parse_node(&empty).unwrap().is_none());

        let untyped = HttpResponse::new(200, Headers::new(), Some("1".into()));
        assert!(adapter.root_parse_node(&untyped).unwrap().is_none());

        let typed = HttpResponse::new(200, headers, Some("1".into()));
        let node = adapter.root_parse_node(&typed).unwrap().unwrap();
        assert_eq!(node.get_int_value(), Some(1));
    }
}
