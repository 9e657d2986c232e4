//! Abstract description of an HTTP request built by generated code.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::SecondsFormat;
use kiota_core::{
    ContentCodecRegistry, Headers, KiotaError, Parsable, PrimitiveValue, Result,
};
use url::Url;

use crate::options::RequestOption;
use crate::uri_template::{self, Binding};

/// Path parameter holding the adapter's base URL.
pub const BASE_URL_KEY: &str = "baseurl";

/// Path parameter holding a complete URL that bypasses the template.
pub const RAW_URL_KEY: &str = "request-raw-url";

const CONTENT_TYPE_HEADER: &str = "content-type";
const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// CONNECT
    Connect,
    /// PUT
    Put,
    /// TRACE
    Trace,
    /// HEAD
    Head,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Put => "PUT",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path or query parameter value, rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    /// A single value.
    Single(String),
    /// A list of values.
    Multiple(Vec<String>),
}

impl ParameterValue {
    fn binding(&self) -> Binding<'_> {
        match self {
            ParameterValue::Single(v) => Binding::Single(v),
            ParameterValue::Multiple(vs) => Binding::List(vs),
        }
    }
}

impl From<PrimitiveValue> for ParameterValue {
    fn from(value: PrimitiveValue) -> Self {
        ParameterValue::Single(parameter_text(&value))
    }
}

/// Renders a scalar the way it appears in a URL.
pub fn parameter_text(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::Bool(v) => v.to_string(),
        PrimitiveValue::Byte(v) => v.to_string(),
        PrimitiveValue::Short(v) => v.to_string(),
        PrimitiveValue::Int(v) => v.to_string(),
        PrimitiveValue::Long(v) => v.to_string(),
        PrimitiveValue::Float(v) => v.to_string(),
        PrimitiveValue::Double(v) => v.to_string(),
        PrimitiveValue::Decimal(v) => v.to_string(),
        PrimitiveValue::String(v) => v.clone(),
        PrimitiveValue::Uuid(v) => v.hyphenated().to_string(),
        PrimitiveValue::Date(v) => v.format("%Y-%m-%d").to_string(),
        PrimitiveValue::Time(v) => v.format("%H:%M:%S%.f").to_string(),
        PrimitiveValue::DateTime(v) => v.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        PrimitiveValue::Duration(v) => v.to_string(),
        PrimitiveValue::Bytes(v) => STANDARD.encode(v),
    }
}

/// Everything needed to issue one request: method, URL template and its
/// parameters, headers, body and options.
///
/// A request description is consumed by the adapter when it is sent.
#[derive(Debug, Clone, Default)]
pub struct RequestInformation {
    http_method: HttpMethod,
    url_template: Option<String>,
    path_parameters: BTreeMap<String, ParameterValue>,
    query_parameters: BTreeMap<String, ParameterValue>,
    headers: Headers,
    content: Option<Bytes>,
    options: Vec<Arc<dyn RequestOption>>,
    uri: Option<Url>,
}

impl RequestInformation {
    /// Creates a request for `url_template`.
    pub fn new(http_method: HttpMethod, url_template: impl Into<String>) -> Self {
        Self {
            http_method,
            url_template: Some(url_template.into()),
            ..Self::default()
        }
    }

    /// Creates a request for a fixed URL.
    pub fn with_uri(http_method: HttpMethod, uri: Url) -> Self {
        let mut info = Self {
            http_method,
            ..Self::default()
        };
        info.set_uri(uri);
        info
    }

    /// Returns the HTTP method.
    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// Sets the HTTP method.
    pub fn set_http_method(&mut self, method: HttpMethod) {
        self.http_method = method;
    }

    /// Returns the URL template, if any.
    pub fn url_template(&self) -> Option<&str> {
        self.url_template.as_deref()
    }

    /// Sets a path parameter.
    pub fn path_parameter(mut self, name: impl Into<String>, value: impl Into<PrimitiveValue>) -> Self {
        self.set_path_parameter(name, value);
        self
    }

    /// Sets a path parameter in place.
    pub fn set_path_parameter(&mut self, name: impl Into<String>, value: impl Into<PrimitiveValue>) {
        self.path_parameters
            .insert(name.into(), ParameterValue::from(value.into()));
    }

    /// Returns the path parameters.
    pub fn path_parameters(&self) -> &BTreeMap<String, ParameterValue> {
        &self.path_parameters
    }

    /// Sets a single-valued query parameter.
    pub fn query_parameter(mut self, name: impl Into<String>, value: impl Into<PrimitiveValue>) -> Self {
        self.query_parameters
            .insert(name.into(), ParameterValue::from(value.into()));
        self
    }

    /// Sets a multi-valued query parameter.
    pub fn query_parameter_list<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PrimitiveValue>,
    {
        let rendered = values
            .into_iter()
            .map(|v| parameter_text(&v.into()))
            .collect();
        self.query_parameters
            .insert(name.into(), ParameterValue::Multiple(rendered));
        self
    }

    /// Returns the query parameters.
    pub fn query_parameters(&self) -> &BTreeMap<String, ParameterValue> {
        &self.query_parameters
    }

    /// Overrides the template with a fixed URL.
    ///
    /// Path and query parameters are cleared.
    pub fn set_uri(&mut self, uri: Url) {
        self.path_parameters.clear();
        self.query_parameters.clear();
        self.uri = Some(uri);
    }

    /// Builds the request URL.
    ///
    /// A URL set through [`set_uri`](Self::set_uri) or the raw URL path
    /// parameter wins over the template.
    pub fn uri(&self) -> Result<Url> {
        if let Some(uri) = &self.uri {
            return Ok(uri.clone());
        }
        if let Some(ParameterValue::Single(raw)) = self.path_parameters.get(RAW_URL_KEY) {
            return parse_url(raw);
        }
        let template = self
            .url_template
            .as_deref()
            .ok_or_else(|| KiotaError::InvalidUrl("url template cannot be empty".to_string()))?;
        let expanded = uri_template::expand(template, |name| {
            self.query_parameters
                .get(name)
                .or_else(|| self.path_parameters.get(name))
                .map(ParameterValue::binding)
        })?;
        parse_url(&expanded)
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the request headers for modification.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Adds a header value.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Returns the request body.
    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    /// Replaces the request body without touching headers.
    pub fn set_content(&mut self, content: Option<Bytes>) {
        self.content = content;
    }

    /// Takes the body out of the request.
    pub fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }

    /// Sets a binary body with the `application/octet-stream` content type.
    pub fn set_stream_content(&mut self, content: impl Into<Bytes>) {
        self.set_stream_content_with_type(content, BINARY_CONTENT_TYPE);
    }

    /// Sets a binary body with the given content type.
    pub fn set_stream_content_with_type(&mut self, content: impl Into<Bytes>, content_type: &str) {
        self.content = Some(content.into());
        self.headers.try_add(CONTENT_TYPE_HEADER, content_type);
    }

    /// Encodes `value` as the body using the writer registered for `content_type`.
    pub fn set_content_from_parsable(
        &mut self,
        registry: &ContentCodecRegistry,
        content_type: &str,
        value: &dyn Parsable,
    ) -> Result<()> {
        let mut writer = registry.get_serialization_writer(content_type)?;
        writer.write_object_value(None, Some(value), &[])?;
        self.set_serialized_content(writer.get_serialized_content()?, content_type);
        Ok(())
    }

    /// Encodes `values` as an array body.
    pub fn set_content_from_parsable_collection(
        &mut self,
        registry: &ContentCodecRegistry,
        content_type: &str,
        values: &[&dyn Parsable],
    ) -> Result<()> {
        let mut writer = registry.get_serialization_writer(content_type)?;
        writer.write_collection_of_object_values(None, Some(values))?;
        self.set_serialized_content(writer.get_serialized_content()?, content_type);
        Ok(())
    }

    /// Encodes a scalar as the body.
    pub fn set_content_from_scalar(
        &mut self,
        registry: &ContentCodecRegistry,
        content_type: &str,
        value: &PrimitiveValue,
    ) -> Result<()> {
        let mut writer = registry.get_serialization_writer(content_type)?;
        writer.write_primitive_value(None, value)?;
        self.set_serialized_content(writer.get_serialized_content()?, content_type);
        Ok(())
    }

    fn set_serialized_content(&mut self, content: Bytes, content_type: &str) {
        tracing::debug!(content_type, len = content.len(), "serialized request body");
        self.content = Some(content);
        self.headers.try_add(CONTENT_TYPE_HEADER, content_type);
    }

    /// Adds an option, replacing any option of the same type.
    pub fn add_request_option<O: RequestOption>(&mut self, option: O) {
        let option: Arc<dyn RequestOption> = Arc::new(option);
        let id = TypeId::of::<O>();
        match self.options.iter().position(|o| o.as_any().type_id() == id) {
            Some(i) => self.options[i] = option,
            None => self.options.push(option),
        }
    }

    /// Adds an option and returns the request.
    pub fn request_option<O: RequestOption>(mut self, option: O) -> Self {
        self.add_request_option(option);
        self
    }

    /// Removes the option of type `O`, if present.
    pub fn remove_request_option<O: RequestOption>(&mut self) {
        let id = TypeId::of::<O>();
        self.options.retain(|o| o.as_any().type_id() != id);
    }

    /// Returns the option of type `O`, if present.
    pub fn get_request_option<O: RequestOption>(&self) -> Option<&O> {
        self.options
            .iter()
            .find_map(|o| o.as_any().downcast_ref::<O>())
    }

    /// Returns the options in insertion order.
    pub fn request_options(&self) -> &[Arc<dyn RequestOption>] {
        &self.options
    }

    pub(crate) fn into_parts(self) -> (HttpMethod, Headers, Option<Bytes>, Vec<Arc<dyn RequestOption>>) {
        (self.http_method, self.headers, self.content, self.options)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| KiotaError::InvalidUrl(format!("{raw}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    use crate::options::{ResponseHandler, ResponseHandlerOption};
    use crate::transport::HttpResponse;
    use crate::ErrorMappings;
    use async_trait::async_trait;
    use kiota_core::{FieldDeserializers, SerializationWriter};

    #[derive(Debug, Default)]
    struct Group {
        group_id: Option<String>,
    }

    impl Parsable for Group {
        fn field_deserializers(&self) -> FieldDeserializers<Self> {
            FieldDeserializers::new().with("groupId", |g: &mut Group, n| {
                g.group_id = n.get_string_value();
                Ok(())
            })
        }

        fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
            writer.write_string_value(Some("groupId"), self.group_id.as_deref())
        }
    }

    #[derive(Debug)]
    struct Marker(u8);

    impl RequestOption for Marker {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Ignore;

    #[async_trait]
    impl ResponseHandler for Ignore {
        async fn handle_response(
            &self,
            _: HttpResponse,
            _: Option<&ErrorMappings>,
        ) -> Result<Option<Box<dyn Any + Send>>> {
            Ok(None)
        }
    }

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }

    #[test]
    fn test_uri_from_template() {
        let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/groups/{groupId}/artifacts{?limit,order}")
            .path_parameter(BASE_URL_KEY, "http://localhost:8080/apis/registry/v2")
            .path_parameter("groupId", "my group")
            .query_parameter("limit", 20i32);
        assert_eq!(
            info.uri().unwrap().as_str(),
            "http://localhost:8080/apis/registry/v2/groups/my%20group/artifacts?limit=20"
        );
    }

    #[test]
    fn test_uri_with_list_query() {
        let info = RequestInformation::new(HttpMethod::Get, "https://example.com/items{?select}")
            .query_parameter_list("select", ["id", "name"]);
        assert_eq!(info.uri().unwrap().as_str(), "https://example.com/items?select=id,name");
    }

    #[test]
    fn test_set_uri_overrides_template() {
        let mut info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/x")
            .path_parameter(BASE_URL_KEY, "https://ignored.example");
        info.set_uri(Url::parse("https://example.com/fixed").unwrap());
        assert!(info.path_parameters().is_empty());
        assert_eq!(info.uri().unwrap().as_str(), "https://example.com/fixed");
    }

    #[test]
    fn test_raw_url_parameter() {
        let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/x")
            .path_parameter(RAW_URL_KEY, "https://example.com/next?page=2");
        assert_eq!(info.uri().unwrap().as_str(), "https://example.com/next?page=2");
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let info = RequestInformation::default();
        let err = info.uri().unwrap_err();
        assert_eq!(err.to_string(), "invalid url: url template cannot be empty");
    }

    #[test]
    fn test_relative_expansion_is_an_error() {
        let info = RequestInformation::new(HttpMethod::Get, "{+baseurl}/x");
        assert!(matches!(info.uri(), Err(KiotaError::InvalidUrl(_))));
    }

    #[test]
    fn test_parameter_text() {
        assert_eq!(parameter_text(&PrimitiveValue::Bool(true)), "true");
        assert_eq!(parameter_text(&PrimitiveValue::Bytes(b"hi".to_vec())), "aGk=");
        let date = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(parameter_text(&PrimitiveValue::Date(date)), "2024-02-29");
    }

    #[test]
    fn test_set_content_from_parsable() {
        let registry = ContentCodecRegistry::with_defaults();
        let mut info = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups");
        let group = Group {
            group_id: Some("test-group".to_string()),
        };
        info.set_content_from_parsable(&registry, "application/json", &group)
            .unwrap();

        assert_eq!(
            info.content().map(|c| &c[..]),
            Some(&br#"{"groupId":"test-group"}"#[..])
        );
        assert_eq!(info.headers().first("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_set_content_from_parsable_collection() {
        let registry = ContentCodecRegistry::with_defaults();
        let mut info = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups");
        let a = Group {
            group_id: Some("a".to_string()),
        };
        let b = Group::default();
        info.set_content_from_parsable_collection(&registry, "application/json", &[&a, &b])
            .unwrap();
        assert_eq!(
            info.content().map(|c| &c[..]),
            Some(&br#"[{"groupId":"a"},{}]"#[..])
        );
    }

    #[test]
    fn test_set_content_from_scalar() {
        let registry = ContentCodecRegistry::with_defaults();
        let mut info = RequestInformation::new(HttpMethod::Put, "{+baseurl}/name");
        info.set_content_from_scalar(&registry, "application/json", &PrimitiveValue::from("x"))
            .unwrap();
        assert_eq!(info.content().map(|c| &c[..]), Some(&b"\"x\""[..]));
    }

    #[test]
    fn test_unregistered_content_type_leaves_body_empty() {
        let registry = ContentCodecRegistry::with_defaults();
        let mut info = RequestInformation::new(HttpMethod::Post, "{+baseurl}/groups");
        let err = info
            .set_content_from_parsable(&registry, "application/xml", &Group::default())
            .unwrap_err();
        assert!(matches!(err, KiotaError::ContentType(_)));
        assert!(info.content().is_none());
    }

    #[test]
    fn test_stream_content() {
        let mut info = RequestInformation::new(HttpMethod::Put, "{+baseurl}/blob");
        info.set_stream_content(&b"raw"[..]);
        assert_eq!(info.content().map(|c| &c[..]), Some(&b"raw"[..]));
        assert_eq!(
            info.headers().first("content-type"),
            Some("application/octet-stream")
        );
    }

    #[test]
    fn test_request_options_replace_same_type() {
        let mut info = RequestInformation::default();
        info.add_request_option(Marker(1));
        info.add_request_option(ResponseHandlerOption::new(Ignore));
        info.add_request_option(Marker(2));

        assert_eq!(info.request_options().len(), 2);
        assert_eq!(info.get_request_option::<Marker>().map(|m| m.0), Some(2));

        info.remove_request_option::<Marker>();
        assert!(info.get_request_option::<Marker>().is_none());
        assert!(info.get_request_option::<ResponseHandlerOption>().is_some());
    }
}
