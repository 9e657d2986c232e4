//! Status code to error type mappings supplied by generated request builders.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kiota_core::{ApiErrorBody, Parsable, ParseNode, Result};

/// Creates a typed error body from a parse node.
pub type ErrorFactory =
    Arc<dyn Fn(&dyn ParseNode) -> Result<Box<dyn ApiErrorBody>> + Send + Sync>;

/// Maps `"<status code>"`, `"4XX"` or `"5XX"` to an error factory.
///
/// An exact status code entry takes precedence over its class wildcard.
#[derive(Clone, Default)]
pub struct ErrorMappings {
    entries: HashMap<String, ErrorFactory>,
}

impl ErrorMappings {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw factory for `code`.
    pub fn insert(&mut self, code: impl Into<String>, factory: ErrorFactory) {
        self.entries.insert(code.into().to_ascii_uppercase(), factory);
    }

    /// Registers `T` for `code`, created by `create` and then populated from
    /// the response body.
    pub fn with<T, F>(mut self, code: impl Into<String>, create: F) -> Self
    where
        T: Parsable + fmt::Debug + 'static,
        F: Fn(&dyn ParseNode) -> Result<T> + Send + Sync + 'static,
    {
        let factory: ErrorFactory = Arc::new(move |node: &dyn ParseNode| {
            let value = node.get_object_value(|n| create(n))?;
            Ok(Box::new(value) as Box<dyn ApiErrorBody>)
        });
        self.insert(code, factory);
        self
    }

    /// Returns the factory for `status`: exact code first, then the class wildcard.
    pub fn resolve(&self, status: u16) -> Option<&ErrorFactory> {
        if let Some(factory) = self.entries.get(&status.to_string()) {
            return Some(factory);
        }
        match status {
            400..=499 => self.entries.get("4XX"),
            500..=599 => self.entries.get("5XX"),
            _ => None,
        }
    }

    /// Returns `true` if no codes are mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of mapped codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for ErrorMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.entries.keys().collect();
        codes.sort_unstable();
        f.debug_struct("ErrorMappings").field("codes", &codes).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiota_core::serialization::json::JsonParseNodeFactory;
    use kiota_core::{FieldDeserializers, ParseNodeFactory, SerializationWriter};

    #[derive(Debug, Default)]
    struct NotFound {
        detail: Option<String>,
    }

    impl Parsable for NotFound {
        fn field_deserializers(&self) -> FieldDeserializers<Self> {
            FieldDeserializers::new().with("detail", |e: &mut NotFound, n| {
                e.detail = n.get_string_value();
                Ok(())
            })
        }

        fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()> {
            writer.write_string_value(Some("detail"), self.detail.as_deref())
        }
    }

    #[derive(Debug, Default)]
    struct ServerFault;

    impl Parsable for ServerFault {
        fn field_deserializers(&self) -> FieldDeserializers<Self> {
            FieldDeserializers::new()
        }

        fn serialize(&self, _: &mut dyn SerializationWriter) -> Result<()> {
            Ok(())
        }
    }

    fn mappings() -> ErrorMappings {
        ErrorMappings::new()
            .with("404", |_| Ok(NotFound::default()))
            .with("5xx", |_| Ok(ServerFault))
    }

    fn decode(factory: &ErrorFactory) -> Box<dyn ApiErrorBody> {
        let node = JsonParseNodeFactory::new()
            .get_parse_node("application/json", br#"{"detail":"missing"}"#)
            .unwrap();
        factory(node.as_ref()).unwrap()
    }

    #[test]
    fn test_exact_code_wins() {
        let table = mappings();
        let body = decode(table.resolve(404).unwrap());
        let not_found = body.as_any().downcast_ref::<NotFound>().unwrap();
        assert_eq!(not_found.detail.as_deref(), Some("missing"));
    }

    #[test]
    fn test_class_wildcard() {
        let table = mappings();
        let body = decode(table.resolve(503).unwrap());
        assert!(body.as_any().downcast_ref::<ServerFault>().is_some());
    }

    #[test]
    fn test_unmapped_codes() {
        let table = mappings();
        assert!(table.resolve(403).is_none());
        assert!(table.resolve(302).is_none());
        assert!(ErrorMappings::new().is_empty());
    }

    #[test]
    fn test_exact_entry_over_class_entry() {
        let table = ErrorMappings::new()
            .with("4XX", |_| Ok(ServerFault))
            .with("404", |_| Ok(NotFound::default()));
        let body = decode(table.resolve(404).unwrap());
        assert!(body.as_any().downcast_ref::<NotFound>().is_some());
        let body = decode(table.resolve(400).unwrap());
        assert!(body.as_any().downcast_ref::<ServerFault>().is_some());
    }

    #[test]
    fn test_debug_lists_codes() {
        assert_eq!(
            format!("{:?}", mappings()),
            r#"ErrorMappings { codes: ["404", "5XX"] }"#
        );
        assert_eq!(mappings().len(), 2);
    }
}
