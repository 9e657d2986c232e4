//! Content-type keyed lookup of parse node and serialization writer factories.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{KiotaError, Result};
use crate::serialization::json::{JsonParseNodeFactory, JsonSerializationWriterFactory};
use crate::serialization::{
    ParseNode, ParseNodeFactory, SerializationWriter, SerializationWriterFactory,
};
use crate::store::{BackingStoreParseNodeFactory, BackingStoreSerializationWriterFactory};

/// Registry mapping content types to codec factories.
///
/// A registry is built once and then shared read-only, typically behind an
/// `Arc` held by a request adapter.
///
/// # Example
///
/// ```
/// use kiota_core::ContentCodecRegistry;
///
/// let registry = ContentCodecRegistry::with_defaults();
/// let node = registry.get_parse_node("application/json", br#"{"id":1}"#).unwrap();
/// assert!(!node.is_null());
/// ```
#[derive(Clone, Default)]
pub struct ContentCodecRegistry {
    parse_node_factories: HashMap<String, Arc<dyn ParseNodeFactory>>,
    writer_factories: HashMap<String, Arc<dyn SerializationWriterFactory>>,
}

impl ContentCodecRegistry {
    /// Creates a builder for a registry.
    pub fn builder() -> ContentCodecRegistryBuilder {
        ContentCodecRegistryBuilder::default()
    }

    /// Creates a registry with the JSON codec registered.
    pub fn with_defaults() -> Self {
        Self::builder().json().build()
    }

    /// Decodes `content` with the factory registered for `content_type`.
    pub fn get_parse_node(&self, content_type: &str, content: &[u8]) -> Result<Box<dyn ParseNode>> {
        self.parse_node_factory(content_type)?
            .get_parse_node(content_type, content)
    }

    /// Creates a writer with the factory registered for `content_type`.
    pub fn get_serialization_writer(
        &self,
        content_type: &str,
    ) -> Result<Box<dyn SerializationWriter>> {
        self.serialization_writer_factory(content_type)?
            .get_serialization_writer(content_type)
    }

    /// Returns the parse node factory for `content_type`.
    pub fn parse_node_factory(&self, content_type: &str) -> Result<&Arc<dyn ParseNodeFactory>> {
        require_content_type(content_type)?;
        tracing::debug!(content_type, "selecting parse node factory");
        self.parse_node_factories
            .get(content_type)
            .ok_or_else(|| not_registered(content_type, "parsed"))
    }

    /// Returns the serialization writer factory for `content_type`.
    pub fn serialization_writer_factory(
        &self,
        content_type: &str,
    ) -> Result<&Arc<dyn SerializationWriterFactory>> {
        require_content_type(content_type)?;
        tracing::debug!(content_type, "selecting serialization writer factory");
        self.writer_factories
            .get(content_type)
            .ok_or_else(|| not_registered(content_type, "serialized"))
    }

    /// Returns `true` if `content_type` can be parsed.
    pub fn can_parse(&self, content_type: &str) -> bool {
        self.parse_node_factories.contains_key(content_type)
    }

    /// Returns `true` if `content_type` can be written.
    pub fn can_serialize(&self, content_type: &str) -> bool {
        self.writer_factories.contains_key(content_type)
    }

    /// Returns the registered parseable content types, sorted.
    pub fn parse_content_types(&self) -> Vec<&str> {
        let mut types: Vec<_> = self.parse_node_factories.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// Returns a copy of this registry whose factories track backing store changes.
    pub fn with_backing_store(&self) -> Self {
        Self {
            parse_node_factories: self
                .parse_node_factories
                .iter()
                .map(|(ct, f)| {
                    let wrapped: Arc<dyn ParseNodeFactory> =
                        Arc::new(BackingStoreParseNodeFactory::new(Arc::clone(f)));
                    (ct.clone(), wrapped)
                })
                .collect(),
            writer_factories: self
                .writer_factories
                .iter()
                .map(|(ct, f)| {
                    let wrapped: Arc<dyn SerializationWriterFactory> =
                        Arc::new(BackingStoreSerializationWriterFactory::new(Arc::clone(f)));
                    (ct.clone(), wrapped)
                })
                .collect(),
        }
    }
}

fn require_content_type(content_type: &str) -> Result<()> {
    if content_type.is_empty() {
        return Err(KiotaError::ContentType(
            "content type cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn not_registered(content_type: &str, action: &str) -> KiotaError {
    KiotaError::ContentType(format!(
        "content type {content_type} does not have a factory registered to be {action}"
    ))
}

impl fmt::Debug for ContentCodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writers: Vec<_> = self.writer_factories.keys().collect();
        writers.sort_unstable();
        f.debug_struct("ContentCodecRegistry")
            .field("parse", &self.parse_content_types())
            .field("serialize", &writers)
            .finish()
    }
}

/// Builder for [`ContentCodecRegistry`].
#[derive(Default)]
pub struct ContentCodecRegistryBuilder {
    registry: ContentCodecRegistry,
}

impl ContentCodecRegistryBuilder {
    /// Registers a parse node factory under its own content type.
    ///
    /// A later registration for the same content type replaces the earlier one.
    pub fn parse_node_factory(mut self, factory: Arc<dyn ParseNodeFactory>) -> Self {
        let content_type = factory.valid_content_type().to_string();
        self.registry
            .parse_node_factories
            .insert(content_type, factory);
        self
    }

    /// Registers a serialization writer factory under its own content type.
    pub fn serialization_writer_factory(
        mut self,
        factory: Arc<dyn SerializationWriterFactory>,
    ) -> Self {
        let content_type = factory.valid_content_type().to_string();
        self.registry.writer_factories.insert(content_type, factory);
        self
    }

    /// Registers the JSON parse node and serialization writer factories.
    pub fn json(self) -> Self {
        self.parse_node_factory(Arc::new(JsonParseNodeFactory::new()))
            .serialization_writer_factory(Arc::new(JsonSerializationWriterFactory::new()))
    }

    /// Builds the registry.
    pub fn build(self) -> ContentCodecRegistry {
        self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_register_json() {
        let registry = ContentCodecRegistry::with_defaults();
        assert!(registry.can_parse("application/json"));
        assert!(registry.can_serialize("application/json"));
        assert_eq!(registry.parse_content_types(), vec!["application/json"]);
    }

    #[test]
    fn test_empty_content_type_is_rejected() {
        let registry = ContentCodecRegistry::with_defaults();
        let err = registry.get_parse_node("", b"{}").err().unwrap();
        assert_eq!(
            err.to_string(),
            "content type error: content type cannot be empty"
        );
        assert!(registry.get_serialization_writer("").is_err());
    }

    #[test]
    fn test_unregistered_content_type() {
        let registry = ContentCodecRegistry::with_defaults();
        let err = registry.get_parse_node("text/plain", b"hi").err().unwrap();
        assert_eq!(
            err.to_string(),
            "content type error: content type text/plain does not have a factory registered to be parsed"
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ContentCodecRegistry::builder().build();
        assert!(!registry.can_parse("application/json"));
        assert!(registry.get_serialization_writer("application/json").is_err());
    }

    #[test]
    fn test_writer_round_trip_through_registry() {
        let registry = ContentCodecRegistry::with_defaults();
        let mut writer = registry.get_serialization_writer("application/json").unwrap();
        writer.write_string_value(None, Some("hello")).unwrap();
        let content = writer.get_serialized_content().unwrap();

        let node = registry.get_parse_node("application/json", &content).unwrap();
        assert_eq!(node.get_string_value().as_deref(), Some("hello"));
    }

    #[test]
    fn test_with_backing_store_keeps_content_types() {
        let registry = ContentCodecRegistry::with_defaults().with_backing_store();
        assert!(registry.can_parse("application/json"));
        assert!(registry.can_serialize("application/json"));
    }

    #[test]
    fn test_debug_lists_content_types() {
        let registry = ContentCodecRegistry::with_defaults();
        let debug = format!("{registry:?}");
        assert!(debug.contains("application/json"));
    }
}
