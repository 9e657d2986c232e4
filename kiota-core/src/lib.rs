//! Core abstractions for generated API clients.
//!
//! This crate defines how generated models are decoded from and encoded to
//! payloads: the [`ParseNode`] and [`SerializationWriter`] traits, the JSON
//! codec implementing them, and the [`ContentCodecRegistry`] that selects a
//! codec by content type.

#![warn(missing_docs)]

pub mod error;
pub mod headers;
pub mod registry;
pub mod serialization;
pub mod store;

pub use error::{ApiError, ApiErrorBody, KiotaError, Result};
pub use headers::Headers;
pub use registry::{ContentCodecRegistry, ContentCodecRegistryBuilder};
pub use serialization::{
    AdditionalData, AnyValue, FieldDeserializers, Parsable, ParseNode, ParseNodeFactory,
    PeriodAndDuration, Primitive, PrimitiveKind, PrimitiveValue, SerializationWriter,
    SerializationWriterFactory, ValuedEnum,
};
pub use store::{BackingStore, InMemoryBackingStore};
