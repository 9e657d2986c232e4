//! Serialization framework shared by generated models and request adapters.

mod duration;
mod hooks;
pub mod json;
mod parsable;
mod parse_node;
mod value;
mod writer;

pub use duration::PeriodAndDuration;
pub use hooks::{AssignHook, ObjectHook, ObjectStartHook, ParseHooks, WriterHooks};
pub use parsable::{FieldDeserializer, FieldDeserializers, Parsable, ValuedEnum};
pub use parse_node::{
    stream_value, validate_content_type, ArrayElements, ParseNode, ParseNodeFactory,
};
pub use value::{AdditionalData, AnyValue, Encodable, Primitive, PrimitiveKind, PrimitiveValue};
pub use writer::{SerializationWriter, SerializationWriterFactory};
