//! JSON implementation of the parse node and serialization writer.

mod decoder;
mod parse_node;
pub mod scalar;
mod writer;

pub use decoder::{DefaultJsonValueDecoder, JsonValueDecoder};
pub use parse_node::{JsonParseNode, JsonParseNodeFactory};
pub use writer::{JsonSerializationWriter, JsonSerializationWriterFactory};

/// The content type handled by the JSON codec.
pub const JSON_CONTENT_TYPE: &str = "application/json";
