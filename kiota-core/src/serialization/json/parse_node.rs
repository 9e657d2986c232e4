use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::serialization::{
    validate_content_type, AnyValue, ArrayElements, ParseHooks, ParseNode, ParseNodeFactory,
    PeriodAndDuration,
};

use super::{DefaultJsonValueDecoder, JsonValueDecoder, JSON_CONTENT_TYPE};

/// State shared by a root node and every node derived from it.
#[derive(Clone)]
struct NodeContext {
    decoder: Arc<dyn JsonValueDecoder>,
    hooks: ParseHooks,
}

/// A [`ParseNode`] over a `serde_json::Value`.
#[derive(Clone)]
pub struct JsonParseNode {
    value: Value,
    context: NodeContext,
}

impl JsonParseNode {
    /// Wraps `value` with the default decoder and no hooks.
    pub fn new(value: Value) -> Self {
        Self::with_context(value, Arc::new(DefaultJsonValueDecoder), ParseHooks::default())
    }

    /// Wraps `value` with a custom decoder and hooks.
    pub fn with_context(value: Value, decoder: Arc<dyn JsonValueDecoder>, hooks: ParseHooks) -> Self {
        Self {
            value,
            context: NodeContext { decoder, hooks },
        }
    }

    /// Returns the wrapped JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn child(&self, value: Value) -> Box<dyn ParseNode> {
        Box::new(Self {
            value,
            context: self.context.clone(),
        })
    }

    fn decoder(&self) -> &dyn JsonValueDecoder {
        self.context.decoder.as_ref()
    }
}

impl fmt::Debug for JsonParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonParseNode")
            .field("value", &self.value)
            .field("hooks", &self.context.hooks)
            .finish()
    }
}

impl ParseNode for JsonParseNode {
    fn hooks(&self) -> &ParseHooks {
        &self.context.hooks
    }

    fn is_null(&self) -> bool {
        self.value.is_null()
    }

    fn get_child_node(&self, name: &str) -> Option<Box<dyn ParseNode>> {
        let object = self.value.as_object()?;
        Some(self.child(object.get(name).cloned().unwrap_or(Value::Null)))
    }

    fn get_field_nodes(&self) -> Option<Vec<(String, Box<dyn ParseNode>)>> {
        let object = self.value.as_object()?;
        Some(
            object
                .iter()
                .map(|(name, value)| (name.clone(), self.child(value.clone())))
                .collect(),
        )
    }

    fn get_array_elements(&self) -> ArrayElements {
        match &self.value {
            Value::Null => ArrayElements::Null,
            Value::Array(items) => {
                ArrayElements::Items(items.iter().map(|item| self.child(item.clone())).collect())
            }
            _ => ArrayElements::NotAnArray,
        }
    }

    fn get_string_value(&self) -> Option<String> {
        self.decoder().decode_string(&self.value)
    }

    fn get_bool_value(&self) -> Option<bool> {
        self.decoder().decode_bool(&self.value)
    }

    fn get_byte_value(&self) -> Option<i8> {
        self.decoder().decode_byte(&self.value)
    }

    fn get_short_value(&self) -> Option<i16> {
        self.decoder().decode_short(&self.value)
    }

    fn get_int_value(&self) -> Option<i32> {
        self.decoder().decode_int(&self.value)
    }

    fn get_long_value(&self) -> Option<i64> {
        self.decoder().decode_long(&self.value)
    }

    fn get_float_value(&self) -> Option<f32> {
        self.decoder().decode_float(&self.value)
    }

    fn get_double_value(&self) -> Option<f64> {
        self.decoder().decode_double(&self.value)
    }

    fn get_decimal_value(&self) -> Option<Decimal> {
        self.decoder().decode_decimal(&self.value)
    }

    fn get_uuid_value(&self) -> Option<Uuid> {
        self.decoder().decode_uuid(&self.value)
    }

    fn get_date_time_value(&self) -> Option<DateTime<FixedOffset>> {
        self.decoder().decode_date_time(&self.value)
    }

    fn get_date_value(&self) -> Option<NaiveDate> {
        self.decoder().decode_date(&self.value)
    }

    fn get_time_value(&self) -> Option<NaiveTime> {
        self.decoder().decode_time(&self.value)
    }

    fn get_period_and_duration_value(&self) -> Option<PeriodAndDuration> {
        self.decoder().decode_period_and_duration(&self.value)
    }

    fn get_byte_array_value(&self) -> Option<Vec<u8>> {
        self.decoder().decode_byte_array(&self.value)
    }

    fn get_any_value(&self) -> Result<AnyValue> {
        self.decoder().decode_any(&self.value)
    }
}

/// Creates [`JsonParseNode`]s from `application/json` payloads.
#[derive(Clone)]
pub struct JsonParseNodeFactory {
    decoder: Arc<dyn JsonValueDecoder>,
}

impl JsonParseNodeFactory {
    /// Creates a factory with the default decoder.
    pub fn new() -> Self {
        Self::with_decoder(Arc::new(DefaultJsonValueDecoder))
    }

    /// Creates a factory whose nodes use `decoder` for scalar reads.
    pub fn with_decoder(decoder: Arc<dyn JsonValueDecoder>) -> Self {
        Self { decoder }
    }

    /// Wraps an already decoded value.
    pub fn create_node(&self, value: Value, hooks: ParseHooks) -> JsonParseNode {
        JsonParseNode::with_context(value, Arc::clone(&self.decoder), hooks)
    }
}

impl Default for JsonParseNodeFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for JsonParseNodeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonParseNodeFactory").finish_non_exhaustive()
    }
}

impl ParseNodeFactory for JsonParseNodeFactory {
    fn valid_content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn get_parse_node_with_hooks(
        &self,
        content_type: &str,
        content: &[u8],
        hooks: ParseHooks,
    ) -> Result<Box<dyn ParseNode>> {
        validate_content_type(JSON_CONTENT_TYPE, content_type)?;
        let value: Value = serde_json::from_slice(content)?;
        Ok(Box::new(self.create_node(value, hooks)))
    }
}
