use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{KiotaError, Result};
use crate::serialization::{
    validate_content_type, AnyValue, Parsable, PeriodAndDuration, PrimitiveValue,
    SerializationWriter, SerializationWriterFactory, WriterHooks,
};

use super::JSON_CONTENT_TYPE;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
enum Scope {
    Object { first: bool },
    Array { first: bool },
}

/// A [`SerializationWriter`] that produces UTF-8 JSON text.
///
/// The writer tracks open objects and arrays, so misuse such as a keyed
/// write inside an array or a second root value fails with
/// [`KiotaError::InvalidState`] instead of producing malformed output.
#[derive(Debug)]
pub struct JsonSerializationWriter {
    buffer: BytesMut,
    scopes: Vec<Scope>,
    root_written: bool,
    // A composed type wrapper reserved the current slot for its merged value.
    value_pending: bool,
    // Depth of the object a keyed write opened in a reserved composed slot.
    merged_object: Option<usize>,
    hooks: WriterHooks,
}

impl JsonSerializationWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty writer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            scopes: Vec::new(),
            root_written: false,
            value_pending: false,
            merged_object: None,
            hooks: WriterHooks::default(),
        }
    }

    /// Returns the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Positions the output for a new value, writing separators and the field name.
    fn begin_value(&mut self, key: Option<&str>) -> Result<()> {
        if std::mem::replace(&mut self.value_pending, false) {
            if key.is_none() {
                return Ok(());
            }
            // A keyed write turns the reserved slot into an object the members merge into.
            self.open(Scope::Object { first: true });
            self.merged_object = Some(self.scopes.len());
        }
        match (self.scopes.last_mut(), key) {
            (None, None) => {
                if self.root_written {
                    return Err(KiotaError::InvalidState(
                        "a JSON document can only have one root value".to_string(),
                    ));
                }
                self.root_written = true;
            }
            (None, Some(key)) => {
                return Err(KiotaError::InvalidState(format!(
                    "cannot write field {key} outside of an object"
                )));
            }
            (Some(Scope::Object { first }), Some(key)) => {
                if !std::mem::replace(first, false) {
                    self.buffer.put_u8(b',');
                }
                self.put_json(key)?;
                self.buffer.put_u8(b':');
            }
            (Some(Scope::Object { .. }), None) => {
                return Err(KiotaError::InvalidState(
                    "a value inside an object requires a field name".to_string(),
                ));
            }
            (Some(Scope::Array { first }), None) => {
                if !std::mem::replace(first, false) {
                    self.buffer.put_u8(b',');
                }
            }
            (Some(Scope::Array { .. }), Some(key)) => {
                return Err(KiotaError::InvalidState(format!(
                    "cannot write field {key} inside an array"
                )));
            }
        }
        Ok(())
    }

    fn put_json<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer((&mut self.buffer).writer(), value)?;
        Ok(())
    }

    fn put_raw(&mut self, text: &str) {
        self.buffer.put_slice(text.as_bytes());
    }

    fn write_raw(&mut self, key: Option<&str>, text: &str) -> Result<()> {
        self.begin_value(key)?;
        self.put_raw(text);
        Ok(())
    }

    fn write_text(&mut self, key: Option<&str>, text: &str) -> Result<()> {
        self.begin_value(key)?;
        self.put_json(text)
    }

    fn open(&mut self, scope: Scope) {
        self.buffer.put_u8(match scope {
            Scope::Object { .. } => b'{',
            Scope::Array { .. } => b'[',
        });
        self.scopes.push(scope);
    }

    fn close(&mut self) -> Result<()> {
        match self.scopes.pop() {
            Some(Scope::Object { .. }) => self.buffer.put_u8(b'}'),
            Some(Scope::Array { .. }) => self.buffer.put_u8(b']'),
            None => {
                return Err(KiotaError::InvalidState(
                    "no open object or array to close".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Serializes one model's fields, firing the start hook first.
    fn write_fields(&mut self, hooks: &WriterHooks, value: &dyn Parsable) -> Result<()> {
        if let Some(hook) = hooks.on_start_object() {
            hook(value, self as &mut dyn SerializationWriter)?;
        }
        value.serialize(self)
    }

    /// Serializes one merged model with the full hook sequence.
    fn write_model(&mut self, hooks: &WriterHooks, value: &dyn Parsable) -> Result<()> {
        if let Some(hook) = hooks.before_object() {
            hook(value);
        }
        self.write_fields(hooks, value)?;
        if let Some(hook) = hooks.after_object() {
            hook(value);
        }
        Ok(())
    }
}

impl Default for JsonSerializationWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializationWriter for JsonSerializationWriter {
    fn hooks(&self) -> &WriterHooks {
        &self.hooks
    }

    fn set_hooks(&mut self, hooks: WriterHooks) {
        self.hooks = hooks;
    }

    fn write_string_value(&mut self, key: Option<&str>, value: Option<&str>) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, v),
            None => Ok(()),
        }
    }

    fn write_bool_value(&mut self, key: Option<&str>, value: Option<bool>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, if v { "true" } else { "false" }),
            None => Ok(()),
        }
    }

    fn write_byte_value(&mut self, key: Option<&str>, value: Option<i8>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_short_value(&mut self, key: Option<&str>, value: Option<i16>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_int_value(&mut self, key: Option<&str>, value: Option<i32>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_long_value(&mut self, key: Option<&str>, value: Option<i64>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_float_value(&mut self, key: Option<&str>, value: Option<f32>) -> Result<()> {
        match value {
            Some(v) => {
                self.begin_value(key)?;
                self.put_json(&v)
            }
            None => Ok(()),
        }
    }

    fn write_double_value(&mut self, key: Option<&str>, value: Option<f64>) -> Result<()> {
        match value {
            Some(v) => {
                self.begin_value(key)?;
                self.put_json(&v)
            }
            None => Ok(()),
        }
    }

    fn write_decimal_value(&mut self, key: Option<&str>, value: Option<Decimal>) -> Result<()> {
        match value {
            Some(v) => self.write_raw(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_uuid_value(&mut self, key: Option<&str>, value: Option<Uuid>) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &v.hyphenated().to_string()),
            None => Ok(()),
        }
    }

    fn write_date_time_value(
        &mut self,
        key: Option<&str>,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => Ok(()),
        }
    }

    fn write_date_value(&mut self, key: Option<&str>, value: Option<NaiveDate>) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &v.format("%Y-%m-%d").to_string()),
            None => Ok(()),
        }
    }

    fn write_time_value(&mut self, key: Option<&str>, value: Option<NaiveTime>) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &v.format("%H:%M:%S%.f").to_string()),
            None => Ok(()),
        }
    }

    fn write_period_and_duration_value(
        &mut self,
        key: Option<&str>,
        value: Option<PeriodAndDuration>,
    ) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &v.to_string()),
            None => Ok(()),
        }
    }

    fn write_byte_array_value(&mut self, key: Option<&str>, value: Option<&[u8]>) -> Result<()> {
        match value {
            Some(v) => self.write_text(key, &STANDARD.encode(v)),
            None => Ok(()),
        }
    }

    fn write_null_value(&mut self, key: Option<&str>) -> Result<()> {
        self.write_raw(key, "null")
    }

    fn write_collection_of_primitive_values(
        &mut self,
        key: Option<&str>,
        values: Option<&[PrimitiveValue]>,
    ) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        self.begin_value(key)?;
        self.open(Scope::Array { first: true });
        for value in values {
            self.write_primitive_value(None, value)?;
        }
        self.close()
    }

    fn write_object_value(
        &mut self,
        key: Option<&str>,
        value: Option<&dyn Parsable>,
        additional: &[&dyn Parsable],
    ) -> Result<()> {
        if value.is_none() && additional.is_empty() {
            return Ok(());
        }
        let hooks = self.hooks.clone();
        let composed = value.map_or(false, |v| v.is_composed_type_wrapper());
        // A member of a composed value whose slot already became an object shares it.
        let merging = key.is_none() && self.merged_object == Some(self.scopes.len());
        let outer_merge = if composed { self.merged_object.take() } else { None };
        let depth = self.scopes.len();

        if let (Some(value), Some(hook)) = (value, hooks.before_object()) {
            hook(value);
        }
        if !merging {
            self.begin_value(key)?;
            if composed {
                self.value_pending = true;
            } else {
                self.open(Scope::Object { first: true });
            }
        }
        if let Some(value) = value {
            self.write_fields(&hooks, value)?;
        }
        for extra in additional {
            self.write_model(&hooks, *extra)?;
        }
        if composed {
            if std::mem::replace(&mut self.value_pending, false) {
                self.put_raw("null");
            } else if self.merged_object == Some(depth + 1) {
                self.close()?;
            }
            self.merged_object = outer_merge;
        } else if !merging {
            self.close()?;
        }
        if let (Some(value), Some(hook)) = (value, hooks.after_object()) {
            hook(value);
        }
        Ok(())
    }

    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: Option<&[&dyn Parsable]>,
    ) -> Result<()> {
        let Some(values) = values else {
            return Ok(());
        };
        self.begin_value(key)?;
        self.open(Scope::Array { first: true });
        for value in values {
            self.write_object_value(None, Some(*value), &[])?;
        }
        self.close()
    }

    fn write_any_value(&mut self, key: Option<&str>, value: &AnyValue) -> Result<()> {
        match value {
            AnyValue::Null => self.write_null_value(key),
            AnyValue::Primitive(p) => self.write_primitive_value(key, p),
            AnyValue::Collection(items) => {
                self.begin_value(key)?;
                self.open(Scope::Array { first: true });
                for item in items {
                    self.write_any_value(None, item)?;
                }
                self.close()
            }
            AnyValue::Object(fields) => {
                self.begin_value(key)?;
                self.open(Scope::Object { first: true });
                for (name, item) in fields {
                    self.write_any_value(Some(name.as_str()), item)?;
                }
                self.close()
            }
            AnyValue::Node(node) => {
                self.begin_value(key)?;
                self.put_json(node)
            }
        }
    }

    fn get_serialized_content(&mut self) -> Result<Bytes> {
        if !self.scopes.is_empty() || self.value_pending {
            return Err(KiotaError::InvalidState(
                "cannot read content while an object or array is still open".to_string(),
            ));
        }
        self.root_written = false;
        Ok(self.buffer.split().freeze())
    }
}

/// Creates [`JsonSerializationWriter`]s for `application/json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializationWriterFactory;

impl JsonSerializationWriterFactory {
    /// Creates the factory.
    pub fn new() -> Self {
        Self
    }
}

impl SerializationWriterFactory for JsonSerializationWriterFactory {
    fn valid_content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn get_serialization_writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        validate_content_type(JSON_CONTENT_TYPE, content_type)?;
        Ok(Box::new(JsonSerializationWriter::new()))
    }
}
