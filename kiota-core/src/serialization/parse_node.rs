//! Format-independent view of a decoded payload.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{KiotaError, Result};

use super::{
    AnyValue, ParseHooks, Parsable, PeriodAndDuration, Primitive, PrimitiveKind, PrimitiveValue,
    ValuedEnum,
};

/// The elements of a node read as an array.
pub enum ArrayElements {
    /// The node is an explicit or implicit null.
    Null,
    /// The node holds a scalar or an object.
    NotAnArray,
    /// The array items, in order.
    Items(Vec<Box<dyn ParseNode>>),
}

/// A cursor over one value of a decoded payload.
///
/// Scalar getters return `None` when the node is null, has a different
/// shape, or holds text that does not parse as the requested type.
pub trait ParseNode: Send + Sync {
    /// Returns the hooks inherited from the node's factory.
    fn hooks(&self) -> &ParseHooks;

    /// Returns `true` if the node is null or absent.
    fn is_null(&self) -> bool;

    /// Returns the child at `name`, or `None` when this node is not an object.
    ///
    /// A missing key yields a null node.
    fn get_child_node(&self, name: &str) -> Option<Box<dyn ParseNode>>;

    /// Returns the fields of an object node in document order.
    fn get_field_nodes(&self) -> Option<Vec<(String, Box<dyn ParseNode>)>>;

    /// Returns the items of an array node.
    fn get_array_elements(&self) -> ArrayElements;

    /// Reads a string.
    fn get_string_value(&self) -> Option<String>;

    /// Reads a boolean.
    fn get_bool_value(&self) -> Option<bool>;

    /// Reads an integer in `i8` range.
    fn get_byte_value(&self) -> Option<i8>;

    /// Reads a number in `i16` range.
    fn get_short_value(&self) -> Option<i16>;

    /// Reads a number in `i32` range, truncating fractions.
    fn get_int_value(&self) -> Option<i32>;

    /// Reads a number in `i64` range, truncating fractions.
    fn get_long_value(&self) -> Option<i64>;

    /// Reads a number in `f32` range.
    fn get_float_value(&self) -> Option<f32>;

    /// Reads a number as `f64`.
    fn get_double_value(&self) -> Option<f64>;

    /// Reads a number as a decimal.
    fn get_decimal_value(&self) -> Option<Decimal>;

    /// Parses textual UUID.
    fn get_uuid_value(&self) -> Option<Uuid>;

    /// Parses an RFC 3339 date-time.
    fn get_date_time_value(&self) -> Option<DateTime<FixedOffset>>;

    /// Parses an ISO-8601 calendar date.
    fn get_date_value(&self) -> Option<NaiveDate>;

    /// Parses an ISO-8601 time of day.
    fn get_time_value(&self) -> Option<NaiveTime>;

    /// Parses an ISO-8601 period and duration.
    fn get_period_and_duration_value(&self) -> Option<PeriodAndDuration>;

    /// Decodes base64 text; an empty string yields an empty array.
    fn get_byte_array_value(&self) -> Option<Vec<u8>>;

    /// Reads the node as an untyped value for additional data.
    fn get_any_value(&self) -> Result<AnyValue>;

    /// Reads a scalar of the requested kind.
    ///
    /// Fails for [`PrimitiveKind::Void`] and [`PrimitiveKind::Stream`], which
    /// only exist as response targets.
    fn get_primitive_value(&self, kind: PrimitiveKind) -> Result<Option<PrimitiveValue>> {
        let value = match kind {
            PrimitiveKind::Bool => self.get_bool_value().map(PrimitiveValue::Bool),
            PrimitiveKind::Byte => self.get_byte_value().map(PrimitiveValue::Byte),
            PrimitiveKind::Short => self.get_short_value().map(PrimitiveValue::Short),
            PrimitiveKind::Int => self.get_int_value().map(PrimitiveValue::Int),
            PrimitiveKind::Long => self.get_long_value().map(PrimitiveValue::Long),
            PrimitiveKind::Float => self.get_float_value().map(PrimitiveValue::Float),
            PrimitiveKind::Double => self.get_double_value().map(PrimitiveValue::Double),
            PrimitiveKind::Decimal => self.get_decimal_value().map(PrimitiveValue::Decimal),
            PrimitiveKind::String => self.get_string_value().map(PrimitiveValue::String),
            PrimitiveKind::Uuid => self.get_uuid_value().map(PrimitiveValue::Uuid),
            PrimitiveKind::Date => self.get_date_value().map(PrimitiveValue::Date),
            PrimitiveKind::Time => self.get_time_value().map(PrimitiveValue::Time),
            PrimitiveKind::DateTime => self.get_date_time_value().map(PrimitiveValue::DateTime),
            PrimitiveKind::Duration => self
                .get_period_and_duration_value()
                .map(PrimitiveValue::Duration),
            PrimitiveKind::Bytes => self.get_byte_array_value().map(PrimitiveValue::Bytes),
            PrimitiveKind::Void | PrimitiveKind::Stream => {
                return Err(unknown_kind(kind));
            }
        };
        Ok(value)
    }

    /// Reads an array of scalars; null items decode to `None`.
    ///
    /// Returns `Ok(None)` for a null node and fails for a non-array node.
    fn get_collection_of_primitive_values(
        &self,
        kind: PrimitiveKind,
    ) -> Result<Option<Vec<Option<PrimitiveValue>>>> {
        if !kind.is_node_value() {
            return Err(unknown_kind(kind));
        }
        match self.get_array_elements() {
            ArrayElements::Null => Ok(None),
            ArrayElements::NotAnArray => Err(expected_array()),
            ArrayElements::Items(items) => items
                .iter()
                .map(|item| item.get_primitive_value(kind))
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }
}

fn unknown_kind(kind: PrimitiveKind) -> KiotaError {
    KiotaError::UnsupportedType(format!("unknown type to deserialize {}", kind.name()))
}

fn expected_array() -> KiotaError {
    KiotaError::InvalidState("invalid state expected to have an array node".to_string())
}

impl dyn ParseNode + '_ {
    /// Decodes this node as a model.
    ///
    /// `factory` creates the instance, inspecting the node for a
    /// discriminator when the model is polymorphic. Every non-null field
    /// with a known name is then assigned; unknown fields go to the model's
    /// additional data if it keeps one and are skipped otherwise. The
    /// before/after assignment hooks wrap the whole field loop and only fire
    /// for object nodes.
    pub fn get_object_value<T, F>(&self, factory: F) -> Result<T>
    where
        T: Parsable + 'static,
        F: FnOnce(&dyn ParseNode) -> Result<T>,
    {
        let mut item = factory(self)?;
        let Some(fields) = self.get_field_nodes() else {
            return Ok(item);
        };
        let hooks = self.hooks().clone();
        hooks.fire_before(&mut item);
        assign_field_values(&mut item, fields)?;
        hooks.fire_after(&mut item);
        Ok(item)
    }

    /// Decodes an array of models; null items are skipped.
    ///
    /// Returns `Ok(None)` for a null or non-array node.
    pub fn get_collection_of_object_values<T, F>(&self, factory: F) -> Result<Option<Vec<T>>>
    where
        T: Parsable + 'static,
        F: Fn(&dyn ParseNode) -> Result<T>,
    {
        let ArrayElements::Items(items) = self.get_array_elements() else {
            return Ok(None);
        };
        let mut out = Vec::with_capacity(items.len());
        for item in &items {
            if item.is_null() {
                continue;
            }
            out.push(item.get_object_value(&factory)?);
        }
        Ok(Some(out))
    }

    /// Resolves the node's text as an enum member.
    ///
    /// Returns `None` for null, empty or unknown text.
    pub fn get_enum_value<E: ValuedEnum>(&self) -> Option<E> {
        let raw = self.get_string_value()?;
        if raw.is_empty() {
            return None;
        }
        E::for_value(&raw)
    }

    /// Resolves comma-separated text as a set of enum members.
    ///
    /// Tokens are matched as-is without trimming. Unknown tokens are dropped
    /// and repeated members keep their first position.
    pub fn get_enum_set_value<E: ValuedEnum + PartialEq>(&self) -> Option<Vec<E>> {
        let raw = self.get_string_value()?;
        if raw.is_empty() {
            return None;
        }
        let mut out: Vec<E> = Vec::new();
        for token in raw.split(',') {
            match E::for_value(token) {
                Some(member) if !out.contains(&member) => out.push(member),
                Some(_) => {}
                None => tracing::warn!(token, "dropping unknown enum set member"),
            }
        }
        Some(out)
    }

    /// Resolves an array of strings as enum members; unknown items yield `None`.
    ///
    /// Returns `Ok(None)` for a null node and fails for a non-array node.
    pub fn get_collection_of_enum_values<E: ValuedEnum>(&self) -> Result<Option<Vec<Option<E>>>> {
        match self.get_array_elements() {
            ArrayElements::Null => Ok(None),
            ArrayElements::NotAnArray => Err(expected_array()),
            ArrayElements::Items(items) => Ok(Some(
                items.iter().map(|item| item.get_enum_value::<E>()).collect(),
            )),
        }
    }

    /// Typed form of [`ParseNode::get_primitive_value`].
    pub fn get_primitive<T: Primitive>(&self) -> Result<Option<T>> {
        Ok(self
            .get_primitive_value(T::KIND)?
            .and_then(T::from_primitive))
    }

    /// Typed form of [`ParseNode::get_collection_of_primitive_values`].
    pub fn get_collection_of_primitives<T: Primitive>(&self) -> Result<Option<Vec<Option<T>>>> {
        Ok(self
            .get_collection_of_primitive_values(T::KIND)?
            .map(|items| {
                items
                    .into_iter()
                    .map(|item| item.and_then(T::from_primitive))
                    .collect()
            }))
    }
}

fn assign_field_values<T: Parsable + 'static>(
    item: &mut T,
    fields: Vec<(String, Box<dyn ParseNode>)>,
) -> Result<()> {
    let deserializers = item.field_deserializers();
    for (name, node) in fields {
        if node.is_null() {
            tracing::trace!(field = %name, "skipping null field");
            continue;
        }
        match deserializers.get(&name) {
            Some(assign) => assign(&mut *item, node.as_ref())?,
            None => {
                if let Some(data) = item.additional_data_mut() {
                    data.insert(name, node.get_any_value()?);
                } else {
                    tracing::trace!(field = %name, "skipping unknown field");
                }
            }
        }
    }
    Ok(())
}

/// Creates parse nodes for one content type.
pub trait ParseNodeFactory: Send + Sync {
    /// Returns the content type this factory accepts.
    fn valid_content_type(&self) -> &str;

    /// Decodes `content` into a root node whose descendants share `hooks`.
    fn get_parse_node_with_hooks(
        &self,
        content_type: &str,
        content: &[u8],
        hooks: ParseHooks,
    ) -> Result<Box<dyn ParseNode>>;

    /// Decodes `content` into a root node without hooks.
    fn get_parse_node(&self, content_type: &str, content: &[u8]) -> Result<Box<dyn ParseNode>> {
        self.get_parse_node_with_hooks(content_type, content, ParseHooks::default())
    }
}

/// Checks that `content_type` is non-empty and equal to `expected`.
pub fn validate_content_type(expected: &str, content_type: &str) -> Result<()> {
    if content_type.is_empty() {
        return Err(KiotaError::ContentType(
            "content type cannot be empty".to_string(),
        ));
    }
    if content_type != expected {
        return Err(KiotaError::ContentType(format!(
            "expected a {expected} content type"
        )));
    }
    Ok(())
}

/// Wraps a raw response body so it can be requested through [`Primitive`].
pub fn stream_value(body: Bytes) -> PrimitiveValue {
    PrimitiveValue::Bytes(body.to_vec())
}
