//! Format-independent writer for models and scalars.

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::Result;

use super::{
    AdditionalData, AnyValue, Parsable, PeriodAndDuration, PrimitiveValue, ValuedEnum,
    WriterHooks,
};

/// Builds a serialized payload value by value.
///
/// Every write takes an optional key: `Some(key)` writes a named field of the
/// enclosing object, `None` writes a bare value (the root, an array item, or
/// the merged value of a composed type wrapper). Writing `None` as the value
/// of a keyed field omits the field entirely.
pub trait SerializationWriter: Send {
    /// Returns the hooks invoked around each written model.
    fn hooks(&self) -> &WriterHooks;

    /// Replaces the hooks invoked around each written model.
    fn set_hooks(&mut self, hooks: WriterHooks);

    /// Writes a string.
    fn write_string_value(&mut self, key: Option<&str>, value: Option<&str>) -> Result<()>;

    /// Writes a boolean.
    fn write_bool_value(&mut self, key: Option<&str>, value: Option<bool>) -> Result<()>;

    /// Writes an `i8`.
    fn write_byte_value(&mut self, key: Option<&str>, value: Option<i8>) -> Result<()>;

    /// Writes an `i16`.
    fn write_short_value(&mut self, key: Option<&str>, value: Option<i16>) -> Result<()>;

    /// Writes an `i32`.
    fn write_int_value(&mut self, key: Option<&str>, value: Option<i32>) -> Result<()>;

    /// Writes an `i64`.
    fn write_long_value(&mut self, key: Option<&str>, value: Option<i64>) -> Result<()>;

    /// Writes an `f32`.
    fn write_float_value(&mut self, key: Option<&str>, value: Option<f32>) -> Result<()>;

    /// Writes an `f64`.
    fn write_double_value(&mut self, key: Option<&str>, value: Option<f64>) -> Result<()>;

    /// Writes a decimal.
    fn write_decimal_value(&mut self, key: Option<&str>, value: Option<Decimal>) -> Result<()>;

    /// Writes a UUID as text.
    fn write_uuid_value(&mut self, key: Option<&str>, value: Option<Uuid>) -> Result<()>;

    /// Writes an offset date-time as RFC 3339 text.
    fn write_date_time_value(
        &mut self,
        key: Option<&str>,
        value: Option<DateTime<FixedOffset>>,
    ) -> Result<()>;

    /// Writes a date as `YYYY-MM-DD`.
    fn write_date_value(&mut self, key: Option<&str>, value: Option<NaiveDate>) -> Result<()>;

    /// Writes a time of day as ISO-8601 text.
    fn write_time_value(&mut self, key: Option<&str>, value: Option<NaiveTime>) -> Result<()>;

    /// Writes a period and duration as ISO-8601 text.
    fn write_period_and_duration_value(
        &mut self,
        key: Option<&str>,
        value: Option<PeriodAndDuration>,
    ) -> Result<()>;

    /// Writes bytes as base64 text.
    fn write_byte_array_value(&mut self, key: Option<&str>, value: Option<&[u8]>) -> Result<()>;

    /// Writes an explicit null.
    fn write_null_value(&mut self, key: Option<&str>) -> Result<()>;

    /// Writes an array of scalars.
    fn write_collection_of_primitive_values(
        &mut self,
        key: Option<&str>,
        values: Option<&[PrimitiveValue]>,
    ) -> Result<()>;

    /// Writes a model.
    ///
    /// `additional` values are merged into the same JSON value: for a plain
    /// model they are written as extra fields of its object; when `value`
    /// is a composed type wrapper, the first present member becomes the
    /// value itself.
    fn write_object_value(
        &mut self,
        key: Option<&str>,
        value: Option<&dyn Parsable>,
        additional: &[&dyn Parsable],
    ) -> Result<()>;

    /// Writes an array of models.
    fn write_collection_of_object_values(
        &mut self,
        key: Option<&str>,
        values: Option<&[&dyn Parsable]>,
    ) -> Result<()>;

    /// Writes an untyped value.
    fn write_any_value(&mut self, key: Option<&str>, value: &AnyValue) -> Result<()>;

    /// Returns the finished payload and resets the writer.
    fn get_serialized_content(&mut self) -> Result<Bytes>;

    /// Writes a scalar by dispatching on its kind.
    fn write_primitive_value(&mut self, key: Option<&str>, value: &PrimitiveValue) -> Result<()> {
        match value {
            PrimitiveValue::Bool(v) => self.write_bool_value(key, Some(*v)),
            PrimitiveValue::Byte(v) => self.write_byte_value(key, Some(*v)),
            PrimitiveValue::Short(v) => self.write_short_value(key, Some(*v)),
            PrimitiveValue::Int(v) => self.write_int_value(key, Some(*v)),
            PrimitiveValue::Long(v) => self.write_long_value(key, Some(*v)),
            PrimitiveValue::Float(v) => self.write_float_value(key, Some(*v)),
            PrimitiveValue::Double(v) => self.write_double_value(key, Some(*v)),
            PrimitiveValue::Decimal(v) => self.write_decimal_value(key, Some(*v)),
            PrimitiveValue::String(v) => self.write_string_value(key, Some(v)),
            PrimitiveValue::Uuid(v) => self.write_uuid_value(key, Some(*v)),
            PrimitiveValue::Date(v) => self.write_date_value(key, Some(*v)),
            PrimitiveValue::Time(v) => self.write_time_value(key, Some(*v)),
            PrimitiveValue::DateTime(v) => self.write_date_time_value(key, Some(*v)),
            PrimitiveValue::Duration(v) => self.write_period_and_duration_value(key, Some(*v)),
            PrimitiveValue::Bytes(v) => self.write_byte_array_value(key, Some(v)),
        }
    }

    /// Writes each entry of a model's additional data as a field.
    fn write_additional_data(&mut self, data: &AdditionalData) -> Result<()> {
        for (name, value) in data {
            self.write_any_value(Some(name.as_str()), value)?;
        }
        Ok(())
    }
}

impl dyn SerializationWriter + '_ {
    /// Writes an optional model with no merged values.
    pub fn write_object<T: Parsable>(&mut self, key: Option<&str>, value: Option<&T>) -> Result<()> {
        self.write_object_value(key, value.map(|v| v as &dyn Parsable), &[])
    }

    /// Writes an optional slice of models.
    pub fn write_objects<T: Parsable>(
        &mut self,
        key: Option<&str>,
        values: Option<&[T]>,
    ) -> Result<()> {
        match values {
            Some(values) => {
                let refs: Vec<&dyn Parsable> = values.iter().map(|v| v as &dyn Parsable).collect();
                self.write_collection_of_object_values(key, Some(&refs))
            }
            None => self.write_collection_of_object_values(key, None),
        }
    }

    /// Writes an optional slice of scalars.
    pub fn write_primitives<T>(&mut self, key: Option<&str>, values: Option<&[T]>) -> Result<()>
    where
        T: Clone + Into<PrimitiveValue>,
    {
        match values {
            Some(values) => {
                let converted: Vec<PrimitiveValue> =
                    values.iter().cloned().map(Into::into).collect();
                self.write_collection_of_primitive_values(key, Some(&converted))
            }
            None => self.write_collection_of_primitive_values(key, None),
        }
    }

    /// Writes an enum member as its serialized text.
    pub fn write_enum<E: ValuedEnum>(&mut self, key: Option<&str>, value: Option<&E>) -> Result<()> {
        self.write_string_value(key, value.map(ValuedEnum::value))
    }

    /// Writes a set of enum members as one comma-separated string.
    ///
    /// An empty set omits the field.
    pub fn write_enum_set<E: ValuedEnum>(
        &mut self,
        key: Option<&str>,
        values: Option<&[E]>,
    ) -> Result<()> {
        let joined = values
            .filter(|v| !v.is_empty())
            .map(|v| v.iter().map(ValuedEnum::value).collect::<Vec<_>>().join(","));
        self.write_string_value(key, joined.as_deref())
    }

    /// Writes enum members as an array of strings.
    pub fn write_enums<E: ValuedEnum>(&mut self, key: Option<&str>, values: Option<&[E]>) -> Result<()> {
        match values {
            Some(values) => {
                let texts: Vec<PrimitiveValue> = values
                    .iter()
                    .map(|v| PrimitiveValue::String(v.value().to_string()))
                    .collect();
                self.write_collection_of_primitive_values(key, Some(&texts))
            }
            None => self.write_collection_of_primitive_values(key, None),
        }
    }
}

/// Creates serialization writers for one content type.
pub trait SerializationWriterFactory: Send + Sync {
    /// Returns the content type this factory produces.
    fn valid_content_type(&self) -> &str;

    /// Creates a fresh writer for `content_type`.
    fn get_serialization_writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>>;
}
