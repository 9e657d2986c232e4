use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::serialization::{AnyValue, PeriodAndDuration};

use super::scalar;

/// Scalar conversions used by [`JsonParseNode`](super::JsonParseNode).
///
/// Every method has a default built on the functions in
/// [`scalar`](super::scalar). Implement this trait and override individual
/// methods to change how particular scalars are read, then pass the decoder
/// to [`JsonParseNodeFactory::with_decoder`](super::JsonParseNodeFactory::with_decoder).
/// Child nodes inherit the decoder of their parent.
pub trait JsonValueDecoder: Send + Sync {
    /// Reads a string.
    fn decode_string(&self, value: &Value) -> Option<String> {
        scalar::string(value)
    }

    /// Reads a boolean.
    fn decode_bool(&self, value: &Value) -> Option<bool> {
        scalar::boolean(value)
    }

    /// Reads an `i8`.
    fn decode_byte(&self, value: &Value) -> Option<i8> {
        scalar::byte(value)
    }

    /// Reads an `i16`.
    fn decode_short(&self, value: &Value) -> Option<i16> {
        scalar::short(value)
    }

    /// Reads an `i32`.
    fn decode_int(&self, value: &Value) -> Option<i32> {
        scalar::int(value)
    }

    /// Reads an `i64`.
    fn decode_long(&self, value: &Value) -> Option<i64> {
        scalar::long(value)
    }

    /// Reads an `f32`.
    fn decode_float(&self, value: &Value) -> Option<f32> {
        scalar::float(value)
    }

    /// Reads an `f64`.
    fn decode_double(&self, value: &Value) -> Option<f64> {
        scalar::double(value)
    }

    /// Reads a decimal.
    fn decode_decimal(&self, value: &Value) -> Option<Decimal> {
        scalar::decimal(value)
    }

    /// Reads a UUID.
    fn decode_uuid(&self, value: &Value) -> Option<Uuid> {
        scalar::uuid(value)
    }

    /// Reads an offset date-time.
    fn decode_date_time(&self, value: &Value) -> Option<DateTime<FixedOffset>> {
        scalar::date_time(value)
    }

    /// Reads a date.
    fn decode_date(&self, value: &Value) -> Option<NaiveDate> {
        scalar::date(value)
    }

    /// Reads a time of day.
    fn decode_time(&self, value: &Value) -> Option<NaiveTime> {
        scalar::time(value)
    }

    /// Reads a period and duration.
    fn decode_period_and_duration(&self, value: &Value) -> Option<PeriodAndDuration> {
        scalar::period_and_duration(value)
    }

    /// Reads base64 bytes.
    fn decode_byte_array(&self, value: &Value) -> Option<Vec<u8>> {
        scalar::byte_array(value)
    }

    /// Reads an untyped value.
    fn decode_any(&self, value: &Value) -> Result<AnyValue> {
        scalar::any(value)
    }
}

/// The decoder with every default conversion.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultJsonValueDecoder;

impl JsonValueDecoder for DefaultJsonValueDecoder {}
