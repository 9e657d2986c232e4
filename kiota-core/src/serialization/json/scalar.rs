//! Conversions from JSON values to scalars.
//!
//! Each function returns `None` when the value has the wrong shape or its
//! text does not parse; malformed text is logged at debug level.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{KiotaError, Result};
use crate::serialization::{AnyValue, PeriodAndDuration, PrimitiveValue};

fn text(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn parse_text<T, E, F>(value: &Value, what: &str, parse: F) -> Option<T>
where
    E: std::fmt::Display,
    F: FnOnce(&str) -> std::result::Result<T, E>,
{
    let raw = text(value)?;
    match parse(raw) {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::debug!(value = raw, error = %err, "ignoring malformed {what}");
            None
        }
    }
}

/// Reads a JSON string.
pub fn string(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Reads a JSON boolean.
pub fn boolean(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Reads an integral number in `i8` range.
pub fn byte(value: &Value) -> Option<i8> {
    value.as_i64().and_then(|v| i8::try_from(v).ok())
}

/// Reads an `i64`, truncating a floating value that fits.
fn truncated(value: &Value, min: f64, max: f64) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    let v = value.as_f64()?;
    if v.is_finite() && v >= min && v <= max {
        Some(v.trunc() as i64)
    } else {
        None
    }
}

/// Reads a number in `i16` range.
pub fn short(value: &Value) -> Option<i16> {
    truncated(value, f64::from(i16::MIN), f64::from(i16::MAX)).and_then(|v| i16::try_from(v).ok())
}

/// Reads a number in `i32` range.
pub fn int(value: &Value) -> Option<i32> {
    truncated(value, f64::from(i32::MIN), f64::from(i32::MAX)).and_then(|v| i32::try_from(v).ok())
}

/// Reads a number in `i64` range.
pub fn long(value: &Value) -> Option<i64> {
    truncated(value, i64::MIN as f64, i64::MAX as f64)
}

/// Reads a number that rounds to a finite `f32`.
pub fn float(value: &Value) -> Option<f32> {
    let v = value.as_f64()? as f32;
    v.is_finite().then_some(v)
}

/// Reads a number as `f64`.
pub fn double(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// Reads a number as a decimal, keeping the literal digits when possible.
pub fn decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(number) = value else {
        return None;
    };
    let literal = number.to_string();
    Decimal::from_str(&literal)
        .or_else(|_| Decimal::from_scientific(&literal))
        .map_err(|err| tracing::debug!(value = %literal, error = %err, "number out of decimal range"))
        .ok()
}

/// Parses a textual UUID.
pub fn uuid(value: &Value) -> Option<Uuid> {
    parse_text(value, "uuid", Uuid::parse_str)
}

/// Parses RFC 3339 date-time text.
pub fn date_time(value: &Value) -> Option<DateTime<FixedOffset>> {
    parse_text(value, "date-time", DateTime::parse_from_rfc3339)
}

/// Parses `YYYY-MM-DD` text.
pub fn date(value: &Value) -> Option<NaiveDate> {
    parse_text(value, "date", |s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
}

/// Parses `HH:MM[:SS[.fff]]` text.
pub fn time(value: &Value) -> Option<NaiveTime> {
    parse_text(value, "time", |s| {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    })
}

/// Parses ISO-8601 period and duration text.
pub fn period_and_duration(value: &Value) -> Option<PeriodAndDuration> {
    parse_text(value, "duration", PeriodAndDuration::from_str)
}

/// Decodes standard base64 text; an empty string reads as absent.
pub fn byte_array(value: &Value) -> Option<Vec<u8>> {
    parse_text(value, "base64", |s| STANDARD.decode(s))
}

/// Reads any JSON value for additional data.
///
/// Integers become `Int` when they fit in 32 bits and `Long` otherwise;
/// other numbers become `Double`. Objects and arrays are kept undecoded.
pub fn any(value: &Value) -> Result<AnyValue> {
    Ok(match value {
        Value::Null => AnyValue::Null,
        Value::Bool(b) => AnyValue::Primitive(PrimitiveValue::Bool(*b)),
        Value::String(s) => AnyValue::Primitive(PrimitiveValue::String(s.clone())),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                match i32::try_from(v) {
                    Ok(small) => AnyValue::Primitive(PrimitiveValue::Int(small)),
                    Err(_) => AnyValue::Primitive(PrimitiveValue::Long(v)),
                }
            } else if n.is_u64() {
                return Err(KiotaError::Serialization(format!(
                    "could not get the value during deserialization, unknown primitive type: {n}"
                )));
            } else {
                match n.as_f64() {
                    Some(v) => AnyValue::Primitive(PrimitiveValue::Double(v)),
                    None => {
                        return Err(KiotaError::Serialization(format!(
                            "could not get the value during deserialization, unknown primitive type: {n}"
                        )))
                    }
                }
            }
        }
        Value::Array(_) | Value::Object(_) => AnyValue::Node(value.clone()),
    })
}
