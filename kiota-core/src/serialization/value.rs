//! Dynamic value types used for primitive dispatch and additional data.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::PeriodAndDuration;

/// The closed set of scalar kinds a parse node or request adapter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// Arbitrary-precision decimal.
    Decimal,
    /// `String`
    String,
    /// `Uuid`
    Uuid,
    /// Calendar date without a time zone.
    Date,
    /// Time of day without a time zone.
    Time,
    /// Date and time with a UTC offset.
    DateTime,
    /// ISO-8601 period and duration.
    Duration,
    /// Base64 encoded bytes.
    Bytes,
    /// No value; only meaningful as a response target.
    Void,
    /// The raw response body; only meaningful as a response target.
    Stream,
}

impl PrimitiveKind {
    /// Returns a short lowercase name for the kind.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::String => "string",
            PrimitiveKind::Uuid => "uuid",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Time => "time",
            PrimitiveKind::DateTime => "datetime",
            PrimitiveKind::Duration => "duration",
            PrimitiveKind::Bytes => "bytes",
            PrimitiveKind::Void => "void",
            PrimitiveKind::Stream => "stream",
        }
    }

    /// Returns `true` if values of this kind can be read from a parse node.
    pub fn is_node_value(&self) -> bool {
        !matches!(self, PrimitiveKind::Void | PrimitiveKind::Stream)
    }
}

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// A boolean.
    Bool(bool),
    /// An 8-bit integer.
    Byte(i8),
    /// A 16-bit integer.
    Short(i16),
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A 32-bit float.
    Float(f32),
    /// A 64-bit float.
    Double(f64),
    /// A decimal.
    Decimal(Decimal),
    /// A string.
    String(String),
    /// A UUID.
    Uuid(Uuid),
    /// A date.
    Date(NaiveDate),
    /// A time of day.
    Time(NaiveTime),
    /// An offset date-time.
    DateTime(DateTime<FixedOffset>),
    /// A period and duration.
    Duration(PeriodAndDuration),
    /// A byte array.
    Bytes(Vec<u8>),
}

impl PrimitiveValue {
    /// Returns the kind of this value.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            PrimitiveValue::Bool(_) => PrimitiveKind::Bool,
            PrimitiveValue::Byte(_) => PrimitiveKind::Byte,
            PrimitiveValue::Short(_) => PrimitiveKind::Short,
            PrimitiveValue::Int(_) => PrimitiveKind::Int,
            PrimitiveValue::Long(_) => PrimitiveKind::Long,
            PrimitiveValue::Float(_) => PrimitiveKind::Float,
            PrimitiveValue::Double(_) => PrimitiveKind::Double,
            PrimitiveValue::Decimal(_) => PrimitiveKind::Decimal,
            PrimitiveValue::String(_) => PrimitiveKind::String,
            PrimitiveValue::Uuid(_) => PrimitiveKind::Uuid,
            PrimitiveValue::Date(_) => PrimitiveKind::Date,
            PrimitiveValue::Time(_) => PrimitiveKind::Time,
            PrimitiveValue::DateTime(_) => PrimitiveKind::DateTime,
            PrimitiveValue::Duration(_) => PrimitiveKind::Duration,
            PrimitiveValue::Bytes(_) => PrimitiveKind::Bytes,
        }
    }

    /// Returns the string content if this is a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A Rust type that maps to exactly one [`PrimitiveKind`].
///
/// Implemented for the scalar types a parse node can decode, and for `()`
/// ([`PrimitiveKind::Void`]) and [`Bytes`] ([`PrimitiveKind::Stream`]) as
/// response targets.
pub trait Primitive: Sized {
    /// The kind this type decodes from.
    const KIND: PrimitiveKind;

    /// Extracts `Self` from a value of the matching kind.
    fn from_primitive(value: PrimitiveValue) -> Option<Self>;
}

macro_rules! primitive {
    ($ty:ty, $variant:ident) => {
        impl Primitive for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$variant;

            fn from_primitive(value: PrimitiveValue) -> Option<Self> {
                match value {
                    PrimitiveValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$ty> for PrimitiveValue {
            fn from(value: $ty) -> Self {
                PrimitiveValue::$variant(value)
            }
        }

        impl From<$ty> for AnyValue {
            fn from(value: $ty) -> Self {
                AnyValue::Primitive(PrimitiveValue::$variant(value))
            }
        }
    };
}

primitive!(bool, Bool);
primitive!(i8, Byte);
primitive!(i16, Short);
primitive!(i32, Int);
primitive!(i64, Long);
primitive!(f32, Float);
primitive!(f64, Double);
primitive!(Decimal, Decimal);
primitive!(String, String);
primitive!(Uuid, Uuid);
primitive!(NaiveDate, Date);
primitive!(NaiveTime, Time);
primitive!(DateTime<FixedOffset>, DateTime);
primitive!(PeriodAndDuration, Duration);
primitive!(Vec<u8>, Bytes);

impl Primitive for () {
    const KIND: PrimitiveKind = PrimitiveKind::Void;

    fn from_primitive(_: PrimitiveValue) -> Option<Self> {
        None
    }
}

impl Primitive for Bytes {
    const KIND: PrimitiveKind = PrimitiveKind::Stream;

    fn from_primitive(value: PrimitiveValue) -> Option<Self> {
        match value {
            PrimitiveValue::Bytes(v) => Some(Bytes::from(v)),
            _ => None,
        }
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::String(value.to_string())
    }
}

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::Primitive(PrimitiveValue::String(value.to_string()))
    }
}

/// Untyped values: the additional data of a model, or the argument of
/// [`SerializationWriter::write_any_value`](super::SerializationWriter::write_any_value).
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    /// An explicit null.
    Null,
    /// A scalar.
    Primitive(PrimitiveValue),
    /// An ordered list of values.
    Collection(Vec<AnyValue>),
    /// An ordered list of named values, written as an object.
    Object(Vec<(String, AnyValue)>),
    /// An undecoded JSON subtree, kept as-is.
    Node(serde_json::Value),
}

impl AnyValue {
    /// Builds an object value from anything that exposes named fields.
    pub fn from_encodable(value: &dyn Encodable) -> Self {
        AnyValue::Object(value.encode_fields())
    }

    /// Returns `true` for [`AnyValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, AnyValue::Null)
    }

    /// Returns the scalar if this is a primitive value.
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            AnyValue::Primitive(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the string content if this is a string primitive.
    pub fn as_str(&self) -> Option<&str> {
        self.as_primitive()?.as_str()
    }
}

impl From<PrimitiveValue> for AnyValue {
    fn from(value: PrimitiveValue) -> Self {
        AnyValue::Primitive(value)
    }
}

impl From<Vec<AnyValue>> for AnyValue {
    fn from(value: Vec<AnyValue>) -> Self {
        AnyValue::Collection(value)
    }
}

impl<T: Into<AnyValue>> From<Option<T>> for AnyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AnyValue::Null, Into::into)
    }
}

/// A plain value type that is not [`Parsable`](super::Parsable) but can list its
/// fields for [`AnyValue::Object`] serialization.
pub trait Encodable {
    /// Returns the named fields in write order.
    fn encode_fields(&self) -> Vec<(String, AnyValue)>;
}

/// Unknown properties captured during deserialization, keyed by JSON field name.
pub type AdditionalData = BTreeMap<String, AnyValue>;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode<T: Primitive>(value: PrimitiveValue) -> Option<T> {
        T::from_primitive(value)
    }

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(PrimitiveValue::from(5i32).kind(), PrimitiveKind::Int);
        assert_eq!(PrimitiveValue::from("x").kind(), PrimitiveKind::String);
        assert_eq!(PrimitiveValue::from(vec![1u8]).kind(), PrimitiveKind::Bytes);
        assert_eq!(<i64 as Primitive>::KIND, PrimitiveKind::Long);
        assert_eq!(<() as Primitive>::KIND, PrimitiveKind::Void);
        assert_eq!(<Bytes as Primitive>::KIND, PrimitiveKind::Stream);
    }

    #[test]
    fn test_from_primitive_requires_matching_kind() {
        assert_eq!(decode::<i32>(PrimitiveValue::Int(7)), Some(7));
        assert_eq!(decode::<i32>(PrimitiveValue::Long(7)), None);
        assert_eq!(
            decode::<Bytes>(PrimitiveValue::Bytes(vec![1, 2])),
            Some(Bytes::from_static(&[1, 2]))
        );
    }

    #[test]
    fn test_node_value_kinds() {
        assert!(PrimitiveKind::Decimal.is_node_value());
        assert!(!PrimitiveKind::Void.is_node_value());
        assert!(!PrimitiveKind::Stream.is_node_value());
    }

    #[test]
    fn test_option_into_any_value() {
        assert_eq!(AnyValue::from(None::<i32>), AnyValue::Null);
        assert_eq!(
            AnyValue::from(Some("a")),
            AnyValue::Primitive(PrimitiveValue::String("a".into()))
        );
        assert_eq!(AnyValue::from("a").as_str(), Some("a"));
    }

    struct Point {
        x: i32,
        y: i32,
    }

    impl Encodable for Point {
        fn encode_fields(&self) -> Vec<(String, AnyValue)> {
            vec![("x".into(), self.x.into()), ("y".into(), self.y.into())]
        }
    }

    #[test]
    fn test_from_encodable() {
        let value = AnyValue::from_encodable(&Point { x: 1, y: 2 });
        let AnyValue::Object(fields) = value else {
            panic!("expected object");
        };
        assert_eq!(fields[0], ("x".to_string(), AnyValue::from(1i32)));
        assert_eq!(fields[1], ("y".to_string(), AnyValue::from(2i32)));
    }
}
