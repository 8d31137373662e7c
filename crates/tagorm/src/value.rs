//! Bound field values.
//!
//! [`Value`] is the closed set of column values a record can bind into an INSERT or
//! UPDATE. It implements [`ToSql`] by delegating to the wrapped type's driver encoding,
//! so the fragment generator and the execution handle exchange typed values instead of
//! type-erased trait objects.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::fmt::Write;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Json(serde_json::Value),
    /// Postgres array; element encoding is left to the driver.
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render this value as a SQL literal.
    ///
    /// Used for statement logging only; statements sent to the server always bind
    /// values as parameters.
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::Int2(v) => v.to_string(),
            Value::Int4(v) => v.to_string(),
            Value::Int8(v) => v.to_string(),
            Value::Float4(v) => v.to_string(),
            Value::Float8(v) => v.to_string(),
            Value::Text(v) => quote_literal(v),
            Value::Bytes(v) => {
                let mut out = String::with_capacity(v.len() * 2 + 5);
                out.push_str("'\\x");
                for b in v {
                    let _ = write!(out, "{b:02x}");
                }
                out.push('\'');
                out
            }
            Value::Uuid(v) => quote_literal(&v.to_string()),
            Value::Timestamp(v) => quote_literal(&v.to_string()),
            Value::TimestampTz(v) => quote_literal(&v.to_rfc3339()),
            Value::Date(v) => quote_literal(&v.to_string()),
            Value::Json(v) => quote_literal(&v.to_string()),
            Value::Array(items) => {
                let inner: Vec<String> = items.iter().map(Value::to_literal).collect();
                format!("ARRAY[{}]", inner.join(", "))
            }
        }
    }
}

/// Quote `s` as a single-quoted SQL string literal, doubling embedded quotes.
pub(crate) fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int2(v) => v.to_sql_checked(ty, out),
            Value::Int4(v) => v.to_sql_checked(ty, out),
            Value::Int8(v) => v.to_sql_checked(ty, out),
            Value::Float4(v) => v.to_sql_checked(ty, out),
            Value::Float8(v) => v.to_sql_checked(ty, out),
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Array(items) => items.to_sql_checked(ty, out),
        }
    }

    // Type checking happens per variant inside `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Conversion from a record field into a [`Value`].
///
/// Implemented for the column types `#[derive(Record)]` can bind. Fields of other
/// types must be marked `#[record(skip)]` or converted by hand.
pub trait IntoValue {
    fn into_value(&self) -> Value;
}

impl IntoValue for Value {
    fn into_value(&self) -> Value {
        self.clone()
    }
}

macro_rules! impl_into_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(&self) -> Value {
                    Value::$variant(self.clone())
                }
            }
        )+
    };
}

impl_into_value!(
    bool => Bool,
    i16 => Int2,
    i32 => Int4,
    i64 => Int8,
    f32 => Float4,
    f64 => Float8,
    String => Text,
    Vec<u8> => Bytes,
    Uuid => Uuid,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    NaiveDate => Date,
    serde_json::Value => Json,
);

// Unsigned integers widen into the next signed Postgres type.
impl IntoValue for u8 {
    fn into_value(&self) -> Value {
        Value::Int2(i16::from(*self))
    }
}

impl IntoValue for u16 {
    fn into_value(&self) -> Value {
        Value::Int4(i32::from(*self))
    }
}

impl IntoValue for u32 {
    fn into_value(&self) -> Value {
        Value::Int8(i64::from(*self))
    }
}

impl IntoValue for str {
    fn into_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: IntoValue + ?Sized> IntoValue for &T {
    fn into_value(&self) -> Value {
        (**self).into_value()
    }
}

impl<T: IntoValue + ?Sized> IntoValue for Box<T> {
    fn into_value(&self) -> Value {
        (**self).into_value()
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(&self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

macro_rules! impl_array_into_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IntoValue for Vec<$ty> {
                fn into_value(&self) -> Value {
                    Value::Array(self.iter().map(IntoValue::into_value).collect())
                }
            }
        )+
    };
}

impl_array_into_value!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    String,
    Uuid,
    NaiveDateTime,
    DateTime<Utc>,
    NaiveDate,
    serde_json::Value,
    Option<i32>,
    Option<i64>,
    Option<String>,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: IntoValue> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.into_value()
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    v.into_value()
                }
            }
        )+
    };
}

impl_from_for_value!(
    bool,
    i16,
    i32,
    i64,
    f32,
    f64,
    u8,
    u16,
    u32,
    String,
    Vec<u8>,
    Uuid,
    NaiveDateTime,
    DateTime<Utc>,
    NaiveDate,
    serde_json::Value,
    Vec<i32>,
    Vec<i64>,
    Vec<String>,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(None::<i64>.into_value(), Value::Null);
        assert_eq!(Some(7_i64).into_value(), Value::Int8(7));
    }

    #[test]
    fn unsigned_widen() {
        assert_eq!(3_u8.into_value(), Value::Int2(3));
        assert_eq!(u16::MAX.into_value(), Value::Int4(65535));
        assert_eq!(u32::MAX.into_value(), Value::Int8(4_294_967_295));
    }

    #[test]
    fn vectors_become_arrays_except_bytes() {
        assert_eq!(
            vec![1_i32, 2].into_value(),
            Value::Array(vec![Value::Int4(1), Value::Int4(2)])
        );
        assert_eq!(vec![0xde_u8, 0xad].into_value(), Value::Bytes(vec![0xde, 0xad]));
    }

    #[test]
    fn literals_escape_quotes() {
        assert_eq!(Value::from("it's").to_literal(), "'it''s'");
        assert_eq!(Value::Null.to_literal(), "NULL");
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_literal(), "'\\xdead'");
        assert_eq!(
            Value::from(vec!["a".to_string(), "b".to_string()]).to_literal(),
            "ARRAY['a', 'b']"
        );
    }

    #[test]
    fn null_encodes_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::INT8, &mut buf).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn scalar_encoding_checks_inner_type() {
        let mut buf = BytesMut::new();
        assert!(Value::Int8(1).to_sql(&Type::INT8, &mut buf).is_ok());
        assert_eq!(buf.len(), 8);

        let mut buf = BytesMut::new();
        assert!(Value::Int8(1).to_sql(&Type::TEXT, &mut buf).is_err());
    }

    #[test]
    fn arrays_delegate_to_driver() {
        let mut buf = BytesMut::new();
        let v = Value::Array(vec![Value::Int4(1), Value::Int4(2)]);
        assert!(v.to_sql(&Type::INT4_ARRAY, &mut buf).is_ok());
        assert!(!buf.is_empty());
    }
}
