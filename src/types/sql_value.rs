use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Represents a SQL value in a driver-agnostic way.
/// Drivers are responsible for converting these to and from their native types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<Utc>),
    Uuid(Uuid),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Name of the SQL type carried by this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Bool(_) => "BOOLEAN",
            SqlValue::Int16(_) => "SMALLINT",
            SqlValue::Int32(_) => "INTEGER",
            SqlValue::Int64(_) => "BIGINT",
            SqlValue::Float32(_) => "REAL",
            SqlValue::Float64(_) => "DOUBLE PRECISION",
            SqlValue::Decimal(_) => "NUMERIC",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Bytes(_) => "BYTEA",
            SqlValue::Date(_) => "DATE",
            SqlValue::DateTime(_) => "TIMESTAMP",
            SqlValue::DateTimeTz(_) => "TIMESTAMPTZ",
            SqlValue::Uuid(_) => "UUID",
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<u8> for SqlValue {
    fn from(value: u8) -> Self {
        SqlValue::Int16(i16::from(value))
    }
}

impl From<i16> for SqlValue {
    fn from(value: i16) -> Self {
        SqlValue::Int16(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int32(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int64(value)
    }
}

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float32(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float64(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Decimal(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<Vec<char>> for SqlValue {
    fn from(value: Vec<char>) -> Self {
        SqlValue::Text(value.into_iter().collect())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::DateTimeTz(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Conversion out of a [`SqlValue`].
///
/// Returns `None` when the value cannot be represented as `Self`. Integer
/// widening and `Text` to `Vec<char>` are the only implicit coercions.
pub trait FromSqlValue: Sized {
    fn from_sql_value(value: &SqlValue) -> Option<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromSqlValue for u8 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int16(n) => u8::try_from(*n).ok(),
            SqlValue::Int32(n) => u8::try_from(*n).ok(),
            SqlValue::Int64(n) => u8::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl FromSqlValue for i16 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int16(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int16(n) => Some(i32::from(*n)),
            SqlValue::Int32(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Int16(n) => Some(i64::from(*n)),
            SqlValue::Int32(n) => Some(i64::from(*n)),
            SqlValue::Int64(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromSqlValue for f32 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float32(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromSqlValue for f64 {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Float32(n) => Some(f64::from(*n)),
            SqlValue::Float64(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromSqlValue for Decimal {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Decimal(d) => Some(*d),
            SqlValue::Int16(n) => Some(Decimal::from(*n)),
            SqlValue::Int32(n) => Some(Decimal::from(*n)),
            SqlValue::Int64(n) => Some(Decimal::from(*n)),
            _ => None,
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<char> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Text(s) => Some(s.chars().collect()),
            _ => None,
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDate {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::DateTime(dt) => Some(*dt),
            SqlValue::DateTimeTz(dt) => Some(dt.naive_utc()),
            _ => None,
        }
    }
}

impl FromSqlValue for DateTime<Utc> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::DateTimeTz(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl FromSqlValue for Uuid {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: &SqlValue) -> Option<Self> {
        match value {
            SqlValue::Null => Some(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_into_null() {
        let v: SqlValue = None::<i32>.into();
        assert!(v.is_null());
        let v: SqlValue = Some("x").into();
        assert_eq!(v, SqlValue::Text("x".to_string()));
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(i64::from_sql_value(&SqlValue::Int16(7)), Some(7));
        assert_eq!(i32::from_sql_value(&SqlValue::Int64(7)), None);
        assert_eq!(u8::from_sql_value(&SqlValue::Int32(300)), None);
    }

    #[test]
    fn test_nullable_targets() {
        assert_eq!(
            Option::<String>::from_sql_value(&SqlValue::Null),
            Some(None)
        );
        assert_eq!(String::from_sql_value(&SqlValue::Null), None);
        assert_eq!(
            Option::<bool>::from_sql_value(&SqlValue::Bool(true)),
            Some(Some(true))
        );
    }

    #[test]
    fn test_chars_from_text() {
        let chars = Vec::<char>::from_sql_value(&SqlValue::Text("ab".into())).unwrap();
        assert_eq!(chars, vec!['a', 'b']);
    }
}
