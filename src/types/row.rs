use std::any::type_name;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{Result, RowBindError};
use crate::types::{find_column, Cursor, FromSqlValue, SqlValue};

/// A view of one result row.
///
/// Columns can be read by ordinal, by name, or as a dynamic member. Typed
/// getters convert through [`FromSqlValue`] and fail with
/// [`RowBindError::Conversion`] on a type mismatch.
#[derive(Debug, Clone, Copy)]
pub struct DynamicRow<'a> {
    columns: &'a [String],
    values: &'a [SqlValue],
}

impl<'a> DynamicRow<'a> {
    pub(crate) fn new(columns: &'a [String], values: &'a [SqlValue]) -> Self {
        Self { columns, values }
    }

    /// Views the row a cursor is currently positioned on.
    pub fn from_cursor(cursor: &'a Cursor) -> Result<Self> {
        let values = cursor.current().ok_or(RowBindError::NoCurrentRow)?;
        Ok(Self::new(cursor.columns(), values))
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    /// Returns all values in column order.
    pub fn values(&self) -> &'a [SqlValue] {
        self.values
    }

    pub fn name(&self, index: usize) -> Result<&'a str> {
        self.columns
            .get(index)
            .map(|s| s.as_str())
            .ok_or(RowBindError::IndexOutOfRange {
                index,
                field_count: self.field_count(),
            })
    }

    pub fn ordinal(&self, name: &str) -> Result<usize> {
        find_column(self.columns, name).ok_or_else(|| RowBindError::UnknownColumn(name.to_string()))
    }

    /// Gets a value by column index.
    pub fn get(&self, index: usize) -> Result<&'a SqlValue> {
        self.values.get(index).ok_or(RowBindError::IndexOutOfRange {
            index,
            field_count: self.field_count(),
        })
    }

    /// Gets a value by column name.
    pub fn get_by_name(&self, name: &str) -> Result<&'a SqlValue> {
        let index = self.ordinal(name)?;
        self.get(index)
    }

    /// Resolves a member name to the column of the same name.
    ///
    /// Any column name is accepted, identifier or not. A member written as a
    /// call (`"name()"`) that names no column is rejected with
    /// [`RowBindError::UnboundMethod`].
    pub fn member(&self, name: &str) -> Result<&'a SqlValue> {
        match find_column(self.columns, name) {
            Some(index) => self.get(index),
            None => match name.strip_suffix("()") {
                Some(method) => Err(RowBindError::UnboundMethod(method.to_string())),
                None => Err(RowBindError::UnknownColumn(name.to_string())),
            },
        }
    }

    /// Resolves a member and converts it to `T`.
    pub fn member_as<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let value = self.member(name)?;
        convert(name, value)
    }

    pub fn get_as<T: FromSqlValue>(&self, index: usize) -> Result<T> {
        let value = self.get(index)?;
        convert(self.name(index)?, value)
    }

    pub fn get_by_name_as<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name)?;
        convert(name, value)
    }

    pub fn is_null(&self, index: usize) -> Result<bool> {
        Ok(self.get(index)?.is_null())
    }

    pub fn data_type_name(&self, index: usize) -> Result<&'static str> {
        Ok(self.get(index)?.type_name())
    }

    pub fn get_bool(&self, index: usize) -> Result<bool> {
        self.get_as(index)
    }

    pub fn get_byte(&self, index: usize) -> Result<u8> {
        self.get_as(index)
    }

    pub fn get_i16(&self, index: usize) -> Result<i16> {
        self.get_as(index)
    }

    pub fn get_i32(&self, index: usize) -> Result<i32> {
        self.get_as(index)
    }

    pub fn get_i64(&self, index: usize) -> Result<i64> {
        self.get_as(index)
    }

    pub fn get_f32(&self, index: usize) -> Result<f32> {
        self.get_as(index)
    }

    pub fn get_f64(&self, index: usize) -> Result<f64> {
        self.get_as(index)
    }

    pub fn get_decimal(&self, index: usize) -> Result<Decimal> {
        self.get_as(index)
    }

    pub fn get_date_time(&self, index: usize) -> Result<NaiveDateTime> {
        self.get_as(index)
    }

    pub fn get_uuid(&self, index: usize) -> Result<Uuid> {
        self.get_as(index)
    }

    pub fn get_string(&self, index: usize) -> Result<String> {
        self.get_as(index)
    }

    pub fn get_bytes(&self, index: usize) -> Result<Vec<u8>> {
        self.get_as(index)
    }

    pub fn get_chars(&self, index: usize) -> Result<Vec<char>> {
        self.get_as(index)
    }
}

fn convert<T: FromSqlValue>(column: &str, value: &SqlValue) -> Result<T> {
    T::from_sql_value(value).ok_or_else(|| RowBindError::Conversion {
        column: column.to_string(),
        target: type_name::<T>(),
    })
}

/// Fully buffered result of a query, containing zero or more rows.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Buffers every row the cursor has not read yet.
    pub fn from_cursor(cursor: Cursor) -> Self {
        let (columns, rows) = cursor.into_remaining();
        Self { columns, rows }
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(&self) -> Result<DynamicRow<'_>> {
        match self.rows.as_slice() {
            [values] => Ok(DynamicRow::new(&self.columns, values)),
            rows => Err(RowBindError::UnexpectedRowCount {
                expected: 1,
                actual: rows.len(),
            }),
        }
    }

    /// Returns a view of every row, in order.
    pub fn rows(&self) -> impl Iterator<Item = DynamicRow<'_>> + '_ {
        self.rows
            .iter()
            .map(move |values| DynamicRow::new(&self.columns, values))
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
