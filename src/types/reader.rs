use crate::error::Result;
use crate::types::{Cursor, DynamicRow, SqlValue};

/// Forward-only reader handing out a [`DynamicRow`] per row.
///
/// # Example
/// ```
/// use rowbind::types::{Cursor, DynamicReader, SqlValue};
///
/// let cursor = Cursor::new(
///     vec!["id".to_string()],
///     vec![vec![SqlValue::Int32(1)], vec![SqlValue::Int32(2)]],
/// );
/// let mut reader = DynamicReader::new(cursor);
/// let mut ids = Vec::new();
/// while let Some(row) = reader.next_row() {
///     ids.push(row.member_as::<i32>("id").unwrap());
/// }
/// assert_eq!(ids, vec![1, 2]);
/// ```
#[derive(Debug)]
pub struct DynamicReader {
    cursor: Cursor,
}

impl DynamicReader {
    pub fn new(cursor: Cursor) -> Self {
        Self { cursor }
    }

    /// Advances the cursor and returns a view of the new current row.
    ///
    /// Returns `None` once the rows are exhausted. Exhausting the reader does
    /// not close it.
    pub fn next_row(&mut self) -> Option<DynamicRow<'_>> {
        if self.cursor.read() {
            DynamicRow::from_cursor(&self.cursor).ok()
        } else {
            None
        }
    }

    /// Advances the cursor without handing out a view.
    pub fn read(&mut self) -> bool {
        self.cursor.read()
    }

    /// View of the row the reader is positioned on.
    pub fn current(&self) -> Result<DynamicRow<'_>> {
        DynamicRow::from_cursor(&self.cursor)
    }

    pub fn get(&self, index: usize) -> Result<&SqlValue> {
        self.current()?.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Result<&SqlValue> {
        self.current()?.get_by_name(name)
    }

    pub fn field_count(&self) -> usize {
        self.cursor.field_count()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.cursor.name(index)
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.cursor.ordinal(name)
    }

    pub fn records_affected(&self) -> u64 {
        self.cursor.records_affected()
    }

    pub fn close(&mut self) {
        self.cursor.close();
    }

    pub fn is_closed(&self) -> bool {
        self.cursor.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RowBindError;

    fn reader() -> DynamicReader {
        DynamicReader::new(Cursor::new(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![SqlValue::Int32(1), "Alice".into()],
                vec![SqlValue::Int32(2), "Bob".into()],
            ],
        ))
    }

    #[test]
    fn test_iteration_is_single_pass() {
        let mut reader = reader();
        let mut names = Vec::new();
        while let Some(row) = reader.next_row() {
            names.push(row.get_string(1).unwrap());
        }
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert!(reader.next_row().is_none());
        assert!(!reader.is_closed());
    }

    #[test]
    fn test_access_before_first_read() {
        let reader = reader();
        assert!(matches!(reader.get(0), Err(RowBindError::NoCurrentRow)));
        assert_eq!(reader.field_count(), 2);
        assert_eq!(reader.ordinal("NAME"), Some(1));
    }

    #[test]
    fn test_reads_through_current_row() {
        let mut reader = reader();
        assert!(reader.read());
        assert_eq!(reader.get_by_name("name").unwrap(), &SqlValue::from("Alice"));
        reader.close();
        assert!(reader.is_closed());
        assert!(reader.next_row().is_none());
    }
}
