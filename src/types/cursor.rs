use std::collections::VecDeque;

use crate::types::SqlValue;

/// Driver-agnostic forward-only result of a query.
///
/// Rows are consumed one at a time by [`Cursor::read`]; once a row has been
/// left behind it cannot be revisited.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    columns: Vec<String>,
    pending: VecDeque<Vec<SqlValue>>,
    current: Option<Vec<SqlValue>>,
    records_affected: u64,
    closed: bool,
}

impl Cursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            pending: rows.into(),
            current: None,
            records_affected: 0,
            closed: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_records_affected(mut self, records_affected: u64) -> Self {
        self.records_affected = records_affected;
        self
    }

    /// Advances to the next row. Returns false once the rows are exhausted
    /// or the cursor has been closed.
    pub fn read(&mut self) -> bool {
        if self.closed {
            self.current = None;
            return false;
        }
        self.current = self.pending.pop_front();
        self.current.is_some()
    }

    /// Values of the row the cursor is positioned on.
    pub fn current(&self) -> Option<&[SqlValue]> {
        self.current.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|s| s.as_str())
    }

    /// Looks a column up by exact name first, then ignoring ASCII case.
    pub fn ordinal(&self, name: &str) -> Option<usize> {
        find_column(&self.columns, name)
    }

    pub fn records_affected(&self) -> u64 {
        self.records_affected
    }

    /// Discards any unread rows.
    pub fn close(&mut self) {
        self.pending.clear();
        self.current = None;
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Consumes the remaining rows, starting after the current one.
    pub(crate) fn into_remaining(self) -> (Vec<String>, Vec<Vec<SqlValue>>) {
        (self.columns, self.pending.into())
    }
}

pub(crate) fn find_column(columns: &[String], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .or_else(|| columns.iter().position(|c| names_match(c, name)))
}

/// Case-insensitive name comparison, folding non-ASCII letters too.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor() -> Cursor {
        Cursor::new(
            vec!["Id".to_string(), "name".to_string()],
            vec![
                vec![SqlValue::Int32(1), "a".into()],
                vec![SqlValue::Int32(2), "b".into()],
            ],
        )
    }

    #[test]
    fn test_read_is_forward_only() {
        let mut cursor = cursor();
        assert!(cursor.current().is_none());
        assert!(cursor.read());
        assert_eq!(cursor.current().unwrap()[0], SqlValue::Int32(1));
        assert!(cursor.read());
        assert_eq!(cursor.current().unwrap()[0], SqlValue::Int32(2));
        assert!(!cursor.read());
        assert!(cursor.current().is_none());
        assert!(!cursor.is_closed());
    }

    #[test]
    fn test_ordinal_prefers_exact_match() {
        let cursor = Cursor::new(vec!["id".to_string(), "ID".to_string()], vec![]);
        assert_eq!(cursor.ordinal("ID"), Some(1));
        assert_eq!(cursor.ordinal("Id"), Some(0));
        assert_eq!(cursor.ordinal("missing"), None);
    }

    #[test]
    fn test_ordinal_folds_non_ascii_case() {
        let cursor = Cursor::new(vec!["GRÖßE".to_string(), "Ärger".to_string()], vec![]);
        assert_eq!(cursor.ordinal("größe"), Some(0));
        assert_eq!(cursor.ordinal("ÄRGER"), Some(1));
        assert_eq!(cursor.ordinal("arger"), None);
    }

    #[test]
    fn test_close_discards_rows() {
        let mut cursor = cursor();
        cursor.close();
        assert!(cursor.is_closed());
        assert!(!cursor.read());
    }
}
