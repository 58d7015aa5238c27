mod cursor;
mod parameter;
mod reader;
mod row;
mod sql_value;

pub use cursor::Cursor;
pub(crate) use cursor::{find_column, names_match};
pub use parameter::{Parameter, PARAMETER_MARKER};
pub use reader::DynamicReader;
pub use row::{DynamicRow, QueryResult};
pub use sql_value::{FromSqlValue, SqlValue};
