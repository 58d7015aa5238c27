use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::types::{FromSql, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::command::CommandKind;
use crate::error::{Result, RowBindError};
use crate::traits::{Connection, DatabaseDriver};
use crate::types::{Cursor, Parameter, SqlValue, PARAMETER_MARKER};

/// PostgreSQL driver implementation using tokio-postgres.
#[derive(Debug, Default)]
pub struct TokioPostgresDriver;

impl TokioPostgresDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseDriver for TokioPostgresDriver {
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| RowBindError::ConnectionFailed(e.to_string()))?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Box::new(TokioPostgresConnection {
            client: Some(client),
        }))
    }
}

/// An open tokio-postgres client. Closing drops the client, which ends the
/// spawned connection task.
pub struct TokioPostgresConnection {
    client: Option<Client>,
}

impl TokioPostgresConnection {
    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| RowBindError::QueryFailed("connection is closed".to_string()))
    }
}

#[async_trait]
impl Connection for TokioPostgresConnection {
    async fn query(&self, text: &str, kind: CommandKind, params: &[Parameter]) -> Result<Cursor> {
        let client = self.client()?;
        let (sql, values) = statement(text, kind, params, true)?;
        let prepared = client
            .prepare(&sql)
            .await
            .map_err(|e| RowBindError::QueryFailed(e.to_string()))?;

        let converted_params = convert_params(&values, prepared.params());
        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = client
            .query(&prepared, &param_refs)
            .await
            .map_err(|e| RowBindError::QueryFailed(e.to_string()))?;

        // Statement metadata keeps the column names even when no row comes back
        let columns: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let result_rows: Vec<Vec<SqlValue>> = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(i, col)| row_value(row, i, col.type_()))
                    .collect()
            })
            .collect();

        Ok(Cursor::new(columns, result_rows))
    }

    async fn execute(&self, text: &str, kind: CommandKind, params: &[Parameter]) -> Result<u64> {
        let client = self.client()?;
        let (sql, values) = statement(text, kind, params, false)?;
        let prepared = client
            .prepare(&sql)
            .await
            .map_err(|e| RowBindError::QueryFailed(e.to_string()))?;

        let converted_params = convert_params(&values, prepared.params());
        let param_refs: Vec<&(dyn ToSql + Sync)> = converted_params
            .iter()
            .map(|b| b.as_ref() as &(dyn ToSql + Sync))
            .collect();

        client
            .execute(&prepared, &param_refs)
            .await
            .map_err(|e| RowBindError::QueryFailed(e.to_string()))
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("Closed PostgreSQL connection");
        }
    }
}

/// Renders the SQL sent to PostgreSQL and the positional values it binds.
fn statement<'p>(
    text: &str,
    kind: CommandKind,
    params: &'p [Parameter],
    returns_rows: bool,
) -> Result<(String, Vec<&'p SqlValue>)> {
    match kind {
        CommandKind::Text => bind_named(text, params),
        CommandKind::StoredProcedure => Ok(procedure_call(text, params, returns_rows)),
    }
}

/// Rewrites `@name` markers into `$n` placeholders.
///
/// Markers inside quoted literals or identifiers, comments and dollar-quoted
/// bodies are left alone. A name used more than once binds to a single
/// placeholder. Parameters the text never mentions are not sent.
pub(crate) fn bind_named<'p>(sql: &str, params: &'p [Parameter]) -> Result<(String, Vec<&'p SqlValue>)> {
    let mut out = String::with_capacity(sql.len());
    let mut bound: Vec<&'p Parameter> = Vec::new();
    let mut i = 0;

    while let Some(c) = sql[i..].chars().next() {
        let rest = &sql[i..];
        if let Some(len) = verbatim_len(rest, c) {
            out.push_str(&rest[..len]);
            i += len;
            continue;
        }

        let after = &rest[c.len_utf8()..];
        let starts_name = c == PARAMETER_MARKER
            && after.starts_with(|n: char| n.is_ascii_alphabetic() || n == '_');
        if !starts_name {
            out.push(c);
            i += c.len_utf8();
            continue;
        }

        let name_len = after
            .find(|n: char| !(n.is_ascii_alphanumeric() || n == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let param = params
            .iter()
            .find(|p| p.is_named(name))
            .ok_or_else(|| {
                RowBindError::QueryFailed(format!("No value supplied for parameter {}{}", PARAMETER_MARKER, name))
            })?;
        let position = match bound.iter().position(|b| std::ptr::eq(*b, param)) {
            Some(position) => position,
            None => {
                bound.push(param);
                bound.len() - 1
            }
        };
        out.push('$');
        out.push_str(&(position + 1).to_string());
        i += c.len_utf8() + name_len;
    }

    Ok((out, bound.into_iter().map(|p| &p.value).collect()))
}

/// Length of the quoted literal, comment or dollar-quoted body starting at
/// the head of `rest`, copied through unchanged. Unterminated spans run to
/// the end of the text.
fn verbatim_len(rest: &str, c: char) -> Option<usize> {
    match c {
        '\'' | '"' => Some(rest[1..].find(c).map_or(rest.len(), |n| n + 2)),
        '-' if rest.starts_with("--") => Some(rest.find('\n').map_or(rest.len(), |n| n + 1)),
        '/' if rest.starts_with("/*") => Some(rest[2..].find("*/").map_or(rest.len(), |n| n + 4)),
        '$' => {
            let tag_len = rest[1..].find('$')?;
            let tag = &rest[1..1 + tag_len];
            if tag.starts_with(|t: char| t.is_ascii_digit())
                || !tag.chars().all(|t| t.is_alphanumeric() || t == '_')
            {
                return None;
            }
            let delimiter = &rest[..tag_len + 2];
            let body = &rest[delimiter.len()..];
            Some(
                body.find(delimiter)
                    .map_or(rest.len(), |n| delimiter.len() + n + delimiter.len()),
            )
        }
        _ => None,
    }
}

/// Renders a procedure invocation passing every parameter by name.
pub(crate) fn procedure_call<'p>(
    name: &str,
    params: &'p [Parameter],
    returns_rows: bool,
) -> (String, Vec<&'p SqlValue>) {
    let args = params
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} => ${}", p.bare_name(), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = if returns_rows {
        format!("SELECT * FROM {}({})", name, args)
    } else {
        format!("CALL {}({})", name, args)
    };
    (sql, params.iter().map(|p| &p.value).collect())
}

fn convert_params(values: &[&SqlValue], types: &[Type]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| sql_value_to_tosql(v, types.get(i).unwrap_or(&Type::TEXT)))
        .collect()
}

/// Convert a SqlValue to a boxed ToSql trait object for a parameter of type `ty`.
fn sql_value_to_tosql(value: &SqlValue, ty: &Type) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => typed_null(ty),
        SqlValue::Bool(b) => Box::new(*b),
        SqlValue::Int16(i) => integer(i64::from(*i), ty),
        SqlValue::Int32(i) => integer(i64::from(*i), ty),
        SqlValue::Int64(i) => integer(*i, ty),
        SqlValue::Float32(f) if *ty == Type::FLOAT8 => Box::new(f64::from(*f)),
        SqlValue::Float32(f) => Box::new(*f),
        SqlValue::Float64(f) => Box::new(*f),
        SqlValue::Decimal(d) => Box::new(*d),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Bytes(b) => Box::new(b.clone()),
        SqlValue::Date(d) => Box::new(*d),
        SqlValue::DateTime(dt) => Box::new(*dt),
        SqlValue::DateTimeTz(dt) => Box::new(*dt),
        SqlValue::Uuid(u) => Box::new(*u),
    }
}

/// Narrows an integer to the parameter's width when it fits.
fn integer(value: i64, ty: &Type) -> Box<dyn ToSql + Sync + Send> {
    match *ty {
        Type::INT2 => match i16::try_from(value) {
            Ok(v) => Box::new(v),
            Err(_) => Box::new(value),
        },
        Type::INT4 => match i32::try_from(value) {
            Ok(v) => Box::new(v),
            Err(_) => Box::new(value),
        },
        Type::NUMERIC => Box::new(Decimal::from(value)),
        _ => Box::new(value),
    }
}

fn typed_null(ty: &Type) -> Box<dyn ToSql + Sync + Send> {
    match *ty {
        Type::BOOL => Box::new(None::<bool>),
        Type::INT2 => Box::new(None::<i16>),
        Type::INT4 => Box::new(None::<i32>),
        Type::INT8 => Box::new(None::<i64>),
        Type::FLOAT4 => Box::new(None::<f32>),
        Type::FLOAT8 => Box::new(None::<f64>),
        Type::NUMERIC => Box::new(None::<Decimal>),
        Type::BYTEA => Box::new(None::<Vec<u8>>),
        Type::DATE => Box::new(None::<NaiveDate>),
        Type::TIMESTAMP => Box::new(None::<NaiveDateTime>),
        Type::TIMESTAMPTZ => Box::new(None::<DateTime<Utc>>),
        Type::UUID => Box::new(None::<Uuid>),
        _ => Box::new(None::<String>),
    }
}

/// Convert a row value at a given index to a SqlValue.
fn row_value(row: &Row, index: usize, type_: &Type) -> SqlValue {
    match *type_ {
        Type::BOOL => column(row, index, SqlValue::Bool),
        Type::INT2 => column(row, index, SqlValue::Int16),
        Type::INT4 => column(row, index, SqlValue::Int32),
        Type::INT8 => column(row, index, SqlValue::Int64),
        Type::FLOAT4 => column(row, index, SqlValue::Float32),
        Type::FLOAT8 => column(row, index, SqlValue::Float64),
        Type::NUMERIC => column(row, index, SqlValue::Decimal),
        Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => column(row, index, SqlValue::Text),
        Type::BYTEA => column(row, index, SqlValue::Bytes),
        Type::DATE => column(row, index, SqlValue::Date),
        Type::TIMESTAMP => column(row, index, SqlValue::DateTime),
        Type::TIMESTAMPTZ => column(row, index, SqlValue::DateTimeTz),
        Type::UUID => column(row, index, SqlValue::Uuid),
        _ => match row.try_get::<_, Option<String>>(index) {
            Ok(value) => value.map(SqlValue::Text).unwrap_or(SqlValue::Null),
            Err(_) => {
                warn!(column = index, pg_type = %type_, "Unsupported column type, reading as NULL");
                SqlValue::Null
            }
        },
    }
}

fn column<'r, T: FromSql<'r>>(row: &'r Row, index: usize, wrap: fn(T) -> SqlValue) -> SqlValue {
    match row.try_get::<_, Option<T>>(index) {
        Ok(Some(value)) => wrap(value),
        Ok(None) => SqlValue::Null,
        Err(e) => {
            warn!(column = index, "Failed to read column: {}", e);
            SqlValue::Null
        }
    }
}
