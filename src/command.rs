use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::mapping::{bind_columns, bind_parameters, parameters_from_type, Mapped};
use crate::traits::{Connection, DatabaseDriver};
use crate::types::{Cursor, DynamicReader, DynamicRow, Parameter, QueryResult, SqlValue};

/// How the command text is interpreted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandKind {
    /// Literal SQL.
    #[default]
    Text,
    /// Name of a stored procedure; parameters are passed as its arguments.
    StoredProcedure,
}

type ReleaseAction = Box<dyn FnOnce() + Send>;

/// A parameterized database command bound to one connection descriptor.
///
/// Methods that leave a connection open ([`Command::reader`]) register a
/// release action; [`Command::dispose`] runs the accumulated actions, and
/// dropping the command disposes it.
pub struct Command {
    driver: Arc<dyn DatabaseDriver>,
    text: String,
    kind: CommandKind,
    connection_string: String,
    params: Vec<Parameter>,
    releases: Mutex<Vec<ReleaseAction>>,
}

impl Command {
    pub fn new(
        driver: Arc<dyn DatabaseDriver>,
        text: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            text: text.into(),
            kind: CommandKind::Text,
            connection_string: connection_string.into(),
            params: Vec::new(),
            releases: Mutex::new(Vec::new()),
        }
    }

    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parameters<P: Into<Parameter>>(mut self, params: impl IntoIterator<Item = P>) -> Self {
        self.add_range(params);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    /// Current parameters, in binding order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// Adds a parameter, replacing the value of a same-named one.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        self.add_parameter(Parameter::new(name, value))
    }

    pub fn add_parameter(&mut self, param: Parameter) -> &mut Self {
        match self.params.iter_mut().find(|p| p.is_named(param.name())) {
            Some(existing) => existing.value = param.value,
            None => self.params.push(param),
        }
        self
    }

    pub fn add_range<P: Into<Parameter>>(&mut self, params: impl IntoIterator<Item = P>) -> &mut Self {
        for param in params {
            self.add_parameter(param.into());
        }
        self
    }

    /// Adds one parameter per name/value entry.
    pub fn add_map<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.add_range(entries.into_iter().map(Parameter::from))
    }

    /// Replaces the parameters with one `NULL` parameter per readable
    /// property of `T`, named after its mapped column.
    pub fn add_parameters_from_type<T: Mapped>(&mut self) -> &mut Self {
        self.params = parameters_from_type::<T>();
        self
    }

    /// Registers an action to run when the command is disposed.
    pub fn on_dispose(&self, action: impl FnOnce() + Send + 'static) {
        self.releases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(action));
    }

    /// Runs every registered release action. Each action runs once, however
    /// many times or from however many callers this is invoked.
    pub fn dispose(&self) {
        let actions = std::mem::take(&mut *self.releases.lock().unwrap_or_else(PoisonError::into_inner));
        if actions.is_empty() {
            return;
        }
        debug!(actions = actions.len(), "Disposing command");
        for action in actions {
            action();
        }
    }

    async fn open(&self) -> Result<Box<dyn Connection>> {
        debug!(command = %self.text, kind = ?self.kind, params = self.params.len(), "Opening connection");
        self.driver.connect(&self.connection_string).await
    }

    /// Executes the command and returns a reader over its rows.
    ///
    /// The connection stays open until the command is disposed.
    pub async fn reader(&self) -> Result<DynamicReader> {
        let mut connection = self.open().await?;
        let result = connection.query(&self.text, self.kind, &self.params).await;
        match result {
            Ok(cursor) => {
                self.on_dispose(move || connection.close());
                Ok(DynamicReader::new(cursor))
            }
            Err(e) => {
                connection.close();
                Err(e)
            }
        }
    }

    /// Executes the command and buffers the whole result.
    pub async fn data_set(&self) -> Result<QueryResult> {
        let mut connection = self.open().await?;
        let result = connection
            .query(&self.text, self.kind, &self.params)
            .await
            .map(QueryResult::from_cursor);
        connection.close();
        result
    }

    /// Executes the command once and returns the affected row count.
    pub async fn execute(&self) -> Result<u64> {
        let mut connection = self.open().await?;
        let result = connection
            .execute(&self.text, self.kind, &self.params)
            .await;
        connection.close();
        result
    }

    /// Executes the command and builds one `T` per result row.
    ///
    /// Types providing [`Mapped::hydrator`] read themselves from each row.
    /// Otherwise every writable property whose mapped column appears in the
    /// result is assigned; the rest keep their default values.
    pub async fn instantiate<T: Mapped + Default>(&self) -> Result<Vec<T>> {
        let started = Instant::now();
        let mut connection = self.open().await?;
        let result = match connection.query(&self.text, self.kind, &self.params).await {
            Ok(mut cursor) => materialize::<T>(&mut cursor),
            Err(e) => Err(e),
        };
        connection.close();

        let items = result?;
        debug!(
            rows = items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Instantiated {}",
            std::any::type_name::<T>()
        );
        Ok(items)
    }

    /// Executes the command once per item, in order, on a single connection.
    ///
    /// Before each execution every parameter matching a readable property of
    /// `T` receives that property's value. Returns the total affected rows.
    pub async fn save<'a, T, I>(&self, items: I) -> Result<u64>
    where
        T: Mapped,
        I: IntoIterator<Item = &'a T>,
    {
        let properties = T::properties();
        let bindings = bind_parameters(&properties, &self.params)?;
        let mut params = self.params.clone();

        let mut connection = self.open().await?;
        let mut affected = 0;
        let mut executions = 0usize;
        let mut failure = None;
        for item in items {
            for &(property, param) in &bindings {
                params[param].value = properties[property].read(item).unwrap_or(SqlValue::Null);
            }
            match connection.execute(&self.text, self.kind, &params).await {
                Ok(count) => {
                    affected += count;
                    executions += 1;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        connection.close();

        if let Some(e) = failure {
            return Err(e);
        }
        debug!(executions, affected, "Saved {}", std::any::type_name::<T>());
        Ok(affected)
    }

    pub async fn save_one<T: Mapped>(&self, item: &T) -> Result<u64> {
        self.save(std::iter::once(item)).await
    }
}

fn materialize<T: Mapped + Default>(cursor: &mut Cursor) -> Result<Vec<T>> {
    let mut items = Vec::new();

    if let Some(hydrate) = T::hydrator() {
        while cursor.read() {
            let row = DynamicRow::from_cursor(cursor)?;
            let mut item = T::default();
            hydrate(&mut item, &row)?;
            items.push(item);
        }
        return Ok(items);
    }

    let properties = T::properties();
    let bindings = bind_columns(&properties, cursor.columns());
    while cursor.read() {
        let row = DynamicRow::from_cursor(cursor)?;
        let mut item = T::default();
        for &(property, column) in &bindings {
            properties[property].write(&mut item, row.name(column)?, row.get(column)?)?;
        }
        items.push(item);
    }
    Ok(items)
}

impl From<&Command> for Vec<Parameter> {
    fn from(command: &Command) -> Self {
        command.params.clone()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("text", &self.text)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Drop for Command {
    fn drop(&mut self) {
        self.dispose();
    }
}
