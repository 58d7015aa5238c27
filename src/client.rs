use std::sync::Arc;

use crate::command::{Command, CommandKind};
use crate::config::{ConnectionRole, RowBindConfig};
use crate::drivers::TokioPostgresDriver;
use crate::error::Result;
use crate::traits::DatabaseDriver;

/// Main entry point for rowbind.
/// Holds the database driver and the named connection strings, and hands out
/// commands bound to them.
pub struct RowBindClient {
    driver: Arc<dyn DatabaseDriver>,
    config: RowBindConfig,
}

impl RowBindClient {
    /// Create a client backed by PostgreSQL.
    ///
    /// # Example
    /// ```ignore
    /// let config = RowBindConfig::load(Some(Path::new("rowbind.toml")))?;
    /// let client = RowBindClient::postgres(config);
    /// let users: Vec<User> = client.command("SELECT * FROM users")?.instantiate().await?;
    /// ```
    pub fn postgres(config: RowBindConfig) -> Self {
        Self::with_driver(Arc::new(TokioPostgresDriver::new()), config)
    }

    /// Create a new client with a custom driver.
    /// Useful for testing or using alternative database drivers.
    pub fn with_driver(driver: Arc<dyn DatabaseDriver>, config: RowBindConfig) -> Self {
        Self { driver, config }
    }

    pub fn config(&self) -> &RowBindConfig {
        &self.config
    }

    /// A SQL text command on the `default` connection.
    pub fn command(&self, sql: impl Into<String>) -> Result<Command> {
        self.command_for(ConnectionRole::Default, sql)
    }

    /// A SQL text command on the `default_readonly` connection.
    pub fn read_only(&self, sql: impl Into<String>) -> Result<Command> {
        self.command_for(ConnectionRole::ReadOnly, sql)
    }

    /// A SQL text command on the `default_readwrite` connection.
    pub fn read_write(&self, sql: impl Into<String>) -> Result<Command> {
        self.command_for(ConnectionRole::ReadWrite, sql)
    }

    /// A stored-procedure call on the `default` connection.
    pub fn procedure(&self, name: impl Into<String>) -> Result<Command> {
        Ok(self.command(name)?.with_kind(CommandKind::StoredProcedure))
    }

    pub fn command_for(&self, role: ConnectionRole, sql: impl Into<String>) -> Result<Command> {
        let connection_string = self.config.for_role(role)?;
        Ok(self.command_on(connection_string, sql))
    }

    /// A SQL text command on an inline connection string.
    pub fn command_on(&self, connection_string: impl Into<String>, sql: impl Into<String>) -> Command {
        Command::new(Arc::clone(&self.driver), sql, connection_string)
    }
}
