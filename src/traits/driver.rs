use async_trait::async_trait;

use crate::command::CommandKind;
use crate::error::Result;
use crate::types::{Cursor, Parameter};

/// Trait for database driver implementations.
/// Drivers are responsible for:
/// - Opening connections from a connection descriptor
/// - Binding named parameters in the driver's placeholder style
/// - Converting results to a driver-agnostic [`Cursor`]
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Open a new connection described by `connection_string`.
    async fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>>;
}

/// An open connection produced by a [`DatabaseDriver`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a command that returns rows.
    async fn query(&self, text: &str, kind: CommandKind, params: &[Parameter]) -> Result<Cursor>;

    /// Execute a command that does not return rows; returns the affected row count.
    async fn execute(&self, text: &str, kind: CommandKind, params: &[Parameter]) -> Result<u64>;

    /// Release the connection. Calling it more than once has no further effect.
    fn close(&mut self);
}
