//! rowbind - dynamic row access and struct mapping over parameterized commands
//!
//! # Example
//! ```ignore
//! use rowbind::{Mapped, Property, RowBindClient, RowBindConfig};
//!
//! #[derive(Default)]
//! struct User {
//!     id: i32,
//!     name: String,
//! }
//!
//! impl Mapped for User {
//!     fn properties() -> Vec<Property<Self>> {
//!         vec![
//!             Property::field("Id", |u: &User| &u.id, |u: &mut User| &mut u.id),
//!             Property::field("Name", |u: &User| &u.name, |u: &mut User| &mut u.name)
//!                 .column("user_name"),
//!         ]
//!     }
//! }
//!
//! let client = RowBindClient::postgres(RowBindConfig::load(None)?);
//!
//! // Read rows into structs
//! let users: Vec<User> = client
//!     .command("SELECT id, user_name FROM users WHERE id > @min")?
//!     .with_parameters([("min", 10)])
//!     .instantiate()
//!     .await?;
//!
//! // Write them back, one execution per item
//! let mut update = client.read_write("UPDATE users SET user_name = @user_name WHERE id = @id")?;
//! update.add_parameters_from_type::<User>();
//! update.save(&users).await?;
//!
//! // Or walk the rows dynamically
//! let mut reader = client.command("SELECT * FROM users")?.reader().await?;
//! while let Some(row) = reader.next_row() {
//!     let name: String = row.member_as("user_name")?;
//! }
//! ```

pub mod command;
pub mod config;
pub mod drivers;
pub mod error;
pub mod mapping;
pub mod traits;
pub mod types;

mod client;

// Re-export main types for convenient access
pub use client::RowBindClient;
pub use command::{Command, CommandKind};
pub use config::{ConnectionRole, RowBindConfig};
pub use error::{Result, RowBindError};
pub use mapping::{ColumnMapping, Hydrate, Hydrator, Mapped, Property};
pub use traits::{Connection, DatabaseDriver};
pub use types::{Cursor, DynamicReader, DynamicRow, FromSqlValue, Parameter, QueryResult, SqlValue};
