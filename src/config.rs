//! Named connection strings.
//!
//! Entries are read from an optional TOML file and then from environment
//! variables prefixed with `ROWBIND`, the latter taking precedence:
//!
//! ```toml
//! [connection_strings]
//! default = "postgres://app@localhost/app"
//! default_readonly = "postgres://reader@replica/app"
//! default_readwrite = "postgres://writer@primary/app"
//! ```
//!
//! `ROWBIND_CONNECTION_STRINGS__DEFAULT=...` overrides the `default` entry.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::{Result, RowBindError};

pub const ENV_PREFIX: &str = "ROWBIND";

/// Which named connection a command is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionRole {
    #[default]
    Default,
    ReadOnly,
    ReadWrite,
}

impl ConnectionRole {
    /// Name of the configuration entry this role resolves.
    pub fn entry_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ReadOnly => "default_readonly",
            Self::ReadWrite => "default_readwrite",
        }
    }
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entry_name())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RowBindConfig {
    #[serde(default)]
    pub connection_strings: HashMap<String, String>,
}

impl RowBindConfig {
    /// Loads the configuration file at `path`, if any, then applies
    /// `ROWBIND_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parses a TOML document, ignoring the environment.
    pub fn from_toml(source: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn with_connection(mut self, name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        self.connection_strings
            .insert(name.into(), connection_string.into());
        self
    }

    /// Looks up a connection string by entry name.
    pub fn connection_string(&self, name: &str) -> Result<&str> {
        self.connection_strings
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| RowBindError::MissingConnection(name.to_string()))
    }

    pub fn for_role(&self, role: ConnectionRole) -> Result<&str> {
        self.connection_string(role.entry_name())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
[connection_strings]
default = "postgres://app@localhost/app"
default_readonly = "postgres://reader@replica/app"
"#;

    #[test]
    fn test_roles_resolve_entries() {
        let config = RowBindConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(
            config.for_role(ConnectionRole::Default).unwrap(),
            "postgres://app@localhost/app"
        );
        assert_eq!(
            config.for_role(ConnectionRole::ReadOnly).unwrap(),
            "postgres://reader@replica/app"
        );
        assert!(matches!(
            config.for_role(ConnectionRole::ReadWrite),
            Err(RowBindError::MissingConnection(name)) if name == "default_readwrite"
        ));
    }

    #[test]
    fn test_empty_document() {
        let config = RowBindConfig::from_toml("").unwrap();
        assert!(config.connection_strings.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = RowBindConfig::load(Some(file.path())).unwrap();
        assert_eq!(
            config.connection_string("default_readonly").unwrap(),
            "postgres://reader@replica/app"
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = RowBindConfig::load(Some(Path::new("/nonexistent/rowbind.toml"))).unwrap_err();
        assert!(matches!(err, RowBindError::Config(_)));
    }

    #[test]
    fn test_load_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[connection_strings]\nreporting = \"postgres://file/db\"\n")
            .unwrap();

        std::env::set_var("ROWBIND_CONNECTION_STRINGS__REPORTING", "postgres://env/db");
        let config = RowBindConfig::load(Some(file.path()));
        std::env::remove_var("ROWBIND_CONNECTION_STRINGS__REPORTING");

        assert_eq!(
            config.unwrap().connection_string("reporting").unwrap(),
            "postgres://env/db"
        );
    }

    #[test]
    fn test_with_connection() {
        let config = RowBindConfig::default().with_connection("default", "postgres://x");
        assert_eq!(config.for_role(ConnectionRole::Default).unwrap(), "postgres://x");
    }
}
