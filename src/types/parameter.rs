use crate::types::{names_match, SqlValue};

/// Marker prefixed to every parameter name.
pub const PARAMETER_MARKER: char = '@';

/// A named value bound into a command before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    pub value: SqlValue,
}

impl Parameter {
    /// Creates a parameter, prefixing the name with [`PARAMETER_MARKER`] if it
    /// does not carry one already.
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let name = name.into();
        let name = if name.starts_with(PARAMETER_MARKER) {
            name
        } else {
            format!("{}{}", PARAMETER_MARKER, name)
        };
        Self {
            name,
            value: value.into(),
        }
    }

    /// Creates a parameter with a `NULL` placeholder value.
    pub fn unset(name: impl Into<String>) -> Self {
        Self::new(name, SqlValue::Null)
    }

    /// Full parameter name, marker included.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter name without the marker.
    pub fn bare_name(&self) -> &str {
        &self.name[PARAMETER_MARKER.len_utf8()..]
    }

    /// Case-insensitive name comparison; the marker is optional on `name`.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.strip_prefix(PARAMETER_MARKER).unwrap_or(name);
        names_match(self.bare_name(), name)
    }
}

impl<K: Into<String>, V: Into<SqlValue>> From<(K, V)> for Parameter {
    fn from((name, value): (K, V)) -> Self {
        Parameter::new(name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_added_once() {
        assert_eq!(Parameter::new("id", 1).name(), "@id");
        assert_eq!(Parameter::new("@id", 1).name(), "@id");
        assert_eq!(Parameter::new("@id", 1).bare_name(), "id");
    }

    #[test]
    fn test_is_named() {
        let p = Parameter::unset("UserId");
        assert!(p.is_named("userid"));
        assert!(p.is_named("@USERID"));
        assert!(!p.is_named("user"));
        assert!(p.value.is_null());
    }

    #[test]
    fn test_is_named_non_ascii() {
        let p = Parameter::unset("Ärger");
        assert!(p.is_named("@ärger"));
        assert!(!p.is_named("arger"));
    }
}
