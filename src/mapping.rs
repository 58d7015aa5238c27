//! Column mapping between result columns, command parameters and struct fields.
//!
//! A type describes its fields once through [`Mapped::properties`]. Each
//! [`Property`] is matched against a column or parameter by its explicit
//! [`ColumnMapping`] when it carries one, and by its own name otherwise.
//! Matching ignores ASCII case.

use std::any::type_name;

use crate::error::{Result, RowBindError};
use crate::types::find_column;
use crate::types::{DynamicRow, FromSqlValue, Parameter, SqlValue};

/// Binds a property to a specific column name.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub column_name: String,
    /// Carried for callers; the mapping logic does not apply it.
    pub default_value: Option<SqlValue>,
}

impl ColumnMapping {
    pub fn new(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            default_value: None,
        }
    }

    pub fn with_default(column_name: impl Into<String>, default_value: impl Into<SqlValue>) -> Self {
        Self {
            column_name: column_name.into(),
            default_value: Some(default_value.into()),
        }
    }
}

type Getter<T> = Box<dyn Fn(&T) -> SqlValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &SqlValue) -> bool + Send + Sync>;

/// One field of a mapped type: its name, optional column mapping, and how to
/// read and write it.
pub struct Property<T> {
    name: &'static str,
    mapping: Option<ColumnMapping>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
    target: &'static str,
}

impl<T: 'static> Property<T> {
    /// A readable and writable field.
    ///
    /// # Example
    /// ```
    /// use rowbind::mapping::Property;
    ///
    /// #[derive(Default)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let name = Property::field("Name", |u: &User| &u.name, |u: &mut User| &mut u.name)
    ///     .column("user_name");
    /// assert_eq!(name.column_name(), "user_name");
    /// ```
    pub fn field<F>(name: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self
    where
        F: Clone + Into<SqlValue> + FromSqlValue + 'static,
    {
        Self {
            name,
            mapping: None,
            getter: Some(Box::new(move |item| get(item).clone().into())),
            setter: Some(Box::new(move |item, value| match F::from_sql_value(value) {
                Some(v) => {
                    *get_mut(item) = v;
                    true
                }
                None => false,
            })),
            target: type_name::<F>(),
        }
    }

    /// A read-only property computed from the value.
    pub fn readable<F>(name: &'static str, get: fn(&T) -> F) -> Self
    where
        F: Into<SqlValue> + 'static,
    {
        Self {
            name,
            mapping: None,
            getter: Some(Box::new(move |item| get(item).into())),
            setter: None,
            target: type_name::<F>(),
        }
    }

    /// A write-only property.
    pub fn writable<F>(name: &'static str, set: fn(&mut T, F)) -> Self
    where
        F: FromSqlValue + 'static,
    {
        Self {
            name,
            mapping: None,
            getter: None,
            setter: Some(Box::new(move |item, value| match F::from_sql_value(value) {
                Some(v) => {
                    set(item, v);
                    true
                }
                None => false,
            })),
            target: type_name::<F>(),
        }
    }

    /// Maps this property to an explicitly named column.
    pub fn column(self, column_name: impl Into<String>) -> Self {
        self.mapping(ColumnMapping::new(column_name))
    }

    pub fn mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }
}

impl<T> Property<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column_mapping(&self) -> Option<&ColumnMapping> {
        self.mapping.as_ref()
    }

    /// Column this property binds to: the explicit mapping, else its name.
    pub fn column_name(&self) -> &str {
        self.mapping
            .as_ref()
            .map(|m| m.column_name.as_str())
            .unwrap_or(self.name)
    }

    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Reads the property; `None` when it is write-only.
    pub fn read(&self, item: &T) -> Option<SqlValue> {
        self.getter.as_ref().map(|get| get(item))
    }

    /// Writes `value` read from `column` into the property.
    pub fn write(&self, item: &mut T, column: &str, value: &SqlValue) -> Result<()> {
        let set = self
            .setter
            .as_ref()
            .ok_or_else(|| RowBindError::Mapping(format!("Property {} is not writable", self.name)))?;
        if set(item, value) {
            Ok(())
        } else {
            Err(RowBindError::Conversion {
                column: column.to_string(),
                target: self.target,
            })
        }
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("mapping", &self.mapping)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Routine a type uses to read itself from a row.
pub type Hydrator<T> = fn(&mut T, &DynamicRow<'_>) -> Result<()>;

/// A type whose fields can be bound to columns and parameters.
pub trait Mapped: Sized + 'static {
    /// Returns the declared properties, in declaration order.
    fn properties() -> Vec<Property<Self>>;

    /// Returns the type's own hydration routine. When present it replaces
    /// column matching entirely.
    fn hydrator() -> Option<Hydrator<Self>> {
        None
    }
}

/// A type that reads its own fields from a row.
///
/// Hook it in with `fn hydrator() -> Option<Hydrator<Self>> { Some(Self::hydrate) }`.
pub trait Hydrate {
    fn hydrate(&mut self, row: &DynamicRow<'_>) -> Result<()>;
}

/// Explicitly mapped properties first, then the unmapped ones, each group in
/// declaration order.
fn ordered<'p, T>(
    properties: &'p [Property<T>],
    keep: impl Fn(&Property<T>) -> bool,
) -> impl Iterator<Item = (usize, &'p Property<T>)> {
    let explicit = properties
        .iter()
        .enumerate()
        .filter(|(_, p)| p.mapping.is_some())
        .collect::<Vec<_>>();
    let implicit = properties
        .iter()
        .enumerate()
        .filter(|(_, p)| p.mapping.is_none())
        .collect::<Vec<_>>();
    explicit
        .into_iter()
        .chain(implicit)
        .filter(move |(_, p)| keep(*p))
}

/// Parameters for every readable property of `T`, with `NULL` values.
pub(crate) fn parameters_from_type<T: Mapped>() -> Vec<Parameter> {
    let properties = T::properties();
    let mut params: Vec<Parameter> = Vec::new();
    for (_, property) in ordered(&properties, Property::is_readable) {
        let name = property.column_name();
        if !params.iter().any(|p| p.is_named(name)) {
            params.push(Parameter::unset(name));
        }
    }
    params
}

/// Pairs of (property index, parameter index) binding readable properties of
/// `T` to `params`. Fails when nothing matches.
pub(crate) fn bind_parameters<T: Mapped>(
    properties: &[Property<T>],
    params: &[Parameter],
) -> Result<Vec<(usize, usize)>> {
    let mut bindings: Vec<(usize, usize)> = Vec::new();
    for (index, property) in ordered(properties, Property::is_readable) {
        let found = params.iter().position(|p| p.is_named(property.column_name()));
        if let Some(param) = found {
            if !bindings.iter().any(|(_, bound)| *bound == param) {
                bindings.push((index, param));
            }
        }
    }
    if bindings.is_empty() {
        return Err(RowBindError::Mapping(format!(
            "The intersection of the command's parameter names and property names of type {} is empty",
            type_name::<T>()
        )));
    }
    Ok(bindings)
}

/// Pairs of (property index, column index) binding writable properties of
/// `T` to result columns. Properties without a column are left out.
pub(crate) fn bind_columns<T>(properties: &[Property<T>], columns: &[String]) -> Vec<(usize, usize)> {
    ordered(properties, Property::is_writable)
        .filter_map(|(index, property)| {
            find_column(columns, property.column_name()).map(|column| (index, column))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Widget {
        id: i32,
        label: String,
        weight: Option<f64>,
        secret: String,
    }

    impl Mapped for Widget {
        fn properties() -> Vec<Property<Self>> {
            vec![
                Property::field("Id", |w: &Widget| &w.id, |w: &mut Widget| &mut w.id),
                Property::field("Label", |w: &Widget| &w.label, |w: &mut Widget| &mut w.label)
                    .column("widget_label"),
                Property::field("Weight", |w: &Widget| &w.weight, |w: &mut Widget| &mut w.weight),
                Property::writable("Secret", |w: &mut Widget, v: String| w.secret = v),
                Property::readable("Display", |w: &Widget| format!("{}:{}", w.id, w.label)),
            ]
        }
    }

    #[test]
    fn test_parameters_explicit_first() {
        let names: Vec<String> = parameters_from_type::<Widget>()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["@widget_label", "@Id", "@Weight", "@Display"]);
    }

    #[test]
    fn test_parameters_skip_duplicate_names() {
        struct Clash {
            a: i32,
            b: i32,
        }
        impl Mapped for Clash {
            fn properties() -> Vec<Property<Self>> {
                vec![
                    Property::readable("A", |c: &Clash| c.a),
                    Property::readable("B", |c: &Clash| c.b).column("a"),
                ]
            }
        }
        let params = parameters_from_type::<Clash>();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), "@a");
    }

    #[test]
    fn test_parameter_names_keep_declared_case() {
        struct Pair {
            foo: i32,
            bar: i32,
        }
        impl Mapped for Pair {
            fn properties() -> Vec<Property<Self>> {
                vec![
                    Property::readable("Bar", |p: &Pair| p.bar),
                    Property::readable("Foo", |p: &Pair| p.foo).column("foo"),
                ]
            }
        }
        let names: Vec<String> = parameters_from_type::<Pair>()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["@foo", "@Bar"]);
    }

    #[test]
    fn test_bind_columns_case_insensitive() {
        let properties = Widget::properties();
        let columns = vec![
            "ID".to_string(),
            "WIDGET_LABEL".to_string(),
            "label".to_string(),
            "secret".to_string(),
        ];
        let bindings = bind_columns(&properties, &columns);
        // Label is bound through its mapping, never through its own name.
        assert_eq!(bindings, vec![(1, 1), (0, 0), (3, 3)]);
    }

    #[test]
    fn test_bind_parameters_requires_overlap() {
        let properties = Widget::properties();
        let err = bind_parameters(&properties, &[Parameter::unset("unrelated")]).unwrap_err();
        assert!(matches!(err, RowBindError::Mapping(_)));

        let params = vec![Parameter::unset("@id"), Parameter::unset("@Widget_Label")];
        let bindings = bind_parameters(&properties, &params).unwrap();
        assert_eq!(bindings, vec![(1, 1), (0, 0)]);
    }

    #[test]
    fn test_binding_folds_non_ascii_case() {
        #[derive(Default)]
        struct Parcel {
            size: i32,
            level: u8,
        }
        impl Mapped for Parcel {
            fn properties() -> Vec<Property<Self>> {
                vec![
                    Property::field("Größe", |p: &Parcel| &p.size, |p: &mut Parcel| &mut p.size),
                    Property::field("Ärger", |p: &Parcel| &p.level, |p: &mut Parcel| &mut p.level),
                ]
            }
        }

        let properties = Parcel::properties();
        let columns = vec!["ärger".to_string(), "GRÖßE".to_string()];
        assert_eq!(bind_columns(&properties, &columns), vec![(0, 1), (1, 0)]);

        let params = vec![Parameter::unset("@ÄRGER")];
        assert_eq!(bind_parameters(&properties, &params).unwrap(), vec![(1, 0)]);

        let mut parcel = Parcel::default();
        properties[1]
            .write(&mut parcel, "ärger", &SqlValue::Int16(7))
            .unwrap();
        assert_eq!(parcel.level, 7);
        assert_eq!(properties[1].read(&parcel), Some(SqlValue::Int16(7)));
    }

    #[test]
    fn test_bind_parameters_ignores_write_only() {
        let properties = Widget::properties();
        let err = bind_parameters(&properties, &[Parameter::unset("secret")]).unwrap_err();
        assert!(matches!(err, RowBindError::Mapping(_)));
    }

    #[test]
    fn test_property_write_conversion() {
        let properties = Widget::properties();
        let mut widget = Widget::default();
        properties[0]
            .write(&mut widget, "id", &SqlValue::Int16(4))
            .unwrap();
        assert_eq!(widget.id, 4);
        properties[2]
            .write(&mut widget, "weight", &SqlValue::Null)
            .unwrap();
        assert_eq!(widget.weight, None);

        let err = properties[0]
            .write(&mut widget, "id", &SqlValue::Text("x".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            RowBindError::Conversion { column, target } if column == "id" && target == "i32"
        ));
    }

    #[test]
    fn test_property_read() {
        let properties = Widget::properties();
        let widget = Widget {
            id: 3,
            label: "bolt".into(),
            weight: None,
            secret: String::new(),
        };
        assert_eq!(properties[1].read(&widget), Some(SqlValue::Text("bolt".into())));
        assert_eq!(properties[2].read(&widget), Some(SqlValue::Null));
        assert_eq!(properties[3].read(&widget), None);
        assert_eq!(
            properties[4].read(&widget),
            Some(SqlValue::Text("3:bolt".into()))
        );
    }

    #[test]
    fn test_column_mapping_default_is_carried() {
        let mapping = ColumnMapping::with_default("qty", 0);
        assert_eq!(mapping.default_value, Some(SqlValue::Int32(0)));
        let property = Property::readable("Quantity", |w: &Widget| w.id).mapping(mapping);
        assert_eq!(property.column_name(), "qty");
    }
}
