//! Field descriptors and the fragment generator.
//!
//! A [`FieldDescriptor`] is the metadata derived for one mapped record field. The
//! rendering functions in this module turn a descriptor sequence into the four SQL
//! fragment shapes used by the facade: SELECT columns, JOIN clauses, INSERT
//! column/value pairs and UPDATE assignments.

use crate::value::{Value, quote_literal};

/// Default sentinel expanded to [`NIL_UUID`].
pub const DEFAULT_KEY_UUID: &str = "uuid";
/// The nil UUID literal.
pub const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Metadata for one mapped field.
///
/// `name` is the qualified column (`"table.column"`). An empty name comes from a
/// present-but-blank column attribute: such descriptors are left out of SELECT
/// rendering but still take part in INSERT and UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub default: Option<&'static str>,
    pub join: Option<&'static str>,
    /// Present only when produced by value-carrying introspection.
    pub value: Option<Value>,
}

impl FieldDescriptor {
    /// Structural descriptor.
    ///
    /// Empty `default`/`join` strings are normalized to `None`, and the `"uuid"`
    /// default expands to the nil UUID.
    pub fn new(name: &'static str, default: &'static str, join: &'static str) -> Self {
        let default = match default {
            "" => None,
            DEFAULT_KEY_UUID => Some(NIL_UUID),
            other => Some(other),
        };
        Self {
            name,
            default,
            join: (!join.is_empty()).then_some(join),
            value: None,
        }
    }

    /// Attach a bound runtime value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Descriptor equality ignoring the bound value.
    pub fn same_shape(&self, other: &FieldDescriptor) -> bool {
        self.name == other.name && self.default == other.default && self.join == other.join
    }

    /// Table qualifier of `name`, if any (`"users"` for `"users.email"`).
    pub fn table(&self) -> Option<&'static str> {
        self.name.rsplit_once('.').map(|(table, _)| table)
    }

    /// Unqualified column (`"email"` for `"users.email"`).
    pub fn column(&self) -> &'static str {
        self.name.rsplit_once('.').map_or(self.name, |(_, column)| column)
    }

    /// Whether this field can be written by an INSERT/UPDATE against `table`.
    ///
    /// Blank names and columns qualified with another table (typically reached
    /// through a join) are read-only.
    pub fn writable_for(&self, table: &str) -> bool {
        if self.name.is_empty() {
            return false;
        }
        let target = table.rsplit_once('.').map_or(table, |(_, t)| t);
        match self.table() {
            None => true,
            Some(qualifier) => {
                let qualifier = qualifier.rsplit_once('.').map_or(qualifier, |(_, t)| t);
                qualifier == target
            }
        }
    }

    /// SELECT column: `name AS "name"` or `COALESCE(name, 'a', 'b') AS "name"`.
    ///
    /// Returns `None` for blank-named descriptors.
    pub fn to_select(&self) -> Option<String> {
        if self.name.is_empty() {
            return None;
        }
        Some(match self.default {
            None => format!(r#"{} AS "{}""#, self.name, self.name),
            Some(def) => {
                let literals: Vec<String> = def.split(',').map(|v| quote_literal(v.trim())).collect();
                format!(
                    r#"COALESCE({}, {}) AS "{}""#,
                    self.name,
                    literals.join(", "),
                    self.name
                )
            }
        })
    }

    /// Named placeholder token, e.g. `:t.a`.
    pub fn to_placeholder(&self) -> String {
        format!(":{}", self.name)
    }

    /// Template-style UPDATE assignment, e.g. `a = :t.a`.
    pub fn to_update(&self) -> String {
        format!("{} = :{}", self.column(), self.name)
    }
}

/// Render the SELECT column list, skipping blank-named descriptors.
pub fn render_select(fields: &[FieldDescriptor]) -> Vec<String> {
    fields.iter().filter_map(FieldDescriptor::to_select).collect()
}

/// Collect join clauses in descriptor order. Duplicates are kept.
pub fn render_joins(fields: &[FieldDescriptor]) -> Vec<&'static str> {
    fields.iter().filter_map(|f| f.join).collect()
}

/// Descriptors that can be written to `table`, in order.
pub fn writable(fields: &[FieldDescriptor], table: &str) -> Vec<FieldDescriptor> {
    fields.iter().filter(|f| f.writable_for(table)).cloned().collect()
}

/// Name, column and value sequences for a positional INSERT.
///
/// Descriptors without a bound value bind `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValues {
    /// Qualified descriptor names (`t.a`).
    pub names: Vec<&'static str>,
    /// Columns as written in the statement (`a`).
    pub columns: Vec<&'static str>,
    pub values: Vec<Value>,
}

impl ColumnValues {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub fn render_insert(fields: &[FieldDescriptor]) -> ColumnValues {
    let mut out = ColumnValues {
        names: Vec::with_capacity(fields.len()),
        columns: Vec::with_capacity(fields.len()),
        values: Vec::with_capacity(fields.len()),
    };
    for field in fields {
        out.names.push(field.name);
        out.columns.push(field.column());
        out.values.push(field.value.clone().unwrap_or(Value::Null));
    }
    out
}

/// Column list and placeholder list for a template-style INSERT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInsert {
    /// `a, b`
    pub columns: String,
    /// `:t.a, :t.b`
    pub placeholders: String,
}

impl NamedInsert {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub fn render_named_insert(fields: &[FieldDescriptor]) -> NamedInsert {
    let columns: Vec<&str> = fields.iter().map(FieldDescriptor::column).collect();
    let placeholders: Vec<String> = fields.iter().map(FieldDescriptor::to_placeholder).collect();
    NamedInsert {
        columns: columns.join(", "),
        placeholders: placeholders.join(", "),
    }
}

/// One `column = value` pair of a positional UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: Value,
}

pub fn render_update(fields: &[FieldDescriptor]) -> Vec<Assignment> {
    fields
        .iter()
        .map(|f| Assignment {
            column: f.column(),
            value: f.value.clone().unwrap_or(Value::Null),
        })
        .collect()
}

/// Template-style UPDATE assignments, one per descriptor.
pub fn render_named_update(fields: &[FieldDescriptor]) -> Vec<String> {
    fields.iter().map(FieldDescriptor::to_update).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_default() {
        let field = FieldDescriptor::new("t.c", "", "");
        assert_eq!(field.to_select().unwrap(), r#"t.c AS "t.c""#);
    }

    #[test]
    fn select_with_single_default() {
        let field = FieldDescriptor::new("t.c", "3", "");
        assert_eq!(field.to_select().unwrap(), r#"COALESCE(t.c, '3') AS "t.c""#);
    }

    #[test]
    fn select_with_default_list_trims_parts() {
        let field = FieldDescriptor::new("test_name", "test_default,test_default1, test_default2", "");
        assert_eq!(
            field.to_select().unwrap(),
            r#"COALESCE(test_name, 'test_default', 'test_default1', 'test_default2') AS "test_name""#
        );

        let field = FieldDescriptor::new("t.c", "a, b", "");
        assert_eq!(field.to_select().unwrap(), r#"COALESCE(t.c, 'a', 'b') AS "t.c""#);
    }

    #[test]
    fn uuid_default_expands_to_nil_uuid() {
        let field = FieldDescriptor::new("t.id", "uuid", "");
        assert_eq!(field.default, Some(NIL_UUID));
        assert_eq!(
            field.to_select().unwrap(),
            format!(r#"COALESCE(t.id, '{NIL_UUID}') AS "t.id""#)
        );
    }

    #[test]
    fn blank_name_is_left_out_of_select_only() {
        let fields = vec![
            FieldDescriptor::new("", "", ""),
            FieldDescriptor::new("t.a", "", ""),
        ];
        assert_eq!(render_select(&fields), vec![r#"t.a AS "t.a""#]);

        // Blank names still take part in INSERT and UPDATE rendering.
        assert_eq!(render_insert(&fields).names, vec!["", "t.a"]);
        assert_eq!(render_named_update(&fields).len(), 2);
    }

    #[test]
    fn joins_keep_order_and_duplicates() {
        let join = "LEFT JOIN t2 ON t2.id = t.t2_id";
        let fields = vec![
            FieldDescriptor::new("t2.a", "", join),
            FieldDescriptor::new("t.b", "", ""),
            FieldDescriptor::new("t2.c", "", join),
        ];
        assert_eq!(render_joins(&fields).join(" "), format!("{join} {join}"));
    }

    #[test]
    fn insert_pairs_names_with_values() {
        let fields = vec![
            FieldDescriptor::new("t.a", "", "").with_value(Value::Int8(1)),
            FieldDescriptor::new("t.b", "", "").with_value(Value::from("x")),
        ];
        let insert = render_insert(&fields);
        assert_eq!(insert.names, vec!["t.a", "t.b"]);
        assert_eq!(insert.columns, vec!["a", "b"]);
        assert_eq!(insert.values, vec![Value::Int8(1), Value::from("x")]);

        let named = render_named_insert(&fields);
        assert_eq!(named.columns, "a, b");
        assert_eq!(named.placeholders, ":t.a, :t.b");
    }

    #[test]
    fn insert_without_bound_value_binds_null() {
        let fields = vec![FieldDescriptor::new("t.a", "", "")];
        assert_eq!(render_insert(&fields).values, vec![Value::Null]);
    }

    #[test]
    fn qualifier_split() {
        let field = FieldDescriptor::new("public.users.email", "", "");
        assert_eq!(field.table(), Some("public.users"));
        assert_eq!(field.column(), "email");

        let field = FieldDescriptor::new("email", "", "");
        assert_eq!(field.table(), None);
        assert_eq!(field.column(), "email");
    }

    #[test]
    fn writable_only_for_own_table() {
        assert!(FieldDescriptor::new("users.email", "", "").writable_for("users"));
        assert!(FieldDescriptor::new("users.email", "", "").writable_for("public.users"));
        assert!(FieldDescriptor::new("email", "", "").writable_for("users"));
        assert!(!FieldDescriptor::new("teams.name", "", "").writable_for("users"));
        assert!(!FieldDescriptor::new("", "", "").writable_for("users"));
    }

    #[test]
    fn update_assignments() {
        let fields = vec![
            FieldDescriptor::new("t.a", "", "").with_value(Value::Int8(1)),
            FieldDescriptor::new("t.b", "", ""),
        ];
        assert_eq!(
            render_update(&fields),
            vec![
                Assignment { column: "a", value: Value::Int8(1) },
                Assignment { column: "b", value: Value::Null },
            ]
        );
        assert_eq!(render_named_update(&fields), vec!["a = :t.a", "b = :t.b"]);
    }

    #[test]
    fn writable_keeps_own_table_in_order() {
        let fields = vec![
            FieldDescriptor::new("users.id", "", ""),
            FieldDescriptor::new("teams.name", "", ""),
            FieldDescriptor::new("", "", ""),
            FieldDescriptor::new("users.email", "", ""),
        ];
        let names: Vec<&str> = writable(&fields, "users").iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["users.id", "users.email"]);
    }
}
