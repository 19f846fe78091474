//! Declarative descriptors and statement construction.
//!
//! Each operation maps a [`Descriptor`] to exactly one SQL statement
//! string. Construction is pure; execution lives in the connection scope.
//! The statement text is the compatibility contract, so quoting stays
//! literal here rather than going through parameter binding.

use serde_json::Map;

use crate::value::{Data, Value};

/// Caller-built description of a single CRUD or schema operation.
///
/// `table` is always required; everything else is per-operation. Column
/// names pass through verbatim, unescaped.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Descriptor {
    pub table: String,
    pub fields: Option<String>,
    pub where_clause: Option<String>,
    pub group: Option<String>,
    pub order: Option<String>,
    pub limit: Option<u32>,
    pub where_in: Vec<String>,
    pub joiner: Option<String>,
    pub data: Data,
    pub id: Option<Value>,
    pub field: Option<String>,
}

impl Descriptor {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_fields(mut self, fields: &str) -> Self {
        self.fields = Some(fields.to_string());
        self
    }

    pub fn with_where(mut self, clause: &str) -> Self {
        self.where_clause = Some(clause.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_where_in(mut self, values: &[&str]) -> Self {
        self.where_in = values.iter().map(|value| value.to_string()).collect();
        self
    }

    pub fn with_joiner(mut self, joiner: &str) -> Self {
        self.joiner = Some(joiner.to_string());
        self
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

/// SELECT with the fixed clause order WHERE, GROUP BY, ORDER BY, LIMIT. A
/// non-empty `where_in` appends a quoted ` in (...)` fragment after all
/// other clauses. `joiner` without explicit `fields` selects `joiner.*`.
pub fn select(descriptor: &Descriptor) -> String {
    let fields = match (&descriptor.fields, &descriptor.joiner) {
        (Some(fields), _) => fields.clone(),
        (None, Some(joiner)) => format!("{joiner}.*"),
        (None, None) => "*".to_string(),
    };

    let mut sql = format!("SELECT {fields} FROM {}", descriptor.table);
    if let Some(clause) = &descriptor.where_clause {
        sql.push_str(&format!(" WHERE {clause}"));
    }
    if let Some(group) = &descriptor.group {
        sql.push_str(&format!(" GROUP BY {group}"));
    }
    if let Some(order) = &descriptor.order {
        sql.push_str(&format!(" ORDER BY {order}"));
    }
    if let Some(limit) = descriptor.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if !descriptor.where_in.is_empty() {
        sql.push_str(&format!(" in ('{}')", descriptor.where_in.join("', '")));
    }
    sql
}

/// Single-row SELECT, always LIMIT 1. The `field` form compares against
/// `id` as a quoted string; an explicit `where_clause` overrides both.
pub fn entry(descriptor: &Descriptor) -> String {
    let id = descriptor.id.as_ref().map(Value::bare).unwrap_or_default();
    let mut condition = format!("id={id}");
    if let Some(field) = &descriptor.field {
        condition = format!("{field}=\"{id}\"");
    }
    if let Some(clause) = &descriptor.where_clause {
        condition = clause.clone();
    }
    format!("SELECT * FROM {} WHERE {condition} LIMIT 1", descriptor.table)
}

/// Whole-column SELECT for blob retrieval; `field` is required.
pub fn image(descriptor: &Descriptor) -> String {
    let field = descriptor.field.as_deref().unwrap_or_default();
    format!("SELECT {field} FROM {}", descriptor.table)
}

// The column list carries every data key while the value list only carries
// encodable values, so an unsupported value leaves the two lists uneven.
// That mismatch is part of the contract and fails at execution, not here.
fn columns_and_values(data: &Data) -> (Vec<&str>, Vec<String>) {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (name, value) in data.iter() {
        columns.push(name);
        if let Some(literal) = value.literal() {
            values.push(literal);
        }
    }
    (columns, values)
}

pub fn insert(descriptor: &Descriptor) -> String {
    let (columns, values) = columns_and_values(&descriptor.data);
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        descriptor.table,
        columns.join(","),
        values.join(",")
    )
}

pub fn insert_or_replace(descriptor: &Descriptor) -> String {
    let (columns, values) = columns_and_values(&descriptor.data);
    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        descriptor.table,
        columns.join(","),
        values.join(",")
    )
}

/// UPDATE with one `col = value` assignment per encodable data entry. An
/// absent `where_clause` falls back to `id=<id>` when `id` is present.
pub fn update(descriptor: &Descriptor) -> String {
    let mut sets = Vec::new();
    for (name, value) in descriptor.data.iter() {
        if let Some(literal) = value.literal() {
            sets.push(format!("{name} = {literal}"));
        }
    }

    let condition = match (&descriptor.where_clause, &descriptor.id) {
        (Some(clause), _) => clause.clone(),
        (None, Some(id)) => format!("id={}", id.bare()),
        (None, None) => String::new(),
    };

    format!(
        "UPDATE {} SET {} WHERE {condition}",
        descriptor.table,
        sets.join(",")
    )
}

pub fn delete(descriptor: &Descriptor) -> String {
    match &descriptor.where_clause {
        Some(clause) => format!("DELETE FROM {} WHERE {clause}", descriptor.table),
        None => format!("DELETE FROM {}", descriptor.table),
    }
}

/// COUNT over `id`, or `joiner.id` when a joiner is set.
pub fn count(descriptor: &Descriptor) -> String {
    let counted = match &descriptor.joiner {
        Some(joiner) => format!("{joiner}.id"),
        None => "id".to_string(),
    };
    let mut sql = format!(
        "SELECT COUNT({counted}) as counter FROM {}",
        descriptor.table
    );
    if let Some(clause) = &descriptor.where_clause {
        sql.push_str(&format!(" WHERE {clause}"));
    }
    sql
}

pub fn last_entry(table: &str) -> String {
    format!("SELECT * FROM {table} ORDER BY id DESC")
}

pub fn last_id(table: &str) -> String {
    format!("SELECT id FROM {table} ORDER BY id DESC")
}

/// Column list for an inferred table: the key set of the first sample
/// element, in key order.
pub fn inferred_columns(sample: &Map<String, serde_json::Value>) -> Vec<String> {
    sample.keys().cloned().collect()
}

/// CREATE TABLE for an inferred schema; every column is unconstrained TEXT.
pub fn create_table(table: &str, columns: &[String]) -> String {
    let definitions: Vec<String> = columns
        .iter()
        .map(|column| format!("{column} TEXT"))
        .collect();
    format!("CREATE TABLE {table} ({})", definitions.join(","))
}

/// One INSERT per sample element; every value is coerced to quoted text
/// whatever its JSON type. Missing keys store as empty text.
pub fn insert_text_row(
    table: &str,
    columns: &[String],
    row: &Map<String, serde_json::Value>,
) -> String {
    let values: Vec<String> = columns
        .iter()
        .map(|column| format!("\"{}\"", coerce_text(row.get(column))))
        .collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(","),
        values.join(",")
    )
}

fn coerce_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {table}")
}

pub fn table_exists(table: &str) -> String {
    format!("SELECT name FROM sqlite_master WHERE type='table' AND name='{table}'")
}

pub fn table_info(table: &str) -> String {
    format!("PRAGMA TABLE_INFO({table})")
}

pub fn add_column(table: &str, column: &str, type_spec: &str) -> String {
    format!("ALTER TABLE {table} ADD COLUMN {column} {type_spec}")
}
