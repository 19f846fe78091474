//! Public facade composing descriptors, statement construction, and
//! connection scoping.

use std::path::Path;

use serde_json::Map;
use tracing::warn;

use crate::connection::Store;
use crate::error::{DbError, DbResult};
use crate::query::{self, Descriptor};
use crate::value::{Record, Value};

/// Descriptor-driven interface to one named SQLite database.
///
/// Every method acquires its own connection scope and releases it on
/// exit; nothing is cached between calls. Read methods trap statement
/// failures, log them, and yield empty results; write methods propagate
/// them. Each read method also has a `*_with` form that invokes a
/// synchronous callback with the same result instead of returning it.
pub struct DbHelper {
    store: Store,
}

impl DbHelper {
    /// Point the helper at a database file; the file is created on first
    /// use if it does not exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            store: Store::new(path),
        }
    }

    // Shared read path: statement failures surface as an empty result.
    fn read(&self, sql: &str) -> Vec<Record> {
        match self.store.acquire().and_then(|scope| scope.run(sql)) {
            Ok(records) => records,
            Err(err) => {
                warn!("statement failed: {}", err);
                Vec::new()
            }
        }
    }

    /// SELECT per the descriptor's clause set.
    pub fn get(&self, descriptor: &Descriptor) -> Vec<Record> {
        self.read(&query::select(descriptor))
    }

    /// Callback form of [`get`](Self::get).
    pub fn get_with(&self, descriptor: &Descriptor, callback: impl FnOnce(Vec<Record>)) {
        callback(self.get(descriptor));
    }

    /// Single row keyed on `id`, `field`, or a verbatim `where`.
    pub fn get_entry(&self, descriptor: &Descriptor) -> Option<Record> {
        self.read(&query::entry(descriptor)).into_iter().next()
    }

    pub fn get_entry_with(&self, descriptor: &Descriptor, callback: impl FnOnce(Option<Record>)) {
        callback(self.get_entry(descriptor));
    }

    /// First row's value for the descriptor's `field`; blob columns come
    /// back as [`Value::Blob`].
    pub fn get_image(&self, descriptor: &Descriptor) -> Option<Value> {
        let field = descriptor.field.clone()?;
        self.read(&query::image(descriptor))
            .into_iter()
            .next()
            .and_then(|mut record| record.remove(&field))
    }

    pub fn get_image_with(&self, descriptor: &Descriptor, callback: impl FnOnce(Option<Value>)) {
        callback(self.get_image(descriptor));
    }

    /// COUNT over `id` (or `joiner.id`), optionally filtered. Yields the
    /// single counter value, not a record list.
    pub fn count_rows(&self, descriptor: &Descriptor) -> Option<i64> {
        self.read(&query::count(descriptor))
            .first()
            .and_then(|record| record.get("counter"))
            .and_then(Value::as_integer)
    }

    pub fn count_rows_with(&self, descriptor: &Descriptor, callback: impl FnOnce(Option<i64>)) {
        callback(self.count_rows(descriptor));
    }

    /// Highest-id row id, or `None` for an empty table.
    pub fn get_last_id(&self, descriptor: &Descriptor) -> Option<i64> {
        self.read(&query::last_id(&descriptor.table))
            .first()
            .and_then(|record| record.get("id"))
            .and_then(Value::as_integer)
    }

    pub fn get_last_id_with(&self, descriptor: &Descriptor, callback: impl FnOnce(Option<i64>)) {
        callback(self.get_last_id(descriptor));
    }

    /// Highest-id row, or `None` for an empty table.
    pub fn get_last_entry(&self, descriptor: &Descriptor) -> Option<Record> {
        self.read(&query::last_entry(&descriptor.table))
            .into_iter()
            .next()
    }

    pub fn get_last_entry_with(
        &self,
        descriptor: &Descriptor,
        callback: impl FnOnce(Option<Record>),
    ) {
        callback(self.get_last_entry(descriptor));
    }

    /// INSERT the descriptor's data; returns the new row id.
    pub fn set(&self, descriptor: &Descriptor) -> DbResult<i64> {
        let scope = self.store.acquire()?;
        scope.execute(&query::insert(descriptor))?;
        Ok(scope.last_insert_id())
    }

    /// INSERT OR REPLACE: an existing row with a matching unique or
    /// primary key is replaced. Returns the resulting row id.
    pub fn insert_or_replace(&self, descriptor: &Descriptor) -> DbResult<i64> {
        let scope = self.store.acquire()?;
        scope.execute(&query::insert_or_replace(descriptor))?;
        Ok(scope.last_insert_id())
    }

    /// UPDATE; `id` stands in for a missing `where`. Returns rows
    /// affected.
    pub fn update(&self, descriptor: &Descriptor) -> DbResult<usize> {
        let scope = self.store.acquire()?;
        scope.execute(&query::update(descriptor))
    }

    /// Alias for [`update`](Self::update).
    pub fn edit(&self, descriptor: &Descriptor) -> DbResult<usize> {
        self.update(descriptor)
    }

    /// DELETE, optionally filtered. Returns rows affected.
    pub fn delete(&self, descriptor: &Descriptor) -> DbResult<usize> {
        let scope = self.store.acquire()?;
        scope.execute(&query::delete(descriptor))
    }

    /// Create `table` from a JSON array of flat objects and load every
    /// element into it, in array order. Columns come from the first
    /// element's keys, all typed TEXT; values store as text whatever
    /// their JSON type. An empty array is an error and creates nothing.
    pub fn create_from_json(&self, json: &str, table: &str) -> DbResult<()> {
        let rows: Vec<Map<String, serde_json::Value>> = serde_json::from_str(json)?;
        let first = rows.first().ok_or_else(|| DbError::EmptySample {
            table: table.to_string(),
        })?;
        let columns = query::inferred_columns(first);

        let scope = self.store.acquire()?;
        scope.execute(&query::create_table(table, &columns))?;
        for row in &rows {
            scope.execute(&query::insert_text_row(table, &columns, row))?;
        }
        Ok(())
    }

    /// DROP TABLE; dropping a table that does not exist is an error.
    pub fn drop_table(&self, table: &str) -> DbResult<()> {
        let scope = self.store.acquire()?;
        scope.execute(&query::drop_table(table))?;
        Ok(())
    }

    /// True iff the metadata catalog lists `table`.
    pub fn table_exists(&self, table: &str) -> bool {
        !self.read(&query::table_exists(table)).is_empty()
    }

    /// Add `column` unless the table already has it; a second identical
    /// call is a no-op.
    pub fn add_column(&self, table: &str, column: &str, type_spec: &str) -> DbResult<()> {
        let scope = self.store.acquire()?;
        let info = scope.run(&query::table_info(table))?;
        let present = info.iter().any(|record| {
            matches!(record.get("name"), Some(Value::Text(name)) if name == column)
        });
        if !present {
            scope.execute(&query::add_column(table, column, type_spec))?;
        }
        Ok(())
    }

    /// Run a caller-supplied statement inside a BEGIN/COMMIT pair and
    /// return its decoded rows. The wrapped statement keeps read
    /// semantics: a failure is logged and yields an empty result, and the
    /// COMMIT still runs. BEGIN/COMMIT failures propagate.
    pub fn exec(&self, sql: &str) -> DbResult<Vec<Record>> {
        let scope = self.store.acquire()?;
        scope.begin()?;
        let records = match scope.run(sql) {
            Ok(records) => records,
            Err(err) => {
                warn!("statement failed: {}", err);
                Vec::new()
            }
        };
        scope.commit()?;
        Ok(records)
    }
}
