//! Connection lifetime management.
//!
//! Operations never share an open handle: each acquires a [`Scope`] at
//! entry and drops it at exit. `exec` keeps a single scope across its
//! BEGIN/COMMIT pair. The store itself holds only the path.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::{DbError, DbResult};
use crate::value::{Record, Value};

/// Handle factory for one named embedded database.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open a connection for the duration of one operation.
    pub fn acquire(&self) -> DbResult<Scope> {
        let conn = Connection::open(&self.path).map_err(|source| DbError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(Scope { conn })
    }
}

/// An acquired connection; the handle closes when the scope drops.
pub struct Scope {
    conn: Connection,
}

impl Scope {
    /// Run one statement and decode whatever rows it yields, pairing each
    /// column name with its row value until the cursor is exhausted.
    /// Statements without a result set execute on the first cursor step
    /// and decode to an empty list.
    pub fn run(&self, sql: &str) -> DbResult<Vec<Record>> {
        let mut statement = self.conn.prepare(sql)?;
        let names: Vec<String> = statement
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = statement.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (index, name) in names.iter().enumerate() {
                record.insert(name.clone(), Value::from(row.get_ref(index)?));
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Run one row-less statement; returns the affected-row count.
    pub fn execute(&self, sql: &str) -> DbResult<usize> {
        Ok(self.conn.execute(sql, [])?)
    }

    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    pub fn begin(&self) -> DbResult<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    pub fn commit(&self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }
}
