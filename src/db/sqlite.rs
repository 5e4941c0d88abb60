// src/db/sqlite.rs

//! SQLite row store
//!
//! A local, history-free backend. Statements are bound as parameters rather
//! than rendered as literals, since SQLite string literals do not understand
//! backslash escapes.

use crate::db::schema;
use crate::db::sql::{Select, Statement};
use crate::db::{open, transaction, Row, RowStore};
use crate::error::Result;
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStore {
    /// Open an existing database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open(&path.to_string_lossy())?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Create (or reuse) a database file with an up-to-date schema
    pub fn create(path: &Path) -> Result<Self> {
        crate::db::init(&path.to_string_lossy())?;
        Self::open(path)
    }

    /// A throwaway in-memory store with the schema applied
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }
}

fn to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(i) => JsonValue::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

impl RowStore for SqliteStore {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn ensure_schema(&mut self) -> Result<()> {
        schema::create_tables(&self.conn)
    }

    fn execute(&mut self, statements: &[Statement]) -> Result<()> {
        debug!("Executing {} statements against {}", statements.len(), self.path.display());
        transaction(&mut self.conn, |tx| {
            for statement in statements {
                let (sql, values) = statement.to_parameterized();
                tx.execute(&sql, params_from_iter(values.iter()))?;
            }
            Ok(())
        })
    }

    fn query(&self, select: &Select) -> Result<Vec<Row>> {
        let (sql, values) = select.to_parameterized();
        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                let mut out = Row::new();
                for (i, name) in names.iter().enumerate() {
                    out.insert(name.clone(), to_json(row.get_ref(i)?));
                }
                Ok(out)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn commit(&mut self, message: &str) -> Result<()> {
        info!("SQLite store keeps no history; not recording commit '{}'", message);
        Ok(())
    }
}
