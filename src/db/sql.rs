// src/db/sql.rs

//! Engine-neutral SQL statements
//!
//! A [`Statement`] renders two ways: as literal SQL (its `Display` impl),
//! which is what the Dolt CLI receives on stdin, and as a parameterized
//! string plus bound values for rusqlite. Literal strings use MySQL
//! escaping: backslashes doubled, then single quotes backslash-escaped.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqliteValue, ValueRef};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Bool(bool),
    /// Stored as compact JSON text
    Json(JsonValue),
}

impl SqlValue {
    pub fn text(s: impl Into<String>) -> Self {
        SqlValue::Text(s.into())
    }

    /// Text when present, NULL otherwise
    pub fn opt_text(s: Option<&str>) -> Self {
        s.map(SqlValue::text).unwrap_or(SqlValue::Null)
    }

    pub fn opt_json(value: Option<JsonValue>) -> Self {
        value.map(SqlValue::Json).unwrap_or(SqlValue::Null)
    }

    /// Render as a SQL literal
    pub fn literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(s) => escape_str(s),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Json(json) => escape_str(&json.to_string()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(SqliteValue::Null),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Bool(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
            SqlValue::Json(json) => ToSqlOutput::Owned(SqliteValue::Text(json.to_string())),
        })
    }
}

/// Quote a string as a MySQL-style literal
pub fn escape_str(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A write statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `DELETE FROM table WHERE column = value`
    Delete {
        table: &'static str,
        column: &'static str,
        value: SqlValue,
    },
    /// `INSERT INTO table (columns) VALUES (values)`
    Insert {
        table: &'static str,
        columns: &'static [&'static str],
        values: Vec<SqlValue>,
    },
}

impl Statement {
    pub fn table(&self) -> &'static str {
        match self {
            Statement::Delete { table, .. } | Statement::Insert { table, .. } => *table,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Statement::Insert { .. })
    }

    /// SQL with `?N` placeholders and the values to bind
    pub fn to_parameterized(&self) -> (String, &[SqlValue]) {
        match self {
            Statement::Delete {
                table,
                column,
                value,
            } => (
                format!("DELETE FROM {} WHERE {} = ?1", table, column),
                std::slice::from_ref(value),
            ),
            Statement::Insert {
                table,
                columns,
                values,
            } => (
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders(values.len())
                ),
                values.as_slice(),
            ),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Delete {
                table,
                column,
                value,
            } => write!(
                f,
                "DELETE FROM {} WHERE {} = {};",
                table,
                column,
                value.literal()
            ),
            Statement::Insert {
                table,
                columns,
                values,
            } => {
                let literals: Vec<String> = values.iter().map(SqlValue::literal).collect();
                write!(
                    f,
                    "INSERT INTO {} ({}) VALUES ({});",
                    table,
                    columns.join(", "),
                    literals.join(", ")
                )
            }
        }
    }
}

/// A single-table read
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub filter: Option<(&'static str, SqlValue)>,
    pub order_by: Option<&'static str>,
}

impl Select {
    pub fn new(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            filter: None,
            order_by: None,
        }
    }

    /// Restrict to rows where `column` equals `value`
    pub fn filter(mut self, column: &'static str, value: SqlValue) -> Self {
        self.filter = Some((column, value));
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = Some(column);
        self
    }

    fn head(&self) -> String {
        format!("SELECT {} FROM {}", self.columns.join(", "), self.table)
    }

    fn tail(&self) -> String {
        self.order_by
            .map(|column| format!(" ORDER BY {}", column))
            .unwrap_or_default()
    }

    pub fn to_parameterized(&self) -> (String, &[SqlValue]) {
        match &self.filter {
            Some((column, value)) => (
                format!("{} WHERE {} = ?1{}", self.head(), column, self.tail()),
                std::slice::from_ref(value),
            ),
            None => (format!("{}{}", self.head(), self.tail()), &[][..]),
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some((column, value)) => write!(
                f,
                "{} WHERE {} = {}{};",
                self.head(),
                column,
                value.literal(),
                self.tail()
            ),
            None => write!(f, "{}{};", self.head(), self.tail()),
        }
    }
}
