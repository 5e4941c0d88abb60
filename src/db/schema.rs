// src/db/schema.rs

//! Row-store schema definitions
//!
//! The table DDL is written in the subset shared by Dolt (MySQL dialect) and
//! SQLite, so `init` can run the same statements against either engine.

use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

pub const PACKAGES_TABLE: &str = "packages";
pub const FILES_TABLE: &str = "package_files";
pub const DEPS_TABLE: &str = "package_deps";

/// Columns of `packages`, in insert order
pub const PACKAGE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "version",
    "description",
    "agent_variant",
    "author",
    "license",
    "tags",
    "install_scope",
    "variables",
    "options",
];

/// Columns of `package_files`, in insert order
pub const FILE_COLUMNS: &[&str] = &[
    "package_id",
    "dest_path",
    "content",
    "sha256",
    "file_type",
    "content_type",
    "is_template",
    "fm_name",
    "fm_description",
    "fm_version",
    "fm_model",
    "frontmatter",
];

/// Columns of `package_deps`, in insert order
pub const DEP_COLUMNS: &[&str] = &["package_id", "dep_type", "dep_name", "dep_spec"];

/// Table DDL valid for both Dolt and SQLite
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS packages (
        id VARCHAR(255) NOT NULL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        version VARCHAR(64) NOT NULL,
        description TEXT,
        agent_variant VARCHAR(32) NOT NULL DEFAULT 'claude',
        author VARCHAR(255),
        license VARCHAR(64),
        tags TEXT,
        install_scope VARCHAR(32) NOT NULL DEFAULT 'any',
        variables JSON,
        options JSON
    )",
    "CREATE TABLE IF NOT EXISTS package_files (
        package_id VARCHAR(255) NOT NULL,
        dest_path VARCHAR(512) NOT NULL,
        content LONGTEXT NOT NULL,
        sha256 CHAR(64),
        file_type VARCHAR(32) NOT NULL,
        content_type VARCHAR(32) NOT NULL,
        is_template BOOLEAN NOT NULL DEFAULT FALSE,
        fm_name VARCHAR(255),
        fm_description TEXT,
        fm_version VARCHAR(64),
        fm_model VARCHAR(64),
        frontmatter JSON,
        PRIMARY KEY (package_id, dest_path),
        FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS package_deps (
        package_id VARCHAR(255) NOT NULL,
        dep_type VARCHAR(32) NOT NULL,
        dep_name VARCHAR(255) NOT NULL,
        dep_spec VARCHAR(255),
        FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
    )",
];

/// The table DDL as one script, statements separated by `;`
pub fn create_tables_script() -> String {
    CREATE_TABLES
        .iter()
        .map(|ddl| format!("{};", ddl))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lookup indexes for SQLite
///
/// Dolt indexes foreign key columns on its own.
pub const SQLITE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_package_deps_package ON package_deps(package_id, dep_name)",
];

/// Create the tables and indexes on a SQLite connection
///
/// Every statement is `IF NOT EXISTS`, so this is safe to run on every open.
pub fn create_tables(conn: &Connection) -> Result<()> {
    debug!("Ensuring package tables");
    conn.execute_batch(&create_tables_script())?;
    for ddl in SQLITE_INDEXES {
        conn.execute(ddl, [])?;
    }
    Ok(())
}
