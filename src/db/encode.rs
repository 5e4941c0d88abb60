// src/db/encode.rs

//! PackageRecord → write statements

use crate::codec::Value;
use crate::db::schema::{
    DEPS_TABLE, DEP_COLUMNS, FILES_TABLE, FILE_COLUMNS, PACKAGES_TABLE, PACKAGE_COLUMNS,
};
use crate::db::sql::{SqlValue, Statement};
use crate::packages::{DepRecord, FileRecord, PackageRecord};

/// Agent variant written for every ingested package
pub const AGENT_VARIANT: &str = "claude";

/// Build the statements that replace a package's rows
///
/// The package's existing rows are deleted first, so applying the batch
/// twice leaves the same rows as applying it once.
pub fn encode_package(pkg: &PackageRecord) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(4 + pkg.files.len() + pkg.deps.len());

    statements.push(delete_from(FILES_TABLE, "package_id", &pkg.id));
    statements.push(delete_from(DEPS_TABLE, "package_id", &pkg.id));
    statements.push(delete_from(PACKAGES_TABLE, "id", &pkg.id));

    statements.push(Statement::Insert {
        table: PACKAGES_TABLE,
        columns: PACKAGE_COLUMNS,
        values: vec![
            SqlValue::text(&pkg.id),
            SqlValue::text(&pkg.name),
            SqlValue::text(&pkg.version),
            SqlValue::text(&pkg.description),
            SqlValue::text(AGENT_VARIANT),
            SqlValue::text(&pkg.author),
            SqlValue::text(&pkg.license),
            SqlValue::text(pkg.tags_joined()),
            SqlValue::text(&pkg.install_scope),
            SqlValue::opt_json(pkg.variables.as_ref().map(|v| v.to_json())),
            SqlValue::opt_json(pkg.options.as_ref().map(|v| v.to_json())),
        ],
    });

    statements.extend(pkg.files.iter().map(encode_file));
    statements.extend(pkg.deps.iter().map(encode_dep));
    statements
}

fn delete_from(table: &'static str, column: &'static str, id: &str) -> Statement {
    Statement::Delete {
        table,
        column,
        value: SqlValue::text(id),
    }
}

fn encode_file(file: &FileRecord) -> Statement {
    let fm = file.frontmatter.as_ref();
    Statement::Insert {
        table: FILES_TABLE,
        columns: FILE_COLUMNS,
        values: vec![
            SqlValue::text(&file.package_id),
            SqlValue::text(&file.dest_path),
            SqlValue::text(&file.content),
            SqlValue::text(&file.sha256),
            SqlValue::text(file.file_type.as_str()),
            SqlValue::text(file.content_type.as_str()),
            SqlValue::Bool(file.is_template),
            SqlValue::opt_text(fm.and_then(|f| f.name.as_deref())),
            SqlValue::opt_text(fm.and_then(|f| f.description.as_deref())),
            SqlValue::opt_text(fm.and_then(|f| f.version.as_deref())),
            SqlValue::opt_text(fm.and_then(|f| f.model.as_deref())),
            SqlValue::opt_json(fm.map(|f| Value::Map(f.raw.clone()).to_json())),
        ],
    }
}

fn encode_dep(dep: &DepRecord) -> Statement {
    Statement::Insert {
        table: DEPS_TABLE,
        columns: DEP_COLUMNS,
        values: vec![
            SqlValue::text(&dep.package_id),
            SqlValue::text(&dep.dep_type),
            SqlValue::text(&dep.dep_name),
            SqlValue::text(&dep.dep_spec),
        ],
    }
}
