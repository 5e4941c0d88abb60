// src/db/models.rs

//! Row shapes for the package tables and their conversion to records
//!
//! Rows arrive as JSON objects. Dolt and SQLite disagree on how booleans and
//! JSON columns come back (`true` vs `1`, embedded objects vs JSON text), so
//! the deserializers here accept every representation either engine uses.

use crate::codec::Value;
use crate::db::schema::{
    DEPS_TABLE, DEP_COLUMNS, FILES_TABLE, FILE_COLUMNS, PACKAGES_TABLE, PACKAGE_COLUMNS,
};
use crate::db::sql::{Select, SqlValue};
use crate::db::{Row, RowStore};
use crate::error::{Error, Result};
use crate::packages::classify::classify;
use crate::packages::record::{split_tags, DEP_TYPE_TOOL};
use crate::packages::{ContentType, DepRecord, FileRecord, FileType, Frontmatter, PackageRecord};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// A row of `packages`
#[derive(Debug, Clone, Deserialize)]
pub struct PackageRow {
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub agent_variant: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub install_scope: Option<String>,
    #[serde(default, deserialize_with = "json_column")]
    pub variables: Option<JsonValue>,
    #[serde(default, deserialize_with = "json_column")]
    pub options: Option<JsonValue>,
}

impl PackageRow {
    /// Convert to a record without children
    pub fn into_record(self) -> PackageRecord {
        let mut pkg = PackageRecord::new(self.id);
        if let Some(name) = self.name.filter(|n| !n.is_empty()) {
            pkg.name = name;
        }
        if let Some(version) = self.version {
            pkg.version = version;
        }
        pkg.description = self.description.unwrap_or_default();
        pkg.author = self.author.unwrap_or_default();
        if let Some(license) = self.license {
            pkg.license = license;
        }
        pkg.tags = self.tags;
        if let Some(scope) = self.install_scope.filter(|s| !s.is_empty()) {
            pkg.install_scope = scope;
        }
        pkg.variables = self
            .variables
            .map(|v| Value::from_json(&v))
            .filter(|v| !v.is_empty());
        pkg.options = self
            .options
            .map(|v| Value::from_json(&v))
            .filter(|v| !v.is_empty());
        pkg
    }
}

/// A row of `package_files`
#[derive(Debug, Clone, Deserialize)]
pub struct FileRow {
    pub package_id: String,
    pub dest_path: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub sha256: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub file_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub content_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_template: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fm_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fm_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fm_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fm_model: Option<String>,
    #[serde(default, deserialize_with = "json_column")]
    pub frontmatter: Option<JsonValue>,
}

impl FileRow {
    /// Convert to a record, keeping the stored digest as-is
    ///
    /// Unknown stored type names fall back to path classification.
    pub fn into_record(self) -> FileRecord {
        let (path_file_type, path_content_type) = classify(&self.dest_path);

        let file_type = match self.file_type.as_deref().map(str::parse::<FileType>) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                warn!("{} in {}; classifying by path", e, self.dest_path);
                path_file_type
            }
            None => path_file_type,
        };
        let content_type = match self.content_type.as_deref().map(str::parse::<ContentType>) {
            Some(Ok(t)) => t,
            Some(Err(e)) => {
                warn!("{} in {}; classifying by path", e, self.dest_path);
                path_content_type
            }
            None => path_content_type,
        };

        let raw = match self.frontmatter.map(|v| Value::from_json(&v)) {
            Some(Value::Map(map)) => Some(map),
            _ => None,
        };
        let has_fields = self.fm_name.is_some()
            || self.fm_description.is_some()
            || self.fm_version.is_some()
            || self.fm_model.is_some();
        let frontmatter = if raw.is_some() || has_fields {
            Some(Frontmatter {
                name: self.fm_name,
                description: self.fm_description,
                version: self.fm_version,
                model: self.fm_model,
                raw: raw.unwrap_or_default(),
            })
        } else {
            None
        };

        FileRecord {
            package_id: self.package_id,
            dest_path: self.dest_path,
            content: self.content.unwrap_or_default(),
            sha256: self.sha256.unwrap_or_default(),
            file_type,
            content_type,
            is_template: self.is_template,
            frontmatter,
        }
    }
}

/// A row of `package_deps`
#[derive(Debug, Clone, Deserialize)]
pub struct DepRow {
    pub package_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dep_type: Option<String>,
    pub dep_name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dep_spec: Option<String>,
}

impl DepRow {
    pub fn into_record(self) -> DepRecord {
        DepRecord {
            package_id: self.package_id,
            dep_type: self
                .dep_type
                .unwrap_or_else(|| DEP_TYPE_TOOL.to_string()),
            dep_name: self.dep_name,
            dep_spec: self.dep_spec.unwrap_or_default(),
        }
    }
}

/// Any scalar as text; null as `None`
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(match JsonValue::deserialize(d)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// `true`, non-zero numbers, `"1"` and `"true"` are true
fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(match JsonValue::deserialize(d)? {
        JsonValue::Bool(b) => b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    })
}

/// A JSON column delivered either as JSON text or as an embedded value
fn json_column<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<JsonValue>, D::Error> {
    match JsonValue::deserialize(d)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) if s.trim().is_empty() => Ok(None),
        JsonValue::String(s) => serde_json::from_str(&s)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("invalid JSON column: {}", e))),
        other => Ok(Some(other)),
    }
}

/// Tags stored comma-joined, or as a JSON array
fn lenient_tags<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match JsonValue::deserialize(d)? {
        JsonValue::String(s) if s.trim_start().starts_with('[') => {
            match serde_json::from_str::<Vec<String>>(&s) {
                Ok(tags) => tags,
                Err(_) => split_tags(&s),
            }
        }
        JsonValue::String(s) => split_tags(&s),
        JsonValue::Array(items) => items
            .into_iter()
            .map(|item| match item {
                JsonValue::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Deserialize one row into its typed shape
pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    serde_json::from_value(JsonValue::Object(row)).map_err(|e| Error::InvalidRow(e.to_string()))
}

fn by_package(table: &'static str, columns: &'static [&'static str], id: &str) -> Select {
    Select::new(table, columns).filter("package_id", SqlValue::text(id))
}

/// Load a package with its files (by `dest_path`) and deps (by `dep_name`)
pub fn load_package(store: &dyn RowStore, id: &str) -> Result<Option<PackageRecord>> {
    let select = Select::new(PACKAGES_TABLE, PACKAGE_COLUMNS).filter("id", SqlValue::text(id));
    let Some(row) = store.query(&select)?.into_iter().next() else {
        return Ok(None);
    };
    let mut pkg = decode_row::<PackageRow>(row)?.into_record();

    let files = store.query(&by_package(FILES_TABLE, FILE_COLUMNS, id).order_by("dest_path"))?;
    pkg.files = files
        .into_iter()
        .map(|row| decode_row::<FileRow>(row).map(FileRow::into_record))
        .collect::<Result<Vec<_>>>()?;

    let deps = store.query(&by_package(DEPS_TABLE, DEP_COLUMNS, id).order_by("dep_name"))?;
    pkg.deps = deps
        .into_iter()
        .map(|row| decode_row::<DepRow>(row).map(DepRow::into_record))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        "Loaded {}: {} files, {} deps",
        pkg.id,
        pkg.files.len(),
        pkg.deps.len()
    );
    Ok(Some(pkg))
}

/// All package ids, ordered by id
pub fn list_package_ids(store: &dyn RowStore) -> Result<Vec<String>> {
    let rows = store.query(&Select::new(PACKAGES_TABLE, &["id"]).order_by("id"))?;
    rows.into_iter()
        .map(|row| match row.get("id") {
            Some(JsonValue::String(id)) => Ok(id.clone()),
            other => Err(Error::InvalidRow(format!("package id {:?}", other))),
        })
        .collect()
}

/// Number of stored files for a package
pub fn count_files(store: &dyn RowStore, id: &str) -> Result<usize> {
    Ok(store
        .query(&by_package(FILES_TABLE, &["dest_path"], id))?
        .len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_package_row_defaults() {
        let pkg = decode_row::<PackageRow>(row(json!({"id": "p"})))
            .unwrap()
            .into_record();
        assert_eq!(pkg.name, "p");
        assert_eq!(pkg.version, "0.0.0");
        assert_eq!(pkg.install_scope, "any");
        assert!(pkg.tags.is_empty());
        assert!(pkg.variables.is_none());
    }

    #[test]
    fn test_json_columns_as_text_or_object() {
        let text = decode_row::<PackageRow>(row(json!({
            "id": "p",
            "variables": "{\"REPO\": {\"default\": \"main\"}}",
            "options": {"dry": {"type": "bool"}},
            "tags": "a,b"
        })))
        .unwrap()
        .into_record();

        let vars = text.variables.unwrap();
        let repo = vars.as_map().and_then(|m| m.get("REPO")).and_then(Value::as_map).unwrap();
        assert_eq!(repo.get_text("default"), Some("main".to_string()));
        assert!(text.options.unwrap().as_map().unwrap().get("dry").is_some());
        assert_eq!(text.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_tags_as_json_array() {
        let pkg = decode_row::<PackageRow>(row(json!({"id": "p", "tags": "[\"x\", \"y\"]"})))
            .unwrap()
            .into_record();
        assert_eq!(pkg.tags, vec!["x", "y"]);
    }

    #[test]
    fn test_lenient_booleans() {
        for (value, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("1"), true),
            (json!(0), false),
            (json!(false), false),
            (json!(null), false),
        ] {
            let file = decode_row::<FileRow>(row(json!({
                "package_id": "p",
                "dest_path": "a.md",
                "is_template": value,
            })))
            .unwrap();
            assert_eq!(file.is_template, expected);
        }
    }

    #[test]
    fn test_file_row_frontmatter() {
        let file = decode_row::<FileRow>(row(json!({
            "package_id": "p",
            "dest_path": "commands/run.md",
            "content": "x",
            "sha256": "abc",
            "file_type": "command",
            "content_type": "markdown",
            "fm_name": "run",
            "frontmatter": "{\"name\": \"run\", \"tools\": [\"Read\"]}"
        })))
        .unwrap()
        .into_record();

        assert_eq!(file.file_type, FileType::Command);
        let fm = file.frontmatter.unwrap();
        assert_eq!(fm.name.as_deref(), Some("run"));
        assert_eq!(fm.raw.keys().collect::<Vec<_>>(), vec!["name", "tools"]);
    }

    #[test]
    fn test_unknown_file_type_falls_back_to_path() {
        let file = decode_row::<FileRow>(row(json!({
            "package_id": "p",
            "dest_path": "agents/a.md",
            "file_type": "snippet",
            "content_type": "markdown",
        })))
        .unwrap()
        .into_record();
        assert_eq!(file.file_type, FileType::Agent);
        assert!(file.frontmatter.is_none());
    }

    #[test]
    fn test_invalid_row() {
        let err = decode_row::<DepRow>(row(json!({"package_id": "p"}))).unwrap_err();
        assert!(matches!(err, Error::InvalidRow(_)));
    }

    #[test]
    fn test_dep_row_defaults() {
        let dep = decode_row::<DepRow>(row(json!({"package_id": "p", "dep_name": "git", "dep_spec": null})))
            .unwrap()
            .into_record();
        assert_eq!(dep.dep_type, "tool");
        assert_eq!(dep.requirement(), "git");
    }
}
