// src/ingest.rs

//! Package directories → row-store batch
//!
//! Ingest runs in two steps. [`plan`] scans every directory and encodes the
//! packages that scanned cleanly. [`apply`] sends the whole plan to a store
//! as one batch. A package that fails to scan is logged and left out; the
//! rest of the batch still goes through.

use crate::codec::Value;
use crate::db::schema::FILES_TABLE;
use crate::db::{count_files, encode_package, RowStore, Statement};
use crate::error::Result;
use crate::packages::{scan_package, ScannedPackage};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// File inserts longer than this are shortened in dry-run output
pub const PREVIEW_TRUNCATE_OVER: usize = 500;

/// Length kept from a shortened insert
pub const PREVIEW_KEEP: usize = 200;

const RULE: &str = "============================================================";

/// A scanned package and the statements that store it
#[derive(Debug, Clone)]
pub struct PlannedPackage {
    pub source: PathBuf,
    pub scanned: ScannedPackage,
    pub statements: Vec<Statement>,
}

impl PlannedPackage {
    pub fn id(&self) -> &str {
        &self.scanned.record.id
    }
}

/// A directory that could not be turned into a package
#[derive(Debug, Clone)]
pub struct IngestFailure {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestPlan {
    pub packages: Vec<PlannedPackage>,
    pub failures: Vec<IngestFailure>,
}

impl IngestPlan {
    pub fn package_ids(&self) -> Vec<&str> {
        self.packages.iter().map(PlannedPackage::id).collect()
    }

    /// Every statement of the plan, in package order
    pub fn statements(&self) -> Vec<Statement> {
        self.packages
            .iter()
            .flat_map(|p| p.statements.iter().cloned())
            .collect()
    }

    pub fn warning_count(&self) -> usize {
        self.packages.iter().map(|p| p.scanned.warnings.len()).sum()
    }

    /// Commit message used when none is given
    pub fn default_commit_message(&self) -> String {
        format!("Ingest: {}", self.package_ids().join(", "))
    }
}

/// Scan and encode each directory, in argument order
///
/// Scan failures only affect their own directory.
pub fn plan(dirs: &[PathBuf]) -> IngestPlan {
    let mut plan = IngestPlan::default();

    for dir in dirs {
        if !dir.is_dir() {
            error!("Not a directory: {}", dir.display());
            plan.failures.push(IngestFailure {
                source: dir.clone(),
                reason: "not a directory".to_string(),
            });
            continue;
        }

        match scan_package(dir) {
            Ok(scanned) => {
                let statements = encode_package(&scanned.record);
                plan.packages.push(PlannedPackage {
                    source: dir.clone(),
                    scanned,
                    statements,
                });
            }
            Err(e) => {
                error!("Skipping {}: {}", dir.display(), e);
                plan.failures.push(IngestFailure {
                    source: dir.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    plan
}

/// Stored file count of one package after an ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCount {
    pub id: String,
    pub files: usize,
}

/// Execute the plan as one batch and read back the stored file counts
///
/// A store failure aborts the whole batch.
pub fn apply(store: &mut dyn RowStore, plan: &IngestPlan) -> Result<Vec<StoredCount>> {
    if plan.packages.is_empty() {
        warn!("Nothing to ingest");
        return Ok(Vec::new());
    }

    let statements = plan.statements();
    info!(
        "Ingesting {} package(s) into {} ({} statements)",
        plan.packages.len(),
        store.describe(),
        statements.len()
    );
    store.execute(&statements)?;

    plan.package_ids()
        .into_iter()
        .map(|id| {
            Ok(StoredCount {
                id: id.to_string(),
                files: count_files(&*store, id)?,
            })
        })
        .collect()
}

/// Render a statement for dry-run output
///
/// Large file inserts are cut short so a preview stays readable.
pub fn preview(statement: &Statement) -> String {
    let sql = statement.to_string();
    if statement.is_insert()
        && statement.table() == FILES_TABLE
        && sql.len() > PREVIEW_TRUNCATE_OVER
    {
        let mut cut = PREVIEW_KEEP;
        while !sql.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}\n  ... [content truncated] ...", &sql[..cut])
    } else {
        sql
    }
}

/// The dry-run SQL listing of one package
pub fn preview_package(planned: &PlannedPackage) -> String {
    let mut out = format!("-- SQL for {}\n", planned.id());
    for statement in &planned.statements {
        out.push_str(&preview(statement));
        out.push('\n');
    }
    out
}

fn map_keys(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_map())
        .map(|m| m.keys().collect::<Vec<_>>().join(", "))
}

/// Human-readable summary of a scanned package
pub fn summary(scanned: &ScannedPackage) -> String {
    let pkg = &scanned.record;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Package: {}  v{}", pkg.id, pkg.version);
    let _ = writeln!(out, "  Author:  {}", pkg.author);
    let _ = writeln!(out, "  Tags:    {}", pkg.tags_joined());
    let _ = writeln!(out, "  Scope:   {}", pkg.install_scope);
    if let Some(vars) = map_keys(pkg.variables.as_ref()) {
        let _ = writeln!(out, "  Vars:    {}", vars);
    }
    if let Some(options) = map_keys(pkg.options.as_ref()) {
        let _ = writeln!(out, "  Options: {}", options);
    }

    let _ = writeln!(out, "  Files:   {}", pkg.files.len());
    for file in &pkg.files {
        let mut flags = String::new();
        if file.is_template {
            flags.push_str(" [T]");
        }
        if file.frontmatter.is_some() {
            flags.push_str(" [FM]");
        }
        let _ = writeln!(out, "    {:8} {}{}", file.file_type.as_str(), file.dest_path, flags);
    }

    if !pkg.deps.is_empty() {
        let _ = writeln!(out, "  Deps:    {}", pkg.deps.len());
        for dep in &pkg.deps {
            let _ = writeln!(out, "    {}", dep.requirement());
        }
    }

    if !scanned.warnings.is_empty() {
        let _ = writeln!(out, "  Warnings: {}", scanned.warnings.len());
        for warning in &scanned.warnings {
            let _ = writeln!(out, "    {}", warning);
        }
    }

    let _ = write!(out, "{}", RULE);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SqlValue, SqliteStore};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_package(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("commands")).unwrap();
        fs::write(
            dir.join("manifest.yaml"),
            format!(
                "name: {}\nversion: 1.2.0\nauthor: randlee\ntags: [a, b]\nartifacts:\n  commands:\n    - commands/run.md\nrequires:\n  - git >= 2.20\n",
                name
            ),
        )
        .unwrap();
        fs::write(
            dir.join("commands/run.md"),
            "---\nname: run\ndescription: Run it\n---\nUse {{REPO}}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_plan_skips_bad_directories() {
        let temp = tempdir().unwrap();
        let good = write_package(temp.path(), "sc-good");
        let empty = temp.path().join("sc-empty");
        fs::create_dir(&empty).unwrap();
        let missing = temp.path().join("sc-missing");

        let plan = plan(&[good, empty, missing]);
        assert_eq!(plan.package_ids(), vec!["sc-good"]);
        assert_eq!(plan.failures.len(), 2);
        assert_eq!(plan.failures[1].reason, "not a directory");
        assert_eq!(plan.default_commit_message(), "Ingest: sc-good");
    }

    #[test]
    fn test_apply_reports_counts() {
        let temp = tempdir().unwrap();
        let a = write_package(temp.path(), "sc-a");
        let b = write_package(temp.path(), "sc-b");
        let plan = plan(&[a, b]);

        let mut store = SqliteStore::in_memory().unwrap();
        let counts = apply(&mut store, &plan).unwrap();
        assert_eq!(
            counts,
            vec![
                StoredCount { id: "sc-a".to_string(), files: 1 },
                StoredCount { id: "sc-b".to_string(), files: 1 },
            ]
        );
        assert_eq!(plan.default_commit_message(), "Ingest: sc-a, sc-b");
    }

    #[test]
    fn test_apply_twice_is_idempotent() {
        let temp = tempdir().unwrap();
        let plan = plan(&[write_package(temp.path(), "sc-a")]);

        let mut store = SqliteStore::in_memory().unwrap();
        apply(&mut store, &plan).unwrap();
        let counts = apply(&mut store, &plan).unwrap();
        assert_eq!(counts[0].files, 1);
    }

    #[test]
    fn test_empty_plan_touches_nothing() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert!(apply(&mut store, &IngestPlan::default()).unwrap().is_empty());
    }

    #[test]
    fn test_preview_truncates_large_file_inserts() {
        let long = Statement::Insert {
            table: FILES_TABLE,
            columns: &["package_id", "content"],
            values: vec![SqlValue::text("p"), SqlValue::text("x".repeat(600))],
        };
        let shown = preview(&long);
        assert!(shown.ends_with("\n  ... [content truncated] ..."));
        assert_eq!(shown.len(), PREVIEW_KEEP + "\n  ... [content truncated] ...".len());

        let short = Statement::Delete {
            table: FILES_TABLE,
            column: "package_id",
            value: SqlValue::text("p"),
        };
        assert_eq!(preview(&short), "DELETE FROM package_files WHERE package_id = 'p';");
    }

    #[test]
    fn test_preview_cuts_on_char_boundary() {
        let long = Statement::Insert {
            table: FILES_TABLE,
            columns: &["content"],
            values: vec![SqlValue::text("é".repeat(400))],
        };
        assert!(preview(&long).contains("[content truncated]"));
    }

    #[test]
    fn test_summary_lists_files_and_deps() {
        let temp = tempdir().unwrap();
        let plan = plan(&[write_package(temp.path(), "sc-a")]);
        let text = summary(&plan.packages[0].scanned);

        assert!(text.contains("  Package: sc-a  v1.2.0"));
        assert!(text.contains("  Tags:    a,b"));
        assert!(text.contains("    command  commands/run.md [T] [FM]"));
        assert!(text.contains("  Deps:    1\n    git >= 2.20"));
        assert!(!text.contains("Warnings"));

        let sql = preview_package(&plan.packages[0]);
        assert!(sql.starts_with("-- SQL for sc-a\nDELETE FROM package_files"));
    }
}
