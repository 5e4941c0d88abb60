// src/export/verify.rs

//! Compare an exported package against a reference package tree

use crate::error::Result;
use crate::packages::classify::is_skipped_name;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailKind {
    Diff,
    ExportOnly,
    SourceOnly,
    Binary,
}

impl DetailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diff => "DIFF",
            Self::ExportOnly => "EXPORT_ONLY",
            Self::SourceOnly => "SOURCE_ONLY",
            Self::Binary => "BINARY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyDetail {
    pub kind: DetailKind,
    /// Package-relative, `/`-separated
    pub path: String,
}

impl fmt::Display for VerifyDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.path)
    }
}

/// Counts and details of one package comparison
///
/// Binary files are reported in `details` but count as neither matched
/// nor differed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub matched: usize,
    pub differed: usize,
    pub export_only: usize,
    pub source_only: usize,
    pub binary: usize,
    pub details: Vec<VerifyDetail>,
}

impl VerifyReport {
    fn record(&mut self, kind: DetailKind, path: String) {
        match kind {
            DetailKind::Diff => self.differed += 1,
            DetailKind::ExportOnly => self.export_only += 1,
            DetailKind::SourceOnly => self.source_only += 1,
            DetailKind::Binary => self.binary += 1,
        }
        self.details.push(VerifyDetail { kind, path });
    }

    /// Whether every compared file matched
    pub fn is_clean(&self) -> bool {
        self.differed == 0 && self.export_only == 0 && self.source_only == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The reference tree has no directory for this package
    SourceMissing(PathBuf),
    Compared(VerifyReport),
}

fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_pruned(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_skipped_name(&entry.file_name().to_string_lossy())
}

/// Files under `root`, package-relative and sorted
fn files_under(root: &Path, prune: bool) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !prune || !is_pruned(e))
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(relative(root, entry.path()));
        }
    }
    Ok(files)
}

/// Compare `<export_root>/<id>` with `<source_root>/<id>`
pub fn verify_against_source(export_root: &Path, source_root: &Path, id: &str) -> Result<VerifyOutcome> {
    let export_pkg = export_root.join(id);
    let source_pkg = source_root.join(id);

    if !source_pkg.exists() {
        warn!("{}: source not found at {}", id, source_pkg.display());
        return Ok(VerifyOutcome::SourceMissing(source_pkg));
    }

    let mut report = VerifyReport::default();
    let exported = files_under(&export_pkg, false)?;

    for rel in &exported {
        let source_file = source_pkg.join(rel);
        if !source_file.is_file() {
            report.record(DetailKind::ExportOnly, rel.clone());
            continue;
        }

        let exported_bytes = fs::read(export_pkg.join(rel))?;
        let source_bytes = fs::read(&source_file)?;
        match (
            std::str::from_utf8(&exported_bytes),
            std::str::from_utf8(&source_bytes),
        ) {
            (Ok(a), Ok(b)) if a == b => report.matched += 1,
            (Ok(_), Ok(_)) => report.record(DetailKind::Diff, rel.clone()),
            _ => report.record(DetailKind::Binary, rel.clone()),
        }
    }

    let exported: BTreeSet<&str> = exported.iter().map(String::as_str).collect();
    for rel in files_under(&source_pkg, true)? {
        if !exported.contains(rel.as_str()) {
            report.record(DetailKind::SourceOnly, rel);
        }
    }

    debug!(
        "{}: {} matched, {} differed, {} export-only, {} source-only",
        id, report.matched, report.differed, report.export_only, report.source_only
    );
    Ok(VerifyOutcome::Compared(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_source_missing() {
        let temp = tempdir().unwrap();
        let outcome = verify_against_source(temp.path(), &temp.path().join("src"), "p").unwrap();
        assert!(matches!(outcome, VerifyOutcome::SourceMissing(_)));
    }

    #[test]
    fn test_classifies_every_file() {
        let export = tempdir().unwrap();
        let source = tempdir().unwrap();
        let e = export.path().join("p");
        let s = source.path().join("p");

        write(&e, "commands/same.md", b"same\n");
        write(&s, "commands/same.md", b"same\n");
        write(&e, "commands/changed.md", b"new\n");
        write(&s, "commands/changed.md", b"old\n");
        write(&e, ".claude-plugin/plugin.json", b"{}\n");
        write(&s, "scripts/extra.py", b"print()\n");
        write(&e, "assets/logo.bin", &[0xff, 0xfe]);
        write(&s, "assets/logo.bin", &[0xff, 0xfe]);
        write(&s, "README.md", b"skipped\n");
        write(&s, "tests/test_x.py", b"skipped\n");

        let VerifyOutcome::Compared(report) =
            verify_against_source(export.path(), source.path(), "p").unwrap()
        else {
            panic!("expected a comparison");
        };

        assert_eq!(report.matched, 1);
        assert_eq!(report.differed, 1);
        assert_eq!(report.export_only, 1);
        assert_eq!(report.source_only, 1);
        assert_eq!(report.binary, 1);
        assert!(!report.is_clean());

        let details: Vec<String> = report.details.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            details,
            vec![
                "EXPORT_ONLY .claude-plugin/plugin.json",
                "BINARY assets/logo.bin",
                "DIFF commands/changed.md",
                "SOURCE_ONLY scripts/extra.py",
            ]
        );
    }

    #[test]
    fn test_identical_trees_are_clean() {
        let export = tempdir().unwrap();
        let source = tempdir().unwrap();
        for root in [export.path(), source.path()] {
            write(&root.join("p"), "manifest.yaml", b"name: p\n");
            write(&root.join("p"), "agents/a.md", b"agent\n");
        }

        let VerifyOutcome::Compared(report) =
            verify_against_source(export.path(), source.path(), "p").unwrap()
        else {
            panic!("expected a comparison");
        };
        assert_eq!(report.matched, 2);
        assert!(report.is_clean());
        assert!(report.details.is_empty());
    }
}
