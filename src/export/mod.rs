// src/export/mod.rs

//! Row store → package directories
//!
//! A stored package is written back as `manifest.yaml`, every stored file
//! byte-for-byte, and a synthesized plugin descriptor when the package does
//! not store its own.

pub mod manifest;
pub mod plugin;
pub mod verify;

use crate::db::{list_package_ids, load_package, RowStore};
use crate::error::{Error, Result};
use crate::hash::matches_sha256;
use crate::packages::scanner::is_safe_relative_path;
use crate::packages::{PackageRecord, MANIFEST_FILE, PLUGIN_DESCRIPTOR};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub use manifest::build_manifest;
pub use plugin::build_plugin_descriptor;
pub use verify::{verify_against_source, DetailKind, VerifyDetail, VerifyOutcome, VerifyReport};

/// What an export wrote, or would write on a dry run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStats {
    pub id: String,
    pub version: String,
    pub dry_run: bool,
    /// Stored files, not counting the manifest or a synthesized descriptor
    pub content_files: usize,
    pub synthesized_descriptor: bool,
    pub files_written: usize,
    pub sha_ok: usize,
    pub sha_fail: usize,
}

/// A package id that could not be exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    pub exported: Vec<ExportStats>,
    pub failures: Vec<ExportFailure>,
}

impl ExportSummary {
    pub fn files_written(&self) -> usize {
        self.exported.iter().map(|s| s.files_written).sum()
    }

    pub fn sha_ok(&self) -> usize {
        self.exported.iter().map(|s| s.sha_ok).sum()
    }

    pub fn sha_fail(&self) -> usize {
        self.exported.iter().map(|s| s.sha_fail).sum()
    }
}

/// A package id names a single directory under the output root
fn check_package_id(id: &str) -> Result<()> {
    if is_safe_relative_path(id) && !id.contains(['/', '\\']) && id != "." {
        Ok(())
    } else {
        Err(Error::UnsafePath(id.to_string()))
    }
}

fn check_paths(pkg: &PackageRecord) -> Result<()> {
    check_package_id(&pkg.id)?;
    match pkg.files.iter().find(|f| !is_safe_relative_path(&f.dest_path)) {
        Some(file) => Err(Error::UnsafePath(file.dest_path.clone())),
        None => Ok(()),
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// Export one package to `<out_root>/<id>`
///
/// Every stored path is checked before anything is written.
pub fn export_package(
    store: &dyn RowStore,
    id: &str,
    out_root: &Path,
    dry_run: bool,
) -> Result<ExportStats> {
    let pkg = load_package(store, id)?.ok_or_else(|| Error::PackageNotFound(id.to_string()))?;
    check_paths(&pkg)?;

    let synthesized_descriptor = pkg.file(PLUGIN_DESCRIPTOR).is_none();
    let mut stats = ExportStats {
        id: pkg.id.clone(),
        version: pkg.version.clone(),
        dry_run,
        content_files: pkg.files.len(),
        synthesized_descriptor,
        ..Default::default()
    };

    if dry_run {
        return Ok(stats);
    }

    let pkg_dir = out_root.join(&pkg.id);
    fs::create_dir_all(&pkg_dir)?;

    write_file(&pkg_dir.join(MANIFEST_FILE), &build_manifest(&pkg))?;
    stats.files_written += 1;

    for file in &pkg.files {
        write_file(&pkg_dir.join(&file.dest_path), &file.content)?;
        stats.files_written += 1;

        if file.sha256.is_empty() {
            continue;
        }
        if matches_sha256(&file.content, &file.sha256) {
            stats.sha_ok += 1;
        } else {
            warn!("{}: SHA mismatch: {}", pkg.id, file.dest_path);
            stats.sha_fail += 1;
        }
    }

    if synthesized_descriptor {
        write_file(&pkg_dir.join(PLUGIN_DESCRIPTOR), &build_plugin_descriptor(&pkg)?)?;
        stats.files_written += 1;
    }

    info!(
        "Exported {}: {} files, {} SHA verified",
        pkg.id, stats.files_written, stats.sha_ok
    );
    Ok(stats)
}

/// Export `ids`, or every stored package when `ids` is empty
///
/// Packages that cannot be exported are logged and skipped; store failures
/// abort the run.
pub fn export_all(
    store: &dyn RowStore,
    ids: &[String],
    out_root: &Path,
    dry_run: bool,
) -> Result<ExportSummary> {
    let ids = if ids.is_empty() {
        list_package_ids(store)?
    } else {
        ids.to_vec()
    };

    info!("Exporting {} package(s) from {}", ids.len(), store.describe());
    if !dry_run {
        fs::create_dir_all(out_root)?;
    }

    let mut summary = ExportSummary::default();
    for id in ids {
        match export_package(store, &id, out_root, dry_run) {
            Ok(stats) => summary.exported.push(stats),
            Err(e) if e.is_item_fatal() => {
                error!("{}: {}", id, e);
                summary.failures.push(ExportFailure {
                    id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}
