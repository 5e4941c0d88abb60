// src/packages/scanner.rs

//! Package directory scanning
//!
//! Reads `manifest.yaml`, resolves metadata defaults, and loads every
//! declared artifact into a [`PackageRecord`]. Problems that only affect a
//! single artifact are collected as [`ScanWarning`]s; problems with the
//! manifest itself abort the scan of that package.

use crate::codec::{parse_document, parse_frontmatter, Mapping, Value};
use crate::error::{Error, Result};
use crate::packages::classify::{classify, is_skipped, ContentType};
use crate::packages::record::{split_tags, DepRecord, FileRecord, Frontmatter, PackageRecord};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info, warn};

/// Name of the package manifest inside a package directory
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Package-relative path of the plugin descriptor
pub const PLUGIN_DESCRIPTOR: &str = ".claude-plugin/plugin.json";

/// Non-fatal problem found while scanning a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// Declared artifact does not exist on disk
    MissingArtifact(String),
    /// Artifact declared more than once; the first declaration wins
    DuplicatePath(String),
    /// Artifact path is absolute or climbs out of the package
    UnsafePath(String),
    /// Markdown frontmatter block could not be parsed
    InvalidFrontmatter { path: String, message: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArtifact(path) => write!(f, "Missing artifact: {}", path),
            Self::DuplicatePath(path) => write!(f, "Duplicate artifact path: {}", path),
            Self::UnsafePath(path) => write!(f, "Unsafe artifact path: {}", path),
            Self::InvalidFrontmatter { path, message } => {
                write!(f, "Invalid frontmatter in {}: {}", path, message)
            }
        }
    }
}

/// Result of scanning one package directory
#[derive(Debug, Clone)]
pub struct ScannedPackage {
    pub record: PackageRecord,
    pub warnings: Vec<ScanWarning>,
}

/// Whether a package-relative path stays inside the package
pub fn is_safe_relative_path(path: &str) -> bool {
    if path.is_empty() || path.starts_with(['/', '\\']) {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Read a file that must be UTF-8 text
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| Error::NonUtf8Content(path.to_path_buf()))
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
        .unwrap_or_default()
}

fn non_empty_text(manifest: &Mapping, key: &str) -> Option<String> {
    manifest.get_text(key).filter(|s| !s.is_empty())
}

fn tags_from(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::List(items)) => {
            let joined: Vec<String> = items.iter().filter_map(Value::scalar_text).collect();
            split_tags(&joined.join(","))
        }
        Some(value) => value.scalar_text().map(|s| split_tags(&s)).unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Scan a package directory into a record
pub fn scan_package(dir: &Path) -> Result<ScannedPackage> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(Error::ManifestNotFound(dir.to_path_buf()));
    }

    let manifest = parse_document(&read_text(&manifest_path)?)?;
    let fallback = dir_name(dir);

    let id = non_empty_text(&manifest, "name").unwrap_or(fallback);
    let mut record = PackageRecord::new(id.clone());
    if let Some(version) = non_empty_text(&manifest, "version") {
        record.version = version;
    }
    record.description = manifest.get_text("description").unwrap_or_default();
    record.author = manifest.get_text("author").unwrap_or_default();
    if let Some(license) = non_empty_text(&manifest, "license") {
        record.license = license;
    }
    record.tags = tags_from(manifest.get("tags"));

    if let Some(scope) = manifest
        .get("install")
        .and_then(Value::as_map)
        .and_then(|install| install.get_text("scope"))
        .filter(|s| !s.is_empty())
    {
        record.install_scope = scope;
    }

    record.variables = manifest.get("variables").filter(|v| !v.is_empty()).cloned();
    record.options = manifest.get("options").filter(|v| !v.is_empty()).cloned();

    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    if let Some(artifacts) = manifest.get("artifacts").and_then(Value::as_map) {
        for (section, paths) in artifacts.iter() {
            let Some(paths) = paths.as_list() else {
                debug!("Ignoring non-list artifacts section '{}'", section);
                continue;
            };

            for entry in paths {
                let Some(declared) = entry.scalar_text() else {
                    debug!("Ignoring non-scalar entry in artifacts section '{}'", section);
                    continue;
                };
                let rel = declared.trim().trim_start_matches("./").to_string();

                if !is_safe_relative_path(&rel) {
                    warn!("Unsafe artifact path in {}: {}", id, rel);
                    warnings.push(ScanWarning::UnsafePath(rel));
                    continue;
                }
                if is_skipped(&rel) {
                    debug!("Skipping {}", rel);
                    continue;
                }
                if seen.contains(&rel) {
                    warn!("Duplicate artifact path in {}: {}", id, rel);
                    warnings.push(ScanWarning::DuplicatePath(rel));
                    continue;
                }

                let full_path = dir.join(&rel);
                if !full_path.is_file() {
                    warn!("Missing artifact in {}: {}", id, rel);
                    warnings.push(ScanWarning::MissingArtifact(rel));
                    continue;
                }

                record.files.push(scan_file(&id, &rel, &full_path, &mut warnings)?);
                seen.insert(rel);
            }
        }
    }

    let plugin_path = dir.join(PLUGIN_DESCRIPTOR);
    if plugin_path.is_file() && !seen.contains(PLUGIN_DESCRIPTOR) {
        record
            .files
            .push(scan_file(&id, PLUGIN_DESCRIPTOR, &plugin_path, &mut warnings)?);
    }

    if let Some(requires) = manifest.get("requires").and_then(Value::as_list) {
        record.deps = requires
            .iter()
            .filter_map(Value::scalar_text)
            .map(|req| DepRecord::from_requirement(&id, &req))
            .collect();
    }

    info!(
        "Scanned {} v{}: {} files, {} deps, {} warnings",
        record.id,
        record.version,
        record.files.len(),
        record.deps.len(),
        warnings.len()
    );

    Ok(ScannedPackage { record, warnings })
}

fn scan_file(
    package_id: &str,
    rel: &str,
    full_path: &Path,
    warnings: &mut Vec<ScanWarning>,
) -> Result<FileRecord> {
    let content = read_text(full_path)?;
    let (file_type, content_type) = classify(rel);

    let frontmatter = if content_type == ContentType::Markdown {
        match parse_frontmatter(&content) {
            Ok(fm) => fm.map(Frontmatter::from_mapping),
            Err(e) => {
                warn!("Invalid frontmatter in {}: {}", rel, e);
                warnings.push(ScanWarning::InvalidFrontmatter {
                    path: rel.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    } else {
        None
    };

    debug!(
        "Scanned {} ({}, {}, {} bytes)",
        rel,
        file_type,
        content_type,
        content.len()
    );

    Ok(FileRecord::from_content(package_id, rel, content, frontmatter))
}
