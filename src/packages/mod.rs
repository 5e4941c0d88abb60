// src/packages/mod.rs

//! Package directories and their in-memory records
//!
//! A package is a directory holding `manifest.yaml` plus the agent, command,
//! skill, script and hook files it declares. Scanning turns that directory
//! into a [`PackageRecord`]; export turns a record back into a directory.

pub mod classify;
pub mod record;
pub mod scanner;

pub use classify::{classify, is_skipped, ContentType, FileType};
pub use record::{DepRecord, FileRecord, Frontmatter, PackageRecord};
pub use scanner::{scan_package, ScanWarning, ScannedPackage, MANIFEST_FILE, PLUGIN_DESCRIPTOR};
