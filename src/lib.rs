// src/lib.rs

//! canvas-transcode
//!
//! Moves skill packages (a directory with `manifest.yaml`, markdown commands,
//! agents, skills and scripts) into a tabular row store and back out again.
//!
//! # Architecture
//!
//! - `packages`: scan a directory into a `PackageRecord`, classifying files
//! - `codec`: the manifest/frontmatter text subset, parsing and rendering
//! - `db`: row encoding/decoding and the `RowStore` backends (Dolt, SQLite)
//! - `ingest` / `export`: the two directions of the round trip
//! - Exported content is byte-identical; SHA-256 digests are checked on export

pub mod codec;
pub mod config;
pub mod db;
mod error;
pub mod export;
pub mod hash;
pub mod ingest;
pub mod packages;

pub use error::{Error, Result};
