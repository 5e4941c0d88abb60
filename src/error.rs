// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for canvas-transcode
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured text outside the supported grammar
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Package directory has no manifest.yaml
    #[error("No manifest.yaml in {0}")]
    ManifestNotFound(PathBuf),

    /// Package id not present in the row store
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// A content file is not valid UTF-8
    #[error("File is not valid UTF-8: {0}")]
    NonUtf8Content(PathBuf),

    /// A path escapes the package root
    #[error("Refusing unsafe path: {0}")]
    UnsafePath(String),

    /// The external row-store engine rejected a statement batch or query
    #[error("Row store error: {0}")]
    RowStore(String),

    /// No row store could be located
    #[error("No Dolt database at {0}")]
    StoreNotFound(PathBuf),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),

    /// A stored row has an unexpected shape
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// Conflicting or unusable command-line settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),
}

impl Error {
    /// Whether this error only affects the current package of a batch
    ///
    /// Everything else (engine failures, missing stores) aborts the batch.
    pub fn is_item_fatal(&self) -> bool {
        matches!(
            self,
            Error::Parse { .. }
                | Error::ManifestNotFound(_)
                | Error::PackageNotFound(_)
                | Error::NonUtf8Content(_)
                | Error::UnsafePath(_)
                | Error::InvalidRow(_)
        )
    }
}

/// Result type alias using canvas-transcode's Error type
pub type Result<T> = std::result::Result<T, Error>;
