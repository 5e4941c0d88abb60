// src/config.rs

//! Run configuration from global command-line flags
//!
//! There are no configuration files. The only thing to resolve is which
//! row store to talk to.

use crate::db::{DoltStore, RowStore, SqliteStore};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name searched for a Dolt database when none is given
pub const DEFAULT_DOLT_DIR: &str = "doltdb";

/// Where the package tables live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Dolt(PathBuf),
    Sqlite(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub doltdb: Option<PathBuf>,
    pub sqlite: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.quiet && self.verbose {
            return Err(Error::InvalidConfig(
                "--quiet and --verbose cannot be combined".to_string(),
            ));
        }
        if self.doltdb.is_some() && self.sqlite.is_some() {
            return Err(Error::InvalidConfig(
                "--doltdb and --sqlite cannot be combined".to_string(),
            ));
        }
        Ok(())
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Resolve the store location relative to `cwd`
    ///
    /// An explicit `--sqlite` file wins. Otherwise the Dolt database is
    /// `--doltdb`, or `./doltdb` when it holds `.dolt`, or `cwd` itself.
    pub fn resolve_store(&self, cwd: &Path) -> Result<StoreLocation> {
        if let Some(path) = &self.sqlite {
            return Ok(StoreLocation::Sqlite(expand_tilde(path)));
        }

        let candidate = match &self.doltdb {
            Some(dir) => expand_tilde(dir),
            None => cwd.join(DEFAULT_DOLT_DIR),
        };
        if DoltStore::is_dolt_repo(&candidate) {
            return Ok(StoreLocation::Dolt(candidate));
        }
        if DoltStore::is_dolt_repo(cwd) {
            debug!("No Dolt database at {}; using {}", candidate.display(), cwd.display());
            return Ok(StoreLocation::Dolt(cwd.to_path_buf()));
        }
        Err(Error::StoreNotFound(candidate))
    }
}

/// Expand a leading `~` to the home directory
///
/// `~user` forms are left as they are.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

impl StoreLocation {
    /// Open the store, creating a SQLite file when `create` is set
    pub fn open(&self, create: bool) -> Result<Box<dyn RowStore>> {
        match self {
            Self::Dolt(dir) => Ok(Box::new(DoltStore::new(dir))),
            Self::Sqlite(path) if create => Ok(Box::new(SqliteStore::create(path)?)),
            Self::Sqlite(path) => Ok(Box::new(SqliteStore::open(path)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::dolt::DOLT_DIR_MARKER;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_quiet_and_verbose_conflict() {
        let config = Config {
            quiet: true,
            verbose: true,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(Config::default().default_log_filter(), "info");
        let quiet = Config { quiet: true, ..Default::default() };
        assert_eq!(quiet.default_log_filter(), "warn");
        let verbose = Config { verbose: true, ..Default::default() };
        assert_eq!(verbose.default_log_filter(), "debug");
    }

    #[test]
    fn test_resolves_default_doltdb() {
        let temp = tempdir().unwrap();
        let db = temp.path().join(DEFAULT_DOLT_DIR);
        fs::create_dir_all(db.join(DOLT_DIR_MARKER)).unwrap();

        let location = Config::default().resolve_store(temp.path()).unwrap();
        assert_eq!(location, StoreLocation::Dolt(db));
    }

    #[test]
    fn test_falls_back_to_cwd() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join(DOLT_DIR_MARKER)).unwrap();

        let location = Config::default().resolve_store(temp.path()).unwrap();
        assert_eq!(location, StoreLocation::Dolt(temp.path().to_path_buf()));
    }

    #[test]
    fn test_missing_store() {
        let temp = tempdir().unwrap();
        let config = Config {
            doltdb: Some(temp.path().join("elsewhere")),
            ..Default::default()
        };
        let err = config.resolve_store(temp.path()).unwrap_err();
        assert!(matches!(err, Error::StoreNotFound(p) if p.ends_with("elsewhere")));
    }

    #[test]
    fn test_sqlite_needs_no_marker() {
        let temp = tempdir().unwrap();
        let config = Config {
            sqlite: Some(temp.path().join("store.db")),
            ..Default::default()
        };
        let location = config.resolve_store(temp.path()).unwrap();
        assert!(matches!(location, StoreLocation::Sqlite(_)));

        let store = location.open(true).unwrap();
        assert!(store.describe().starts_with("sqlite:"));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde(Path::new("/abs/db")), PathBuf::from("/abs/db"));
        assert_eq!(expand_tilde(Path::new("rel/db")), PathBuf::from("rel/db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/doltdb")), home.join("doltdb"));
        }
    }
}
