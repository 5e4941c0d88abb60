// src/db/dolt.rs

//! Dolt row store, driven through the `dolt` command-line tool
//!
//! Writes are piped to `dolt sql` on stdin; reads use `dolt sql -q <sql>
//! -r json`, which prints `{"rows": [...]}`. Every call is one process run
//! inside the database directory.

use crate::db::schema::create_tables_script;
use crate::db::sql::{Select, Statement};
use crate::db::{Row, RowStore};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info, warn};

/// Directory that marks a Dolt database
pub const DOLT_DIR_MARKER: &str = ".dolt";

pub struct DoltStore {
    dir: PathBuf,
    binary: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryOutput {
    #[serde(default)]
    rows: Vec<Row>,
}

impl DoltStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            binary: "dolt".to_string(),
        }
    }

    /// Use a different `dolt` executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Whether `dir` holds a Dolt database
    pub fn is_dolt_repo(dir: &Path) -> bool {
        dir.join(DOLT_DIR_MARKER).is_dir()
    }

    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String> {
        let label = args.iter().take(2).copied().collect::<Vec<_>>().join(" ");
        debug!("Running {} {} in {}", self.binary, label, self.dir.display());

        let spawn_error = |e: std::io::Error| {
            Error::RowStore(format!(
                "Failed to run {}: {}. Is dolt installed?",
                self.binary, e
            ))
        };

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .current_dir(&self.dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let (output, written) = match stdin {
            Some(input) => {
                let mut child = command.stdin(Stdio::piped()).spawn().map_err(spawn_error)?;
                // Feed stdin from its own thread so dolt can fill stdout and
                // stderr while the batch is still being written
                let writer = child.stdin.take().map(|mut pipe| {
                    let input = input.to_owned();
                    thread::spawn(move || pipe.write_all(input.as_bytes()))
                });
                let output = child.wait_with_output()?;
                let written = match writer {
                    Some(handle) => handle.join().unwrap_or_else(|_| {
                        Err(io::Error::other("stdin writer thread panicked"))
                    }),
                    None => Ok(()),
                };
                (output, written)
            }
            None => (command.output().map_err(spawn_error)?, Ok(())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::RowStore(format!(
                "dolt {} failed: {}",
                label,
                stderr.trim()
            )));
        }
        written.map_err(|e| {
            Error::RowStore(format!("Failed to write to dolt {}: {}", label, e))
        })?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Wrap statements in one transaction script
pub fn batch_script(statements: &[Statement]) -> String {
    let mut script = String::from("START TRANSACTION;\n");
    for statement in statements {
        script.push_str(&statement.to_string());
        script.push('\n');
    }
    script.push_str("COMMIT;\n");
    script
}

/// Parse the output of `dolt sql -r json`
///
/// Dolt prints nothing at all for an empty result set.
pub fn parse_query_output(stdout: &str) -> Result<Vec<Row>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let output: QueryOutput = serde_json::from_str(stdout)?;
    Ok(output.rows)
}

impl RowStore for DoltStore {
    fn describe(&self) -> String {
        format!("dolt:{}", self.dir.display())
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.run(&["sql"], Some(&create_tables_script()))?;
        info!("Schema ensured in {}", self.dir.display());
        Ok(())
    }

    fn execute(&mut self, statements: &[Statement]) -> Result<()> {
        if statements.is_empty() {
            return Ok(());
        }
        debug!("Piping {} statements to dolt sql", statements.len());
        self.run(&["sql"], Some(&batch_script(statements)))?;
        Ok(())
    }

    fn query(&self, select: &Select) -> Result<Vec<Row>> {
        let sql = select.to_string();
        let stdout = self.run(&["sql", "-q", &sql, "-r", "json"], None)?;
        parse_query_output(&stdout)
    }

    fn commit(&mut self, message: &str) -> Result<()> {
        self.run(&["add", "."], None)?;
        match self.run(&["commit", "-m", message], None) {
            Ok(_) => {
                info!("Committed: {}", message);
                Ok(())
            }
            Err(Error::RowStore(msg)) if msg.contains("nothing to commit") => {
                warn!("Nothing to commit");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sql::SqlValue;
    use tempfile::tempdir;

    #[test]
    fn test_parse_query_output() {
        let rows = parse_query_output(
            r#"{"rows": [{"id": "b", "is_template": 1}, {"id": "a", "variables": {"X": {"default": 1.10}}}]}"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], serde_json::json!("b"));
        assert_eq!(
            serde_json::to_string(&rows[1]["variables"]).unwrap(),
            r#"{"X":{"default":1.10}}"#
        );
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_query_output("").unwrap().is_empty());
        assert!(parse_query_output("\n").unwrap().is_empty());
        assert!(parse_query_output("{}").unwrap().is_empty());
        assert!(parse_query_output("not json").is_err());
    }

    #[test]
    fn test_batch_script() {
        let statements = vec![Statement::Delete {
            table: "packages",
            column: "id",
            value: SqlValue::text("p"),
        }];
        assert_eq!(
            batch_script(&statements),
            "START TRANSACTION;\nDELETE FROM packages WHERE id = 'p';\nCOMMIT;\n"
        );
    }

    #[test]
    fn test_is_dolt_repo() {
        let temp = tempdir().unwrap();
        assert!(!DoltStore::is_dolt_repo(temp.path()));
        std::fs::create_dir(temp.path().join(DOLT_DIR_MARKER)).unwrap();
        assert!(DoltStore::is_dolt_repo(temp.path()));
    }

    /// A store whose "dolt" is `sh`, so `dolt sql ...` runs the `sql` script
    /// written into the database directory
    #[cfg(unix)]
    fn scripted_store(scripts: &[(&str, &str)]) -> (tempfile::TempDir, DoltStore) {
        let temp = tempdir().unwrap();
        for (name, body) in scripts {
            std::fs::write(temp.path().join(name), body).unwrap();
        }
        let store = DoltStore::new(temp.path()).with_binary("sh");
        (temp, store)
    }

    #[cfg(unix)]
    const ECHO_SQL: &str = r#"if [ "$1" = "-q" ]; then
  printf '%s' "$2" > query.sql
  printf '%s' '{"rows": [{"id": "sc-a"}, {"id": "sc-b", "tags": "x,y"}]}'
  exit 0
fi
tee batch.sql
"#;

    #[cfg(unix)]
    #[test]
    fn test_execute_pipes_batch_to_process() {
        let (temp, mut store) = scripted_store(&[("sql", ECHO_SQL)]);
        let statements = vec![Statement::Delete {
            table: "packages",
            column: "id",
            value: SqlValue::text("sc-a"),
        }];
        store.execute(&statements).unwrap();

        let written = std::fs::read_to_string(temp.path().join("batch.sql")).unwrap();
        assert_eq!(written, batch_script(&statements));
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_large_batch_while_output_flows() {
        let (temp, mut store) = scripted_store(&[("sql", ECHO_SQL)]);
        // The script echoes every byte back, well past any pipe buffer
        let statements: Vec<Statement> = (0..4)
            .map(|i| Statement::Insert {
                table: "package_files",
                columns: &["package_id", "content"],
                values: vec![SqlValue::text(format!("p{}", i)), SqlValue::text("x".repeat(512 * 1024))],
            })
            .collect();
        store.execute(&statements).unwrap();

        let written = std::fs::metadata(temp.path().join("batch.sql")).unwrap().len();
        assert_eq!(written as usize, batch_script(&statements).len());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_batch_reports_stderr() {
        let (_temp, mut store) = scripted_store(&[(
            "sql",
            "echo 'table not found: packages' >&2\nexit 1\n",
        )]);
        // Exits without reading stdin, so the write side may see a broken pipe
        let statements = vec![Statement::Insert {
            table: "package_files",
            columns: &["content"],
            values: vec![SqlValue::text("y".repeat(1024 * 1024))],
        }];
        let err = store.execute(&statements).unwrap_err();
        match err {
            Error::RowStore(msg) => {
                assert!(msg.contains("table not found: packages"), "{}", msg)
            }
            other => panic!("expected a row store error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_query_reads_json_rows() {
        let (temp, store) = scripted_store(&[("sql", ECHO_SQL)]);
        let select = Select::new("packages", &["id"]);
        let rows = store.query(&select).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["tags"], serde_json::json!("x,y"));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("query.sql")).unwrap(),
            select.to_string()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_with_nothing_staged() {
        let (_temp, mut store) = scripted_store(&[
            ("add", "exit 0\n"),
            ("commit", "echo 'no changes added to commit, nothing to commit' >&2\nexit 1\n"),
        ]);
        store.commit("Ingest: sc-a").unwrap();

        let (_temp, mut broken) = scripted_store(&[
            ("add", "exit 0\n"),
            ("commit", "echo 'fatal: not a dolt repository' >&2\nexit 1\n"),
        ]);
        assert!(matches!(broken.commit("Ingest: sc-a"), Err(Error::RowStore(_))));
    }

    #[test]
    fn test_missing_binary_is_store_error() {
        let temp = tempdir().unwrap();
        let store = DoltStore::new(temp.path()).with_binary("canvas-transcode-no-such-dolt");
        let err = store.query(&Select::new("packages", &["id"])).unwrap_err();
        assert!(matches!(err, Error::RowStore(_)));
        assert_eq!(store.describe(), format!("dolt:{}", temp.path().display()));
    }
}
