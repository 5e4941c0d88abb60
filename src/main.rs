// src/main.rs

use anyhow::Result;
use canvas_transcode::config::Config;
use canvas_transcode::export::{self, VerifyOutcome};
use canvas_transcode::ingest;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canvas-transcode")]
#[command(author, version, about = "Move skill packages between directories and a Dolt or SQLite row store", long_about = None)]
struct Cli {
    /// Dolt database directory (default: ./doltdb, then the current directory)
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "sqlite")]
    doltdb: Option<PathBuf>,

    /// Use a SQLite database file instead of Dolt
    #[arg(long, global = true, value_name = "FILE")]
    sqlite: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the package tables in the selected store
    Init,
    /// Store package directories as rows
    Ingest {
        /// Package directories, each holding a manifest.yaml
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// Print the SQL instead of executing it
        #[arg(long)]
        dry_run: bool,
        /// Only print package summaries
        #[arg(long, conflicts_with = "dry_run")]
        list: bool,
        /// Commit to Dolt history after ingesting
        #[arg(long)]
        commit: bool,
        /// Commit message (default: "Ingest: <ids>")
        #[arg(long, value_name = "MSG", requires = "commit")]
        commit_msg: Option<String>,
    },
    /// Write stored packages back out as directories
    Export {
        /// Output directory for exported packages
        #[arg(long, value_name = "DIR")]
        output: PathBuf,
        /// Package ids to export (default: all)
        #[arg(long, value_name = "ID", num_args = 1..)]
        packages: Vec<String>,
        /// Show what would be exported without writing
        #[arg(long)]
        dry_run: bool,
        /// Compare the export against a reference package tree
        #[arg(long, value_name = "DIR")]
        verify_against: Option<PathBuf>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            doltdb: self.doltdb.clone(),
            sqlite: self.sqlite.clone(),
            json: self.json,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir()?;

    match cli.command {
        Some(Commands::Init) => {
            let location = config.resolve_store(&cwd)?;
            let mut store = location.open(true)?;
            store.ensure_schema()?;

            if config.json {
                print_json(&json!({ "store": store.describe(), "initialized": true }))?;
            } else {
                println!("Schema initialized in {}", store.describe());
            }
            Ok(())
        }
        Some(Commands::Ingest {
            dirs,
            dry_run,
            list,
            commit,
            commit_msg,
        }) => {
            let plan = ingest::plan(&dirs);
            let show_text = !config.json && !config.quiet;

            if show_text {
                for planned in &plan.packages {
                    println!("{}", ingest::summary(&planned.scanned));
                }
            }

            if plan.packages.is_empty() {
                anyhow::bail!("No packages to ingest ({} failed)", plan.failures.len());
            }

            if list {
                if config.json {
                    print_json(&ingest_json(&plan, &[], None, false))?;
                }
                return finish(plan.failures.len());
            }

            if dry_run {
                if config.json {
                    print_json(&ingest_json(&plan, &[], None, true))?;
                } else {
                    for planned in &plan.packages {
                        println!("\n{}", ingest::preview_package(planned));
                    }
                }
                return finish(plan.failures.len());
            }

            let location = config.resolve_store(&cwd)?;
            let mut store = location.open(false)?;
            let counts = ingest::apply(store.as_mut(), &plan)?;

            let committed = if commit {
                let message = commit_msg.unwrap_or_else(|| plan.default_commit_message());
                store.commit(&message)?;
                Some(message)
            } else {
                None
            };

            if config.json {
                print_json(&ingest_json(&plan, &counts, committed.as_deref(), false))?;
            } else {
                println!("Ingested: {}", plan.package_ids().join(", "));
                if !config.quiet {
                    for count in &counts {
                        println!("  {}: {} files", count.id, count.files);
                    }
                }
                if let Some(message) = &committed {
                    println!("Committed: {}", message);
                }
            }
            finish(plan.failures.len())
        }
        Some(Commands::Export {
            output,
            packages,
            dry_run,
            verify_against,
        }) => {
            let location = config.resolve_store(&cwd)?;
            let store = location.open(false)?;
            let summary = export::export_all(store.as_ref(), &packages, &output, dry_run)?;

            if summary.exported.is_empty() && summary.failures.is_empty() {
                anyhow::bail!("No packages found in {}", store.describe());
            }

            let mut verified = Vec::new();
            if let Some(reference) = verify_against.as_ref().filter(|_| !dry_run) {
                info!("Verifying against {}", reference.display());
                for stats in &summary.exported {
                    let outcome = export::verify_against_source(&output, reference, &stats.id)?;
                    verified.push((stats.id.clone(), outcome));
                }
            }

            if config.json {
                let verification: Vec<serde_json::Value> = verified
                    .iter()
                    .map(|(id, outcome)| match outcome {
                        VerifyOutcome::SourceMissing(_) => json!({ "id": id, "source_missing": true }),
                        VerifyOutcome::Compared(report) => json!({ "id": id, "report": report }),
                    })
                    .collect();
                print_json(&json!({
                    "exported": summary.exported,
                    "failures": summary.failures,
                    "verification": verification,
                }))?;
                return finish(summary.failures.len());
            }

            for stats in &summary.exported {
                if dry_run {
                    let descriptor = if stats.synthesized_descriptor { " + plugin.json" } else { "" };
                    println!("  Package: {} v{}", stats.id, stats.version);
                    println!(
                        "  Would write {} content files + manifest.yaml{}",
                        stats.content_files, descriptor
                    );
                } else if !config.quiet {
                    println!(
                        "  {}: {} files, {} SHA verified",
                        stats.id, stats.files_written, stats.sha_ok
                    );
                }
            }
            if !dry_run {
                println!(
                    "Export complete: {} files, {} SHA verified, {} SHA failures",
                    summary.files_written(),
                    summary.sha_ok(),
                    summary.sha_fail()
                );
            }

            for (id, outcome) in &verified {
                match outcome {
                    VerifyOutcome::SourceMissing(_) => println!("  {}: source not found", id),
                    VerifyOutcome::Compared(report) => {
                        println!(
                            "  {}: {} matched, {} differed, {} export-only, {} source-only",
                            id, report.matched, report.differed, report.export_only, report.source_only
                        );
                        for detail in &report.details {
                            println!("    {}", detail);
                        }
                    }
                }
            }

            finish(summary.failures.len())
        }
        None => {
            // No command provided, show help
            println!("canvas-transcode v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'canvas-transcode --help' for usage information");
            Ok(())
        }
    }
}

/// Items that failed were already logged; they still fail the run
fn finish(failures: usize) -> Result<()> {
    if failures > 0 {
        anyhow::bail!("{} package(s) failed", failures);
    }
    Ok(())
}

fn ingest_json(
    plan: &ingest::IngestPlan,
    counts: &[ingest::StoredCount],
    committed: Option<&str>,
    dry_run: bool,
) -> serde_json::Value {
    let packages: Vec<serde_json::Value> = plan
        .packages
        .iter()
        .map(|planned| {
            let pkg = &planned.scanned.record;
            let mut entry = json!({
                "id": pkg.id,
                "version": pkg.version,
                "source": planned.source.display().to_string(),
                "files": pkg.files.iter().map(|f| &f.dest_path).collect::<Vec<_>>(),
                "deps": pkg.deps.iter().map(|d| d.requirement()).collect::<Vec<_>>(),
                "warnings": planned.scanned.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            });
            if dry_run {
                entry["sql"] = json!(planned.statements.iter().map(|s| s.to_string()).collect::<Vec<_>>());
            }
            entry
        })
        .collect();

    json!({
        "dry_run": dry_run,
        "packages": packages,
        "failures": plan.failures.iter().map(|f| json!({
            "source": f.source.display().to_string(),
            "reason": f.reason,
        })).collect::<Vec<_>>(),
        "stored": counts.iter().map(|c| json!({ "id": c.id, "files": c.files })).collect::<Vec<_>>(),
        "committed": committed,
    })
}
