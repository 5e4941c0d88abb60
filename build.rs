// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("canvas-transcode")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Synaptic Canvas Contributors")
        .about("Move skill packages between directories and a Dolt or SQLite row store")
        .subcommand_required(false)
        .arg(
            Arg::new("doltdb")
                .long("doltdb")
                .value_name("DIR")
                .global(true)
                .help("Dolt database directory (default: ./doltdb, then the current directory)"),
        )
        .arg(
            Arg::new("sqlite")
                .long("sqlite")
                .value_name("FILE")
                .global(true)
                .conflicts_with("doltdb")
                .help("Use a SQLite database file instead of Dolt"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print results as JSON"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only print warnings and errors"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print debug logging"),
        )
        .subcommand(Command::new("init").about("Create the package tables in the selected store"))
        .subcommand(
            Command::new("ingest")
                .about("Store package directories as rows")
                .arg(
                    Arg::new("dirs")
                        .required(true)
                        .num_args(1..)
                        .help("Package directories, each holding a manifest.yaml"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the SQL instead of executing it"),
                )
                .arg(
                    Arg::new("list")
                        .long("list")
                        .action(ArgAction::SetTrue)
                        .help("Only print package summaries"),
                )
                .arg(
                    Arg::new("commit")
                        .long("commit")
                        .action(ArgAction::SetTrue)
                        .help("Commit to Dolt history after ingesting"),
                )
                .arg(
                    Arg::new("commit_msg")
                        .long("commit-msg")
                        .value_name("MSG")
                        .help("Commit message (default: \"Ingest: <ids>\")"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Write stored packages back out as directories")
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("DIR")
                        .required(true)
                        .help("Output directory for exported packages"),
                )
                .arg(
                    Arg::new("packages")
                        .long("packages")
                        .value_name("ID")
                        .num_args(1..)
                        .help("Package ids to export (default: all)"),
                )
                .arg(
                    Arg::new("dry_run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Show what would be exported without writing"),
                )
                .arg(
                    Arg::new("verify_against")
                        .long("verify-against")
                        .value_name("DIR")
                        .help("Compare the export against a reference package tree"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("canvas-transcode.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
