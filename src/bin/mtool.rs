//! # mtool CLI
//!
//! Records and restores file modification times for a git checkout.
//!
//! ## Usage
//! ```bash
//! # Record mtimes of all tracked files
//! git ls-files --stage | mtool --create --snapshot .mtool
//!
//! # Check whether a checkout still has the recorded mtimes
//! git ls-files --stage | mtool --verify --snapshot .mtool
//!
//! # Put the recorded mtimes back
//! git ls-files --stage | mtool --restore --snapshot .mtool
//! ```
//!
//! Verify exits with the number of files whose mtime differs (capped at 255).

use clap::{ArgGroup, Parser};
use colored::*;
use humantime::format_duration;
use mtool::{MtoolBuilder, MtoolError, Result, RunReport, DEFAULT_CONCURRENCY};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status for command line errors
const USAGE_EXIT: i32 = 10;

/// mtool - capture, verify and restore file modification times
#[derive(Parser)]
#[command(name = "mtool")]
#[command(version)]
#[command(about = "Capture, verify and restore file modification times of a git checkout")]
#[command(long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .args(["create", "verify", "restore"])
        .multiple(false)
))]
struct Cli {
    /// Input filename; content is in 'git ls-files --stage' format; - is for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// mtool snapshot filename; - is for stdout when creating, stdin otherwise
    #[arg(short = 'm', long, default_value = "-")]
    snapshot: String,

    /// Append to an existing snapshot; only valid when creating a snapshot file
    #[arg(short, long)]
    append: bool,

    /// Be verbose about mtime differences found during verify/restore
    #[arg(short, long)]
    verbose: bool,

    /// Create an mtool snapshot (the default action)
    #[arg(short, long)]
    create: bool,

    /// Verify that timestamps on disk match the snapshot
    #[arg(short = 'n', long)]
    verify: bool,

    /// Restore timestamps from the snapshot where they changed
    #[arg(short, long)]
    restore: bool,

    /// How many files to verify/restore concurrently
    #[arg(short = 'o', long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { USAGE_EXIT } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "ERROR".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Run the selected action and return the process exit status
fn run(cli: Cli) -> Result<i32> {
    let mtool = MtoolBuilder::new().concurrency(cli.concurrency).build()?;

    if !cli.verify && !cli.restore {
        if cli.json && cli.snapshot == "-" {
            return Err(MtoolError::invalid_config(
                "--json needs a snapshot file when creating, stdout carries the snapshot",
            ));
        }
        let input = open_reader(&cli.input)?;
        let sink = open_snapshot_sink(&cli.snapshot, cli.append)?;
        let report = mtool.create(input, sink)?;

        if cli.verbose {
            eprintln!(
                "mtool: wrote {} records in {}",
                report.records_written.to_string().cyan(),
                format_duration(Duration::from_millis(report.duration_ms))
            );
        }
        if cli.json {
            print_json(&report)?;
        }
        return Ok(0);
    }

    if cli.append {
        return Err(MtoolError::invalid_config(
            "--append is only valid when creating a snapshot",
        ));
    }
    if cli.input == cli.snapshot {
        return Err(MtoolError::invalid_config(
            "input and snapshot cannot be the same when restoring",
        ));
    }

    let input = open_reader(&cli.input)?;
    let snapshot = open_reader(&cli.snapshot)?;
    let report = if cli.verify {
        mtool.verify(snapshot, input)?
    } else {
        mtool.restore(snapshot, input)?
    };

    if cli.verbose {
        print_summary(&report);
    }
    if cli.json {
        print_json(&report)?;
    }

    Ok(report.exit_code())
}

/// Print a report as pretty JSON on stdout
fn print_json<T: Serialize>(report: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(report).map_err(io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn print_summary(report: &RunReport) {
    let counts = format!("{}/{}", report.verified, report.total_eligible);
    let counts = if report.non_matching == 0 {
        counts.green()
    } else {
        counts.yellow()
    };
    eprintln!(
        "mtool: {} files verified successfully ({})",
        counts,
        format_duration(Duration::from_millis(report.duration_ms))
    );
}

/// Open a line-oriented input; `-` is stdin
fn open_reader(name: &str) -> Result<Box<dyn BufRead>> {
    if name == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    Ok(Box::new(BufReader::new(File::open(name)?)))
}

/// Open the snapshot output; `-` is stdout
fn open_snapshot_sink(name: &str, append: bool) -> Result<Box<dyn Write>> {
    if name == "-" {
        if append {
            return Err(MtoolError::invalid_config(
                "--append needs a snapshot file, not stdout",
            ));
        }
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }

    let file = if append {
        OpenOptions::new().append(true).create(true).open(name)?
    } else {
        File::create(name)?
    };
    Ok(Box::new(BufWriter::new(file)))
}
