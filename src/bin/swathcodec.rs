// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Swathcodec CLI
//!
//! Command-line tool for swath sonar data files.
//!
//! ## Usage
//!
//! ```sh
//! # List supported formats
//! swathcodec formats
//!
//! # Summarize a file
//! swathcodec info line0001.swb
//!
//! # List pings inside a time window and bounds
//! swathcodec list line0001.swb -B 2024/3/1/0/0/0 -E 2024/3/2/0/0/0 -R -10/10/-5/5
//!
//! # Convert to text, averaging every 3 pings
//! swathcodec copy line0001.swb line0001.txt -O 166 -P 3
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{CopyCmd, FormatsCmd, InfoCmd, ListCmd};
use common::Result;
use tracing_subscriber::EnvFilter;

/// Swathcodec - swath sonar data toolkit
///
/// Read, list and convert multibeam, interferometric and sidescan files
/// through one normalized ping record.
#[derive(Parser, Clone)]
#[command(name = "swathcodec")]
#[command(about = "Swath sonar data format toolkit", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Log session activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// List registered formats
    Formats(FormatsCmd),

    /// Summarize a file (record counts, extent, advisories)
    Info(InfoCmd),

    /// Print one line per record
    List(ListCmd),

    /// Copy records into another file and format
    Copy(CopyCmd),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("swathcodec=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swathcodec=warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Formats(cmd) => cmd.run(),
        Commands::Info(cmd) => cmd.run(),
        Commands::List(cmd) => cmd.run(),
        Commands::Copy(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
