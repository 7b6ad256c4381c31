//! # Pack Sync CLI
//!
//! This is the binary entry point for the `pack-sync` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and executing the requested command.
//! - Turning top-level errors into user-facing output.
//!
//! The download logic lives in the `pack_sync` library crate; the binary is
//! a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
