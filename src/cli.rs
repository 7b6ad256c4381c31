//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;

use crate::commands;
use pack_sync::output::OutputConfig;

/// Pack Sync - Download custom content into a content pack
#[derive(Parser, Debug)]
#[command(name = "pack-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download custom content from the server into a pack
    Download(commands::download::DownloadArgs),

    /// Show the content a pack already holds
    Index(commands::index::IndexArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Parse a `--log-level` value, falling back to `warn`.
fn level_filter(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Warn)
}

/// Initialize logging. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str, verbose: bool) {
    let default = if verbose {
        level_filter(level).max(LevelFilter::Info)
    } else {
        level_filter(level)
    };
    let _ = env_logger::Builder::new()
        .filter_level(default)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let verbose = matches!(&self.command, Commands::Download(args) if args.verbose);
        init_logging(&self.log_level, verbose);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Download(args) => commands::download::execute(args, &output),
            Commands::Index(args) => commands::index::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
