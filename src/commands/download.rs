//! Download command implementation
//!
//! The download command runs the full 5-phase pipeline against the configured
//! content server:
//! 1. Indexing the content already in the output pack
//! 2. Fetching and staging the custom content bundle
//! 3. Selecting the requested items
//! 4. Creating the missing pack directories
//! 5. Adding new items and merging existing ones
//!
//! Items that could not be downloaded are listed at the end of the run. The
//! command returns an error, and the process exits with status 1, only when
//! the output path is not a pack.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Args;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

use pack_sync::config;
use pack_sync::extract::YmlSplitter;
use pack_sync::output::{emoji, render_failures, OutputConfig};
use pack_sync::phases::orchestrator::{self, RunOutcome};
use pack_sync::phases::DownloadRequest;
use pack_sync::remote::ServerClient;

/// Arguments for the download command
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Path of the pack to download into (~/.../content/Packs/<PACK_NAME>)
    #[arg(short, long, value_name = "PATH")]
    pub output: PathBuf,

    /// Display names of the items to download (repeatable, comma separated)
    #[arg(short, long, value_name = "NAME", required = true, value_delimiter = ',')]
    pub input: Vec<String>,

    /// Merge into existing items, keeping their preserved fields
    #[arg(short, long)]
    pub force: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,

    /// Path to config file
    #[arg(short, long, value_name = "PATH", env = "PACK_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the content server (overrides DEMISTO_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Show detailed progress information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl DownloadArgs {
    fn requested_names(&self) -> Vec<String> {
        self.input
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// Fetch spinner, drawn only when stdout is a terminal and not quiet.
fn spinner(args: &DownloadArgs, stdout_is_term: bool) -> Result<ProgressBar> {
    if args.quiet || !stdout_is_term {
        return Ok(ProgressBar::hidden());
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    bar.set_message("Downloading custom content...");
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

/// Print the run events and the not-downloaded table.
fn print_outcome(outcome: &RunOutcome, args: &DownloadArgs, output: &OutputConfig) {
    if !args.quiet {
        for event in &outcome.report.events {
            println!("- {}", event);
        }
    }
    if let Some(table) = render_failures(output, &outcome.report.failures) {
        eprintln!();
        eprintln!(
            "{} Didn't succeed to download the following files:",
            emoji(output, "⚠️", "[WARN]")
        );
        eprintln!();
        eprintln!("{}", table);
    }
}

/// Execute the download command
pub fn execute(args: DownloadArgs, output: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();

    let mut config = config::load(args.config.as_deref())?;
    if let Some(base_url) = &args.base_url {
        config.server.base_url = Some(base_url.clone());
        config.validate()?;
    }

    let request = DownloadRequest {
        output_pack_path: args.output.clone(),
        requested_names: args.requested_names(),
        force: args.force,
        insecure: args.insecure || config.server.insecure,
    };
    let client = ServerClient::new(&config.server, request.insecure)?;

    if !args.quiet && args.verbose {
        println!(
            "{} Downloading {} item(s) into {}",
            emoji(output, "📥", "[DOWNLOAD]"),
            request.requested_names.len(),
            request.output_pack_path.display()
        );
    }

    let bar = spinner(&args, Term::stdout().is_term())?;
    let mut outcome =
        orchestrator::download(&request, &config.preserved_fields, &client, &YmlSplitter);
    bar.finish_and_clear();

    // main reports the error and exits with status 1
    if let Some(error) = outcome.fatal.take() {
        return Err(error.into());
    }

    print_outcome(&outcome, &args, output);

    if !args.quiet && outcome.report.is_clean() {
        println!(
            "{} Downloaded successfully in {:.2}s",
            emoji(output, "✅", "[OK]"),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}
