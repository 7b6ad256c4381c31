//! Shell completions for `pack-sync`.
//!
//! ```bash
//! pack-sync completions bash > ~/.local/share/bash-completion/completions/pack-sync
//! pack-sync completions zsh --output ~/.zfunc/_pack-sync
//! ```

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Command, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn render(shell: Shell, cmd: &mut Command, out: &mut dyn Write) {
    let bin_name = cmd.get_name().to_string();
    generate(shell, cmd, bin_name, out);
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("Cannot create {}", path.display()))?;
            render(args.shell, &mut cmd, &mut file);
        }
        None => render(args.shell, &mut cmd, &mut io::stdout()),
    }
    Ok(())
}
