//! Phase 2: Staging the fetched bundle
//!
//! The bundle is written into a scratch directory owned by the run, so later
//! phases can parse, extract and move the fetched files like any other file.
//! The directory is removed by [`cleanup`] at the end of the run.

use std::path::PathBuf;

use log::debug;
use tempfile::TempDir;

use super::RunReport;
use crate::error::Result;
use crate::filesystem::MemoryFS;

/// Fetched files written to a scratch directory.
#[derive(Debug)]
pub struct StagedBundle {
    dir: TempDir,
    /// Staged files in bundle order
    pub files: Vec<PathBuf>,
}

impl StagedBundle {
    /// Location of the scratch directory.
    pub fn root(&self) -> &std::path::Path {
        self.dir.path()
    }
}

/// Execute Phase 2: write `bundle` into a fresh scratch directory.
pub fn execute(bundle: &MemoryFS) -> Result<StagedBundle> {
    let dir = tempfile::Builder::new().prefix("pack-sync-bundle").tempdir()?;
    let files = bundle.write_to(dir.path())?;
    debug!("Staged {} fetched files in {}", files.len(), dir.path().display());
    Ok(StagedBundle { dir, files })
}

/// Remove a scratch directory, recording a failure instead of returning it.
pub fn remove_scratch(dir: TempDir) -> RunReport {
    let mut report = RunReport::new();
    let path = dir.path().display().to_string();
    if let Err(err) = dir.close() {
        report.fail(path, format!("Failed to remove scratch directory: {}", err));
    }
    report
}

/// Remove the staged bundle.
pub fn cleanup(staged: StagedBundle) -> RunReport {
    remove_scratch(staged.dir)
}
