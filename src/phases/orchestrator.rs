//! Orchestrator for the complete download operation
//!
//! This module runs all phases in order and folds their reports together.
//! The only fatal outcome is an invalid output pack path; everything else
//! ends up as a failed item in the final report, and a run with failed items
//! still succeeds.

use log::{info, warn};

use super::{phase1, phase2, phase3, phase4, phase5, DownloadRequest, RunReport};
use crate::config::PreservedFields;
use crate::error::Error;
use crate::extract::PackageExtractor;
use crate::filesystem::MemoryFS;
use crate::path::is_pack_path;
use crate::remote::ContentFetcher;

/// Result of a download run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Process exit status: 1 only when the run could not start
    pub status: i32,
    pub report: RunReport,
    /// The error that stopped the run before any phase started
    pub fatal: Option<Error>,
}

impl RunOutcome {
    fn finished(report: RunReport) -> Self {
        Self {
            status: 0,
            report,
            fatal: None,
        }
    }

    fn aborted(error: Error) -> Self {
        Self {
            status: 1,
            report: RunReport::new(),
            fatal: Some(error),
        }
    }
}

/// Execute the complete download operation.
///
/// 1. Index the content already in the output pack
/// 2. Fetch the bundle and stage it in a scratch directory
/// 3. Select the requested items from the staged files
/// 4. Create the directories they need
/// 5. Add or merge them into the pack
///
/// The scratch directory is removed before returning. A fetch failure is
/// logged and treated as an empty bundle, so every requested name is then
/// reported as missing.
pub fn download(
    request: &DownloadRequest,
    preserved: &PreservedFields,
    fetcher: &dyn ContentFetcher,
    extractor: &dyn PackageExtractor,
) -> RunOutcome {
    let pack_root = request.output_pack_path.as_path();
    if !is_pack_path(pack_root) {
        return RunOutcome::aborted(Error::InvalidPackPath {
            path: pack_root.display().to_string(),
        });
    }

    // Phase 1: Index the pack before anything is written to it
    let index = phase1::build(pack_root);

    let bundle = fetcher.fetch().unwrap_or_else(|err| {
        warn!("Failed to fetch custom content: {}", err);
        MemoryFS::new()
    });
    info!("Fetched {} custom content files", bundle.len());

    let mut report = RunReport::new();

    // Phase 2: Stage
    let staged = match phase2::execute(&bundle) {
        Ok(staged) => staged,
        Err(err) => {
            warn!("Failed to stage custom content: {}", err);
            for name in &request.requested_names {
                report.fail(name.clone(), err.to_string());
            }
            return RunOutcome::finished(report);
        }
    };

    // Phase 3: Catalog
    let (work, catalog_report) = phase3::execute(&staged.files, &index, &request.requested_names);
    report.absorb(catalog_report);

    // Phase 4: Hierarchy
    let hierarchy_report = phase4::execute(pack_root, &work);
    let ready: Vec<_> = work
        .into_iter()
        .filter(|object| !hierarchy_report.failures.iter().any(|f| f.name == object.name))
        .collect();
    report.absorb(hierarchy_report);

    // Phase 5: Merge, skipping items without their directories
    report.absorb(phase5::execute(
        pack_root,
        &ready,
        &index,
        request.force,
        preserved,
        extractor,
    ));

    report.absorb(phase2::cleanup(staged));
    RunOutcome::finished(report)
}
