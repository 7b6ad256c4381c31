//! Phase 3: Custom Content Catalog
//!
//! Classifies every staged file and picks the ones the user asked for.
//! Matching is by display name; whether an item already exists is decided
//! by name within its category, against the index built before any write.

use std::path::{Path, PathBuf};

use log::{debug, info};

use super::{CustomContentObject, PackContentIndex, RunReport, REASON_NOT_IN_BUNDLE};
use crate::content::parse_structured_file;
use crate::entity::{classify, detect_kind};

/// Classify one staged file.
///
/// Returns `None` for files that are not recognizable content or lack an
/// identity. `exists_in_pack` is left `false`.
pub fn classify_file(path: &Path) -> Option<CustomContentObject> {
    let (data, format) = match parse_structured_file(path) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("Not cataloguing {}: {}", path.display(), err);
            return None;
        }
    };
    let kind = detect_kind(format, &data)?;
    let entity = kind.entity();
    let identity = classify(&data, entity)?;

    Some(CustomContentObject {
        id: identity.id,
        name: identity.name,
        path: path.to_path_buf(),
        entity,
        kind,
        file_ending: format.ending().to_string(),
        exists_in_pack: false,
    })
}

/// Execute Phase 3: select the requested items from the staged files.
///
/// Each requested name yields at most one work item, the first staged file
/// carrying that name. Names with no match are reported.
pub fn execute(
    staged_files: &[PathBuf],
    index: &PackContentIndex,
    requested_names: &[String],
) -> (Vec<CustomContentObject>, RunReport) {
    let catalog: Vec<CustomContentObject> = staged_files.iter().filter_map(|path| classify_file(path)).collect();
    debug!("Catalogued {} of {} fetched files", catalog.len(), staged_files.len());

    let mut work = Vec::new();
    let mut report = RunReport::new();

    for name in requested_names {
        match catalog.iter().find(|object| &object.name == name) {
            Some(object) => {
                let mut object = object.clone();
                object.exists_in_pack = index.contains(object.entity, &object.name);
                info!(
                    "Selected {} \"{}\" ({})",
                    object.kind,
                    object.name,
                    if object.exists_in_pack { "existing" } else { "new" }
                );
                work.push(object);
            }
            None => report.fail(name.clone(), REASON_NOT_IN_BUNDLE),
        }
    }

    (work, report)
}
