//! Phase 4: Pack hierarchy
//!
//! Creates the category directory of every selected item, and the package
//! directory of integrations and scripts, when they are missing.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{CustomContentObject, RunReport};
use crate::path::to_directory_name;

/// Directories an item needs in the pack, outermost first.
pub fn required_dirs(pack_root: &Path, object: &CustomContentObject) -> Vec<PathBuf> {
    let category = pack_root.join(object.entity.dir_name());
    let mut dirs = vec![category.clone()];
    if object.entity.is_multi_file() {
        dirs.push(category.join(to_directory_name(&object.name)));
    }
    dirs
}

/// Execute Phase 4: create the missing directories for `work`.
///
/// Running it twice is the same as running it once. An item whose
/// directories cannot be created is reported.
pub fn execute(pack_root: &Path, work: &[CustomContentObject]) -> RunReport {
    let mut report = RunReport::new();

    for object in work {
        for dir in required_dirs(pack_root, object) {
            if dir.is_dir() {
                continue;
            }
            match fs::create_dir(&dir) {
                Ok(()) => debug!("Created {}", dir.display()),
                Err(err) => {
                    report.fail(
                        object.name.clone(),
                        format!("Failed to create {}: {}", dir.display(), err),
                    );
                    break;
                }
            }
        }
    }

    report
}
