//! Phase 5: Merging selected items into the pack
//!
//! Every selected item takes one of five routes:
//!
//! | in pack | force | package | action                                       |
//! |---------|-------|---------|----------------------------------------------|
//! | no      | any   | yes     | split into the package directory             |
//! | no      | any   | no      | move into the category directory             |
//! | yes     | no    | any     | report "File exists and -f is off"           |
//! | yes     | yes   | yes     | split aside, merge the YAML, replace files   |
//! | yes     | yes   | no      | merge, then replace the existing file        |
//!
//! Merging restores the preserved fields of the existing file into the
//! fetched one before it replaces the existing file.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{
    stage, CustomContentObject, PackContentIndex, PackContentInstance, RunReport,
    REASON_EXISTS_WITHOUT_FORCE,
};
use crate::config::PreservedFields;
use crate::content::FileFormat;
use crate::error::{Error, Result};
use crate::extract::PackageExtractor;
use crate::merge::smart_merge_file;
use crate::path::{file_ending, to_directory_name};

/// File name a split package file has inside an existing package.
///
/// Code and descriptor files are named after the directory; the image and
/// description carry a suffix.
pub fn searched_basename(display_name: &str, ending: &str) -> String {
    let dir_name = to_directory_name(display_name);
    match ending {
        "md" => format!("{}_description.{}", dir_name, ending),
        "png" => format!("{}_image.{}", dir_name, ending),
        _ => format!("{}.{}", dir_name, ending),
    }
}

/// Move a file, copying across filesystems when a rename is not possible.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to).map_err(|e| Error::Filesystem {
        message: format!("Failed to move {} to {}: {}", from.display(), to.display(), e),
    })?;
    fs::remove_file(from)?;
    Ok(())
}

fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::Filesystem {
            message: format!("{} has no usable file name", path.display()),
        })
}

fn corresponding_instance<'a>(
    index: &'a PackContentIndex,
    object: &CustomContentObject,
) -> Result<&'a PackContentInstance> {
    index.find(object.entity, &object.name).ok_or_else(|| Error::Merge {
        operation: "locate existing item".to_string(),
        message: format!("{} \"{}\" is not in the pack", object.kind, object.name),
    })
}

/// The five routes an item can take.
struct Merger<'a> {
    pack_root: &'a Path,
    index: &'a PackContentIndex,
    preserved: &'a PreservedFields,
    extractor: &'a dyn PackageExtractor,
}

impl Merger<'_> {
    fn category_dir(&self, object: &CustomContentObject) -> PathBuf {
        self.pack_root.join(object.entity.dir_name())
    }

    fn add_package(&self, object: &CustomContentObject) -> Result<()> {
        let base_name = to_directory_name(&object.name);
        let out_dir = self.category_dir(object).join(&base_name);
        let written = self.extractor.explode(&object.path, &out_dir, object.kind, &base_name)?;
        debug!("Wrote {} files into {}", written.len(), out_dir.display());
        Ok(())
    }

    fn add_file(&self, object: &CustomContentObject) -> Result<()> {
        let destination = self.category_dir(object).join(file_name(&object.path)?);
        move_file(&object.path, &destination)
    }

    fn merge_file(&self, object: &CustomContentObject) -> Result<()> {
        let instance = corresponding_instance(self.index, object)?;
        let existing = instance
            .files
            .first()
            .map(|record| record.path.as_path())
            .unwrap_or(instance.path.as_path());

        smart_merge_file(existing, &object.path, self.preserved)?;
        move_file(&object.path, existing)
    }

    fn merge_package(&self, object: &CustomContentObject, report: &mut RunReport) -> Result<()> {
        let instance = corresponding_instance(self.index, object)?;
        let scratch = tempfile::Builder::new().prefix("pack-sync-split").tempdir()?;

        let result = self.replace_package_files(object, instance, scratch.path());
        report.absorb(stage::remove_scratch(scratch));
        result
    }

    fn replace_package_files(
        &self,
        object: &CustomContentObject,
        instance: &PackContentInstance,
        scratch: &Path,
    ) -> Result<()> {
        let base_name = to_directory_name(&object.name);
        let split = self.extractor.explode(&object.path, scratch, object.kind, &base_name)?;

        for split_file in split {
            let ending = file_ending(&split_file).unwrap_or_default();
            let searched = searched_basename(&object.name, &ending);
            let destination = match instance.file_named(&searched) {
                Some(record) => {
                    if FileFormat::from_ending(&ending) == Some(FileFormat::Yml) {
                        smart_merge_file(&record.path, &split_file, self.preserved)?;
                    }
                    record.path.clone()
                }
                None => instance.path.join(file_name(&split_file)?),
            };
            move_file(&split_file, &destination)?;
        }
        Ok(())
    }
}

/// Execute Phase 5: merge every work item into the pack.
///
/// Items are handled one by one; an item that fails is reported and does
/// not stop the others.
pub fn execute(
    pack_root: &Path,
    work: &[CustomContentObject],
    index: &PackContentIndex,
    force: bool,
    preserved: &PreservedFields,
    extractor: &dyn PackageExtractor,
) -> RunReport {
    let merger = Merger {
        pack_root,
        index,
        preserved,
        extractor,
    };
    let mut report = RunReport::new();

    for object in work {
        let package = object.entity.is_multi_file();
        let (verb, result) = match (object.exists_in_pack, force) {
            (true, false) => {
                info!(
                    "Could not merge {} \"{}\" since it already exists and force is off",
                    object.kind, object.name
                );
                report.fail(object.name.clone(), REASON_EXISTS_WITHOUT_FORCE);
                continue;
            }
            (false, _) if package => ("Added", merger.add_package(object)),
            (false, _) => ("Added", merger.add_file(object)),
            (true, true) if package => ("Merged", merger.merge_package(object, &mut report)),
            (true, true) => ("Merged", merger.merge_file(object)),
        };

        match result {
            Ok(()) => report.event(format!("{} {} \"{}\"", verb, object.kind, object.name)),
            Err(err) => {
                warn!("Failed to merge {} \"{}\": {}", object.kind, object.name, err);
                report.fail(object.name.clone(), err.to_string());
            }
        }
    }

    report
}
