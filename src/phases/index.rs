//! Phase 1: Pack Content Index
//!
//! Walks the output pack one level per step: category directories, then
//! their instances (package directories for integrations and scripts, files
//! for everything else). Each instance is identified through its main
//! descriptor. Instances without a readable identity are left out, so an
//! incoming item with the same name is treated as new.

use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::WalkDir;

use super::{FileRecord, PackContentIndex, PackContentInstance};
use crate::content::{parse_structured_file, FileFormat};
use crate::defaults::CONTENT_FILE_ENDINGS;
use crate::entity::{classify, ContentEntity};
use crate::path::file_ending;

/// Immediate children of `dir`, sorted by name.
fn children(dir: &Path, want_dirs: bool) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            if want_dirs {
                entry.file_type().is_dir()
            } else {
                entry.file_type().is_file()
            }
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn is_content_file(path: &Path) -> bool {
    file_ending(path).is_some_and(|ending| CONTENT_FILE_ENDINGS.contains(&ending.as_str()))
}

/// Locate the descriptor carrying an instance's identity.
///
/// A package directory must hold a single YAML file, or one named after the
/// directory. A file instance is its own descriptor when its extension
/// matches the category's descriptor format.
pub fn main_descriptor(entity: ContentEntity, instance_path: &Path) -> Option<PathBuf> {
    let format = entity.descriptor_format();

    if instance_path.is_dir() {
        let ymls: Vec<PathBuf> = children(instance_path, false)
            .into_iter()
            .filter(|path| file_ending(path).as_deref() == Some(FileFormat::Yml.ending()))
            .collect();
        if ymls.len() == 1 {
            return ymls.into_iter().next();
        }
        let dir_name = instance_path.file_name()?.to_str()?;
        let expected = format!("{}.{}", dir_name, FileFormat::Yml.ending());
        return ymls
            .into_iter()
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(expected.as_str()));
    }

    let ending = file_ending(instance_path)?;
    (FileFormat::from_ending(&ending) == Some(format)).then(|| instance_path.to_path_buf())
}

/// Build the index entry for one instance, if it has an identity.
pub fn build_instance(entity: ContentEntity, instance_path: &Path) -> Option<PackContentInstance> {
    let files: Vec<PathBuf> = if instance_path.is_dir() {
        children(instance_path, false)
            .into_iter()
            .filter(|path| is_content_file(path))
            .collect()
    } else if is_content_file(instance_path) {
        vec![instance_path.to_path_buf()]
    } else {
        Vec::new()
    };
    if files.is_empty() {
        return None;
    }

    let descriptor = main_descriptor(entity, instance_path)?;
    let identity = match parse_structured_file(&descriptor) {
        Ok((data, _)) => classify(&data, entity)?,
        Err(err) => {
            debug!("Skipping {}: {}", instance_path.display(), err);
            return None;
        }
    };

    let records = files
        .into_iter()
        .map(|path| FileRecord {
            name: identity.name.clone(),
            id: identity.id.clone(),
            file_ending: file_ending(&path).unwrap_or_default(),
            path,
        })
        .collect();

    Some(PackContentInstance {
        name: identity.name,
        id: identity.id,
        path: instance_path.to_path_buf(),
        files: records,
    })
}

/// Execute Phase 1: index the content of the pack at `pack_root`.
///
/// Directories that are not content categories are ignored.
pub fn build(pack_root: &Path) -> PackContentIndex {
    let mut index = PackContentIndex::new();

    for category_dir in children(pack_root, true) {
        let Some(entity) = category_dir
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(ContentEntity::from_dir_name)
        else {
            trace!("Ignoring non-content directory {}", category_dir.display());
            continue;
        };

        let instances = children(&category_dir, entity.is_multi_file());
        for instance_path in instances {
            match build_instance(entity, &instance_path) {
                Some(instance) => {
                    trace!("Indexed {} \"{}\"", entity, instance.name);
                    index.insert(entity, instance);
                }
                None => debug!("No identity for {}, not indexed", instance_path.display()),
            }
        }
    }

    debug!("Indexed {} content instances in {}", index.len(), pack_root.display());
    index
}
