//! The phases of a `pack-sync download` run.
//!
//! ## Overview
//!
//! A download run is a straight pipeline:
//! 1. Index - Record what content the output pack already holds
//! 2. Stage - Write the fetched bundle into a scratch directory
//! 3. Catalog - Classify the staged files and select the requested ones
//! 4. Hierarchy - Create the category and instance directories they need
//! 5. Merge - Add new items, smart-merge existing ones
//!
//! The [`orchestrator`] runs them in order. Phases never fail the run: each
//! one returns its output together with a [`RunReport`] of the items it could
//! not handle, and the orchestrator folds the reports together.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::entity::{ContentEntity, ContentKind};

pub mod catalog;
pub mod hierarchy;
pub mod index;
pub mod merge;
pub mod orchestrator;
pub mod stage;

pub use catalog as phase3;
pub use hierarchy as phase4;
pub use index as phase1;
pub use merge as phase5;
pub use stage as phase2;

/// Reason recorded for a requested name missing from the fetched bundle.
pub const REASON_NOT_IN_BUNDLE: &str = "File not in custom content";

/// Reason recorded for an existing item when force is off.
pub const REASON_EXISTS_WITHOUT_FORCE: &str = "File exists and -f is off";

/// An item a phase could not handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Display name of the item, or a path for scratch cleanup failures
    pub name: String,
    pub reason: String,
}

impl fmt::Display for FailedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.reason)
    }
}

/// Non-fatal outcome of one or more phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Items that were not downloaded, in the order they failed
    pub failures: Vec<FailedItem>,
    /// Progress messages such as `Added integration "HelloWorld"`
    pub events: Vec<String>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed item.
    pub fn fail(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.failures.push(FailedItem {
            name: name.into(),
            reason: reason.into(),
        });
    }

    /// Record a progress message.
    pub fn event(&mut self, message: impl Into<String>) {
        self.events.push(message.into());
    }

    /// Append everything `other` recorded.
    pub fn absorb(&mut self, other: RunReport) {
        self.failures.extend(other.failures);
        self.events.extend(other.events);
    }

    /// Whether no failure was recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One content file of an indexed instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub id: String,
    pub path: PathBuf,
    pub file_ending: String,
}

/// A content item already present in the pack.
///
/// For integrations and scripts `path` is the package directory and `files`
/// holds every content file inside it; otherwise `path` is the file itself
/// and `files` holds just that file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackContentInstance {
    pub name: String,
    pub id: String,
    pub path: PathBuf,
    pub files: Vec<FileRecord>,
}

impl PackContentInstance {
    /// The file of this instance with the given file name.
    pub fn file_named(&self, file_name: &str) -> Option<&FileRecord> {
        self.files.iter().find(|record| {
            record
                .path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name == file_name)
        })
    }
}

/// Content already present in the pack, per category.
///
/// Keys are indexing categories: test playbooks are stored as playbooks and
/// beta integrations as integrations (see [`ContentEntity::indexed`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackContentIndex {
    entries: BTreeMap<ContentEntity, Vec<PackContentInstance>>,
}

impl PackContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instance under the indexing category of `entity`.
    pub fn insert(&mut self, entity: ContentEntity, instance: PackContentInstance) {
        self.entries.entry(entity.indexed()).or_default().push(instance);
    }

    /// Instances of a category, in discovery order.
    pub fn instances(&self, entity: ContentEntity) -> &[PackContentInstance] {
        self.entries
            .get(&entity.indexed())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First instance of a category with the given display name.
    pub fn find(&self, entity: ContentEntity, name: &str) -> Option<&PackContentInstance> {
        self.instances(entity).iter().find(|instance| instance.name == name)
    }

    /// Whether a category holds an instance with the given display name.
    pub fn contains(&self, entity: ContentEntity, name: &str) -> bool {
        self.find(entity, name).is_some()
    }

    /// Categories with at least one instance, with their instances.
    pub fn categories(&self) -> impl Iterator<Item = (ContentEntity, &[PackContentInstance])> {
        self.entries
            .iter()
            .map(|(entity, instances)| (*entity, instances.as_slice()))
    }

    /// Total number of instances.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fetched file selected for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomContentObject {
    pub id: String,
    pub name: String,
    /// Location in the scratch directory
    pub path: PathBuf,
    pub entity: ContentEntity,
    pub kind: ContentKind,
    pub file_ending: String,
    /// Whether the pack held an item of this name and category when the run
    /// started
    pub exists_in_pack: bool,
}

/// Parameters of a download run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub output_pack_path: PathBuf,
    /// Display names of the items to download
    pub requested_names: Vec<String>,
    /// Overwrite existing items, restoring their preserved fields
    pub force: bool,
    /// Skip TLS verification when fetching
    pub insecure: bool,
}
