//! # Pack Sync Library
//!
//! This library downloads custom content (integrations, scripts, playbooks,
//! layouts and the other content types) from a security-automation server
//! and merges it into a pack of a local content repository. It backs the
//! `pack-sync` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use pack_sync::path::{rewrite_archive_prefix, to_directory_name};
//! use pack_sync::phases::PackContentIndex;
//!
//! // Display names map to package directory names
//! assert_eq!(to_directory_name("Hello World Script"), "HelloWorldScript");
//!
//! // Script bundle entries are renamed to the pack convention
//! assert_eq!(rewrite_archive_prefix("automation-Greet.yml"), "script-Greet.yml");
//!
//! let index = PackContentIndex::new();
//! assert!(index.is_empty());
//! ```
//!
//! ## Core Concepts
//!
//! - **Content entities (`entity`)**: The content categories of a pack, how
//!   each one is laid out on disk and how an item's identity is read.
//! - **Configuration (`config`)**: Server connection settings and the fields
//!   that survive a re-download.
//! - **Remote (`remote`)**: Fetching the custom content bundle and unpacking
//!   it into an in-memory filesystem (`filesystem`).
//! - **Extraction (`extract`)**: Splitting a bundled integration or script
//!   into its package files.
//! - **Smart merge (`merge`)**: Restoring preserved fields of an existing
//!   file into its re-downloaded version, keeping the file's layout.
//! - **Phases (`phases`)**: The download pipeline.
//!
//! ## Execution Flow
//!
//! The main entry point is [`phases::orchestrator::download`]:
//!
//! 1.  **Index**: Record the content already in the output pack.
//! 2.  **Stage**: Fetch the bundle and write it to a scratch directory.
//! 3.  **Catalog**: Classify the staged files and select the requested items.
//! 4.  **Hierarchy**: Create the directories the selected items need.
//! 5.  **Merge**: Add new items, and smart-merge existing ones when forced.
//!
//! Items that cannot be downloaded are collected in a report; only an
//! invalid output pack path stops a run.

pub mod config;
pub mod content;
pub mod defaults;
pub mod entity;
pub mod error;
pub mod extract;
pub mod filesystem;
pub mod merge;
pub mod output;
pub mod path;
pub mod phases;
pub mod remote;

#[cfg(test)]
mod path_proptest;
