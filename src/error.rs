//! # Error Handling
//!
//! This module defines the centralized error type for `pack-sync`. It uses the
//! `thiserror` library to build a single `Error` enum covering every failure
//! that can abort an operation, with messages that carry enough context to be
//! printed to the user as-is.
//!
//! ## Fatal and non-fatal failures
//!
//! Only a few of these errors ever stop a download run. Most of them are
//! raised by a single step (classifying one file, extracting one package,
//! merging one file) and are turned into a [`FailedItem`] by the pipeline,
//! which keeps going with the next item. See [`crate::phases::RunReport`].
//!
//! [`FailedItem`]: crate::phases::FailedItem

use thiserror::Error;

/// Main error type for pack-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The output path is not of the form `.../content/Packs/<PACK_NAME>`.
    #[error("Path {path} is not a valid pack path. The designated output pack's path is of format ~/.../content/Packs/$PACK_NAME")]
    InvalidPackPath { path: String },

    /// An error occurred while parsing the configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The custom content bundle could not be fetched from the server.
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// The fetched bundle is not a readable archive.
    #[error("Bundle error: {message}")]
    Bundle { message: String },

    /// A content file could not be read or classified.
    #[error("Classification error for {path}: {message}")]
    Classification { path: String, message: String },

    /// A bundled integration/script could not be split into a package.
    #[error("Extraction error for {name}: {message}")]
    Extraction { name: String, message: String },

    /// An error occurred during a smart merge.
    #[error("Merge operation error: {operation} - {message}")]
    Merge { operation: String, message: String },

    /// An error occurred with a filesystem operation.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
