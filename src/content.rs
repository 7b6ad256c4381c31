//! Parsed content files
//!
//! Content items are stored either as YAML descriptors or as JSON documents.
//! [`ContentData`] wraps the parsed document of either format so that the
//! classifier can read identity fields without caring which parser produced
//! the tree.

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::error::{Error, Result};
use crate::path::file_ending;

/// Serialization format of a structured content file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Yml,
    Json,
}

impl FileFormat {
    /// Format for a file extension, if it is a structured one.
    pub fn from_ending(ending: &str) -> Option<Self> {
        match ending {
            "yml" | "yaml" => Some(FileFormat::Yml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    /// Canonical extension for the format.
    pub fn ending(self) -> &'static str {
        match self {
            FileFormat::Yml => "yml",
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ending())
    }
}

/// A parsed YAML or JSON content document.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentData {
    Yaml(YamlValue),
    Json(JsonValue),
}

impl ContentData {
    /// Parse `text` in the given format.
    pub fn parse(text: &str, format: FileFormat) -> Result<Self> {
        match format {
            FileFormat::Yml => Ok(ContentData::Yaml(serde_yaml::from_str(text)?)),
            FileFormat::Json => Ok(ContentData::Json(serde_json::from_str(text)?)),
        }
    }

    /// Whether the document root is a mapping / object.
    pub fn is_mapping(&self) -> bool {
        match self {
            ContentData::Yaml(value) => value.is_mapping(),
            ContentData::Json(value) => value.is_object(),
        }
    }

    /// Whether the document root has `key`.
    pub fn has_key(&self, key: &str) -> bool {
        match self {
            ContentData::Yaml(value) => value.get(key).is_some(),
            ContentData::Json(value) => value.get(key).is_some(),
        }
    }

    /// Scalar at a key path rendered as a string.
    ///
    /// Strings are returned as-is and numbers are formatted; anything else,
    /// and empty strings, count as absent.
    pub fn string_at(&self, keys: &[&str]) -> Option<String> {
        let rendered = match self {
            ContentData::Yaml(root) => {
                let mut current = root;
                for key in keys {
                    current = current.get(*key)?;
                }
                match current {
                    YamlValue::String(s) => s.clone(),
                    YamlValue::Number(n) => n.to_string(),
                    _ => return None,
                }
            }
            ContentData::Json(root) => {
                let mut current = root;
                for key in keys {
                    current = current.get(*key)?;
                }
                match current {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Number(n) => n.to_string(),
                    _ => return None,
                }
            }
        };
        if rendered.is_empty() {
            None
        } else {
            Some(rendered)
        }
    }
}

/// Read and parse a YAML or JSON content file.
///
/// The format is taken from the file extension. Files with any other
/// extension are rejected with [`Error::Classification`].
pub fn parse_structured_file(path: &Path) -> Result<(ContentData, FileFormat)> {
    let format = file_ending(path)
        .as_deref()
        .and_then(FileFormat::from_ending)
        .ok_or_else(|| Error::Classification {
            path: path.display().to_string(),
            message: "Not a YAML or JSON file".to_string(),
        })?;
    let text = fs::read_to_string(path)?;
    let data = ContentData::parse(&text, format).map_err(|err| Error::Classification {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok((data, format))
}
