//! JSON side of the smart merge
//!
//! JSON content is always re-serialized after a merge. Key order is kept
//! (`serde_json` is built with `preserve_order`), and the indent width equals
//! the nesting depth of the document, which is the layout the content
//! repository uses for its JSON files.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value as JsonValue};

use super::{collect_preserved, inject_preserved, MergeValue};
use crate::error::{Error, Result};

impl MergeValue for JsonValue {
    fn get_key(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn key_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_object_mut()?.get_mut(key)
    }

    fn index_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.as_array_mut()?.get_mut(index)
    }

    fn insert_key(&mut self, key: &str, value: Self) {
        if let Some(map) = self.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    fn empty_mapping() -> Self {
        JsonValue::Object(Map::new())
    }

    fn is_mapping(&self) -> bool {
        self.is_object()
    }

    fn is_sequence(&self) -> bool {
        self.is_array()
    }

    fn is_null(&self) -> bool {
        JsonValue::is_null(self)
    }

    fn is_blank(&self) -> bool {
        match self {
            JsonValue::Null => true,
            JsonValue::String(s) => s.is_empty(),
            JsonValue::Array(items) => items.is_empty(),
            JsonValue::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Nesting depth: 0 for scalars and empty containers, otherwise one more
/// than the deepest child.
pub fn json_depth(value: &JsonValue) -> usize {
    match value {
        JsonValue::Object(map) if !map.is_empty() => 1 + map.values().map(json_depth).max().unwrap_or(0),
        JsonValue::Array(items) if !items.is_empty() => 1 + items.iter().map(json_depth).max().unwrap_or(0),
        _ => 0,
    }
}

/// Pretty-print `value` indented by its own depth, with a trailing newline.
pub fn to_depth_indented_string(value: &JsonValue) -> Result<String> {
    let indent = " ".repeat(json_depth(value));
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    value.serialize(&mut serializer)?;

    let mut text = String::from_utf8(buffer).map_err(|err| Error::Merge {
        operation: "json merge".to_string(),
        message: format!("Serialized JSON is not valid UTF-8: {}", err),
    })?;
    text.push('\n');
    Ok(text)
}

/// Restore `fields` from `source` into `destination`.
///
/// Returns the re-indented destination, or `None` when no preserved value
/// was found in `source`.
pub fn smart_merge_json(source: &str, destination: &str, fields: &[String]) -> Result<Option<String>> {
    let source_value: JsonValue = serde_json::from_str(source).map_err(|err| Error::Merge {
        operation: "json merge".to_string(),
        message: format!("Failed to parse existing JSON: {}", err),
    })?;
    let mut dest_value: JsonValue = serde_json::from_str(destination).map_err(|err| Error::Merge {
        operation: "json merge".to_string(),
        message: format!("Failed to parse fetched JSON: {}", err),
    })?;

    let tree = collect_preserved(&source_value, fields);
    if tree.is_empty() {
        return Ok(None);
    }

    inject_preserved(&mut dest_value, &tree);
    to_depth_indented_string(&dest_value).map(Some)
}
