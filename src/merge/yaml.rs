//! YAML side of the smart merge
//!
//! YAML descriptors are reviewed as diffs, so the merged document is written
//! through [`YamlDocument`]: only the entries that received a preserved value
//! change, everything else stays byte-identical. The edited text is parsed
//! again and compared with the merged value; if the two disagree, the
//! document is re-serialized with `serde_yaml` instead.

use log::warn;
use serde_yaml::{Mapping, Value as YamlValue};

use super::yaml_doc::{lookup, YamlDocument};
use super::{collect_preserved, display_path, inject_preserved, MergeValue};
use crate::error::{Error, Result};

impl MergeValue for YamlValue {
    fn get_key(&self, key: &str) -> Option<&Self> {
        self.as_mapping()?.get(key)
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_sequence()?.get(index)
    }

    fn key_mut(&mut self, key: &str) -> Option<&mut Self> {
        self.as_mapping_mut()?.get_mut(key)
    }

    fn index_mut(&mut self, index: usize) -> Option<&mut Self> {
        self.as_sequence_mut()?.get_mut(index)
    }

    fn insert_key(&mut self, key: &str, value: Self) {
        if let Some(map) = self.as_mapping_mut() {
            map.insert(YamlValue::String(key.to_string()), value);
        }
    }

    fn empty_mapping() -> Self {
        YamlValue::Mapping(Mapping::new())
    }

    fn is_mapping(&self) -> bool {
        YamlValue::is_mapping(self)
    }

    fn is_sequence(&self) -> bool {
        YamlValue::is_sequence(self)
    }

    fn is_null(&self) -> bool {
        YamlValue::is_null(self)
    }

    fn is_blank(&self) -> bool {
        match self {
            YamlValue::Null => true,
            YamlValue::String(s) => s.is_empty(),
            YamlValue::Sequence(seq) => seq.is_empty(),
            YamlValue::Mapping(map) => map.is_empty(),
            YamlValue::Tagged(tagged) => tagged.value.is_blank(),
            _ => false,
        }
    }
}

fn parse(text: &str, role: &str) -> Result<YamlValue> {
    serde_yaml::from_str(text).map_err(|err| Error::Merge {
        operation: "yaml merge".to_string(),
        message: format!("Failed to parse {} YAML: {}", role, err),
    })
}

/// Restore `fields` from `source` into `destination`.
///
/// Returns the new text of `destination`, or `None` when nothing changes.
pub fn smart_merge_yaml(source: &str, destination: &str, fields: &[String]) -> Result<Option<String>> {
    let source_value = parse(source, "existing")?;
    let original = parse(destination, "fetched")?;

    let tree = collect_preserved(&source_value, fields);
    if tree.is_empty() {
        return Ok(None);
    }

    let mut merged = original.clone();
    inject_preserved(&mut merged, &tree);
    if merged == original {
        return Ok(None);
    }

    match edit_in_place(destination, &original, &merged, &tree.leaf_paths()) {
        Ok(text) => Ok(Some(text)),
        Err(reason) => {
            warn!("Rewriting whole YAML document: {}", reason);
            Ok(Some(serde_yaml::to_string(&merged)?))
        }
    }
}

fn edit_in_place(
    destination: &str,
    original: &YamlValue,
    merged: &YamlValue,
    paths: &[Vec<super::PathSegment>],
) -> std::result::Result<String, String> {
    let mut doc = YamlDocument::parse(destination);

    for path in paths {
        if lookup(original, path) == lookup(merged, path) {
            continue;
        }
        if lookup(merged, path).is_none() {
            // skipped during injection
            continue;
        }
        doc.set(merged, path)
            .map_err(|err| format!("cannot edit '{}' in place: {}", display_path(path), err))?;
    }

    let text = doc.to_string();
    let reparsed: YamlValue = serde_yaml::from_str(&text)
        .map_err(|err| format!("edited document does not parse: {}", err))?;
    if &reparsed != merged {
        return Err("edited document differs from the merged value".to_string());
    }
    Ok(text)
}
