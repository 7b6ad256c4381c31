//! Smart merge of server-stripped fields
//!
//! The content server drops a known set of fields (`fromversion`,
//! `script.dockerimage45`, ...) from every file it exports. Before a fetched
//! file replaces its on-disk counterpart, the values of those fields are read
//! from the on-disk file and injected back into the fetched one.
//!
//! ## Algorithm
//!
//! 1. Each configured field path is parsed into [`PathSegment`]s and looked
//!    up in the existing file. Present, non-empty values are collected into a
//!    sparse [`FieldTree`] mirroring their position in the document.
//! 2. The tree is deep-merged into the fetched document. Preserved values
//!    always win over whatever the fetched document holds at the same place.
//! 3. The result is written back in the fetched file's own format: YAML
//!    through the line editor in [`yaml_doc`], JSON re-indented by nesting
//!    depth.
//!
//! Both formats share the tree logic through the [`MergeValue`] trait.

pub mod json;
pub mod yaml;
pub mod yaml_doc;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::config::PreservedFields;
use crate::content::FileFormat;
use crate::error::{Error, Result};
use crate::path::file_ending;

/// Represents a segment in a path expression for navigating nested structures
///
/// Path expressions like "configuration[0].defaultvalue" or
/// "script.dockerimage45" are parsed into a sequence of PathSegments for
/// navigation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named key for accessing object/map members
    Key(String),
    /// A numeric index for accessing array/sequence elements
    Index(usize),
}

/// Parse a field path into segments
///
/// Supports:
/// - Dot notation: `script.dockerimage45`
/// - Array indices: `configuration[0].defaultvalue`
/// - Bracket keys: `fields["odd.key"]` or `fields['odd.key']`
/// - Escaped dots: `foo\.bar` (literal dot)
///
/// A purely numeric dot segment (`configuration.0.name`) stays a key here;
/// it is treated as an index when the document holds a sequence at that
/// point.
///
/// # Examples
///
/// ```
/// use pack_sync::merge::{parse_path, PathSegment};
///
/// let segments = parse_path("configuration[0].defaultvalue");
/// assert_eq!(segments[1], PathSegment::Index(0));
/// ```
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    if path.trim().is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    let mut escaped = false;

    while let Some(ch) = chars.next() {
        if escaped {
            current.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => escaped = true,
            '.' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut current)));
                }

                match chars.peek().copied() {
                    Some(quote @ ('"' | '\'')) => {
                        chars.next();
                        let mut key = String::new();
                        while let Some(ch) = chars.next() {
                            if ch == quote && chars.peek() == Some(&']') {
                                chars.next();
                                break;
                            }
                            key.push(ch);
                        }
                        segments.push(PathSegment::Key(key));
                    }
                    _ => {
                        let mut content = String::new();
                        for next in chars.by_ref() {
                            if next == ']' {
                                break;
                            }
                            content.push(next);
                        }
                        let content = content.trim();
                        if let Ok(index) = content.parse::<usize>() {
                            segments.push(PathSegment::Index(index));
                        } else if !content.is_empty() {
                            segments.push(PathSegment::Key(content.to_string()));
                        }
                    }
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        segments.push(PathSegment::Key(current));
    }

    segments
}

/// Render segments back into `a.b[0].c` form for log messages.
pub fn display_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => out.push_str(&format!("[{}]", index)),
        }
    }
    out
}

/// Document value the smart merge can operate on.
///
/// Implemented for `serde_yaml::Value` and `serde_json::Value`.
pub trait MergeValue: Clone + PartialEq {
    /// Member of a mapping.
    fn get_key(&self, key: &str) -> Option<&Self>;
    /// Element of a sequence.
    fn get_index(&self, index: usize) -> Option<&Self>;
    fn key_mut(&mut self, key: &str) -> Option<&mut Self>;
    fn index_mut(&mut self, index: usize) -> Option<&mut Self>;
    /// Add or overwrite a mapping member. No-op on non-mappings.
    fn insert_key(&mut self, key: &str, value: Self);
    fn empty_mapping() -> Self;
    fn is_mapping(&self) -> bool;
    fn is_sequence(&self) -> bool;
    fn is_null(&self) -> bool;
    /// Null, empty string, empty sequence or empty mapping.
    fn is_blank(&self) -> bool;
}

/// Sparse copy of the preserved values of one document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTree<V> {
    Leaf(V),
    Keys(Vec<(String, FieldTree<V>)>),
    Items(BTreeMap<usize, FieldTree<V>>),
}

impl<V: Clone> FieldTree<V> {
    pub fn new() -> Self {
        FieldTree::Keys(Vec::new())
    }

    /// Whether no value was collected.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldTree::Keys(entries) if entries.is_empty())
    }

    fn for_next(rest: &[PathSegment]) -> Self {
        match rest.first() {
            Some(PathSegment::Index(_)) => FieldTree::Items(BTreeMap::new()),
            _ => FieldTree::Keys(Vec::new()),
        }
    }

    /// Store `value` at `path`. A leaf swallows anything inserted below it.
    pub fn insert(&mut self, path: &[PathSegment], value: V) {
        let Some((head, rest)) = path.split_first() else {
            *self = FieldTree::Leaf(value);
            return;
        };

        let child = match (self, head) {
            (FieldTree::Leaf(_), _) => return,
            (FieldTree::Keys(entries), PathSegment::Key(key)) => {
                let pos = match entries.iter().position(|(existing, _)| existing == key) {
                    Some(pos) => pos,
                    None => {
                        entries.push((key.clone(), Self::for_next(rest)));
                        entries.len() - 1
                    }
                };
                &mut entries[pos].1
            }
            (FieldTree::Items(items), PathSegment::Index(index)) => {
                items.entry(*index).or_insert_with(|| Self::for_next(rest))
            }
            _ => return,
        };
        child.insert(rest, value);
    }

    /// Paths of every stored value, in insertion order.
    pub fn leaf_paths(&self) -> Vec<Vec<PathSegment>> {
        let mut out = Vec::new();
        self.collect_leaf_paths(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaf_paths(&self, prefix: &mut Vec<PathSegment>, out: &mut Vec<Vec<PathSegment>>) {
        match self {
            FieldTree::Leaf(_) => out.push(prefix.clone()),
            FieldTree::Keys(entries) => {
                for (key, child) in entries {
                    prefix.push(PathSegment::Key(key.clone()));
                    child.collect_leaf_paths(prefix, out);
                    prefix.pop();
                }
            }
            FieldTree::Items(items) => {
                for (index, child) in items {
                    prefix.push(PathSegment::Index(*index));
                    child.collect_leaf_paths(prefix, out);
                    prefix.pop();
                }
            }
        }
    }
}

impl<V: Clone> Default for FieldTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow one segment, reading a numeric key under a sequence as an index.
fn step<'a, V: MergeValue>(current: &'a V, segment: &PathSegment) -> Option<(PathSegment, &'a V)> {
    match segment {
        PathSegment::Key(key) if current.is_sequence() => {
            let index: usize = key.parse().ok()?;
            Some((PathSegment::Index(index), current.get_index(index)?))
        }
        PathSegment::Key(key) => Some((segment.clone(), current.get_key(key)?)),
        PathSegment::Index(index) => Some((segment.clone(), current.get_index(*index)?)),
    }
}

/// Collect the non-empty values of `fields` from `source`.
pub fn collect_preserved<V: MergeValue>(source: &V, fields: &[String]) -> FieldTree<V> {
    let mut tree = FieldTree::new();

    'fields: for field in fields {
        let mut resolved = Vec::new();
        let mut current = source;
        for segment in parse_path(field) {
            match step(current, &segment) {
                Some((segment, value)) => {
                    resolved.push(segment);
                    current = value;
                }
                None => continue 'fields,
            }
        }
        if resolved.is_empty() || current.is_blank() {
            continue;
        }
        debug!("Preserving field '{}'", field);
        tree.insert(&resolved, current.clone());
    }

    tree
}

/// Deep-merge `tree` into `target`; preserved values win.
pub fn inject_preserved<V: MergeValue>(target: &mut V, tree: &FieldTree<V>) {
    inject(target, tree, &mut Vec::new());
}

fn inject<V: MergeValue>(target: &mut V, tree: &FieldTree<V>, at: &mut Vec<PathSegment>) {
    match tree {
        FieldTree::Leaf(value) => *target = value.clone(),
        FieldTree::Keys(entries) => {
            if !target.is_mapping() {
                if !target.is_null() {
                    warn!(
                        "Replacing non-mapping value at '{}' to restore preserved fields",
                        display_path(at)
                    );
                }
                *target = V::empty_mapping();
            }
            for (key, child) in entries {
                at.push(PathSegment::Key(key.clone()));
                if let Some(existing) = target.key_mut(key) {
                    inject(existing, child, at);
                } else if let Some(value) = materialize(child) {
                    target.insert_key(key, value);
                } else {
                    warn!(
                        "Skipping preserved field '{}': destination has no sequence to hold it",
                        display_path(at)
                    );
                }
                at.pop();
            }
        }
        FieldTree::Items(items) => {
            if !target.is_sequence() {
                warn!(
                    "Skipping preserved items at '{}': destination is not a sequence",
                    display_path(at)
                );
                return;
            }
            for (index, child) in items {
                at.push(PathSegment::Index(*index));
                match target.index_mut(*index) {
                    Some(existing) => inject(existing, child, at),
                    None => warn!(
                        "Skipping preserved field '{}': destination has no such item",
                        display_path(at)
                    ),
                }
                at.pop();
            }
        }
    }
}

/// Build a standalone value from a subtree; sequences cannot be built
/// without a base to index into.
fn materialize<V: MergeValue>(tree: &FieldTree<V>) -> Option<V> {
    match tree {
        FieldTree::Leaf(value) => Some(value.clone()),
        FieldTree::Keys(entries) => {
            let mut mapping = V::empty_mapping();
            let mut any = false;
            for (key, child) in entries {
                if let Some(value) = materialize(child) {
                    mapping.insert_key(key, value);
                    any = true;
                }
            }
            any.then_some(mapping)
        }
        FieldTree::Items(_) => None,
    }
}

/// Restore preserved fields from `existing` into `fetched`, rewriting
/// `fetched` in place.
///
/// The format is taken from the fetched file's extension. Returns whether
/// the fetched file was rewritten.
pub fn smart_merge_file(existing: &Path, fetched: &Path, preserved: &PreservedFields) -> Result<bool> {
    let format = file_ending(fetched)
        .as_deref()
        .and_then(FileFormat::from_ending)
        .ok_or_else(|| Error::Merge {
            operation: "smart merge".to_string(),
            message: format!("{} is not a YAML or JSON file", fetched.display()),
        })?;

    let source = fs::read_to_string(existing)?;
    let destination = fs::read_to_string(fetched)?;
    let fields = preserved.for_format(format);

    let merged = match format {
        FileFormat::Yml => yaml::smart_merge_yaml(&source, &destination, fields)?,
        FileFormat::Json => json::smart_merge_json(&source, &destination, fields)?,
    };

    match merged {
        Some(text) => {
            fs::write(fetched, text)?;
            debug!(
                "Restored preserved fields from {} into {}",
                existing.display(),
                fetched.display()
            );
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as JsonValue};

    #[test]
    fn test_parse_path_simple_dot_notation() {
        let segments = parse_path("script.dockerimage45");
        assert_eq!(
            segments,
            vec![
                PathSegment::Key("script".to_string()),
                PathSegment::Key("dockerimage45".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_path_array_index() {
        let segments = parse_path("configuration[0].defaultvalue");
        assert_eq!(
            segments,
            vec![
                PathSegment::Key("configuration".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("defaultvalue".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_path_quoted_key_and_escape() {
        assert_eq!(
            parse_path(r#"fields["odd.key"]"#),
            vec![
                PathSegment::Key("fields".to_string()),
                PathSegment::Key("odd.key".to_string())
            ]
        );
        assert_eq!(
            parse_path(r"foo\.bar.baz"),
            vec![
                PathSegment::Key("foo.bar".to_string()),
                PathSegment::Key("baz".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_path_empty() {
        assert!(parse_path("").is_empty());
        assert!(parse_path("   ").is_empty());
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(&parse_path("configuration[2].defaultvalue")),
            "configuration[2].defaultvalue"
        );
    }

    fn fields(list: &[&str]) -> Vec<String> {
        list.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_collect_skips_missing_and_blank() {
        let source = json!({"fromVersion": "5.0.0", "toVersion": "", "tags": [], "detached": false});
        let tree = collect_preserved(&source, &fields(&["fromVersion", "toVersion", "tags", "detached", "missing"]));
        assert_eq!(
            tree.leaf_paths(),
            vec![
                vec![PathSegment::Key("fromVersion".to_string())],
                vec![PathSegment::Key("detached".to_string())]
            ]
        );
    }

    #[test]
    fn test_collect_numeric_dot_segment_under_sequence() {
        let source = json!({"configuration": [{"defaultvalue": "secret"}]});
        let tree = collect_preserved(&source, &fields(&["configuration.0.defaultvalue"]));
        assert_eq!(
            tree.leaf_paths(),
            vec![vec![
                PathSegment::Key("configuration".to_string()),
                PathSegment::Index(0),
                PathSegment::Key("defaultvalue".to_string())
            ]]
        );
    }

    #[test]
    fn test_leaf_swallows_nested_field() {
        let source = json!({"script": {"dockerimage45": "img", "type": "python"}});
        let tree = collect_preserved(&source, &fields(&["script.dockerimage45", "script"]));
        assert_eq!(tree.leaf_paths(), vec![vec![PathSegment::Key("script".to_string())]]);
    }

    #[test]
    fn test_inject_adds_missing_and_overwrites_existing() {
        let source = json!({"configuration": [{"name": "url", "defaultvalue": "secret"}], "fromVersion": "6.0.0"});
        let tree = collect_preserved(&source, &fields(&["configuration[0].defaultvalue", "fromVersion"]));

        let mut missing = json!({"configuration": [{"name": "url"}]});
        inject_preserved(&mut missing, &tree);
        assert_eq!(missing["configuration"][0]["defaultvalue"], "secret");
        assert_eq!(missing["fromVersion"], "6.0.0");

        let mut colliding = json!({"configuration": [{"name": "url", "defaultvalue": "other"}], "fromVersion": "5.0.0"});
        inject_preserved(&mut colliding, &tree);
        assert_eq!(colliding["configuration"][0]["defaultvalue"], "secret");
        assert_eq!(colliding["fromVersion"], "6.0.0");
    }

    #[test]
    fn test_inject_skips_missing_sequence_item() {
        let source = json!({"configuration": [{"a": 1}, {"a": 2}]});
        let tree = collect_preserved(&source, &fields(&["configuration[1].a"]));

        let mut target = json!({"configuration": [{"a": 0}]});
        inject_preserved(&mut target, &tree);
        assert_eq!(target, json!({"configuration": [{"a": 0}]}));

        let mut no_list = json!({"name": "x"});
        inject_preserved(&mut no_list, &tree);
        assert_eq!(no_list, json!({"name": "x"}));
    }

    #[test]
    fn test_inject_empty_tree_is_noop() {
        let tree: FieldTree<JsonValue> = collect_preserved(&json!({}), &fields(&["fromVersion"]));
        assert!(tree.is_empty());
        let mut target = json!({"id": "x", "name": "y"});
        inject_preserved(&mut target, &tree);
        assert_eq!(target, json!({"id": "x", "name": "y"}));
    }
}
