//! Line-based YAML document editor
//!
//! Edits a YAML document in place, touching only the lines of the entries it
//! changes. Comments, key order, blank lines and the quoting of every other
//! scalar are kept byte for byte. When a scalar is replaced on its own line,
//! the new value is written in the quoting style of the old one.
//!
//! The editor understands block mappings and block sequences, including
//! mappings that start on a sequence item line (`- name: x`). Flow
//! collections, block scalars, anchors and aliases are treated as opaque:
//! when an edit has to reach inside one, the owning entry is re-rendered as a
//! whole. Anything the editor cannot place is reported as an error so the
//! caller can fall back to a full re-serialization.

use std::fmt;

use serde_yaml::Value as YamlValue;

use super::PathSegment;
use crate::error::{Error, Result};

/// A YAML document held as lines for in-place editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDocument {
    lines: Vec<String>,
    trailing_newline: bool,
    /// `\r\n` when the source used it, `\n` otherwise
    line_ending: &'static str,
}

/// Block mapping whose keys start at column `col` within lines `start..end`.
///
/// With `head_item`, the first key sits on a sequence item line after `- `.
#[derive(Debug, Clone, Copy)]
struct MapRegion {
    start: usize,
    end: usize,
    col: usize,
    head_item: bool,
}

/// Block sequence whose `-` markers sit at column `col` within `start..end`.
#[derive(Debug, Clone, Copy)]
struct SeqRegion {
    start: usize,
    end: usize,
    col: usize,
}

/// One `key: value` entry spanning lines `line..end`.
#[derive(Debug, Clone)]
struct Entry {
    key: String,
    line: usize,
    end: usize,
    col: usize,
    colon: usize,
}

/// One `- value` sequence item spanning lines `line..end`.
#[derive(Debug, Clone, Copy)]
struct Item {
    line: usize,
    end: usize,
    col: usize,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Map(MapRegion),
    Seq(SeqRegion),
    /// Value written on the owner's line, at bytes `start..end`.
    Inline {
        line: usize,
        start: usize,
        end: usize,
    },
    /// Empty values, block scalars, anchors and aliases.
    Opaque,
}

#[derive(Debug, Clone)]
enum Owner {
    Entry(Entry),
    Item(Item),
}

impl YamlDocument {
    /// Split `text` into editable lines.
    ///
    /// The line ending of the first line is used for the whole document.
    pub fn parse(text: &str) -> Self {
        let line_ending = match text.find('\n') {
            Some(at) if text[..at].ends_with('\r') => "\r\n",
            _ => "\n",
        };
        Self {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
            line_ending,
        }
    }

    /// Write the value `merged` holds at `path` into the document.
    ///
    /// `merged` is the complete target document. Missing keys are inserted
    /// with the value `merged` holds for them, so a whole missing subtree is
    /// added at once.
    pub fn set(&mut self, merged: &YamlValue, path: &[PathSegment]) -> Result<()> {
        if path.is_empty() {
            return Err(unsupported("cannot replace the document root"));
        }

        let mut node = self.root();
        let mut owner: Option<Owner> = None;

        for (depth, segment) in path.iter().enumerate() {
            let last = depth + 1 == path.len();
            match (node, segment) {
                (Node::Map(region), PathSegment::Key(key)) => match self.find_key(&region, key)? {
                    Some(entry) => {
                        if last {
                            return self.replace_entry(&entry, value_at(merged, path)?);
                        }
                        node = self.entry_value(&entry);
                        owner = Some(Owner::Entry(entry));
                    }
                    None => {
                        let value = value_at(merged, &path[..=depth])?;
                        return self.insert_entry(&region, key, value);
                    }
                },
                (Node::Seq(seq), PathSegment::Index(index)) => {
                    let items = self.items(&seq)?;
                    let item = *items.get(*index).ok_or_else(|| {
                        unsupported(format!("sequence has no item at index {}", index))
                    })?;
                    if last {
                        return self.replace_item(&item, value_at(merged, path)?);
                    }
                    node = self.item_value(&item);
                    owner = Some(Owner::Item(item));
                }
                _ => {
                    let value = value_at(merged, &path[..depth])?;
                    return match owner {
                        Some(Owner::Entry(entry)) => self.replace_entry(&entry, value),
                        Some(Owner::Item(item)) => self.replace_item(&item, value),
                        None => Err(unsupported("document root is not a block collection")),
                    };
                }
            }
        }

        Ok(())
    }

    /// Remove the mapping entry at `path`.
    ///
    /// Returns `false` when there is nothing to remove.
    pub fn remove(&mut self, path: &[PathSegment]) -> Result<bool> {
        let Some((last, parents)) = path.split_last() else {
            return Err(unsupported("cannot remove the document root"));
        };

        let mut node = self.root();
        for segment in parents {
            node = match (node, segment) {
                (Node::Map(region), PathSegment::Key(key)) => match self.find_key(&region, key)? {
                    Some(entry) => self.entry_value(&entry),
                    None => return Ok(false),
                },
                (Node::Seq(seq), PathSegment::Index(index)) => match self.items(&seq)?.get(*index) {
                    Some(item) => self.item_value(item),
                    None => return Ok(false),
                },
                _ => return Err(unsupported("cannot descend into a non-block value")),
            };
        }

        match (node, last) {
            (Node::Map(region), PathSegment::Key(key)) => match self.find_key(&region, key)? {
                Some(entry) if region.head_item && entry.line == region.start => Err(unsupported(
                    "cannot remove the first key of a sequence item",
                )),
                Some(entry) => {
                    self.lines.drain(entry.line..entry.end);
                    Ok(true)
                }
                None => Ok(false),
            },
            _ => Err(unsupported("only mapping entries can be removed")),
        }
    }

    fn root(&self) -> Node {
        let first = (0..self.lines.len()).find(|&i| !is_ignorable(&self.lines[i]));
        let last = (0..self.lines.len()).rev().find(|&i| !is_ignorable(&self.lines[i]));

        match (first, last) {
            (Some(first), Some(last)) => {
                let col = indent(&self.lines[first]);
                if is_seq_item_at(&self.lines[first], col) {
                    Node::Seq(SeqRegion {
                        start: first,
                        end: last + 1,
                        col,
                    })
                } else {
                    Node::Map(MapRegion {
                        start: first,
                        end: last + 1,
                        col,
                        head_item: false,
                    })
                }
            }
            _ => {
                let end = self.lines.len();
                Node::Map(MapRegion {
                    start: end,
                    end,
                    col: 0,
                    head_item: false,
                })
            }
        }
    }

    fn find_key(&self, region: &MapRegion, key: &str) -> Result<Option<Entry>> {
        Ok(self.entries(region)?.into_iter().find(|entry| entry.key == key))
    }

    fn entries(&self, region: &MapRegion) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut i = region.start;

        while i < region.end {
            let line = &self.lines[i];
            if is_ignorable(line) {
                i += 1;
                continue;
            }
            let at_head = region.head_item && i == region.start;
            if !at_head && (indent(line) != region.col || is_seq_item_at(line, region.col)) {
                return Err(unsupported(format!(
                    "unexpected line {} inside a mapping",
                    i + 1
                )));
            }
            let (key, colon) = parse_key(line, region.col)
                .ok_or_else(|| unsupported(format!("no mapping key on line {}", i + 1)))?;
            let end = self.entry_end(i, region.end, region.col);
            entries.push(Entry {
                key,
                line: i,
                end,
                col: region.col,
                colon,
            });
            i = end;
        }

        Ok(entries)
    }

    /// One past the last content line belonging to the entry on `line`.
    fn entry_end(&self, line: usize, limit: usize, col: usize) -> usize {
        let mut last = line;
        for j in line + 1..limit {
            let text = &self.lines[j];
            if is_ignorable(text) {
                continue;
            }
            let ind = indent(text);
            // `key:` followed by an indentless `- item` list
            if ind > col || (ind == col && is_seq_item_at(text, col)) {
                last = j;
            } else {
                break;
            }
        }
        last + 1
    }

    fn items(&self, seq: &SeqRegion) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut i = seq.start;

        while i < seq.end {
            let line = &self.lines[i];
            if is_ignorable(line) {
                i += 1;
                continue;
            }
            if indent(line) != seq.col || !is_seq_item_at(line, seq.col) {
                break;
            }
            let mut last = i;
            for j in i + 1..seq.end {
                let text = &self.lines[j];
                if is_ignorable(text) {
                    continue;
                }
                if indent(text) > seq.col {
                    last = j;
                } else {
                    break;
                }
            }
            items.push(Item {
                line: i,
                end: last + 1,
                col: seq.col,
            });
            i = last + 1;
        }

        Ok(items)
    }

    fn entry_value(&self, entry: &Entry) -> Node {
        let line = &self.lines[entry.line];
        let (start, end) = inline_span(line, entry.colon + 1);
        if start < end {
            return inline_node(line, entry.line, start, end);
        }
        self.block_node(entry.line + 1, entry.end)
    }

    fn item_value(&self, item: &Item) -> Node {
        let line = &self.lines[item.line];
        let after_dash = item.col + 1;
        let (start, end) = inline_span(line, after_dash);
        if start >= end {
            return self.block_node(item.line + 1, item.end);
        }
        if is_seq_item_at(line, start) {
            return Node::Opaque;
        }
        if parse_key(line, start).is_some() {
            return Node::Map(MapRegion {
                start: item.line,
                end: item.end,
                col: start,
                head_item: true,
            });
        }
        inline_node(line, item.line, start, end)
    }

    fn block_node(&self, from: usize, to: usize) -> Node {
        match (from..to).find(|&j| !is_ignorable(&self.lines[j])) {
            None => Node::Opaque,
            Some(first) => {
                let col = indent(&self.lines[first]);
                if is_seq_item_at(&self.lines[first], col) {
                    Node::Seq(SeqRegion {
                        start: first,
                        end: to,
                        col,
                    })
                } else {
                    Node::Map(MapRegion {
                        start: first,
                        end: to,
                        col,
                        head_item: false,
                    })
                }
            }
        }
    }

    fn replace_entry(&mut self, entry: &Entry, value: &YamlValue) -> Result<()> {
        if let Node::Inline { line, start, end } = self.entry_value(entry) {
            if let Some(text) = inline_scalar(value, &self.lines[line][start..end])? {
                self.lines[line].replace_range(start..end, &text);
                return Ok(());
            }
        }

        let line = &self.lines[entry.line];
        let prefix = line[..entry.col].to_string();
        let key_text = line[entry.col..entry.colon].to_string();
        let rendered = render_entry(&prefix, &key_text, value, entry.col)?;
        self.lines.splice(entry.line..entry.end, rendered);
        Ok(())
    }

    fn replace_item(&mut self, item: &Item, value: &YamlValue) -> Result<()> {
        if let Node::Inline { line, start, end } = self.item_value(item) {
            if let Some(text) = inline_scalar(value, &self.lines[line][start..end])? {
                self.lines[line].replace_range(start..end, &text);
                return Ok(());
            }
        }

        let prefix = self.lines[item.line][..item.col].to_string();
        let rendered = render_item(&prefix, value, item.col)?;
        self.lines.splice(item.line..item.end, rendered);
        Ok(())
    }

    fn insert_entry(&mut self, region: &MapRegion, key: &str, value: &YamlValue) -> Result<()> {
        let prefix = " ".repeat(region.col);
        let rendered = render_entry(&prefix, &render_inline(&YamlValue::String(key.to_string()))?, value, region.col)?;
        self.lines.splice(region.end..region.end, rendered);
        Ok(())
    }
}

impl fmt::Display for YamlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join(self.line_ending))?;
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str(self.line_ending)?;
        }
        Ok(())
    }
}

/// Value at `path` inside `root`, if present.
pub fn lookup<'a>(root: &'a YamlValue, path: &[PathSegment]) -> Option<&'a YamlValue> {
    let mut current = root;
    for segment in path {
        current = match segment {
            PathSegment::Key(key) => current.as_mapping()?.get(key.as_str())?,
            PathSegment::Index(index) => current.as_sequence()?.get(*index)?,
        };
    }
    Some(current)
}

/// Mutable value at `path` inside `root`, if present.
pub fn lookup_mut<'a>(root: &'a mut YamlValue, path: &[PathSegment]) -> Option<&'a mut YamlValue> {
    let mut current = root;
    for segment in path {
        current = match segment {
            PathSegment::Key(key) => current.as_mapping_mut()?.get_mut(key.as_str())?,
            PathSegment::Index(index) => current.as_sequence_mut()?.get_mut(*index)?,
        };
    }
    Some(current)
}

fn value_at<'a>(root: &'a YamlValue, path: &[PathSegment]) -> Result<&'a YamlValue> {
    lookup(root, path).ok_or_else(|| unsupported("edited value is missing from the merged document"))
}

fn unsupported(message: impl Into<String>) -> Error {
    Error::Merge {
        operation: "yaml edit".to_string(),
        message: message.into(),
    }
}

fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || line == "---"
        || line == "..."
        || line.starts_with('%')
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_seq_item_at(line: &str, col: usize) -> bool {
    let bytes = line.as_bytes();
    bytes.get(col) == Some(&b'-') && matches!(bytes.get(col + 1), None | Some(b' ') | Some(b'\t'))
}

fn inline_node(line: &str, index: usize, start: usize, end: usize) -> Node {
    match line.as_bytes()[start] {
        b'|' | b'>' | b'&' | b'*' | b'!' => Node::Opaque,
        _ => Node::Inline {
            line: index,
            start,
            end,
        },
    }
}

/// Byte span of the value written from `from` on, without trailing comment.
fn inline_span(line: &str, from: usize) -> (usize, usize) {
    let bytes = line.as_bytes();
    let mut start = from.min(bytes.len());
    while start < bytes.len() && (bytes[start] == b' ' || bytes[start] == b'\t') {
        start += 1;
    }
    if start >= bytes.len() || bytes[start] == b'#' {
        return (start, start);
    }

    let end = match bytes[start] {
        b'\'' => closing_single(bytes, start).map(|close| close + 1),
        b'"' => closing_double(bytes, start).map(|close| close + 1),
        _ => None,
    };
    if let Some(end) = end {
        return (start, end);
    }

    let mut end = bytes.len();
    for i in start + 1..bytes.len() {
        if bytes[i] == b'#' && (bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') {
            end = i;
            break;
        }
    }
    while end > start && (bytes[end - 1] == b' ' || bytes[end - 1] == b'\t') {
        end -= 1;
    }
    (start, end)
}

fn closing_single(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        if bytes[i] == b'\'' {
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}

fn closing_double(bytes: &[u8], open: usize) -> Option<usize> {
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Parse a mapping key starting at `col`.
///
/// Returns the key and the byte index of its `:` indicator.
fn parse_key(line: &str, col: usize) -> Option<(String, usize)> {
    let bytes = line.as_bytes();
    let first = *bytes.get(col)?;
    if is_seq_item_at(line, col)
        || matches!(
            first,
            b'{' | b'[' | b'&' | b'*' | b'!' | b'|' | b'>' | b'#' | b'?' | b'%' | b'@' | b'`'
        )
    {
        return None;
    }

    let (key, mut colon) = match first {
        b'"' => {
            let close = closing_double(bytes, col)?;
            let key: String = serde_json::from_str(&line[col..=close]).ok()?;
            (key, close + 1)
        }
        b'\'' => {
            let close = closing_single(bytes, col)?;
            (line[col + 1..close].replace("''", "'"), close + 1)
        }
        _ => {
            let mut found = None;
            for i in col..bytes.len() {
                if bytes[i] == b'#' && i > col && bytes[i - 1] == b' ' {
                    return None;
                }
                if bytes[i] == b':' && matches!(bytes.get(i + 1), None | Some(b' ') | Some(b'\t')) {
                    found = Some(i);
                    break;
                }
            }
            let colon = found?;
            (line[col..colon].trim_end().to_string(), colon)
        }
    };

    while bytes.get(colon) == Some(&b' ') {
        colon += 1;
    }
    if bytes.get(colon) != Some(&b':') || !matches!(bytes.get(colon + 1), None | Some(b' ') | Some(b'\t')) {
        return None;
    }
    Some((key, colon))
}

fn render_inline(value: &YamlValue) -> Result<String> {
    Ok(serde_yaml::to_string(value)?.trim_end().to_string())
}

/// Single-line rendering of a scalar in the quoting style of `old`.
///
/// Returns `None` when the value needs more than one line.
fn inline_scalar(value: &YamlValue, old: &str) -> Result<Option<String>> {
    let text = match value {
        YamlValue::Mapping(map) if !map.is_empty() => return Ok(None),
        YamlValue::Sequence(seq) if !seq.is_empty() => return Ok(None),
        YamlValue::String(s) if !s.contains('\n') => match old.as_bytes().first() {
            Some(b'\'') => format!("'{}'", s.replace('\'', "''")),
            Some(b'"') => serde_json::to_string(s)?,
            _ => render_inline(value)?,
        },
        _ => render_inline(value)?,
    };
    Ok(if text.contains('\n') { None } else { Some(text) })
}

fn is_block_collection(value: &YamlValue) -> bool {
    match value {
        YamlValue::Mapping(map) => !map.is_empty(),
        YamlValue::Sequence(seq) => !seq.is_empty(),
        _ => false,
    }
}

fn render_entry(prefix: &str, key_text: &str, value: &YamlValue, col: usize) -> Result<Vec<String>> {
    let body = serde_yaml::to_string(value)?;
    let mut body_lines = body.lines();
    let first = body_lines.next().unwrap_or_default();

    let (mut out, child_indent) = if is_block_collection(value) {
        (vec![format!("{}{}:", prefix, key_text)], col + 2)
    } else {
        (vec![format!("{}{}: {}", prefix, key_text, first)], col)
    };
    let rest: Vec<&str> = if is_block_collection(value) {
        std::iter::once(first).chain(body_lines).collect()
    } else {
        body_lines.collect()
    };
    out.extend(rest.into_iter().map(|line| indent_line(line, child_indent)));
    Ok(out)
}

fn render_item(prefix: &str, value: &YamlValue, col: usize) -> Result<Vec<String>> {
    let body = serde_yaml::to_string(value)?;
    let mut body_lines = body.lines();
    let first = body_lines.next().unwrap_or_default();

    let mut out = vec![format!("{}- {}", prefix, first)];
    out.extend(body_lines.map(|line| indent_line(line, col + 2)));
    Ok(out)
}

fn indent_line(line: &str, width: usize) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{}", " ".repeat(width), line)
    }
}
