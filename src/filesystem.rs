//! In-memory file set for the fetched content bundle
//!
//! The server bundle is unpacked into a [`MemoryFS`] keyed by entry name.
//! Nothing touches the disk until [`MemoryFS::write_to`] stages the entries
//! into a scratch directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Bundle entries by relative path, listed in path order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFS {
    entries: BTreeMap<PathBuf, Vec<u8>>,
}

/// An entry path must stay below the staging root.
fn is_contained(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

impl MemoryFS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    ///
    /// Absolute paths and paths with `..` or `.` components are rejected.
    pub fn insert<P, C>(&mut self, path: P, content: C) -> Result<()>
    where
        P: AsRef<Path>,
        C: Into<Vec<u8>>,
    {
        let path = path.as_ref();
        if !is_contained(path) {
            return Err(Error::Bundle {
                message: format!("Refusing unsafe entry path '{}'", path.display()),
            });
        }
        self.entries.insert(path.to_path_buf(), content.into());
        Ok(())
    }

    /// Content of an entry.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<&[u8]> {
        self.entries.get(path.as_ref()).map(Vec::as_slice)
    }

    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry paths in path order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Sum of all entry sizes in bytes.
    pub fn total_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Write every entry below `root`, creating directories as needed.
    ///
    /// Returns the written paths in path order.
    pub fn write_to(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.entries.len());

        for (relative_path, content) in &self.entries {
            let full_path = root.join(relative_path);

            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                    message: format!("Failed to create directory '{}': {}", parent.display(), e),
                })?;
            }

            fs::write(&full_path, content).map_err(|e| Error::Filesystem {
                message: format!("Failed to write file '{}': {}", full_path.display(), e),
            })?;
            written.push(full_path);
        }

        debug!(
            "Staged {} bundle entries ({} bytes) under {}",
            written.len(),
            self.total_bytes(),
            root.display()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_get() {
        let mut bundle = MemoryFS::new();
        bundle.insert("integration-HelloWorld.yml", "name: HelloWorld").unwrap();
        bundle.insert("integration-HelloWorld.yml", "name: Replaced").unwrap();

        assert!(bundle.contains("integration-HelloWorld.yml"));
        assert_eq!(bundle.get("integration-HelloWorld.yml"), Some(&b"name: Replaced"[..]));
        assert_eq!(bundle.get("missing.yml"), None);
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle.total_bytes(), 14);
    }

    #[test]
    fn test_paths_are_listed_in_order() {
        let mut bundle = MemoryFS::new();
        bundle.insert("script-b.yml", "").unwrap();
        bundle.insert("layout-a.json", b"{}".to_vec()).unwrap();

        let paths: Vec<&Path> = bundle.paths().collect();
        assert_eq!(paths, vec![Path::new("layout-a.json"), Path::new("script-b.yml")]);
    }

    #[test]
    fn test_rejects_unsafe_paths() {
        let mut bundle = MemoryFS::new();
        assert!(bundle.insert("../escape.yml", "").is_err());
        assert!(bundle.insert("/etc/passwd", "").is_err());
        assert!(bundle.insert("./here.yml", "").is_err());
        assert!(bundle.insert("", "").is_err());
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_write_to_creates_directories() {
        let temp = TempDir::new().unwrap();
        let mut bundle = MemoryFS::new();
        bundle.insert("nested/dir/widget-x.json", "{}").unwrap();
        bundle.insert("playbook-y.yml", b"id: y\n".to_vec()).unwrap();

        let written = bundle.write_to(temp.path()).unwrap();
        assert_eq!(
            written,
            vec![
                temp.path().join("nested/dir/widget-x.json"),
                temp.path().join("playbook-y.yml"),
            ]
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join("playbook-y.yml")).unwrap(),
            "id: y\n"
        );
    }
}
