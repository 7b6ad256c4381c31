//! Naming and path utilities for pack-sync
//!
//! Display names of content items ("Hello World Script") map to directory
//! names on disk ("HelloWorldScript"), and server archive entry names map to
//! the canonical local file names. Both mappings live here, together with the
//! small path predicates the pipeline needs.

use std::path::Path;

use crate::defaults::{CONTENT_ROOT_MARKER, ENTITY_NAME_SEPARATORS, PACKS_ROOT_MARKER};

/// Prefix the server uses for script files inside the bundle.
const AUTOMATION_PREFIX: &str = "automation-";

/// Prefix scripts carry in a pack.
const SCRIPT_PREFIX: &str = "script-";

/// Map a content display name to its directory name.
///
/// Removes every separator character (space, underscore, hyphen). The result
/// never contains a separator, so applying it twice changes nothing.
///
/// ```
/// use pack_sync::path::to_directory_name;
///
/// assert_eq!(to_directory_name("Hello World_Script-v2"), "HelloWorldScriptv2");
/// ```
pub fn to_directory_name(display_name: &str) -> String {
    display_name
        .chars()
        .filter(|c| !ENTITY_NAME_SEPARATORS.contains(c))
        .collect()
}

/// Rewrite a bundle entry name to the name the pack uses.
///
/// Scripts are archived as `automation-<name>` by the server; everything else
/// passes through unchanged.
pub fn rewrite_archive_prefix(archive_entry_name: &str) -> String {
    match archive_entry_name.strip_prefix(AUTOMATION_PREFIX) {
        Some(rest) => format!("{}{}", SCRIPT_PREFIX, rest),
        None => archive_entry_name.to_string(),
    }
}

/// Extension of a file without the leading dot, if any.
pub fn file_ending(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_string())
}

/// Check that `path` is a pack directory inside a content repository.
///
/// The path must be an existing directory whose parent is named `Packs` and
/// whose grandparent is named `content`, i.e. `~/.../content/Packs/<PACK>`.
pub fn is_pack_path(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }
    let absolute = match std::path::absolute(path) {
        Ok(absolute) => absolute,
        Err(_) => return false,
    };
    let parent = absolute.parent();
    let grandparent = parent.and_then(Path::parent);

    dir_name_is(parent, PACKS_ROOT_MARKER) && dir_name_is(grandparent, CONTENT_ROOT_MARKER)
}

fn dir_name_is(dir: Option<&Path>, expected: &str) -> bool {
    dir.and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_to_directory_name() {
        assert_eq!(to_directory_name("Hello World"), "HelloWorld");
        assert_eq!(to_directory_name("Hello_World-Script"), "HelloWorldScript");
        assert_eq!(to_directory_name("HelloWorld"), "HelloWorld");
        assert_eq!(to_directory_name(""), "");
        assert_eq!(to_directory_name(" - _ "), "");
    }

    #[test]
    fn test_to_directory_name_keeps_other_punctuation() {
        assert_eq!(to_directory_name("Test (Beta) v1.2"), "Test(Beta)v1.2");
    }

    #[test]
    fn test_rewrite_archive_prefix() {
        assert_eq!(
            rewrite_archive_prefix("automation-HelloWorldScript.yml"),
            "script-HelloWorldScript.yml"
        );
        assert_eq!(
            rewrite_archive_prefix("integration-HelloWorld.yml"),
            "integration-HelloWorld.yml"
        );
        // Only a leading prefix counts
        assert_eq!(
            rewrite_archive_prefix("playbook-automation-flow.yml"),
            "playbook-automation-flow.yml"
        );
    }

    #[test]
    fn test_file_ending() {
        assert_eq!(file_ending(Path::new("a/b/HelloWorld.yml")), Some("yml".to_string()));
        assert_eq!(file_ending(Path::new("layout-x.json")), Some("json".to_string()));
        assert_eq!(file_ending(Path::new("README")), None);
    }

    #[test]
    fn test_is_pack_path_valid() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("content").join("Packs").join("TestPack");
        std::fs::create_dir_all(&pack).unwrap();
        assert!(is_pack_path(&pack));
    }

    #[test]
    fn test_is_pack_path_wrong_markers() {
        let temp = TempDir::new().unwrap();
        let not_packs = temp.path().join("content").join("Stuff").join("TestPack");
        std::fs::create_dir_all(&not_packs).unwrap();
        assert!(!is_pack_path(&not_packs));

        let not_content = temp.path().join("repo").join("Packs").join("TestPack");
        std::fs::create_dir_all(&not_content).unwrap();
        assert!(!is_pack_path(&not_content));
    }

    #[test]
    fn test_is_pack_path_missing_dir() {
        let temp = TempDir::new().unwrap();
        let pack = temp.path().join("content").join("Packs").join("Missing");
        assert!(!is_pack_path(&pack));
    }
}
