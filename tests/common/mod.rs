//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a pack fixture laid out the way a content repository
//! is (`<tmp>/content/Packs/<PACK>`), sample content files, and stand-ins
//! for the content server.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = PackFixture::new().with_file("Layouts/layout-x.json", "{}");
//!     // ... test code
//! }
//! ```

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use pack_sync::error::{Error, Result};
use pack_sync::filesystem::MemoryFS;
use pack_sync::remote::ContentFetcher;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::contents;
    #[allow(unused_imports)]
    pub use super::{bundle, BundleFetcher, FailingFetcher, PackFixture};
}

/// Sample content files, as the server exports them.
#[allow(dead_code)]
pub mod contents {
    /// A bundled integration with inlined code, image and description.
    pub const HELLO_WORLD_INTEGRATION: &str = "\
commonfields:
  id: HelloWorld
  version: -1
name: HelloWorld
display: Hello World
category: Utilities
image: data:image/png;base64,iVBORw0KGgo=
detaileddescription: Use your API key.
configuration:
- display: Server URL
  name: url
  type: 0
script:
  script: |
    def main():
        return 'ok'
  type: python
  subtype: python3
";

    /// The descriptor of the HelloWorld package as it sits in a pack.
    pub const HELLO_WORLD_DESCRIPTOR: &str = "\
commonfields:
  id: HelloWorld
  version: -1
name: HelloWorld
display: Hello World
category: Utilities
fromversion: 5.0.0
configuration:
- display: Server URL
  name: url
  defaultvalue: secret
  type: 0
script:
  script: '-'
  type: python
  subtype: python3
  dockerimage45: demisto/python:1.3-alpine
tests:
- HelloWorld-Test
";

    /// A bundled script, archived under the `automation-` prefix.
    pub const GREET_SCRIPT: &str = "\
commonfields:
  id: greet
  version: -1
name: Greet Script
script: |
  print('hello')
type: python
";

    /// An incident type without its pack-only fields.
    pub const MY_PLAYBOOK_INCIDENT_TYPE: &str =
        r##"{"id": "MyPlaybook", "name": "MyPlaybook", "preProcessingScript": "", "color": "#ff0000"}"##;

    /// The same incident type as it sits in a pack.
    pub const MY_PLAYBOOK_INCIDENT_TYPE_IN_PACK: &str = r##"{
  "id": "MyPlaybook",
  "name": "MyPlaybook",
  "preProcessingScript": "",
  "color": "#000000",
  "detached": false,
  "fromVersion": "5.5.0"
}
"##;

    /// A layout keyed by its incident type.
    pub const PHISHING_LAYOUT: &str = r#"{"typeId": "Phishing", "kind": "details", "layout": {"tabs": []}}"#;
}

/// Build an in-memory bundle from `(name, content)` pairs.
#[allow(dead_code)]
pub fn bundle(files: &[(&str, &str)]) -> MemoryFS {
    let mut fs = MemoryFS::new();
    for (name, content) in files {
        fs.insert(name, *content)
            .expect("Failed to add bundle file");
    }
    fs
}

/// Fetcher that hands out a prepared bundle.
#[allow(dead_code)]
pub struct BundleFetcher(pub MemoryFS);

impl ContentFetcher for BundleFetcher {
    fn fetch(&self) -> Result<MemoryFS> {
        Ok(self.0.clone())
    }
}

/// Fetcher standing in for an unreachable server.
#[allow(dead_code)]
pub struct FailingFetcher;

impl ContentFetcher for FailingFetcher {
    fn fetch(&self) -> Result<MemoryFS> {
        Err(Error::Fetch {
            url: "https://xsoar.invalid/content/bundle".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

/// A temporary content repository holding one pack.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = PackFixture::new()
///     .with_file("Layouts/layout-Phishing.json", contents::PHISHING_LAYOUT);
///
/// let mut cmd = fixture.command();
/// cmd.arg("index").arg(fixture.pack_path()).assert().success();
/// ```
pub struct PackFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl PackFixture {
    /// Name of the fixture pack.
    pub const PACK_NAME: &'static str = "TestPack";

    /// Create `<tmp>/content/Packs/TestPack`, empty.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("content/Packs")
            .child(Self::PACK_NAME)
            .create_dir_all()
            .expect("Failed to create pack directory");
        Self { temp_dir }
    }

    /// Add a file at `path`, relative to the pack.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        let child = self.child(path);
        if let Some(parent) = child.path().parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        child.write_str(content).expect("Failed to write file");
        self
    }

    /// Path of the pack directory.
    pub fn pack_path(&self) -> PathBuf {
        self.temp_dir
            .path()
            .join("content/Packs")
            .join(Self::PACK_NAME)
    }

    /// Path of the temporary directory holding the repository.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A path inside the pack.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        assert_fs::fixture::ChildPath::new(self.pack_path().join(path))
    }

    /// Read a file inside the pack.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.pack_path().join(path)).expect("Failed to read pack file")
    }

    /// Create a command for the pack-sync binary running in the repository
    /// root, isolated from the caller's configuration.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("pack-sync");
        cmd.current_dir(self.root())
            .env("HOME", self.root())
            .env("XDG_CONFIG_HOME", self.root().join(".config"))
            .env_remove("PACK_SYNC_CONFIG")
            .env_remove("DEMISTO_BASE_URL")
            .env_remove("DEMISTO_API_KEY")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for PackFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_a_pack_path() {
        let fixture = PackFixture::new();
        assert!(pack_sync::path::is_pack_path(&fixture.pack_path()));
    }

    #[test]
    fn test_fixture_with_file() {
        let fixture = PackFixture::new().with_file("Layouts/layout-x.json", "{}");
        assert_eq!(fixture.read("Layouts/layout-x.json"), "{}");
    }

    #[test]
    fn test_sample_contents_parse() {
        for yaml in [
            contents::HELLO_WORLD_INTEGRATION,
            contents::HELLO_WORLD_DESCRIPTOR,
            contents::GREET_SCRIPT,
        ] {
            serde_yaml::from_str::<serde_yaml::Value>(yaml).expect("sample should be valid YAML");
        }
        for json in [
            contents::MY_PLAYBOOK_INCIDENT_TYPE,
            contents::MY_PLAYBOOK_INCIDENT_TYPE_IN_PACK,
            contents::PHISHING_LAYOUT,
        ] {
            serde_json::from_str::<serde_json::Value>(json).expect("sample should be valid JSON");
        }
    }
}
