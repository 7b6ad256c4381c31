//! Default values for pack-sync configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// File name of the optional configuration file.
pub const DEFAULT_CONFIG_FILENAME: &str = "config.yaml";

/// Directory name the content repository root must carry.
pub const CONTENT_ROOT_MARKER: &str = "content";

/// Directory name holding all packs inside the content repository.
pub const PACKS_ROOT_MARKER: &str = "Packs";

/// Characters removed from display names to build directory names.
pub const ENTITY_NAME_SEPARATORS: &[char] = &[' ', '_', '-'];

/// File extensions that count as pack content.
pub const CONTENT_FILE_ENDINGS: &[&str] = &["py", "yml", "png", "json", "md"];

/// Request timeout for the bundle fetch, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Fields the server drops from YAML descriptors on export.
pub const DEFAULT_YML_PRESERVED_FIELDS: &[&str] = &[
    "fromversion",
    "toversion",
    "alt_dockerimages",
    "script.dockerimage45",
    "tests",
    "defaultclassifier",
    "defaultmapperin",
    "defaultmapperout",
];

/// Fields the server drops from JSON content on export.
pub const DEFAULT_JSON_PRESERVED_FIELDS: &[&str] = &["fromVersion", "toVersion", "detached"];

/// Returns the default configuration file path.
///
/// Uses the platform-appropriate config directory:
/// - Linux: `~/.config/pack-sync/config.yaml`
/// - macOS: `~/Library/Application Support/pack-sync/config.yaml`
/// - Windows: `{FOLDERID_RoamingAppData}\pack-sync\config.yaml`
///
/// Falls back to `.pack-sync/config.yaml` in the current directory if the
/// platform config directory cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the
/// `PACK_SYNC_CONFIG` environment variable.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".pack-sync"))
        .join("pack-sync")
        .join(DEFAULT_CONFIG_FILENAME)
}
