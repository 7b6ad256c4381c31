//! # Configuration
//!
//! `pack-sync` reads an optional YAML file describing the content server and
//! the fields to preserve during a smart merge:
//!
//! ```yaml
//! server:
//!   base_url: https://xsoar.example.com
//!   api_key: "..."
//!   insecure: false
//!   timeout_secs: 60
//! preserved_fields:
//!   yml: [fromversion, toversion, script.dockerimage45]
//!   json: [fromVersion, toVersion, detached]
//! ```
//!
//! Every key is optional. Values are layered: command-line flags win over
//! environment variables (`DEMISTO_BASE_URL`, `DEMISTO_API_KEY`), which win
//! over the file, which wins over the built-in defaults in
//! [`crate::defaults`].

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::content::FileFormat;
use crate::defaults::{
    default_config_path, DEFAULT_JSON_PRESERVED_FIELDS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_YML_PRESERVED_FIELDS,
};
use crate::error::{Error, Result};

/// Environment variable overriding `server.base_url`.
pub const BASE_URL_ENV: &str = "DEMISTO_BASE_URL";

/// Environment variable overriding `server.api_key`.
pub const API_KEY_ENV: &str = "DEMISTO_API_KEY";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "PACK_SYNC_CONFIG";

/// Complete configuration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub server: ServerConfig,
    pub preserved_fields: PreservedFields,
}

/// Connection settings for the content server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            insecure: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Field paths restored by the smart merge, per file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreservedFields {
    pub yml: Vec<String>,
    pub json: Vec<String>,
}

impl Default for PreservedFields {
    fn default() -> Self {
        Self {
            yml: DEFAULT_YML_PRESERVED_FIELDS.iter().map(|f| f.to_string()).collect(),
            json: DEFAULT_JSON_PRESERVED_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl PreservedFields {
    /// Field list for files of `format`.
    pub fn for_format(&self, format: FileFormat) -> &[String] {
        match format {
            FileFormat::Yml => &self.yml,
            FileFormat::Json => &self.json,
        }
    }
}

impl SyncConfig {
    /// Override server settings from environment lookups.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(url) = non_empty(BASE_URL_ENV) {
            debug!("Using base URL from {}", BASE_URL_ENV);
            self.server.base_url = Some(url);
        }
        if let Some(key) = non_empty(API_KEY_ENV) {
            debug!("Using API key from {}", API_KEY_ENV);
            self.server.api_key = Some(key);
        }
    }

    /// Check that the configured base URL is an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.server.base_url {
            let url = Url::parse(base_url).map_err(|err| Error::ConfigParse {
                message: format!("Invalid server.base_url '{}': {}", base_url, err),
                hint: Some("Use a full URL such as https://xsoar.example.com".to_string()),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::ConfigParse {
                    message: format!("Unsupported scheme '{}' in server.base_url", url.scheme()),
                    hint: Some("The content server is reached over http or https".to_string()),
                });
            }
        }
        Ok(())
    }
}

/// Parse a configuration document.
pub fn parse(yaml_content: &str) -> Result<SyncConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|err| Error::ConfigParse {
        message: err.to_string(),
        hint: Some("Valid top-level keys are 'server' and 'preserved_fields'".to_string()),
    })
}

/// Parse a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|err| Error::ConfigParse {
        message: format!("Cannot read {}: {}", path.as_ref().display(), err),
        hint: None,
    })?;
    parse(&content)
}

/// Load the configuration for a run.
///
/// An explicit path must exist. Without one, the default location is used
/// when a file is there, and built-in defaults otherwise. Environment
/// overrides are applied and the result is validated.
pub fn load(explicit: Option<&Path>) -> Result<SyncConfig> {
    let mut config = match explicit {
        Some(path) => from_file(path)?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!("Loading configuration from {}", path.display());
                from_file(&path)?
            } else {
                SyncConfig::default()
            }
        }
    };
    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.server.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!config.server.insecure);
        assert!(config.preserved_fields.yml.contains(&"script.dockerimage45".to_string()));
        assert!(config.preserved_fields.json.contains(&"detached".to_string()));
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse(
            r#"
server:
  base_url: https://xsoar.example.com
  api_key: secret
  insecure: true
  timeout_secs: 5
preserved_fields:
  yml: [fromversion]
  json: []
"#,
        )
        .unwrap();
        assert_eq!(config.server.base_url.as_deref(), Some("https://xsoar.example.com"));
        assert_eq!(config.server.api_key.as_deref(), Some("secret"));
        assert!(config.server.insecure);
        assert_eq!(config.server.timeout_secs, 5);
        assert_eq!(config.preserved_fields.for_format(FileFormat::Yml), ["fromversion".to_string()]);
        assert!(config.preserved_fields.for_format(FileFormat::Json).is_empty());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse("preserved_fields:\n  yml: [tests]\n").unwrap();
        assert_eq!(config.preserved_fields.yml, vec!["tests".to_string()]);
        assert_eq!(config.preserved_fields.json, PreservedFields::default().json);
    }

    #[test]
    fn test_unknown_key_has_hint() {
        let err = parse("servr:\n  base_url: x\n").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = parse("server:\n  base_url: https://file.example.com\n").unwrap();
        config.apply_env(|name| match name {
            BASE_URL_ENV => Some("https://env.example.com".to_string()),
            API_KEY_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.server.base_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.server.api_key, None);
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = SyncConfig::default();
        config.server.base_url = Some("not a url".to_string());
        assert!(matches!(config.validate(), Err(Error::ConfigParse { .. })));

        config.server.base_url = Some("ftp://host".to_string());
        assert!(config.validate().is_err());

        config.server.base_url = Some("http://localhost:8080".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing_is_error() {
        let temp = TempDir::new().unwrap();
        assert!(from_file(temp.path().join("missing.yaml")).is_err());
    }

    #[test]
    #[serial]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "server:\n  timeout_secs: 7\n").unwrap();
        let config = load(Some(&path)).unwrap();
        assert_eq!(config.server.timeout_secs, 7);
    }

    #[test]
    #[serial]
    fn test_load_applies_environment() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "server:\n  base_url: https://file.example.com\n").unwrap();

        std::env::set_var(BASE_URL_ENV, "https://env.example.com");
        let result = load(Some(&path));
        std::env::remove_var(BASE_URL_ENV);

        let config = result.unwrap();
        assert_eq!(config.server.base_url.as_deref(), Some("https://env.example.com"));
    }

    #[test]
    #[serial]
    fn test_load_rejects_invalid_environment_url() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        std::env::set_var(BASE_URL_ENV, "ftp://env.example.com");
        let result = load(Some(&path));
        std::env::remove_var(BASE_URL_ENV);

        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }
}
