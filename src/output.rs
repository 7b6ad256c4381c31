//! # Output Formatting
//!
//! Terminal rendering for `pack-sync`: whether to use colors and emojis, and
//! the end-of-run listing of items that were not downloaded.
//!
//! ## Respecting User Preferences
//!
//! Color is decided from the `--color=never|always|auto` flag. In auto mode
//! the usual conventions apply: `NO_COLOR` and `CLICOLOR=0` turn colors off,
//! `CLICOLOR_FORCE=1` forces them on, and `TERM=dumb` or a non-TTY stdout
//! turn them off.
//!
//! ## Usage
//!
//! ```rust
//! use pack_sync::output::{render_failures, OutputConfig};
//! use pack_sync::phases::FailedItem;
//!
//! let config = OutputConfig::from_env_and_flag("never");
//! let failures = vec![FailedItem {
//!     name: "HelloWorld".to_string(),
//!     reason: "File not in custom content".to_string(),
//! }];
//! let table = render_failures(&config, &failures).unwrap();
//! assert!(table.contains("FILE NAME"));
//! ```

use std::env;

use console::style;

use crate::phases::FailedItem;

const NAME_HEADER: &str = "FILE NAME";
const REASON_HEADER: &str = "REASON";

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

impl OutputConfig {
    /// Create an output configuration from environment and the `--color`
    /// flag value ("always", "never" or "auto").
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // Presence alone disables colors, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    /// Create a configuration with colors always enabled.
    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    /// Create a configuration with colors always disabled.
    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// Returns the emoji when colors are enabled, the plain text otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// Render the not-downloaded table, or `None` when nothing failed.
///
/// The table has a `FILE NAME` and a `REASON` column, a dashed rule under
/// the headers and one row per failure in the order they were recorded.
pub fn render_failures(config: &OutputConfig, failures: &[FailedItem]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    let name_width = failures
        .iter()
        .map(|item| item.name.chars().count())
        .chain(std::iter::once(NAME_HEADER.len()))
        .max()
        .unwrap_or(NAME_HEADER.len());
    let reason_width = failures
        .iter()
        .map(|item| item.reason.chars().count())
        .chain(std::iter::once(REASON_HEADER.len()))
        .max()
        .unwrap_or(REASON_HEADER.len());

    let mut lines = vec![
        format!("{:<name_width$}  {}", NAME_HEADER, REASON_HEADER),
        format!("{}  {}", "-".repeat(name_width), "-".repeat(reason_width)),
    ];
    lines.extend(
        failures
            .iter()
            .map(|item| format!("{:<name_width$}  {}", item.name, item.reason)),
    );

    let table = lines.join("\n");
    Some(if config.use_color {
        style(table).red().to_string()
    } else {
        table
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(name: &str, reason: &str) -> FailedItem {
        FailedItem {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn test_color_always() {
        assert!(OutputConfig::from_env_and_flag("always").use_color);
    }

    #[test]
    fn test_color_never() {
        assert!(!OutputConfig::from_env_and_flag("NEVER").use_color);
    }

    #[test]
    fn test_emoji_helper() {
        assert_eq!(emoji(&OutputConfig::with_color(), "⚠️", "[WARN]"), "⚠️");
        assert_eq!(emoji(&OutputConfig::without_color(), "⚠️", "[WARN]"), "[WARN]");
    }

    #[test]
    fn test_no_failures_no_table() {
        assert_eq!(render_failures(&OutputConfig::without_color(), &[]), None);
    }

    #[test]
    fn test_table_layout() {
        let failures = vec![
            failure("HelloWorld", "File exists and -f is off"),
            failure("Ghost", "File not in custom content"),
        ];
        let table = render_failures(&OutputConfig::without_color(), &failures).unwrap();
        let expected = "\
FILE NAME   REASON
----------  --------------------------
HelloWorld  File exists and -f is off
Ghost       File not in custom content";
        assert_eq!(table, expected);
    }

    #[test]
    fn test_long_header_sets_width() {
        let table = render_failures(&OutputConfig::without_color(), &[failure("A", "x")]).unwrap();
        assert_eq!(table.lines().nth(2), Some("A          x"));
    }
}
