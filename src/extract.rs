//! Splitting bundled integrations and scripts into packages
//!
//! The server exports an integration or script as one YAML file with its
//! code, image and long description inlined. In a pack they live as a
//! directory package:
//!
//! - `<base>.yml`: the descriptor, with the code replaced by `-` and the
//!   image and description removed
//! - `<base>.py`: the code
//! - `<base>_image.png`: the integration image
//! - `<base>_description.md`: the integration's detailed description

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use serde_yaml::Value as YamlValue;

use crate::entity::ContentKind;
use crate::error::{Error, Result};
use crate::merge::yaml_doc::YamlDocument;
use crate::merge::PathSegment;

const IMAGE_DATA_PREFIX: &str = "data:image/png;base64,";

/// Value the descriptor keeps in place of extracted code.
const CODE_PLACEHOLDER: &str = "-";

/// Turns a bundled file into the files of a directory package.
pub trait PackageExtractor {
    /// Write the package files of `bundled` into `out_dir`, named after
    /// `base_name`. Returns the written paths.
    fn explode(
        &self,
        bundled: &Path,
        out_dir: &Path,
        kind: ContentKind,
        base_name: &str,
    ) -> Result<Vec<PathBuf>>;
}

/// Default extractor for integration and script YAML files.
#[derive(Debug, Clone, Copy, Default)]
pub struct YmlSplitter;

fn key(name: &str) -> PathSegment {
    PathSegment::Key(name.to_string())
}

fn string_at<'a>(value: &'a YamlValue, path: &[PathSegment]) -> Option<&'a str> {
    crate::merge::yaml_doc::lookup(value, path)?.as_str()
}

/// File extension for a script language.
fn code_ending(language: Option<&str>) -> &'static str {
    match language {
        Some("javascript") => "js",
        Some("powershell") => "ps1",
        _ => "py",
    }
}

impl YmlSplitter {
    fn error(base_name: &str, message: impl Into<String>) -> Error {
        Error::Extraction {
            name: base_name.to_string(),
            message: message.into(),
        }
    }
}

/// Apply an in-place edit, giving up on in-place editing when it fails.
///
/// Once `doc` is `None` the descriptor is written as plain YAML.
fn edit_or_drop<F>(doc: &mut Option<YamlDocument>, base_name: &str, edit: F)
where
    F: FnOnce(&mut YamlDocument) -> Result<()>,
{
    if let Some(current) = doc.as_mut() {
        if let Err(err) = edit(current) {
            warn!("Cannot edit descriptor of {} in place: {}", base_name, err);
            *doc = None;
        }
    }
}

impl PackageExtractor for YmlSplitter {
    fn explode(
        &self,
        bundled: &Path,
        out_dir: &Path,
        kind: ContentKind,
        base_name: &str,
    ) -> Result<Vec<PathBuf>> {
        let (code_path, type_path) = match kind {
            ContentKind::Integration => (vec![key("script"), key("script")], vec![key("script"), key("type")]),
            ContentKind::Script => (vec![key("script")], vec![key("type")]),
            other => {
                return Err(Self::error(
                    base_name,
                    format!("Cannot split {} content into a package", other.as_str()),
                ))
            }
        };
        if !out_dir.is_dir() {
            return Err(Self::error(
                base_name,
                format!("Output directory {} does not exist", out_dir.display()),
            ));
        }

        let text = fs::read_to_string(bundled)?;
        let original: YamlValue = serde_yaml::from_str(&text)
            .map_err(|e| Self::error(base_name, format!("Invalid YAML in {}: {}", bundled.display(), e)))?;
        if !original.is_mapping() {
            return Err(Self::error(base_name, "Descriptor is not a YAML mapping"));
        }

        let mut written = Vec::new();
        let mut descriptor = original.clone();
        let mut doc = Some(YamlDocument::parse(&text));

        if let Some(code) = string_at(&original, &code_path).filter(|c| !c.is_empty() && *c != CODE_PLACEHOLDER) {
            let ending = code_ending(string_at(&original, &type_path));
            let code_file = out_dir.join(format!("{}.{}", base_name, ending));
            let mut code = code.to_string();
            if !code.ends_with('\n') {
                code.push('\n');
            }
            fs::write(&code_file, code)?;
            written.push(code_file);

            if let Some(slot) = crate::merge::yaml_doc::lookup_mut(&mut descriptor, &code_path) {
                *slot = YamlValue::String(CODE_PLACEHOLDER.to_string());
            }
            edit_or_drop(&mut doc, base_name, |doc| doc.set(&descriptor, &code_path));
        }

        if kind == ContentKind::Integration {
            if let Some(image) = string_at(&original, &[key("image")]).filter(|i| !i.is_empty()) {
                let payload = image.strip_prefix(IMAGE_DATA_PREFIX).unwrap_or(image);
                let bytes = STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Self::error(base_name, format!("Invalid image data: {}", e)))?;
                let image_file = out_dir.join(format!("{}_image.png", base_name));
                fs::write(&image_file, bytes)?;
                written.push(image_file);
            }

            if let Some(description) =
                string_at(&original, &[key("detaileddescription")]).filter(|d| !d.is_empty())
            {
                let description_file = out_dir.join(format!("{}_description.md", base_name));
                fs::write(&description_file, description)?;
                written.push(description_file);
            }

            for field in ["image", "detaileddescription"] {
                if let Some(map) = descriptor.as_mapping_mut() {
                    map.remove(field);
                }
                edit_or_drop(&mut doc, base_name, |doc| doc.remove(&[key(field)]).map(drop));
            }
        }

        let edited = doc.map(|doc| doc.to_string()).filter(|yml| {
            matches!(serde_yaml::from_str::<YamlValue>(yml), Ok(value) if value == descriptor)
        });
        let yml = match edited {
            Some(yml) => yml,
            None => {
                warn!("Rewriting descriptor of {} as plain YAML", base_name);
                serde_yaml::to_string(&descriptor)?
            }
        };
        let yml_file = out_dir.join(format!("{}.yml", base_name));
        fs::write(&yml_file, yml)?;
        written.push(yml_file);

        debug!("Split {} into {} files", bundled.display(), written.len());
        Ok(written)
    }
}
