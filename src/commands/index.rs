//! # Index Command Implementation
//!
//! This module implements the `index` subcommand, which displays the content
//! a pack already holds, grouped by category, in the same form the download
//! pipeline uses to tell new items from existing ones.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use log::warn;
use ptree::{print_tree, TreeItem};

use pack_sync::output::{emoji, OutputConfig};
use pack_sync::path::is_pack_path;
use pack_sync::phases::{index, PackContentIndex, PackContentInstance};

/// Show the content a pack already holds
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Path of the pack to index
    #[arg(value_name = "PATH", default_value = ".")]
    pub pack: PathBuf,

    /// Also list the files of each item
    #[arg(long)]
    pub files: bool,
}

/// Execute the `index` command.
pub fn execute(args: IndexArgs, output: &OutputConfig) -> Result<()> {
    if !args.pack.is_dir() {
        anyhow::bail!("Pack directory not found: {}", args.pack.display());
    }
    if !is_pack_path(&args.pack) {
        warn!(
            "{} is not of the form ~/.../content/Packs/<PACK_NAME>",
            args.pack.display()
        );
    }

    let pack_index = index::build(&args.pack);
    println!(
        "{} Content of pack: {}",
        emoji(output, "📦", "[PACK]"),
        args.pack.display()
    );

    if pack_index.is_empty() {
        println!("   No content found");
        return Ok(());
    }

    let tree = build_tree(&args.pack, &pack_index, args.files);
    print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

fn pack_label(pack: &Path) -> String {
    std::path::absolute(pack)
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| pack.display().to_string())
}

fn instance_node(instance: &PackContentInstance, with_files: bool) -> TreeNode {
    let label = if instance.name == instance.id {
        instance.name.clone()
    } else {
        format!("{} [{}]", instance.name, instance.id)
    };
    let children = if with_files {
        instance
            .files
            .iter()
            .map(|record| {
                TreeNode::leaf(
                    record
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                )
            })
            .collect()
    } else {
        vec![]
    };
    TreeNode { label, children }
}

/// Build the display tree: pack, then categories, then items.
fn build_tree(pack: &Path, pack_index: &PackContentIndex, with_files: bool) -> TreeNode {
    let children = pack_index
        .categories()
        .map(|(entity, instances)| TreeNode {
            label: format!("{} ({})", entity.dir_name(), instances.len()),
            children: instances
                .iter()
                .map(|instance| instance_node(instance, with_files))
                .collect(),
        })
        .collect();

    TreeNode {
        label: pack_label(pack),
        children,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: vec![],
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
