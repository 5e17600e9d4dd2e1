//! Orphan detection
//!
//! An orphan is a module directory in the asset repository that the
//! index does not list.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::asset::Category;
use crate::catalog::{AssetIndex, ASSET_FILE};

/// Module directory missing from the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub category: Category,
    pub name: String,
    pub path: PathBuf,
}

/// Find the orphans of one category under `repo_root`
///
/// A directory holding an asset file is a module; its subdirectories are
/// not searched, so nested content is never reported twice.
pub fn find_orphans(repo_root: &Path, category: Category, index: &AssetIndex) -> Result<Vec<Orphan>> {
    let root = repo_root.join(category.dir_name());
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let entries = index.entries(category);
    let mut orphans = Vec::new();
    let mut walker = WalkDir::new(&root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            walker.skip_current_dir();
            continue;
        }
        if !entry.path().join(ASSET_FILE).is_file() {
            continue;
        }

        walker.skip_current_dir();

        let name = module_name(&root, entry.path());
        if !entries.contains_key(&name) {
            orphans.push(Orphan {
                category,
                name,
                path: entry.path().to_path_buf(),
            });
        }
    }

    Ok(orphans)
}

/// Slash-separated name of a module directory relative to its category root
fn module_name(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
