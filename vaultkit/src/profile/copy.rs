//! Recursive directory copies used by migrations.

use super::DEPENDENCY_DIR;
use crate::error::{Result, VaultError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies configuration directories between vaults.
pub trait DirCopier: Sync {
    /// Merge-copy `src` into `dst`, overwriting files of the same name.
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Copy a plugins directory, restricted to `only` plugin folders when given.
    fn copy_plugins(&self, src: &Path, dst: &Path, only: Option<&HashSet<String>>) -> Result<()>;
}

/// [`DirCopier`] backed by the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCopier;

impl DirCopier for FsCopier {
    fn copy_dir(&self, src: &Path, dst: &Path) -> Result<()> {
        copy_dir_merge(src, dst)
    }

    fn copy_plugins(&self, src: &Path, dst: &Path, only: Option<&HashSet<String>>) -> Result<()> {
        copy_plugins_dir(src, dst, only)
    }
}

/// Recursively copy `src` into `dst`.
///
/// Files present on both sides are overwritten. Files only at `dst` are left
/// alone. Symbolic links are followed and their targets copied.
pub fn copy_dir_merge(src: &Path, dst: &Path) -> Result<()> {
    copy_tree(src, dst, &|_: &str| false, &mut Vec::new())
}

/// Copy a plugins directory plugin by plugin, skipping dependency folders at
/// any depth.
///
/// `only` holds plugin folder names. Top-level files are always copied.
pub fn copy_plugins_dir(src: &Path, dst: &Path, only: Option<&HashSet<String>>) -> Result<()> {
    if !src.is_dir() {
        return Err(VaultError::FolderNotFound(src.to_path_buf()));
    }
    fs::create_dir_all(dst)?;
    let mut ancestors = vec![fs::canonicalize(src)?];

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let from = entry.path();
        let to = dst.join(&name);

        match classify(&from)? {
            EntryKind::Dir => {
                if name == DEPENDENCY_DIR {
                    continue;
                }
                if let Some(only) = only {
                    if !only.contains(&name) {
                        debug!(plugin = %name, "plugin not selected, skipping");
                        continue;
                    }
                }
                copy_tree(&from, &to, &|n: &str| n == DEPENDENCY_DIR, &mut ancestors)?;
            }
            EntryKind::File => {
                fs::copy(&from, &to)?;
            }
        }
    }
    Ok(())
}

enum EntryKind {
    Dir,
    File,
}

/// Classify `path`, following symbolic links. A dangling link is an io error.
fn classify(path: &Path) -> Result<EntryKind> {
    let meta = fs::metadata(path)?;
    if meta.is_dir() {
        Ok(EntryKind::Dir)
    } else if meta.is_file() {
        Ok(EntryKind::File)
    } else {
        Err(VaultError::UnsupportedEntry(path.to_path_buf()))
    }
}

/// `ancestors` holds the canonical paths of the directories being copied,
/// so a link back into one of them is reported instead of recursing forever.
fn copy_tree(
    src: &Path,
    dst: &Path,
    skip_dir: &dyn Fn(&str) -> bool,
    ancestors: &mut Vec<PathBuf>,
) -> Result<()> {
    if !src.is_dir() {
        return Err(VaultError::FolderNotFound(src.to_path_buf()));
    }
    let canonical = fs::canonicalize(src)?;
    if ancestors.contains(&canonical) {
        return Err(VaultError::LinkLoop(src.to_path_buf()));
    }
    fs::create_dir_all(dst)?;
    ancestors.push(canonical);

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let from = entry.path();
        let to = dst.join(&name);

        match classify(&from)? {
            EntryKind::Dir => {
                if skip_dir(&name.to_string_lossy()) {
                    continue;
                }
                copy_tree(&from, &to, skip_dir, ancestors)?;
            }
            EntryKind::File => {
                fs::copy(&from, &to)?;
            }
        }
    }

    ancestors.pop();
    Ok(())
}
