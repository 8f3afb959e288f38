//! Vault representation and folder operations.

use crate::error::{Result, VaultError};
use glob::{Pattern, glob};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, warn};

/// Name of the per-vault configuration directory.
pub const CONFIG_DIR_NAME: &str = ".obsidian";

/// Represents an Obsidian vault.
#[derive(Debug, Clone)]
pub struct Vault {
    /// Root path of the vault.
    pub root: PathBuf,
}

/// Shallow content counts for one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderInfo {
    pub path: PathBuf,
    pub name: String,
    pub file_count: usize,
    pub subfolder_count: usize,
}

impl FolderInfo {
    /// "(empty)" or "(contains 2 files, 1 subfolder)".
    pub fn summary(&self) -> String {
        if self.file_count == 0 && self.subfolder_count == 0 {
            return "(empty)".to_string();
        }
        let mut parts = Vec::new();
        if self.file_count > 0 {
            parts.push(plural(self.file_count, "file"));
        }
        if self.subfolder_count > 0 {
            parts.push(plural(self.subfolder_count, "subfolder"));
        }
        format!("(contains {})", parts.join(", "))
    }
}

/// All folders sharing one name.
#[derive(Debug, Clone, Serialize)]
pub struct FolderGroup {
    pub name: String,
    pub count: usize,
    pub folders: Vec<FolderInfo>,
}

/// Outcome of a batch folder deletion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteSummary {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

impl Vault {
    /// Create a new vault instance.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(VaultError::VaultNotFound(root));
        }

        Ok(Self { root })
    }

    /// Path of the vault's `.obsidian` directory. It may not exist.
    pub fn config_dir(&self) -> PathBuf {
        self.root.join(CONFIG_DIR_NAME)
    }

    /// Get the full path to a folder.
    pub fn folder_path(&self, relative_path: &Path) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Normalize a user-supplied vault-relative path.
    ///
    /// Absolute paths and `..` are rejected so the result always resolves
    /// inside the vault. `.` components are dropped.
    pub fn relative_path(&self, path: &Path) -> Result<PathBuf> {
        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(VaultError::FolderNotFound(path.to_path_buf()));
                }
            }
        }
        Ok(normalized)
    }

    /// List all visible folders in the vault, relative to the root, sorted.
    ///
    /// The root itself and anything under a dot-directory are excluded.
    pub fn list_folders(&self) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/**/*",
            Pattern::escape(&self.root.to_string_lossy())
        );

        let mut folders = Vec::new();

        for entry in glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if !path.is_dir() {
                        continue;
                    }
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        if !relative.as_os_str().is_empty() && !is_hidden(relative) {
                            folders.push(relative.to_path_buf());
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "glob error while listing folders");
                }
            }
        }

        folders.sort();
        Ok(folders)
    }

    /// Shallow counts of visible files and subfolders in a folder.
    pub fn folder_info(&self, relative_path: &Path) -> Result<FolderInfo> {
        let full = self.folder_path(relative_path);
        if !full.is_dir() {
            return Err(VaultError::FolderNotFound(relative_path.to_path_buf()));
        }

        let mut file_count = 0;
        let mut subfolder_count = 0;
        for entry in std::fs::read_dir(&full)? {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type()?.is_dir() {
                subfolder_count += 1;
            } else {
                file_count += 1;
            }
        }

        Ok(FolderInfo {
            path: relative_path.to_path_buf(),
            name: relative_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            file_count,
            subfolder_count,
        })
    }

    /// Folders whose name contains `query` (case-insensitive), grouped by name.
    ///
    /// An empty query matches every folder.
    pub fn search_folders(&self, query: &str) -> Result<Vec<FolderGroup>> {
        let query_lower = query.trim().to_lowercase();
        let mut groups: BTreeMap<String, Vec<FolderInfo>> = BTreeMap::new();

        for folder in self.list_folders()? {
            let name = folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if !name.to_lowercase().contains(&query_lower) {
                continue;
            }
            let info = self.folder_info(&folder)?;
            groups.entry(name).or_default().push(info);
        }

        Ok(groups
            .into_iter()
            .map(|(name, folders)| FolderGroup {
                name,
                count: folders.len(),
                folders,
            })
            .collect())
    }

    /// Every folder whose name is exactly `name`.
    pub fn folders_named(&self, name: &str) -> Result<Vec<PathBuf>> {
        Ok(self
            .list_folders()?
            .into_iter()
            .filter(|p| p.file_name().map(|n| n == name).unwrap_or(false))
            .collect())
    }

    /// Find folders under `start` (vault root when empty) that contain nothing
    /// but other empty folders.
    ///
    /// The vault root is never reported. Any file, hidden ones included, makes
    /// its folder and all of its ancestors non-empty.
    pub fn find_empty_folders(&self, start: &Path) -> Result<Vec<PathBuf>> {
        let start = &self.relative_path(start)?;
        let start_full = self.folder_path(start);
        if !start_full.is_dir() {
            return Err(VaultError::FolderNotFound(start.to_path_buf()));
        }

        let mut candidates: Vec<PathBuf> = self
            .list_folders()?
            .into_iter()
            .filter(|p| p.starts_with(start))
            .collect();
        if !start.as_os_str().is_empty() && !candidates.iter().any(|p| p == start) {
            candidates.push(start.to_path_buf());
        }

        // Deepest first so children are decided before their parents.
        candidates.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

        let mut empty: HashSet<PathBuf> = HashSet::new();
        for folder in &candidates {
            let mut has_content = false;
            for entry in std::fs::read_dir(self.folder_path(folder))? {
                let entry = entry?;
                let child = folder.join(entry.file_name());
                if !(entry.file_type()?.is_dir() && empty.contains(&child)) {
                    has_content = true;
                    break;
                }
            }
            if !has_content {
                debug!(folder = %folder.display(), "empty folder");
                empty.insert(folder.clone());
            }
        }

        let mut result: Vec<PathBuf> = empty.into_iter().collect();
        result.sort();
        Ok(result)
    }

    /// Delete folders found by [`Vault::find_empty_folders`], deepest first.
    ///
    /// Uses `remove_dir`, so a folder that gained content since the scan fails
    /// instead of being wiped.
    pub fn delete_empty_folders(&self, folders: &[PathBuf]) -> DeleteSummary {
        let mut ordered: Vec<&PathBuf> = folders.iter().collect();
        ordered.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

        let mut summary = DeleteSummary::default();
        for folder in ordered {
            match std::fs::remove_dir(self.folder_path(folder)) {
                Ok(()) => summary.deleted.push(folder.clone()),
                Err(e) => {
                    error!(folder = %folder.display(), error = %e, "failed to delete folder");
                    summary.failed.push(folder.clone());
                }
            }
        }
        summary.deleted.sort();
        summary
    }

    /// Delete every folder named `name`, with its contents.
    ///
    /// A match nested inside another match goes with its ancestor and is not
    /// listed separately.
    pub fn delete_folders_named(&self, name: &str) -> Result<DeleteSummary> {
        let targets = outermost(self.folders_named(name)?);

        let mut summary = DeleteSummary::default();
        for folder in targets {
            match std::fs::remove_dir_all(self.folder_path(&folder)) {
                Ok(()) => summary.deleted.push(folder),
                Err(e) => {
                    error!(folder = %folder.display(), error = %e, "failed to delete folder");
                    summary.failed.push(folder);
                }
            }
        }
        Ok(summary)
    }
}

/// Drop paths that live under another path of the same list.
pub(crate) fn outermost(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort();
    let mut kept: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !kept.iter().any(|k| path.starts_with(k)) {
            kept.push(path);
        }
    }
    kept
}
