//! Enumerates a configuration root's directories and JSON documents.

use crate::error::{Result, VaultError};
use serde::Serialize;
use std::path::Path;

/// Immediate children of a configuration root eligible for migration.
///
/// Both lists keep the filesystem's enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Directory names.
    pub dirs: Vec<String>,
    /// JSON file base names (without `.json`).
    pub files: Vec<String>,
}

/// Scan a configuration root.
pub fn scan_config_root(root: &Path) -> Result<ScanResult> {
    if !root.is_dir() {
        return Err(VaultError::ConfigRootNotFound(root.to_path_buf()));
    }

    let mut result = ScanResult::default();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();

        // `is_dir`/`is_file` follow links, so linked entries are migrated too.
        if path.is_dir() {
            result.dirs.push(entry.file_name().to_string_lossy().to_string());
        } else if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(stem) = path.file_stem() {
                result.files.push(stem.to_string_lossy().to_string());
            }
        }
    }

    Ok(result)
}
