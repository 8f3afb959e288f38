//! Copying and moving files between the filesystem and a vault.
//!
//! Every item is placed as `<destination dir>/<item name>`. Items are handled
//! one at a time; a failing item is recorded and the rest still run.

use crate::error::{Result, VaultError};
use crate::profile::copy_dir_merge;
use crate::vault::Vault;
use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Copy leaves the source in place, move removes it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    /// "copied" or "moved".
    pub fn past_tense(self) -> &'static str {
        match self {
            TransferMode::Copy => "copied",
            TransferMode::Move => "moved",
        }
    }
}

/// What to do when the destination name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the existing entry alone and skip the item.
    #[default]
    Skip,
    /// Replace the existing entry. Directories are merged when copying.
    Overwrite,
    /// Pick a free `name (N).ext` next to the existing entry.
    Increment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Done,
    Skipped,
    Failed,
}

/// Result for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub mode: TransferMode,
    pub destination: PathBuf,
    pub items: Vec<TransferOutcome>,
}

impl TransferReport {
    pub fn count(&self, status: TransferStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    pub fn is_complete(&self) -> bool {
        self.count(TransferStatus::Failed) == 0
    }
}

/// `dir/<file name>` with ` (N)` appended to the stem, for the first N that
/// is free. A name already ending in ` (N)` continues from N + 1.
pub fn incremented_path(dir: &Path, file_name: &str) -> PathBuf {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let (base, mut version) = match split_version(&stem) {
        Some((base, n)) => (base.to_string(), n.saturating_add(1)),
        None => (stem, 1),
    };

    loop {
        let candidate = dir.join(format!("{} ({}){}", base, version, extension));
        if !candidate.exists() {
            return candidate;
        }
        version = version.saturating_add(1);
    }
}

/// Splits `"name (3)"` into `("name", 3)`.
fn split_version(stem: &str) -> Option<(&str, u64)> {
    let inner = stem.strip_suffix(')')?;
    let (base, number) = inner.rsplit_once(" (")?;
    if base.is_empty() || number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((base, number.parse().ok()?))
}

/// Transfer `sources` into the existing directory `dest_dir`.
pub fn transfer(
    sources: &[PathBuf],
    dest_dir: &Path,
    mode: TransferMode,
    policy: ConflictPolicy,
) -> Result<TransferReport> {
    if !dest_dir.is_dir() {
        return Err(VaultError::FolderNotFound(dest_dir.to_path_buf()));
    }

    let mut report = TransferReport {
        mode,
        destination: dest_dir.to_path_buf(),
        items: Vec::with_capacity(sources.len()),
    };
    for source in sources {
        let outcome = transfer_one(source, dest_dir, mode, policy);
        match &outcome.error {
            Some(e) => error!(
                source = %outcome.source.display(),
                error = %e,
                "failed to transfer item"
            ),
            None => debug!(
                source = %outcome.source.display(),
                destination = %outcome.destination.display(),
                status = ?outcome.status,
                "transferred item"
            ),
        }
        report.items.push(outcome);
    }

    info!(
        mode = ?mode,
        done = report.count(TransferStatus::Done),
        skipped = report.count(TransferStatus::Skipped),
        failed = report.count(TransferStatus::Failed),
        "transfer finished"
    );
    Ok(report)
}

fn transfer_one(
    source: &Path,
    dest_dir: &Path,
    mode: TransferMode,
    policy: ConflictPolicy,
) -> TransferOutcome {
    let outcome = |destination: PathBuf, status, error: Option<String>| TransferOutcome {
        source: source.to_path_buf(),
        destination,
        status,
        error,
    };

    let Some(name) = source.file_name().map(|n| n.to_string_lossy().to_string()) else {
        let err = VaultError::FolderNotFound(source.to_path_buf());
        return outcome(dest_dir.to_path_buf(), TransferStatus::Failed, Some(err.to_string()));
    };
    let mut destination = dest_dir.join(&name);

    // `exists` follows links, a dangling one still occupies the name.
    let taken = fs::symlink_metadata(&destination).is_ok();
    if taken && same_entry(source, &destination) {
        return outcome(destination, TransferStatus::Skipped, None);
    }
    if taken {
        match policy {
            ConflictPolicy::Skip => return outcome(destination, TransferStatus::Skipped, None),
            ConflictPolicy::Increment => destination = incremented_path(dest_dir, &name),
            ConflictPolicy::Overwrite => {}
        }
    }

    match place(source, &destination, mode, taken && policy == ConflictPolicy::Overwrite) {
        Ok(()) => outcome(destination, TransferStatus::Done, None),
        Err(e) => outcome(destination, TransferStatus::Failed, Some(e.to_string())),
    }
}

fn same_entry(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn place(source: &Path, destination: &Path, mode: TransferMode, overwrite: bool) -> Result<()> {
    let meta = fs::metadata(source)?;
    if !meta.is_dir() && !meta.is_file() {
        return Err(VaultError::UnsupportedEntry(source.to_path_buf()));
    }
    if meta.is_dir() {
        let canonical = fs::canonicalize(source)?;
        let parent = destination.parent().map(fs::canonicalize).transpose()?;
        if parent.is_some_and(|p| p.starts_with(&canonical)) {
            return Err(VaultError::IntoItself(source.to_path_buf()));
        }
    }

    match mode {
        TransferMode::Copy => copy_item(source, destination, meta.is_dir()),
        TransferMode::Move => {
            if overwrite {
                remove_item(destination)?;
            }
            if fs::rename(source, destination).is_ok() {
                return Ok(());
            }
            // Different filesystem, fall back to copy then delete.
            copy_item(source, destination, meta.is_dir())?;
            remove_item(source)
        }
    }
}

fn copy_item(source: &Path, destination: &Path, is_dir: bool) -> Result<()> {
    if is_dir {
        copy_dir_merge(source, destination)
    } else {
        fs::copy(source, destination)?;
        Ok(())
    }
}

fn remove_item(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

impl Vault {
    /// Bring filesystem paths into the vault folder `into` (root when empty).
    pub fn import_items(
        &self,
        sources: &[PathBuf],
        into: &Path,
        mode: TransferMode,
        policy: ConflictPolicy,
    ) -> Result<TransferReport> {
        let into = self.relative_path(into)?;
        let dest_dir = self.folder_path(&into);
        if !dest_dir.is_dir() {
            return Err(VaultError::FolderNotFound(into));
        }
        transfer(sources, &dest_dir, mode, policy)
    }

    /// Copy or move vault items (relative paths) out to a filesystem directory.
    pub fn export_items(
        &self,
        items: &[PathBuf],
        target: &Path,
        mode: TransferMode,
        policy: ConflictPolicy,
    ) -> Result<TransferReport> {
        let mut sources = Vec::with_capacity(items.len());
        for item in items {
            let relative = self.relative_path(item)?;
            if relative.as_os_str().is_empty() {
                return Err(VaultError::FolderNotFound(item.clone()));
            }
            sources.push(self.folder_path(&relative));
        }
        transfer(&sources, target, mode, policy)
    }
}
