//! Profile migration: moving a vault's `.obsidian` settings, plugins and
//! themes into another vault.
//!
//! A migration runs in four steps:
//! - scan the source configuration root ([`scan_config_root`])
//! - refresh the persisted [`MigrationSelection`] against the scan
//! - let the operator toggle items and plugins ([`selectable_items`], [`detect_plugins`])
//! - execute the selective copy/merge ([`Migrator::run`])

mod copy;
mod merge;
mod migrate;
mod plugins;
mod present;
mod scan;
mod selection;

pub use copy::{DirCopier, FsCopier, copy_dir_merge, copy_plugins_dir};
pub use merge::{FsJsonStore, JsonStore, merge_json, merge_json_file};
pub use migrate::{
    CommandReloader, EntryFailure, MigrationPlan, MigrationReport, Migrator, NoopReloader, Reloader,
};
pub use plugins::{
    ConflictReason, PluginEntry, PluginManifest, PluginReport, compare_versions,
    contextual_warning, detect_plugins, inspect_plugin, is_dev_plugin,
};
pub use present::{SelectableItem, item_description, item_label, selectable_items};
pub use scan::{ScanResult, scan_config_root};
pub use selection::{
    JsonSettingsStore, MigrationSelection, SettingsStore, default_dir_state, default_file_state,
};

use crate::error::{Result, VaultError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the configuration directory holding community plugins.
pub const PLUGINS_DIR: &str = "plugins";

/// Dependency folder skipped when copying plugins and used to spot dev plugins.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Direction of a migration relative to the local vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Other vault -> local vault.
    Import,
    /// Local vault -> other vault.
    Export,
}

impl Direction {
    pub fn verb(self) -> &'static str {
        match self {
            Direction::Import => "Import",
            Direction::Export => "Export",
        }
    }
}

/// Whether a selectable item is a directory or a JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Directory,
    File,
}

/// A vault's configuration directory, checked to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRoot(PathBuf);

impl ConfigRoot {
    /// Open an existing configuration root.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_dir() {
            return Err(VaultError::ConfigRootNotFound(path));
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.0.join(name)
    }

    /// Path of a JSON configuration document by base name.
    pub fn json_file(&self, name: &str) -> PathBuf {
        self.0.join(format!("{}.json", name))
    }

    pub fn plugins_dir(&self) -> PathBuf {
        self.0.join(PLUGINS_DIR)
    }
}
