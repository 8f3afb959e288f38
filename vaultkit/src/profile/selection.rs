//! Persisted migration selection and its store.

use super::PLUGINS_DIR;
use super::plugins::{ConflictReason, PluginEntry};
use super::scan::ScanResult;
use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings files migrated by default.
pub const COMMON_FILES: &[&str] = &[
    "app",
    "appearance",
    "core-plugins",
    "community-plugins",
    "hotkeys",
    "workspace",
    "graph",
    "command-palette",
    "daily-notes",
    "templates",
    "types",
];

/// Settings files left out unless the operator opts in.
pub const OPTIONAL_FILES: &[&str] = &["core-plugins-migration", "plugins"];

/// Default inclusion of a newly discovered directory.
pub fn default_dir_state(name: &str) -> bool {
    name != PLUGINS_DIR
}

/// Default inclusion of a newly discovered JSON file.
///
/// Names on neither list are included.
pub fn default_file_state(name: &str) -> bool {
    if COMMON_FILES.contains(&name) {
        true
    } else {
        !OPTIONAL_FILES.contains(&name)
    }
}

/// The operator's migration choices, remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSelection {
    #[serde(default)]
    pub vault_dirs: BTreeMap<String, bool>,
    #[serde(default)]
    pub vault_files: BTreeMap<String, bool>,
    #[serde(default)]
    pub selected_plugins: BTreeMap<String, bool>,
    /// Conflict each plugin choice was made under. A plugin missing here had
    /// no conflict.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_conflicts: BTreeMap<String, ConflictReason>,
}

fn sync_keys(map: &mut BTreeMap<String, bool>, present: &[String], default: impl Fn(&str) -> bool) {
    map.retain(|key, _| present.iter().any(|p| p == key));
    for name in present {
        if !map.contains_key(name) {
            map.insert(name.clone(), default(name));
        }
    }
}

impl MigrationSelection {
    /// Align the directory and file maps with a fresh scan.
    ///
    /// Keys no longer on disk are dropped, new names get their default, and
    /// existing choices are kept.
    pub fn refresh(&mut self, scan: &ScanResult) {
        sync_keys(&mut self.vault_dirs, &scan.dirs, default_dir_state);
        sync_keys(&mut self.vault_files, &scan.files, default_file_state);
    }

    /// Align the plugin map with freshly detected plugins.
    ///
    /// New plugins default to selected unless they conflict. A kept choice is
    /// reset to that default when the plugin's conflict changed since the
    /// choice was made, so a new downgrade always needs an explicit opt-in.
    pub fn refresh_plugins(&mut self, plugins: &[PluginEntry]) {
        let ids: Vec<String> = plugins.iter().map(|p| p.id.clone()).collect();
        self.selected_plugins.retain(|key, _| ids.contains(key));
        self.plugin_conflicts.retain(|key, _| ids.contains(key));

        for plugin in plugins {
            let seen = self.plugin_conflicts.get(&plugin.id).copied();
            let known = self.selected_plugins.contains_key(&plugin.id);
            if !known || seen != plugin.conflict_reason {
                if known {
                    debug!(plugin = %plugin.id, conflict = ?plugin.conflict_reason, "conflict changed, resetting choice");
                }
                self.selected_plugins
                    .insert(plugin.id.clone(), plugin.default_selected());
            }
            match plugin.conflict_reason {
                Some(reason) => self.plugin_conflicts.insert(plugin.id.clone(), reason),
                None => self.plugin_conflicts.remove(&plugin.id),
            };
        }
    }

    /// Set a directory toggle. Returns false if the name is unknown.
    pub fn set_dir(&mut self, name: &str, enabled: bool) -> bool {
        set_known(&mut self.vault_dirs, name, enabled)
    }

    /// Set a file toggle. Returns false if the name is unknown.
    pub fn set_file(&mut self, name: &str, enabled: bool) -> bool {
        set_known(&mut self.vault_files, name, enabled)
    }

    /// Set a plugin toggle. Returns false if the id is unknown.
    pub fn set_plugin(&mut self, id: &str, enabled: bool) -> bool {
        set_known(&mut self.selected_plugins, id, enabled)
    }

    pub fn set_all_dirs(&mut self, enabled: bool) {
        self.vault_dirs.values_mut().for_each(|v| *v = enabled);
    }

    pub fn set_all_files(&mut self, enabled: bool) {
        self.vault_files.values_mut().for_each(|v| *v = enabled);
    }

    pub fn set_all_plugins(&mut self, enabled: bool) {
        self.selected_plugins.values_mut().for_each(|v| *v = enabled);
    }

    /// Whether the plugin-level selector applies.
    pub fn plugins_enabled(&self) -> bool {
        self.vault_dirs.get(PLUGINS_DIR).copied().unwrap_or(false)
    }

    pub fn enabled_dirs(&self) -> Vec<String> {
        enabled_keys(&self.vault_dirs)
    }

    pub fn enabled_files(&self) -> Vec<String> {
        enabled_keys(&self.vault_files)
    }

    /// Plugin ids to copy, or `None` when no plugin-level selection was made
    /// and every plugin should be copied.
    pub fn plugin_filter(&self) -> Option<HashSet<String>> {
        if self.selected_plugins.is_empty() {
            return None;
        }
        Some(enabled_keys(&self.selected_plugins).into_iter().collect())
    }
}

fn set_known(map: &mut BTreeMap<String, bool>, key: &str, enabled: bool) -> bool {
    match map.get_mut(key) {
        Some(value) => {
            *value = enabled;
            true
        }
        None => false,
    }
}

fn enabled_keys(map: &BTreeMap<String, bool>) -> Vec<String> {
    map.iter()
        .filter(|(_, enabled)| **enabled)
        .map(|(k, _)| k.clone())
        .collect()
}

/// Persistence for [`MigrationSelection`].
pub trait SettingsStore {
    fn load(&self) -> Result<MigrationSelection>;
    fn save(&self, selection: &MigrationSelection) -> Result<()>;
}

/// Stores the selection as a pretty JSON file.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> Result<MigrationSelection> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved selection, starting empty");
            return Ok(MigrationSelection::default());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            VaultError::SettingsError(format!("{}: {}", self.path.display(), e))
        })
    }

    fn save(&self, selection: &MigrationSelection) -> Result<()> {
        let json = serde_json::to_string_pretty(selection)?;
        atomic_write(&self.path, json.as_bytes())
    }
}

/// Atomic write: write to temp file, then rename.
pub(crate) fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        VaultError::SettingsError(format!("Invalid settings path: {}", path.display()))
    })?;
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(".tmp.{}", std::process::id()));

    fs::write(&temp_path, contents).map_err(|e| {
        VaultError::SettingsError(format!("Failed to write temp file: {}", e))
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VaultError::SettingsError(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}
