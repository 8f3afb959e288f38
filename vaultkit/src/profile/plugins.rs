//! Community plugin discovery and conflict detection.

use super::{DEPENDENCY_DIR, Direction};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::warn;

/// Fields read from a plugin's `manifest.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PluginManifest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
}

impl PluginManifest {
    /// Read `<plugin_dir>/manifest.json`. `Ok(None)` when it does not exist.
    pub fn read(plugin_dir: &Path) -> Result<Option<Self>> {
        let path = plugin_dir.join("manifest.json");
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

/// Why applying a plugin is considered risky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictReason {
    /// Source version is older than the destination's.
    LowerVersion,
    /// A development build would replace a released one.
    DevOverStable,
    /// A released build would replace a development one.
    StableOverDev,
    /// A development build would replace another development build.
    DevOverDev,
}

impl ConflictReason {
    pub fn label(self) -> &'static str {
        match self {
            ConflictReason::LowerVersion => "Lower version",
            ConflictReason::DevOverStable => "Dev plugin conflict",
            ConflictReason::StableOverDev => "Overwriting dev plugin",
            ConflictReason::DevOverDev => "Dev plugin over dev plugin",
        }
    }
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One plugin found under a source plugins directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginEntry {
    /// Directory name under `plugins/`.
    pub dir: String,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_dev_plugin: bool,
    pub has_conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_reason: Option<ConflictReason>,
    /// Present when the plugin is installed at the destination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_version: Option<String>,
    pub destination_is_dev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl PluginEntry {
    /// Conflicting plugins start deselected.
    pub fn default_selected(&self) -> bool {
        !self.has_conflict
    }

    /// "Version: 1.2.0 vs 1.3.0 (local)" style line.
    pub fn version_line(&self, direction: Direction) -> Option<String> {
        let version = self.version.as_ref()?;
        match &self.destination_version {
            Some(dest) => {
                let place = match direction {
                    Direction::Import => "local",
                    Direction::Export => "destination",
                };
                let dev = if self.destination_is_dev { " (Dev plugin)" } else { "" };
                Some(format!("Version: {} vs {}{} ({})", version, dest, dev, place))
            }
            None => Some(format!("Version: {}", version)),
        }
    }
}

/// Counts shown above a plugin list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginReport {
    pub plugins: Vec<PluginEntry>,
    pub conflict_count: usize,
    pub dev_plugin_count: usize,
}

/// Compare dotted numeric versions.
///
/// Missing components count as 0, and so do components that are not numbers.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let left = parse(a);
    let right = parse(b);

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// A plugin directory carrying its own dependency tree is under development.
pub fn is_dev_plugin(plugin_dir: &Path) -> bool {
    plugin_dir.join(DEPENDENCY_DIR).is_dir()
}

/// Display-only warning for overwriting across dev/stable builds.
pub fn contextual_warning(
    direction: Direction,
    source_is_dev: bool,
    destination_exists: bool,
    destination_is_dev: bool,
) -> Option<&'static str> {
    if !destination_exists {
        return None;
    }
    match (direction, source_is_dev, destination_is_dev) {
        (_, false, false) => None,
        (Direction::Import, false, true) => {
            Some("May overwrite a local development plugin with a released build")
        }
        (Direction::Import, true, false) => {
            Some("May replace a released plugin with a development build")
        }
        (Direction::Import, true, true) => {
            Some("May overwrite a local development plugin with another development build")
        }
        (Direction::Export, true, false) => {
            Some("May overwrite a released plugin at the destination with a development build")
        }
        (Direction::Export, false, true) => {
            Some("May overwrite a development plugin at the destination")
        }
        (Direction::Export, true, true) => {
            Some("May overwrite the destination's development plugin with the local one")
        }
    }
}

fn dev_conflict(source_is_dev: bool, destination_is_dev: bool) -> Option<ConflictReason> {
    match (source_is_dev, destination_is_dev) {
        (true, false) => Some(ConflictReason::DevOverStable),
        (false, true) => Some(ConflictReason::StableOverDev),
        (true, true) => Some(ConflictReason::DevOverDev),
        (false, false) => None,
    }
}

fn read_manifest_lenient(plugin_dir: &Path) -> Option<PluginManifest> {
    match PluginManifest::read(plugin_dir) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!(plugin = %plugin_dir.display(), error = %e, "could not read plugin manifest");
            None
        }
    }
}

/// Inspect one source plugin directory against the destination plugins directory.
pub fn inspect_plugin(
    source_dir: &Path,
    destination_plugins: &Path,
    direction: Direction,
) -> PluginEntry {
    let dir = source_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let manifest = read_manifest_lenient(source_dir).unwrap_or_default();

    let id = manifest.id.unwrap_or_else(|| dir.clone());
    let name = manifest.name.unwrap_or_else(|| dir.clone());
    let is_dev = is_dev_plugin(source_dir);

    let destination_dir = destination_plugins.join(&id);
    let destination_exists = destination_dir.is_dir();
    let destination_is_dev = destination_exists && is_dev_plugin(&destination_dir);
    let destination_version = if destination_exists {
        read_manifest_lenient(&destination_dir).and_then(|m| m.version)
    } else {
        None
    };

    let lower_version = match (&manifest.version, &destination_version) {
        (Some(src), Some(dst)) if compare_versions(src, dst) == Ordering::Less => {
            Some(ConflictReason::LowerVersion)
        }
        _ => None,
    };
    let conflict_reason = if destination_exists {
        lower_version.or_else(|| dev_conflict(is_dev, destination_is_dev))
    } else {
        None
    };

    PluginEntry {
        dir,
        id,
        name,
        version: manifest.version,
        description: manifest.description,
        is_dev_plugin: is_dev,
        has_conflict: conflict_reason.is_some(),
        conflict_reason,
        destination_version,
        destination_is_dev,
        warning: contextual_warning(direction, is_dev, destination_exists, destination_is_dev)
            .map(str::to_string),
    }
}

/// Inspect every plugin under `source_plugins`, sorted by name.
///
/// A missing source directory yields an empty report.
pub fn detect_plugins(
    source_plugins: &Path,
    destination_plugins: &Path,
    direction: Direction,
) -> Result<PluginReport> {
    let mut report = PluginReport::default();
    if !source_plugins.is_dir() {
        return Ok(report);
    }

    for entry in std::fs::read_dir(source_plugins)? {
        let entry = entry?;
        // Follows links so plugins symlinked in from a dev checkout are found.
        if !entry.path().is_dir() {
            continue;
        }
        let plugin = inspect_plugin(&entry.path(), destination_plugins, direction);
        if plugin.is_dev_plugin {
            report.dev_plugin_count += 1;
        }
        if plugin.has_conflict {
            report.conflict_count += 1;
        }
        report.plugins.push(plugin);
    }

    report
        .plugins
        .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(report)
}
