//! Obsidian's global vault registry (`obsidian.json`).

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One vault entry in `obsidian.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredVault {
    pub path: PathBuf,
    #[serde(default)]
    pub ts: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ObsidianJson {
    #[serde(default)]
    vaults: BTreeMap<String, RegisteredVault>,
}

/// A vault known to Obsidian, for listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownVault {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub open: bool,
}

/// Vaults known to the local Obsidian installation.
#[derive(Debug, Clone, Default)]
pub struct VaultRegistry {
    vaults: Vec<KnownVault>,
}

impl VaultRegistry {
    /// Read the registry. A missing or malformed file yields an empty registry.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "no obsidian.json");
            return Self::default();
        }
        match Self::read(path) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read obsidian.json");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let parsed: ObsidianJson = serde_json::from_str(&content)?;
        Ok(Self::from_entries(parsed.vaults))
    }

    /// Build a registry from raw entries.
    pub fn from_entries(entries: BTreeMap<String, RegisteredVault>) -> Self {
        let vaults = entries
            .into_iter()
            .map(|(id, v)| KnownVault {
                name: v
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                id,
                path: v.path,
                open: v.open.unwrap_or(false),
            })
            .collect();
        Self { vaults }
    }

    /// All known vaults.
    pub fn vaults(&self) -> &[KnownVault] {
        &self.vaults
    }

    /// Known vaults other than `current`.
    ///
    /// Paths are compared after canonicalization, so a trailing slash, a
    /// relative path or a symlink to the current vault still excludes it.
    pub fn others(&self, current: &Path) -> Vec<&KnownVault> {
        let current = canonical(current);
        self.vaults
            .iter()
            .filter(|v| canonical(&v.path) != current)
            .collect()
    }

    /// Find a known vault by its directory name.
    pub fn find_by_name(&self, name: &str) -> Result<&KnownVault> {
        let matches: Vec<&KnownVault> = self.vaults.iter().filter(|v| v.name == name).collect();
        match matches.as_slice() {
            [] => Err(VaultError::UnknownVault(name.to_string())),
            [one] => Ok(one),
            many => Err(VaultError::AmbiguousVault {
                query: name.to_string(),
                count: many.len(),
                matches: many.iter().map(|v| v.path.clone()).collect(),
            }),
        }
    }
}

/// Canonical form of `path`, or the path itself when it cannot be resolved.
fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolves the "other" vault of a migration from an operator argument.
pub trait VaultPicker {
    fn pick(&self, query: &str) -> Result<PathBuf>;
}

/// Picks a vault by directory path, falling back to a registry name lookup.
pub struct RegistryPicker<'a> {
    registry: &'a VaultRegistry,
}

impl<'a> RegistryPicker<'a> {
    pub fn new(registry: &'a VaultRegistry) -> Self {
        Self { registry }
    }
}

impl VaultPicker for RegistryPicker<'_> {
    fn pick(&self, query: &str) -> Result<PathBuf> {
        let as_path = PathBuf::from(query);
        if as_path.is_dir() {
            return Ok(as_path);
        }
        self.registry.find_by_name(query).map(|v| v.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn registry() -> VaultRegistry {
        let json = r#"{
            "vaults": {
                "a1": {"path": "/home/me/Work", "ts": 1, "open": true},
                "b2": {"path": "/home/me/Personal", "ts": 2},
                "c3": {"path": "/mnt/backup/Work", "ts": 3}
            },
            "insider": false
        }"#;
        let parsed: ObsidianJson = serde_json::from_str(json).unwrap();
        VaultRegistry::from_entries(parsed.vaults)
    }

    #[test]
    fn test_others_excludes_current() {
        let registry = registry();
        let others = registry.others(Path::new("/home/me/Work"));
        let names: Vec<&str> = others.iter().map(|v| v.path.to_str().unwrap()).collect();
        assert_eq!(names, vec!["/home/me/Personal", "/mnt/backup/Work"]);
    }

    #[test]
    fn test_others_matches_equivalent_paths() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("Work");
        let personal = dir.path().join("Personal");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::create_dir_all(&personal).unwrap();

        let mut entries = BTreeMap::new();
        for (id, path) in [("w", &work), ("p", &personal)] {
            entries.insert(
                id.to_string(),
                RegisteredVault { path: path.clone(), ts: 0, open: None },
            );
        }
        let registry = VaultRegistry::from_entries(entries);

        let trailing = PathBuf::from(format!("{}/", work.display()));
        let dotted = dir.path().join("Personal/../Work");
        for current in [trailing, dotted] {
            let others = registry.others(&current);
            assert_eq!(others.len(), 1, "{}", current.display());
            assert_eq!(others[0].path, personal);
        }
    }

    #[test]
    fn test_find_by_name() {
        let registry = registry();
        assert_eq!(
            registry.find_by_name("Personal").unwrap().path,
            PathBuf::from("/home/me/Personal")
        );
        assert!(matches!(
            registry.find_by_name("Work"),
            Err(VaultError::AmbiguousVault { count: 2, .. })
        ));
        assert!(matches!(
            registry.find_by_name("Nope"),
            Err(VaultError::UnknownVault(_))
        ));
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = TempDir::new().unwrap();
        assert!(VaultRegistry::load(&dir.path().join("obsidian.json")).vaults().is_empty());

        let path = dir.path().join("obsidian.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(VaultRegistry::load(&path).vaults().is_empty());
    }

    #[test]
    fn test_picker_prefers_existing_directory() {
        let dir = TempDir::new().unwrap();
        let registry = VaultRegistry::default();
        let picker = RegistryPicker::new(&registry);

        let picked = picker.pick(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(picked, dir.path());
        assert!(matches!(picker.pick("ghost"), Err(VaultError::UnknownVault(_))));
    }
}
