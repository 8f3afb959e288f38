//! User configuration loaded from `config.toml`.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default delay before the reload command runs after an import.
pub const DEFAULT_RELOAD_DELAY_MS: u64 = 1500;

/// vaultkit configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vault used when `--vault` is not given.
    pub default_vault: Option<PathBuf>,
    /// Where the migration selection is persisted.
    pub settings_path: Option<PathBuf>,
    /// Location of Obsidian's global `obsidian.json`.
    pub obsidian_config: Option<PathBuf>,
    /// Milliseconds to wait before reloading after an import.
    pub reload_delay_ms: u64,
    /// Command (argv) that reloads the host application after an import.
    pub reload_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_vault: None,
            settings_path: None,
            obsidian_config: None,
            reload_delay_ms: DEFAULT_RELOAD_DELAY_MS,
            reload_command: None,
        }
    }
}

impl Config {
    /// Directory holding vaultkit's own files.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join("vaultkit")
    }

    /// Default path of the config file.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load the config from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load the config from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| VaultError::ConfigError(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the local vault: explicit argument, then `default_vault`, then the
    /// current directory.
    pub fn resolve_vault_path(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(ref path) = self.default_vault {
            return Ok(path.clone());
        }
        Ok(std::env::current_dir()?)
    }

    /// Path of the persisted migration selection.
    pub fn settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("settings.json"))
    }

    /// Path of Obsidian's global vault registry.
    pub fn obsidian_config_path(&self) -> PathBuf {
        self.obsidian_config.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from(".config"))
                .join("obsidian")
                .join("obsidian.json")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.reload_delay_ms, 1500);
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "reload_delay_ms = 0\nreload_command = [\"obsidian\", \"--reload\"]\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.reload_delay_ms, 0);
        assert_eq!(
            config.reload_command,
            Some(vec!["obsidian".to_string(), "--reload".to_string()])
        );
        assert!(config.default_vault.is_none());
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "reload_delay_ms = \"soon\"").unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(VaultError::ConfigError(_))));
    }

    #[test]
    fn test_resolve_vault_path_precedence() {
        let config = Config {
            default_vault: Some(PathBuf::from("/vaults/main")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_vault_path(Some(Path::new("/vaults/other"))).unwrap(),
            PathBuf::from("/vaults/other")
        );
        assert_eq!(
            config.resolve_vault_path(None).unwrap(),
            PathBuf::from("/vaults/main")
        );
    }
}
