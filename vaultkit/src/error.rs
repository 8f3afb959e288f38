//! Error types and exit codes for vaultkit.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const VAULT_NOT_FOUND: i32 = 2;
    pub const CONFIG_ROOT_NOT_FOUND: i32 = 3;
    pub const AMBIGUOUS_VAULT: i32 = 4;
    pub const PARTIAL_MIGRATION: i32 = 5;
}

/// Main error type for vaultkit operations.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault not found: '{0}' is neither a directory nor a known vault name")]
    UnknownVault(String),

    #[error("Ambiguous vault: {count} known vaults are named '{query}'")]
    AmbiguousVault {
        query: String,
        count: usize,
        matches: Vec<PathBuf>,
    },

    #[error("Select a valid vault folder: no configuration directory at {0}")]
    ConfigRootNotFound(PathBuf),

    #[error("Folder not found: {0}")]
    FolderNotFound(PathBuf),

    #[error("Invalid selection toggle '{0}': expected NAME=on|off")]
    InvalidToggle(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Reload failed: {0}")]
    ReloadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Unsupported file type (not a file, directory, or link to one): {0}")]
    UnsupportedEntry(PathBuf),

    #[error("Symbolic link loop: {0} points into its own ancestor")]
    LinkLoop(PathBuf),

    #[error("Cannot place {0} inside itself")]
    IntoItself(PathBuf),
}

impl VaultError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VaultError::VaultNotFound(_) | VaultError::UnknownVault(_) => {
                exit_code::VAULT_NOT_FOUND
            }
            VaultError::ConfigRootNotFound(_) => exit_code::CONFIG_ROOT_NOT_FOUND,
            VaultError::AmbiguousVault { .. } => exit_code::AMBIGUOUS_VAULT,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

/// Result type alias for vaultkit operations.
pub type Result<T> = std::result::Result<T, VaultError>;

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    GeneralError,
    VaultNotFound,
    ConfigRootNotFound,
    AmbiguousVault,
    PartialMigration,
}

impl ExitCode {
    /// Convert to exit code integer.
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => exit_code::SUCCESS,
            ExitCode::GeneralError => exit_code::GENERAL_ERROR,
            ExitCode::VaultNotFound => exit_code::VAULT_NOT_FOUND,
            ExitCode::ConfigRootNotFound => exit_code::CONFIG_ROOT_NOT_FOUND,
            ExitCode::AmbiguousVault => exit_code::AMBIGUOUS_VAULT,
            ExitCode::PartialMigration => exit_code::PARTIAL_MIGRATION,
        }
    }
}
