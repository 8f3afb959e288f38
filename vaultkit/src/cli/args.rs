//! CLI argument definitions using clap.

use crate::error::VaultError;
use crate::profile::Direction;
use crate::transfer::ConflictPolicy;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "vaultkit")]
#[command(author, version, about = "Vault profile migration and folder tools for Obsidian vaults", long_about = None)]
pub struct Cli {
    /// Path to the local vault (overrides config default)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output as JSON (default)
    #[arg(long, global = true, conflicts_with_all = ["yaml", "toml"])]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true, conflicts_with_all = ["json", "toml"])]
    pub yaml: bool,

    /// Output as TOML
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml"])]
    pub toml: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else {
            OutputFormat::Json
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List vaults known to Obsidian
    Vaults(VaultsArgs),

    /// Migrate settings, plugins and themes between vaults
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Search, clean up and delete folders in the vault
    #[command(subcommand)]
    Folders(FolderCommands),

    /// Copy or move files between the filesystem and the vault
    #[command(subcommand)]
    Files(FileCommands),
}

// === Vaults ===

#[derive(Args, Debug)]
pub struct VaultsArgs {
    /// Include the local vault in the listing
    #[arg(long)]
    pub all: bool,
}

// === Profile ===

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Rescan the source configuration and show the selectable items
    Scan(TargetArgs),

    /// Toggle directories and files for the next migration
    Set(SetArgs),

    /// Show plugins with conflicts and toggle them
    Plugins(PluginsArgs),

    /// Import the other vault's profile into the local vault
    Import(ImportArgs),

    /// Export the local profile into the other vault
    Export(ExportArgs),
}

/// Picks the other vault and, with it, the migration direction.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Import from this vault (path or known vault name)
    #[arg(long, conflicts_with = "to", required_unless_present = "to")]
    pub from: Option<String>,

    /// Export to this vault (path or known vault name)
    #[arg(long)]
    pub to: Option<String>,
}

impl TargetArgs {
    /// The other vault's name or path and the direction it implies.
    pub fn target(&self) -> (Direction, &str) {
        match (&self.from, &self.to) {
            (Some(from), _) => (Direction::Import, from.as_str()),
            (None, Some(to)) => (Direction::Export, to.as_str()),
            // clap guarantees one of them is present
            (None, None) => (Direction::Import, ""),
        }
    }
}

/// `NAME=on|off` toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub name: String,
    pub enabled: bool,
}

pub fn parse_toggle(raw: &str) -> Result<Toggle, String> {
    let invalid = || VaultError::InvalidToggle(raw.to_string()).to_string();
    let (name, value) = raw.rsplit_once('=').ok_or_else(invalid)?;
    let enabled = match value.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => true,
        "off" | "false" | "no" | "0" => false,
        _ => return Err(invalid()),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok(Toggle {
        name: name.to_string(),
        enabled,
    })
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Toggle a directory (e.g. themes=off)
    #[arg(long = "dir", value_parser = parse_toggle)]
    pub dirs: Vec<Toggle>,

    /// Toggle a JSON file by base name (e.g. app=on)
    #[arg(long = "file", value_parser = parse_toggle)]
    pub files: Vec<Toggle>,

    /// Enable every directory and file
    #[arg(long, conflicts_with = "none")]
    pub all: bool,

    /// Disable every directory and file
    #[arg(long)]
    pub none: bool,
}

#[derive(Args, Debug)]
pub struct PluginsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Toggle a plugin by id (e.g. dataview=off)
    #[arg(long = "plugin", value_parser = parse_toggle)]
    pub plugins: Vec<Toggle>,

    /// Select every plugin
    #[arg(long, conflicts_with = "none")]
    pub all: bool,

    /// Deselect every plugin
    #[arg(long)]
    pub none: bool,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Vault to import from (path or known vault name)
    pub from: String,

    /// Show what would be migrated without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not reload the host application afterwards
    #[arg(long)]
    pub no_reload: bool,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Vault to export to (path or known vault name)
    pub to: String,

    /// Show what would be migrated without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

// === Folders ===

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// Find folders by name, grouped with their contents
    Search(SearchFoldersArgs),

    /// Find (and optionally delete) empty folders
    Empty(EmptyFoldersArgs),

    /// Delete every folder with the given name
    #[command(name = "delete-by-name")]
    DeleteByName(DeleteByNameArgs),
}

#[derive(Args, Debug)]
pub struct SearchFoldersArgs {
    /// Case-insensitive substring of the folder name (all folders if omitted)
    #[arg(default_value = "")]
    pub query: String,
}

#[derive(Args, Debug)]
pub struct EmptyFoldersArgs {
    /// Folder to start from, relative to the vault root
    #[arg(long, default_value = "", value_parser = clap::builder::TypedValueParser::map(clap::builder::OsStringValueParser::new(), PathBuf::from))]
    pub path: PathBuf,

    /// Delete the folders found
    #[arg(long)]
    pub delete: bool,
}

#[derive(Args, Debug)]
pub struct DeleteByNameArgs {
    /// Exact folder name
    pub name: String,

    /// Show what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

// === Files ===

#[derive(Subcommand, Debug)]
pub enum FileCommands {
    /// Copy (or move) files and folders into the vault
    Import(FileImportArgs),

    /// Copy (or move) vault files and folders out to a directory
    #[command(name = "export-out")]
    ExportOut(FileExportArgs),
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Move instead of copy; the source is deleted afterwards
    #[arg(long = "move")]
    pub move_items: bool,

    /// What to do when the destination name is taken
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Skip)]
    pub on_conflict: ConflictPolicy,
}

#[derive(Args, Debug)]
pub struct FileImportArgs {
    /// Files or folders on the filesystem
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Vault folder to import into, relative to the vault root
    #[arg(long, default_value = "", value_parser = clap::builder::TypedValueParser::map(clap::builder::OsStringValueParser::new(), PathBuf::from))]
    pub into: PathBuf,

    #[command(flatten)]
    pub transfer: TransferArgs,
}

#[derive(Args, Debug)]
pub struct FileExportArgs {
    /// Files or folders, relative to the vault root
    #[arg(required = true)]
    pub items: Vec<PathBuf>,

    /// Existing directory outside the vault
    #[arg(long)]
    pub to: PathBuf,

    #[command(flatten)]
    pub transfer: TransferArgs,
}
