//! vaultkit - profile migration and folder housekeeping for Obsidian vaults.
//!
//! # Overview
//!
//! A vault keeps its settings, community plugins, themes and CSS snippets in a
//! `.obsidian` configuration directory. vaultkit moves that profile between
//! vaults selectively:
//! - directories are copied recursively, merging into existing content
//! - JSON settings files are merged (arrays unioned, objects shallow-merged)
//! - plugins are compared by version and dev status before they are copied
//!
//! It also finds folders by name, finds and deletes empty folders, deletes
//! every folder with a given name, and copies or moves files between the
//! filesystem and the vault.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vaultkit::profile::{
//!     Direction, FsCopier, FsJsonStore, MigrationPlan, MigrationSelection, Migrator,
//!     NoopReloader, scan_config_root,
//! };
//!
//! let plan = MigrationPlan::new(
//!     Direction::Import,
//!     "/vaults/Personal/.obsidian".as_ref(),
//!     "/vaults/Work/.obsidian".as_ref(),
//! )
//! .unwrap();
//!
//! let mut selection = MigrationSelection::default();
//! selection.refresh(&scan_config_root(plan.source.path()).unwrap());
//!
//! let migrator = Migrator::new(&FsCopier, &FsJsonStore, &NoopReloader, Duration::ZERO);
//! let report = migrator.run(&plan, &selection).unwrap();
//! println!("copied {:?}, merged {:?}", report.copied_dirs, report.merged_files);
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod profile;
pub mod registry;
pub mod transfer;
pub mod vault;

// Re-export main types at crate root
pub use config::Config;
pub use error::{Result, VaultError};
pub use registry::VaultRegistry;
pub use vault::Vault;
