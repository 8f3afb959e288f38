//! Orchestrates a selective profile migration.

use super::copy::DirCopier;
use super::merge::{JsonStore, merge_json_file};
use super::plugins::detect_plugins;
use super::selection::MigrationSelection;
use super::{ConfigRoot, Direction, ItemKind, PLUGINS_DIR};
use crate::error::{Result, VaultError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, error, info};

/// Applies imported settings to the running host application.
pub trait Reloader {
    fn reload(&self) -> Result<()>;
}

/// Does nothing; the operator restarts the host manually.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReloader;

impl Reloader for NoopReloader {
    fn reload(&self) -> Result<()> {
        Ok(())
    }
}

/// Runs a configured command to reload the host.
#[derive(Debug, Clone)]
pub struct CommandReloader {
    argv: Vec<String>,
}

impl CommandReloader {
    /// `None` for an empty argv.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() { None } else { Some(Self { argv }) }
    }
}

impl Reloader for CommandReloader {
    fn reload(&self) -> Result<()> {
        let status = Command::new(&self.argv[0]).args(&self.argv[1..]).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(VaultError::ReloadFailed(format!(
                "{} exited with {}",
                self.argv[0], status
            )))
        }
    }
}

/// Source and destination of one migration run.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub direction: Direction,
    pub source: ConfigRoot,
    pub destination: ConfigRoot,
}

impl MigrationPlan {
    /// Build a plan from the local and the other vault's configuration roots.
    pub fn new(direction: Direction, local: &Path, external: &Path) -> Result<Self> {
        let external = ConfigRoot::open(external)?;
        let local = ConfigRoot::open(local)?;
        let (source, destination) = match direction {
            Direction::Import => (external, local),
            Direction::Export => (local, external),
        };
        Ok(Self {
            direction,
            source,
            destination,
        })
    }
}

/// One entry that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    pub name: String,
    pub kind: ItemKind,
    pub error: String,
}

/// Outcome of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub direction: Direction,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub copied_dirs: Vec<String>,
    pub merged_files: Vec<String>,
    pub failures: Vec<EntryFailure>,
    /// Set on import: the host must reload to pick up the new settings.
    pub reload_requested: bool,
}

impl MigrationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Executes migrations through explicit collaborators.
pub struct Migrator<'a> {
    copier: &'a dyn DirCopier,
    json: &'a dyn JsonStore,
    reloader: &'a dyn Reloader,
    reload_delay: Duration,
}

impl<'a> Migrator<'a> {
    pub fn new(
        copier: &'a dyn DirCopier,
        json: &'a dyn JsonStore,
        reloader: &'a dyn Reloader,
        reload_delay: Duration,
    ) -> Self {
        Self {
            copier,
            json,
            reloader,
            reload_delay,
        }
    }

    /// Copy every enabled directory and merge every enabled JSON file.
    ///
    /// Entries run concurrently. A failing entry is logged, recorded in the
    /// report, and does not stop the others. Nothing is rolled back.
    pub fn run(&self, plan: &MigrationPlan, selection: &MigrationSelection) -> Result<MigrationReport> {
        let dirs = selection.enabled_dirs();
        let files = selection.enabled_files();
        let plugin_dirs = if dirs.iter().any(|d| d == PLUGINS_DIR) {
            self.selected_plugin_dirs(plan, selection)?
        } else {
            None
        };

        info!(
            direction = ?plan.direction,
            source = %plan.source.path().display(),
            destination = %plan.destination.path().display(),
            dirs = dirs.len(),
            files = files.len(),
            "starting profile migration"
        );

        let copier = self.copier;
        let json = self.json;
        let (dir_results, file_results): (Vec<_>, Vec<_>) = rayon::join(
            || {
                dirs.par_iter()
                    .map(|name| copy_entry(copier, plan, name, plugin_dirs.as_ref()))
                    .collect()
            },
            || {
                files
                    .par_iter()
                    .map(|name| merge_entry(json, plan, name))
                    .collect()
            },
        );

        let mut report = MigrationReport {
            direction: plan.direction,
            source: plan.source.path().to_path_buf(),
            destination: plan.destination.path().to_path_buf(),
            copied_dirs: Vec::new(),
            merged_files: Vec::new(),
            failures: Vec::new(),
            reload_requested: plan.direction == Direction::Import,
        };
        for result in dir_results {
            match result {
                Ok(name) => report.copied_dirs.push(name),
                Err(failure) => report.failures.push(failure),
            }
        }
        for result in file_results {
            match result {
                Ok(name) => report.merged_files.push(name),
                Err(failure) => report.failures.push(failure),
            }
        }
        // Logged here rather than in the workers so every failure is one event
        // on the caller's subscriber.
        for failure in &report.failures {
            error!(
                entry = %failure.name,
                kind = ?failure.kind,
                error = %failure.error,
                "failed to migrate entry"
            );
        }

        info!(
            copied = report.copied_dirs.len(),
            merged = report.merged_files.len(),
            failed = report.failures.len(),
            "profile migration finished"
        );
        Ok(report)
    }

    /// Wait for the reload delay, then reload the host. No-op unless the
    /// report asks for it.
    pub fn finish(&self, report: &MigrationReport) -> Result<()> {
        if !report.reload_requested {
            return Ok(());
        }
        std::thread::sleep(self.reload_delay);
        info!("reloading host application");
        self.reloader.reload()
    }

    /// Map the plugin-level selection onto plugin folder names.
    fn selected_plugin_dirs(
        &self,
        plan: &MigrationPlan,
        selection: &MigrationSelection,
    ) -> Result<Option<HashSet<String>>> {
        let Some(ids) = selection.plugin_filter() else {
            return Ok(None);
        };
        let report = detect_plugins(
            &plan.source.plugins_dir(),
            &plan.destination.plugins_dir(),
            plan.direction,
        )?;
        Ok(Some(
            report
                .plugins
                .into_iter()
                .filter(|p| ids.contains(&p.id))
                .map(|p| p.dir)
                .collect(),
        ))
    }
}

fn copy_entry(
    copier: &dyn DirCopier,
    plan: &MigrationPlan,
    name: &str,
    plugin_dirs: Option<&HashSet<String>>,
) -> std::result::Result<String, EntryFailure> {
    let src = plan.source.join(name);
    let dst = plan.destination.join(name);
    debug!(entry = %name, "copying directory");

    let result = if name == PLUGINS_DIR {
        copier.copy_plugins(&src, &dst, plugin_dirs)
    } else {
        copier.copy_dir(&src, &dst)
    };
    result
        .map(|_| name.to_string())
        .map_err(|e| failure(name, ItemKind::Directory, e))
}

fn merge_entry(
    json: &dyn JsonStore,
    plan: &MigrationPlan,
    name: &str,
) -> std::result::Result<String, EntryFailure> {
    let src = plan.source.json_file(name);
    let dst = plan.destination.json_file(name);
    debug!(entry = %name, "merging settings file");

    merge_json_file(json, &src, &dst)
        .map(|_| name.to_string())
        .map_err(|e| failure(name, ItemKind::File, e))
}

fn failure(name: &str, kind: ItemKind, err: VaultError) -> EntryFailure {
    EntryFailure {
        name: name.to_string(),
        kind,
        error: err.to_string(),
    }
}
