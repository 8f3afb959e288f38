//! Profile migration commands.

use crate::cli::args::{PluginsArgs, SetArgs, TargetArgs, Toggle};
use crate::cli::output::{DryRunResponse, Output};
use crate::error::{ExitCode, Result};
use crate::profile::{
    Direction, ItemKind, MigrationPlan, MigrationReport, MigrationSelection, Migrator,
    PLUGINS_DIR, PluginReport, ScanResult, SettingsStore, detect_plugins, item_description,
    item_label, scan_config_root, selectable_items,
};
use crate::registry::VaultPicker;
use crate::vault::{CONFIG_DIR_NAME, Vault};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

/// Collaborators shared by the profile commands.
pub struct ProfileContext<'a> {
    /// The local vault.
    pub vault: &'a Vault,
    pub picker: &'a dyn VaultPicker,
    pub store: &'a dyn SettingsStore,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub name: String,
    pub kind: ItemKind,
    pub enabled: bool,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub direction: Direction,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub directories: Vec<ItemView>,
    pub files: Vec<ItemView>,
    /// Plugin-level choices apply only while the plugins directory is enabled.
    pub plugin_selection_available: bool,
}

#[derive(Debug, Serialize)]
pub struct PluginView {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub is_dev_plugin: bool,
    pub has_conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PluginsResponse {
    pub direction: Direction,
    pub conflict_count: usize,
    pub dev_plugin_count: usize,
    pub plugins: Vec<PluginView>,
}

/// Resolve the migration plan for a target vault.
fn plan_for(ctx: &ProfileContext, direction: Direction, target: &str) -> Result<MigrationPlan> {
    let other = ctx.picker.pick(target)?;
    MigrationPlan::new(direction, &ctx.vault.config_dir(), &other.join(CONFIG_DIR_NAME))
}

/// Rescan the source and align the persisted selection with it.
fn refresh_selection(
    ctx: &ProfileContext,
    plan: &MigrationPlan,
) -> Result<(MigrationSelection, ScanResult)> {
    let scan = scan_config_root(plan.source.path())?;
    let mut selection = ctx.store.load()?;
    selection.refresh(&scan);
    ctx.store.save(&selection)?;
    Ok((selection, scan))
}

fn plugin_report(plan: &MigrationPlan) -> Result<PluginReport> {
    detect_plugins(
        &plan.source.plugins_dir(),
        &plan.destination.plugins_dir(),
        plan.direction,
    )
}

fn scan_response(
    plan: &MigrationPlan,
    selection: &MigrationSelection,
    scan: &ScanResult,
) -> ScanResponse {
    let (directories, files): (Vec<ItemView>, Vec<ItemView>) = selectable_items(selection, scan)
        .into_iter()
        .map(|item| ItemView {
            label: item_label(&item, plan.direction),
            description: item_description(&plan.source, &item),
            name: item.name,
            kind: item.kind,
            enabled: item.enabled,
        })
        .partition(|view| view.kind == ItemKind::Directory);

    ScanResponse {
        direction: plan.direction,
        source: plan.source.path().to_path_buf(),
        destination: plan.destination.path().to_path_buf(),
        directories,
        files,
        plugin_selection_available: selection.plugins_enabled(),
    }
}

/// `profile scan`
pub fn scan(ctx: &ProfileContext, target: &TargetArgs, output: &Output) -> Result<ExitCode> {
    let (direction, name) = target.target();
    let plan = plan_for(ctx, direction, name)?;
    let (selection, scan) = refresh_selection(ctx, &plan)?;
    output.print(&scan_response(&plan, &selection, &scan))?;
    Ok(ExitCode::Success)
}

fn apply_toggles(
    toggles: &[Toggle],
    what: &str,
    mut set: impl FnMut(&str, bool) -> bool,
    output: &Output,
) {
    for toggle in toggles {
        if !set(&toggle.name, toggle.enabled) {
            output.warn(&format!("no {} named '{}' in the source profile", what, toggle.name));
        }
    }
}

/// `profile set`
pub fn set(ctx: &ProfileContext, args: &SetArgs, output: &Output) -> Result<ExitCode> {
    let (direction, name) = args.target.target();
    let plan = plan_for(ctx, direction, name)?;
    let (mut selection, scan) = refresh_selection(ctx, &plan)?;

    if args.all || args.none {
        selection.set_all_dirs(args.all);
        selection.set_all_files(args.all);
    }
    apply_toggles(&args.dirs, "directory", |n, on| selection.set_dir(n, on), output);
    apply_toggles(&args.files, "file", |n, on| selection.set_file(n, on), output);

    ctx.store.save(&selection)?;
    output.print(&scan_response(&plan, &selection, &scan))?;
    Ok(ExitCode::Success)
}

/// `profile plugins`
pub fn plugins(ctx: &ProfileContext, args: &PluginsArgs, output: &Output) -> Result<ExitCode> {
    let (direction, name) = args.target.target();
    let plan = plan_for(ctx, direction, name)?;
    let (mut selection, _) = refresh_selection(ctx, &plan)?;

    let report = plugin_report(&plan)?;
    selection.refresh_plugins(&report.plugins);

    if args.all || args.none {
        selection.set_all_plugins(args.all);
    }
    apply_toggles(&args.plugins, "plugin", |n, on| selection.set_plugin(n, on), output);
    ctx.store.save(&selection)?;

    if !selection.plugins_enabled() {
        output.warn(&format!(
            "the {} directory is disabled; enable it with `profile set --dir {}=on` for plugin choices to apply",
            PLUGINS_DIR, PLUGINS_DIR
        ));
    }
    if report.conflict_count > 0 {
        output.notice(&format!(
            "{} plugin(s) may cause conflicts and were deselected by default.",
            report.conflict_count
        ));
    }

    let views = report
        .plugins
        .iter()
        .map(|p| PluginView {
            id: p.id.clone(),
            name: p.name.clone(),
            selected: selection.selected_plugins.get(&p.id).copied().unwrap_or(false),
            is_dev_plugin: p.is_dev_plugin,
            has_conflict: p.has_conflict,
            conflict_reason: p.conflict_reason.map(|r| r.label().to_string()),
            version: p.version_line(plan.direction),
            warning: p.warning.clone(),
        })
        .collect();

    output.print(&PluginsResponse {
        direction: plan.direction,
        conflict_count: report.conflict_count,
        dev_plugin_count: report.dev_plugin_count,
        plugins: views,
    })?;
    Ok(ExitCode::Success)
}

fn planned_changes(plan: &MigrationPlan, selection: &MigrationSelection) -> Result<Vec<String>> {
    let mut changes = Vec::new();
    for dir in selection.enabled_dirs() {
        if dir == PLUGINS_DIR {
            match selection.plugin_filter() {
                Some(ids) if ids.is_empty() => {
                    changes.push("Copy no plugins (none selected)".to_string());
                }
                Some(ids) => {
                    let mut ids: Vec<String> = ids.into_iter().collect();
                    ids.sort();
                    changes.push(format!("Copy plugins: {}", ids.join(", ")));
                }
                None => {
                    let count = plugin_report(plan)?.plugins.len();
                    changes.push(format!("Copy all {} plugins", count));
                }
            }
        } else {
            changes.push(format!("Copy directory {}", dir));
        }
    }
    for file in selection.enabled_files() {
        changes.push(format!("Merge {}.json", file));
    }
    Ok(changes)
}

/// Options for `profile import` / `profile export`.
pub struct MigrateOptions<'a> {
    pub direction: Direction,
    pub target: &'a str,
    pub dry_run: bool,
    /// Whether a reload command is configured and allowed.
    pub reload: bool,
}

/// `profile import` / `profile export`
pub fn migrate(
    ctx: &ProfileContext,
    migrator: &Migrator,
    options: &MigrateOptions,
    output: &Output,
) -> Result<ExitCode> {
    let verb = options.direction.verb().to_lowercase();
    run_migration(ctx, migrator, options, output).inspect_err(|e| {
        error!("Error during {}: {}", verb, e);
    })
}

fn run_migration(
    ctx: &ProfileContext,
    migrator: &Migrator,
    options: &MigrateOptions,
    output: &Output,
) -> Result<ExitCode> {
    let plan = plan_for(ctx, options.direction, options.target)?;
    let (mut selection, _) = refresh_selection(ctx, &plan)?;

    // Re-detect conflicts so a choice made before a downgrade appeared is not reused.
    if selection.plugins_enabled() {
        selection.refresh_plugins(&plugin_report(&plan)?.plugins);
        ctx.store.save(&selection)?;
    }

    if options.dry_run {
        output.print(&DryRunResponse {
            action: options.direction.verb().to_lowercase(),
            changes: planned_changes(&plan, &selection)?,
        })?;
        return Ok(ExitCode::Success);
    }

    let mut report = migrator.run(&plan, &selection)?;
    if !options.reload {
        report.reload_requested = false;
    }
    output.print(&report)?;
    notify(&report, options, output);

    migrator.finish(&report)?;
    if report.is_complete() {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::PartialMigration)
    }
}

fn notify(report: &MigrationReport, options: &MigrateOptions, output: &Output) {
    // Failed entries were already logged by the migrator; only count them here.
    let failed = report.failures.len();
    match report.direction {
        _ if failed > 0 => {
            output.notice(&format!(
                "{} finished, {} of {} entries failed.",
                report.direction.verb(),
                failed,
                failed + report.copied_dirs.len() + report.merged_files.len()
            ));
        }
        Direction::Import if report.reload_requested => {
            output.notice("Success! The app will reload...");
        }
        Direction::Import => {
            output.notice("Import finished. Restart Obsidian to apply the imported settings.");
        }
        Direction::Export => {
            output.notice("Export operations finished successfully");
        }
    }
    info!(target_vault = %options.target, "migration complete");
}
