//! Turns a scan and a selection into labelled, ordered items.

use super::scan::ScanResult;
use super::selection::{COMMON_FILES, MigrationSelection};
use super::{ConfigRoot, Direction, ItemKind};
use crate::vault::plural;
use serde::Serialize;
use std::path::Path;

/// Display order for directories; unlisted names sort alphabetically after.
const DIR_PRIORITY: &[&str] = &["plugins", "themes", "snippets"];

/// One directory or JSON file offered for migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectableItem {
    pub name: String,
    pub kind: ItemKind,
    pub enabled: bool,
}

fn priority_key<'a>(table: &[&str], name: &'a str) -> (usize, &'a str) {
    let rank = table.iter().position(|p| *p == name).unwrap_or(table.len());
    (rank, name)
}

/// Items present in `scan`, directories first, each group in display order.
pub fn selectable_items(selection: &MigrationSelection, scan: &ScanResult) -> Vec<SelectableItem> {
    let mut dirs: Vec<&String> = scan.dirs.iter().collect();
    dirs.sort_by(|a, b| priority_key(DIR_PRIORITY, a).cmp(&priority_key(DIR_PRIORITY, b)));
    let mut files: Vec<&String> = scan.files.iter().collect();
    files.sort_by(|a, b| priority_key(COMMON_FILES, a).cmp(&priority_key(COMMON_FILES, b)));

    let dir_items = dirs.into_iter().map(|name| SelectableItem {
        name: name.clone(),
        kind: ItemKind::Directory,
        enabled: selection.vault_dirs.get(name).copied().unwrap_or(false),
    });
    let file_items = files.into_iter().map(|name| SelectableItem {
        name: name.clone(),
        kind: ItemKind::File,
        enabled: selection.vault_files.get(name).copied().unwrap_or(false),
    });
    dir_items.chain(file_items).collect()
}

/// "Import app (General settings)", "Export themes".
pub fn item_label(item: &SelectableItem, direction: Direction) -> String {
    let suffix = match (item.kind, item.name.as_str()) {
        (ItemKind::File, "app") => " (General settings)",
        _ => "",
    };
    format!("{} {}{}", direction.verb(), item.name, suffix)
}

fn count_entries(dir: &Path, matches: impl Fn(&std::fs::DirEntry) -> bool) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).filter(|e| matches(e)).count())
        .unwrap_or(0)
}

fn is_dir_entry(entry: &std::fs::DirEntry) -> bool {
    entry.path().is_dir()
}

/// Live description for an item, counting nested plugins, themes and snippets.
pub fn item_description(root: &ConfigRoot, item: &SelectableItem) -> Option<String> {
    if item.kind != ItemKind::Directory {
        return None;
    }
    let path = root.join(&item.name);
    match item.name.as_str() {
        "plugins" => Some(plural(count_entries(&path, is_dir_entry), "plugin")),
        "themes" => Some(plural(count_entries(&path, is_dir_entry), "theme")),
        "snippets" => Some(plural(
            count_entries(&path, |e| {
                e.path().extension().map(|x| x == "css").unwrap_or(false)
            }),
            "snippet",
        )),
        _ => None,
    }
}
