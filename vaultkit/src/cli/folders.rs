//! Folder commands: search, empty folder cleanup, delete by name.

use crate::cli::args::{DeleteByNameArgs, EmptyFoldersArgs, SearchFoldersArgs};
use crate::cli::output::{DryRunResponse, Output};
use crate::error::{ExitCode, Result};
use crate::vault::{DeleteSummary, FolderGroup, Vault, outermost, plural};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub groups: Vec<FolderGroup>,
}

#[derive(Debug, Serialize)]
pub struct EmptyFoldersResponse {
    pub start: PathBuf,
    pub folders: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DeleteSummary>,
}

fn exit_for(summary: &DeleteSummary) -> ExitCode {
    if summary.failed.is_empty() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    }
}

pub fn search(vault: &Vault, args: &SearchFoldersArgs, output: &Output) -> Result<ExitCode> {
    let groups = vault.search_folders(&args.query)?;
    let total = groups.iter().map(|g| g.count).sum();
    output.print(&SearchResponse {
        query: args.query.clone(),
        total,
        groups,
    })?;
    Ok(ExitCode::Success)
}

pub fn empty(vault: &Vault, args: &EmptyFoldersArgs, output: &Output) -> Result<ExitCode> {
    let folders = vault.find_empty_folders(&args.path)?;

    if folders.is_empty() {
        output.notice("No empty folders found.");
    }

    let deleted = if args.delete && !folders.is_empty() {
        let summary = vault.delete_empty_folders(&folders);
        output.notice(&format!(
            "Deleted {}.",
            plural(summary.deleted.len(), "empty folder")
        ));
        if !summary.failed.is_empty() {
            output.warn(&format!(
                "could not delete {}",
                plural(summary.failed.len(), "folder")
            ));
        }
        Some(summary)
    } else {
        None
    };

    let code = deleted.as_ref().map(exit_for).unwrap_or(ExitCode::Success);
    output.print(&EmptyFoldersResponse {
        start: args.path.clone(),
        folders,
        deleted,
    })?;
    Ok(code)
}

pub fn delete_by_name(vault: &Vault, args: &DeleteByNameArgs, output: &Output) -> Result<ExitCode> {
    if args.dry_run {
        let targets = outermost(vault.folders_named(&args.name)?);
        let changes = targets
            .iter()
            .map(|p| format!("Delete {}", p.display()))
            .collect();
        output.print(&DryRunResponse {
            action: "delete-by-name".to_string(),
            changes,
        })?;
        return Ok(ExitCode::Success);
    }

    let summary = vault.delete_folders_named(&args.name)?;
    if summary.deleted.is_empty() && summary.failed.is_empty() {
        output.notice(&format!("No folders named '{}' found.", args.name));
    } else {
        output.notice(&format!(
            "Deleted {} named '{}'.",
            plural(summary.deleted.len(), "folder"),
            args.name
        ));
    }
    output.print(&summary)?;
    Ok(exit_for(&summary))
}
