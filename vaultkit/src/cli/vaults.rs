//! `vaults` command.

use crate::cli::args::VaultsArgs;
use crate::cli::output::Output;
use crate::error::{ExitCode, Result};
use crate::registry::{KnownVault, VaultRegistry};
use crate::vault::Vault;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VaultsResponse<'a> {
    pub current: &'a std::path::Path,
    pub vaults: Vec<&'a KnownVault>,
}

pub fn run(
    vault: &Vault,
    registry: &VaultRegistry,
    args: &VaultsArgs,
    output: &Output,
) -> Result<ExitCode> {
    let vaults = if args.all {
        registry.vaults().iter().collect()
    } else {
        registry.others(&vault.root)
    };

    if vaults.is_empty() {
        output.notice("No other vaults are registered with Obsidian.");
    }

    output.print(&VaultsResponse {
        current: &vault.root,
        vaults,
    })?;
    Ok(ExitCode::Success)
}
