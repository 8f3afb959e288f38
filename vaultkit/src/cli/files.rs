//! File commands: import into the vault, copy or move out of it.

use crate::cli::args::{FileExportArgs, FileImportArgs, TransferArgs};
use crate::cli::output::Output;
use crate::error::{ExitCode, Result};
use crate::transfer::{TransferMode, TransferReport, TransferStatus};
use crate::vault::{Vault, plural};

fn mode(args: &TransferArgs) -> TransferMode {
    if args.move_items {
        TransferMode::Move
    } else {
        TransferMode::Copy
    }
}

fn finish(report: &TransferReport, place: &str, output: &Output) -> Result<ExitCode> {
    let done = report.count(TransferStatus::Done);
    let skipped = report.count(TransferStatus::Skipped);
    let failed = report.count(TransferStatus::Failed);

    output.notice(&format!(
        "{} {} {}.",
        plural(done, "item"),
        report.mode.past_tense(),
        place
    ));
    if skipped > 0 {
        output.notice(&format!("Skipped {} already present.", plural(skipped, "item")));
    }
    if failed > 0 {
        output.warn(&format!("could not transfer {}", plural(failed, "item")));
    }

    output.print(report)?;
    Ok(if report.is_complete() {
        ExitCode::Success
    } else {
        ExitCode::GeneralError
    })
}

pub fn import(vault: &Vault, args: &FileImportArgs, output: &Output) -> Result<ExitCode> {
    let report = vault.import_items(
        &args.sources,
        &args.into,
        mode(&args.transfer),
        args.transfer.on_conflict,
    )?;
    finish(&report, "to vault", output)
}

pub fn export_out(vault: &Vault, args: &FileExportArgs, output: &Output) -> Result<ExitCode> {
    let report = vault.export_items(
        &args.items,
        &args.to,
        mode(&args.transfer),
        args.transfer.on_conflict,
    )?;
    finish(&report, &format!("to {}", args.to.display()), output)
}
