//! vaultkit CLI entry point.

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;
use vaultkit::cli::args::{Cli, Commands, FileCommands, FolderCommands, ProfileCommands};
use vaultkit::cli::output::Output;
use vaultkit::cli::profile::{MigrateOptions, ProfileContext};
use vaultkit::cli::{files, folders, profile, vaults};
use vaultkit::config::Config;
use vaultkit::error::{ExitCode as VaultExitCode, VaultError};
use vaultkit::profile::{
    CommandReloader, Direction, FsCopier, FsJsonStore, JsonSettingsStore, Migrator, NoopReloader,
    Reloader,
};
use vaultkit::registry::{RegistryPicker, VaultRegistry};
use vaultkit::vault::Vault;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(code) => ExitCode::from(code.code() as u8),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn run(cli: &Cli) -> Result<VaultExitCode, VaultError> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let vault_path = config.resolve_vault_path(cli.vault.as_deref())?;
    let vault = Vault::new(vault_path)?;
    debug!(vault = %vault.root.display(), "resolved local vault");

    let output = Output::new(cli.output_format(), cli.quiet);

    match &cli.command {
        Commands::Vaults(args) => {
            let registry = VaultRegistry::load(&config.obsidian_config_path());
            vaults::run(&vault, &registry, args, &output)
        }
        Commands::Profile(command) => run_profile(&config, &vault, command, &output),
        Commands::Folders(command) => match command {
            FolderCommands::Search(args) => folders::search(&vault, args, &output),
            FolderCommands::Empty(args) => folders::empty(&vault, args, &output),
            FolderCommands::DeleteByName(args) => folders::delete_by_name(&vault, args, &output),
        },
        Commands::Files(command) => match command {
            FileCommands::Import(args) => files::import(&vault, args, &output),
            FileCommands::ExportOut(args) => files::export_out(&vault, args, &output),
        },
    }
}

fn run_profile(
    config: &Config,
    vault: &Vault,
    command: &ProfileCommands,
    output: &Output,
) -> Result<VaultExitCode, VaultError> {
    let registry = VaultRegistry::load(&config.obsidian_config_path());
    let picker = RegistryPicker::new(&registry);
    let store = JsonSettingsStore::new(config.settings_path());
    let ctx = ProfileContext {
        vault,
        picker: &picker,
        store: &store,
    };

    let command_reloader = config.reload_command.clone().and_then(CommandReloader::new);
    let reloader: &dyn Reloader = match &command_reloader {
        Some(r) => r,
        None => &NoopReloader,
    };
    let migrator = Migrator::new(
        &FsCopier,
        &FsJsonStore,
        reloader,
        Duration::from_millis(config.reload_delay_ms),
    );

    match command {
        ProfileCommands::Scan(target) => profile::scan(&ctx, target, output),
        ProfileCommands::Set(args) => profile::set(&ctx, args, output),
        ProfileCommands::Plugins(args) => profile::plugins(&ctx, args, output),
        ProfileCommands::Import(args) => {
            let options = MigrateOptions {
                direction: Direction::Import,
                target: &args.from,
                dry_run: args.dry_run,
                reload: command_reloader.is_some() && !args.no_reload,
            };
            profile::migrate(&ctx, &migrator, &options, output)
        }
        ProfileCommands::Export(args) => {
            let options = MigrateOptions {
                direction: Direction::Export,
                target: &args.to,
                dry_run: args.dry_run,
                reload: false,
            };
            profile::migrate(&ctx, &migrator, &options, output)
        }
    }
}
