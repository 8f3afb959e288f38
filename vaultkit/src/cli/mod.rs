//! CLI command implementations.

pub mod args;
pub mod output;

pub mod files;
pub mod folders;
pub mod profile;
pub mod vaults;

pub use args::{Cli, Commands};
pub use output::Output;
