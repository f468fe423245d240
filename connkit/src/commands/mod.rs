mod check;
mod completions;
mod generate;
mod info;
mod roles;

use std::path::PathBuf;

use check::CheckCommand;
use clap::{Parser, Subcommand};
use completions::CompletionsCommand;
use connkit_manifest::Manifest;
use eyre::Result;
use generate::GenerateCommand;
use info::InfoCommand;
use roles::RolesCommand;

/// Extension trait for exiting on manifest errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for connkit_manifest::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

/// Parse every manifest, exiting on the first invalid one.
pub(crate) fn load_manifests(paths: &[PathBuf]) -> Vec<Manifest> {
    paths
        .iter()
        .map(|path| Manifest::from_file(path).unwrap_or_exit())
        .collect()
}

#[derive(Parser)]
#[command(name = "connkit")]
#[command(version)]
#[command(about = "Generate connector glue from connkit.toml module manifests")]
pub(crate) struct Cli {
    /// Log generation steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Check(cmd) => cmd.run(),
            Commands::Generate(cmd) => cmd.run(),
            Commands::Roles(cmd) => cmd.run(),
            Commands::Info(cmd) => cmd.run(),
            Commands::Completions(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, lower and lint module manifests
    Check(CheckCommand),

    /// Print the generated units to stdout
    Generate(GenerateCommand),

    /// Show the role registry after generation
    Roles(RolesCommand),

    /// Show a module descriptor
    Info(InfoCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}
