use std::path::PathBuf;

use clap::Args;
use connkit_codegen::lower;
use connkit_manifest::Manifest;
use eyre::{Context, Result};

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct InfoCommand {
    /// Path to connkit.toml (defaults to ./connkit.toml)
    #[arg(short, long, default_value = "connkit.toml")]
    pub config: PathBuf,

    /// Print the lowered descriptor as JSON
    #[arg(long)]
    pub json: bool,
}

impl InfoCommand {
    pub fn run(&self) -> Result<()> {
        let manifest = Manifest::from_file(&self.config).unwrap_or_exit();
        let module = lower(&manifest).wrap_err("Failed to lower module")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&module)?);
            return Ok(());
        }

        let report = ops::info(&module, &self.config);
        report.render(&mut TerminalOutput::new());

        Ok(())
    }
}
