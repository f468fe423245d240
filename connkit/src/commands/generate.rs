use std::path::PathBuf;

use clap::Args;
use connkit_codegen::lower_all;
use eyre::{Context, Result};

use super::load_manifests;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct GenerateCommand {
    /// Module manifests (defaults to ./connkit.toml)
    #[arg(short, long, default_value = "connkit.toml")]
    pub config: Vec<PathBuf>,

    /// Print a single unit, e.g. `salesforce/connection.rs`
    #[arg(short, long)]
    pub unit: Option<String>,
}

impl GenerateCommand {
    pub fn run(&self) -> Result<()> {
        let manifests = load_manifests(&self.config);
        let modules = lower_all(&manifests).wrap_err("Invalid module set")?;

        let report = ops::generate(&modules, self.unit.as_deref())?;
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
