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
pub struct CheckCommand {
    /// Module manifests (defaults to ./connkit.toml)
    #[arg(short, long, default_value = "connkit.toml")]
    pub config: Vec<PathBuf>,
}

impl CheckCommand {
    pub fn run(&self) -> Result<()> {
        let manifests = load_manifests(&self.config);
        let modules = lower_all(&manifests).wrap_err("Invalid module set")?;

        let report = ops::check(&modules, &self.config);
        report.render(&mut TerminalOutput::new());

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }
}
