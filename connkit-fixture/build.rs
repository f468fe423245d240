//! Generates the connector units declared in `connkit.toml`.
//!
//! Units are written under `$OUT_DIR/connkit/<module>/` and `connkit.rs`
//! declares one module per manifest pointing at its `mod.rs`.

use std::{env, fs, path::PathBuf};

use connkit_codegen::{Pipeline, Severity, lower};
use connkit_manifest::Manifest;
use eyre::{Result, WrapErr, eyre};

const MANIFEST: &str = "connkit.toml";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed={}", MANIFEST);

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let manifest = Manifest::from_file(manifest_dir.join(MANIFEST)).map_err(|err| eyre!("{}", err))?;
    let module = lower(&manifest).wrap_err("failed to lower the manifest")?;
    let ctx = Pipeline::new().run(&[module])?;

    for diagnostic in ctx.diagnostics.iter().filter(|d| d.severity == Severity::Warning) {
        println!("cargo:warning={}", diagnostic);
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let units_dir = out_dir.join("connkit");
    for unit in ctx.units.iter() {
        let path = units_dir.join(&unit.name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &unit.content)
            .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    }

    let name = &manifest.module.name;
    let index = units_dir.join(name).join("mod.rs");
    let declaration = format!(
        "#[path = {:?}]\npub mod {};\n",
        index.display().to_string(),
        name
    );
    fs::write(out_dir.join("connkit.rs"), declaration)?;
    Ok(())
}
