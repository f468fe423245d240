//! Manifest parsing from files and strings.

use std::{path::Path, str::FromStr};

use crate::{Error, Manifest, Result, error::SourceContext, validate::ParseContext};

impl FromStr for Manifest {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_manifest(s, "connkit.toml")
    }
}

impl Manifest {
    /// Parse a connkit.toml file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        parse_manifest(&content, &path.display().to_string())
    }

    /// Parse a connkit.toml from a string with a custom filename for error reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_manifest(content, filename)
    }
}

/// Parse a manifest from content with the given filename for error reporting.
pub fn parse_manifest(content: &str, filename: &str) -> Result<Manifest> {
    let source_ctx = SourceContext::new(content, filename);
    let manifest: Manifest = toml::from_str(content).map_err(|e| source_ctx.parse_error(e))?;
    validate_manifest(&manifest, content, filename)?;
    Ok(manifest)
}

/// Validate the manifest after parsing.
fn validate_manifest(manifest: &Manifest, src: &str, filename: &str) -> Result<()> {
    let ctx = ParseContext::new(src, filename);

    manifest.module.validate(&ctx.push("module"))?;

    let fields_ctx = ctx.push("fields");
    for field in &manifest.fields {
        field.validate(&fields_ctx)?;
    }
    fields_ctx.check_unique(manifest.fields.iter().map(|f| f.name.as_str()), "field")?;

    if let Some(connect) = &manifest.connect {
        connect.validate(&ctx.push("connect"))?;
    }

    let ops_ctx = ctx.push("operations");
    for op in &manifest.operations {
        op.validate(&ops_ctx)?;
    }
    ops_ctx.check_unique(
        manifest.operations.iter().map(|op| op.name.as_str()),
        "operation",
    )?;

    let sources_ctx = ctx.push("sources");
    for source in &manifest.sources {
        source.validate(&sources_ctx)?;
    }
    // Sources and operations share the generated unit namespace.
    sources_ctx.check_unique(
        manifest
            .operations
            .iter()
            .map(|op| op.name.as_str())
            .chain(manifest.sources.iter().map(|s| s.name.as_str())),
        "operation or source",
    )?;

    let enums_ctx = ctx.push("enums");
    for decl in &manifest.enums {
        decl.validate(&enums_ctx)?;
    }
    enums_ctx.check_unique(manifest.enums.iter().map(|e| e.type_path.as_str()), "enum")?;

    let transformers_ctx = ctx.push("transformers");
    for transformer in &manifest.transformers {
        transformer.validate(&transformers_ctx)?;
    }
    transformers_ctx.check_unique(
        manifest.transformers.iter().map(|t| t.method.as_str()),
        "transformer",
    )?;

    if let Some(oauth) = &manifest.oauth {
        oauth.validate(&ctx.push("oauth"))?;
    }

    Ok(())
}
