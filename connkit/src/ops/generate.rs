//! Generate operation - run the pipeline and collect units.

use connkit_codegen::{Pipeline, Severity};
use connkit_ir::ModuleDescriptor;
use eyre::{Result, WrapErr, eyre};
use tracing::debug;

use crate::reports::{GenerateReport, UnitPreview};

/// Execute the generate operation.
///
/// Nothing is written to disk; the report carries the unit contents.
pub fn generate(modules: &[ModuleDescriptor], unit: Option<&str>) -> Result<GenerateReport> {
    let ctx = Pipeline::new()
        .run(modules)
        .wrap_err("Generation failed")?;
    debug!(modules = modules.len(), units = ctx.units.len(), "generation finished");

    let warnings = ctx
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .map(ToString::to_string)
        .collect();

    let units = match unit {
        Some(name) => {
            let found = ctx.units.get(name).ok_or_else(|| {
                let available: Vec<_> = ctx.units.names().collect();
                eyre!(
                    "no generated unit named '{}' (available: {})",
                    name,
                    available.join(", ")
                )
            })?;
            vec![UnitPreview {
                name: found.name.clone(),
                content: found.content.clone(),
            }]
        }
        None => ctx
            .units
            .iter()
            .map(|u| UnitPreview {
                name: u.name.clone(),
                content: u.content.clone(),
            })
            .collect(),
    };

    Ok(GenerateReport {
        single: unit.is_some(),
        units,
        warnings,
    })
}
