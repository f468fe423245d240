//! Check operation - lint module descriptors.

use std::path::PathBuf;

use connkit_codegen::{Pipeline, Severity};
use connkit_ir::ModuleDescriptor;

use crate::reports::CheckReport;

/// Execute the check operation.
///
/// Runs every lint over every module. Unlike a generation run, lint
/// errors in one module do not hide the diagnostics of the next.
pub fn check(modules: &[ModuleDescriptor], config_paths: &[PathBuf]) -> CheckReport {
    let pipeline = Pipeline::new();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for module in modules {
        for diag in pipeline.check(module) {
            let location = match &diag.location {
                Some(loc) => format!("{}.{}", module.name, loc),
                None => module.name.clone(),
            };
            let msg = format!("[{}] {}\n  --> {}", diag.generator, diag.message, location);

            match diag.severity {
                Severity::Error => errors.push(msg),
                Severity::Warning => warnings.push(msg),
                Severity::Info => infos.push(msg),
            }
        }
    }

    CheckReport {
        config_paths: config_paths.iter().map(|p| p.display().to_string()).collect(),
        errors,
        warnings,
        infos,
    }
}
