use connkit_ir::{ModuleDescriptor, ParameterKind};

use super::Lint;
use crate::pipeline::Diagnostic;

/// Errors unless every source receives exactly one source callback and no
/// operation receives one.
pub struct SourceCallbackLint;

impl Lint for SourceCallbackLint {
    fn name(&self) -> &'static str {
        "source-callback"
    }

    fn description(&self) -> &'static str {
        "a source callback belongs to exactly one parameter of each source"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        for op in &module.operations {
            for param in op
                .params
                .iter()
                .filter(|p| p.kind == ParameterKind::SourceCallback)
            {
                diagnostics.push(
                    Diagnostic::error(
                        self.name(),
                        format!(
                            "parameter '{}' is a source callback, which only sources receive",
                            param.name
                        ),
                    )
                    .at(format!("operations.{}", op.name)),
                );
            }
        }

        for source in &module.sources {
            let count = source
                .params
                .iter()
                .filter(|p| p.kind == ParameterKind::SourceCallback)
                .count();
            let problem = match count {
                1 => continue,
                0 => "has no source-callback parameter",
                _ => "has more than one source-callback parameter",
            };
            diagnostics.push(
                Diagnostic::error(self.name(), format!("source '{}' {}", source.name, problem))
                    .at(format!("sources.{}", source.name)),
            );
        }
    }
}
