use connkit_ir::ModuleDescriptor;

use super::Lint;
use crate::pipeline::Diagnostic;

/// Notes a module or operation without a description.
pub struct EmptyDescriptionLint;

impl Lint for EmptyDescriptionLint {
    fn name(&self) -> &'static str {
        "empty-description"
    }

    fn description(&self) -> &'static str {
        "module or operation has no description"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        let missing = |d: &Option<String>| d.as_deref().is_none_or(|d| d.trim().is_empty());

        if missing(&module.description) {
            diagnostics.push(
                Diagnostic::info(self.name(), format!("module '{}' has no description", module.name))
                    .at("module"),
            );
        }
        for op in module.operations.iter().filter(|op| missing(&op.description)) {
            diagnostics.push(
                Diagnostic::info(self.name(), format!("operation '{}' has no description", op.name))
                    .at(format!("operations.{}", op.name)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lints::fixtures;

    #[test]
    fn test_empty_description() {
        let mut module = fixtures::module();
        module.description = Some("  ".into());
        let mut op = fixtures::operation("query");
        op.description = None;
        module.operations.push(op);
        module.operations.push(fixtures::operation("update"));

        let mut diagnostics = Vec::new();
        EmptyDescriptionLint.check(&module, &mut diagnostics);
        let locations: Vec<_> = diagnostics.iter().filter_map(|d| d.location.as_deref()).collect();
        assert_eq!(locations, ["module", "operations.query"]);
    }
}
