use connkit_ir::ModuleDescriptor;

use super::Lint;
use crate::pipeline::Diagnostic;

/// Warns when a poolable module also declares a connect triple.
pub struct PoolableConnectLint;

impl Lint for PoolableConnectLint {
    fn name(&self) -> &'static str {
        "poolable-connect"
    }

    fn description(&self) -> &'static str {
        "the connection pool takes precedence over the poolable flag"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        if module.poolable && module.connect.is_some() {
            diagnostics.push(
                Diagnostic::warning(
                    self.name(),
                    "module is poolable and declares a connect triple; instances are pooled per connection key only",
                )
                .at("module.poolable"),
            );
        }
    }
}

/// Warns when a connect triple has no validate method.
pub struct MissingValidateLint;

impl Lint for MissingValidateLint {
    fn name(&self) -> &'static str {
        "missing-validate"
    }

    fn description(&self) -> &'static str {
        "connections without a validate method are re-established on every acquisition"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(connect) = &module.connect
            && connect.validate.is_none()
        {
            diagnostics.push(
                Diagnostic::warning(
                    self.name(),
                    "no validate method; connections are re-established on every acquisition",
                )
                .at("connect"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lints::fixtures;

    #[test]
    fn test_poolable_connect() {
        let mut module = fixtures::module();
        module.poolable = true;
        let mut diagnostics = Vec::new();
        PoolableConnectLint.check(&module, &mut diagnostics);
        assert!(diagnostics.is_empty());

        module.connect = Some(fixtures::connect());
        PoolableConnectLint.check(&module, &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].severity.is_error());
    }

    #[test]
    fn test_missing_validate() {
        let mut module = fixtures::module();
        let mut connect = fixtures::connect();
        connect.validate = None;
        module.connect = Some(connect);

        let mut diagnostics = Vec::new();
        MissingValidateLint.check(&module, &mut diagnostics);
        assert_eq!(diagnostics[0].location.as_deref(), Some("connect"));
    }
}
