use connkit_ir::{ModuleDescriptor, Operation, ParameterKind};

use super::Lint;
use crate::pipeline::Diagnostic;

/// Names the generated processor code uses for its own fields and locals.
const RESERVED: &[&str] = &[
    "context",
    "config",
    "retry",
    "module",
    "evaluator",
    "message",
    "connection",
    "instance",
    "target",
    "outbound",
    "key",
    "manager",
    "callback",
    "runner",
];

/// Operations and sources, with the location diagnostics point at.
fn invocables(module: &ModuleDescriptor) -> Vec<(String, Operation)> {
    module
        .operations
        .iter()
        .map(|op| (format!("operations.{}", op.name), op.clone()))
        .chain(
            module
                .sources
                .iter()
                .map(|source| (format!("sources.{}", source.name), source.as_operation())),
        )
        .collect()
}

/// Errors when two operations generate the same processor or method.
pub struct DuplicateOperationLint;

impl Lint for DuplicateOperationLint {
    fn name(&self) -> &'static str {
        "duplicate-operation"
    }

    fn description(&self) -> &'static str {
        "two operations map to the same processor type"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        let groups = [
            (
                "operation",
                module.operations.iter().map(|op| op.name.as_str()).collect::<Vec<_>>(),
            ),
            (
                "source",
                module.sources.iter().map(|s| s.name.as_str()).collect(),
            ),
        ];
        for (kind, names) in groups {
            let mut seen: Vec<String> = Vec::new();
            for name in names {
                let normalized = connkit_core::to_snake_case(name);
                if seen.contains(&normalized) {
                    diagnostics.push(
                        Diagnostic::error(
                            self.name(),
                            format!("{kind} '{name}' collides with an earlier {kind}"),
                        )
                        .at(format!("{kind}s.{name}")),
                    );
                } else {
                    seen.push(normalized);
                }
            }
        }
    }
}

/// Errors when a parameter name collides with a generated processor field
/// or with a connect parameter.
pub struct ReservedNameLint;

impl Lint for ReservedNameLint {
    fn name(&self) -> &'static str {
        "reserved-name"
    }

    fn description(&self) -> &'static str {
        "parameter name is used by generated processor code"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        let connect_params: Vec<&str> = module
            .connect
            .iter()
            .flat_map(|c| c.params.iter().map(|p| p.name.as_str()))
            .collect();

        for name in connect_params.iter().filter(|n| RESERVED.contains(n)) {
            diagnostics.push(
                Diagnostic::error(
                    self.name(),
                    format!("connect parameter '{}' is reserved by generated code", name),
                )
                .at("connect.params"),
            );
        }

        for (location, op) in invocables(module) {
            for param in &op.params {
                let reason = if RESERVED.contains(&param.name.as_str()) {
                    "is reserved by generated code"
                } else if connect_params.contains(&param.name.as_str()) {
                    "shadows a connect parameter"
                } else {
                    continue;
                };
                diagnostics.push(
                    Diagnostic::error(
                        self.name(),
                        format!("parameter '{}' {}", param.name, reason),
                    )
                    .at(location.clone()),
                );
            }
        }
    }
}

/// Checks `invalidate-on` declarations.
///
/// Matching the variant needs the module error type. Without a connect
/// triple there is no connection to invalidate, so the declaration has no
/// effect.
pub struct InvalidateOnLint;

impl Lint for InvalidateOnLint {
    fn name(&self) -> &'static str {
        "invalidate-on"
    }

    fn description(&self) -> &'static str {
        "invalidate-on needs an error type and a connect triple"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        for (location, op) in invocables(module) {
            if op.invalidate_on.is_none() {
                continue;
            }
            if module.error_type.is_none() {
                diagnostics.push(
                    Diagnostic::error(
                        self.name(),
                        format!(
                            "operation '{}' declares invalidate-on but the module has no error type",
                            op.name
                        ),
                    )
                    .at(location.clone()),
                );
            }
            if module.connect.is_none() {
                diagnostics.push(
                    Diagnostic::warning(
                        self.name(),
                        format!(
                            "operation '{}' declares invalidate-on without a connect triple; it is never retried",
                            op.name
                        ),
                    )
                    .at(location),
                );
            }
        }
    }
}

/// Errors on connection-field parameters in a module without OAuth.
pub struct ConnectionFieldLint;

impl Lint for ConnectionFieldLint {
    fn name(&self) -> &'static str {
        "connection-field"
    }

    fn description(&self) -> &'static str {
        "connection-field parameters read the OAuth access token"
    }

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>) {
        if module.oauth.is_some() {
            return;
        }
        for (location, op) in invocables(module) {
            for param in op
                .params
                .iter()
                .filter(|p| p.kind == ParameterKind::ConnectionField)
            {
                diagnostics.push(
                    Diagnostic::error(
                        self.name(),
                        format!(
                            "parameter '{}' is a connection field but the module has no [oauth] table",
                            param.name
                        ),
                    )
                    .at(location.clone()),
                );
            }
        }
    }
}
