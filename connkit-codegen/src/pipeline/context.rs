//! State shared by every generator of a run.

use std::collections::HashSet;

use super::{Diagnostic, Severity};
use crate::{
    roles::{Role, RoleNotFoundError, RoleRegistry, TypeHandle},
    unit::{GeneratedUnit, UnitRegistry},
};

/// Created once per run and passed by `&mut` to each generator.
#[derive(Debug, Default)]
pub struct GenerationContext {
    pub roles: RoleRegistry,
    pub units: UnitRegistry,
    pub diagnostics: Vec<Diagnostic>,
    /// Items emitted once per run however many modules declare them.
    claimed: HashSet<String>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, module: &str, role: Role, handle: TypeHandle) {
        self.roles.register(module, role, handle);
    }

    pub fn lookup(&self, module: &str, role: Role) -> Result<&TypeHandle, RoleNotFoundError> {
        self.roles.lookup(module, role)
    }

    pub fn emit(&mut self, unit: GeneratedUnit) {
        self.units.add(unit);
    }

    /// Returns true the first time `key` is claimed in this run.
    pub fn claim(&mut self, key: impl Into<String>) -> bool {
        self.claimed.insert(key.into())
    }

    pub fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
