//! Roles command report data structures.

use super::output::{Output, Report};

#[derive(Debug)]
pub struct RoleEntry {
    pub role: String,
    pub rust_type: String,
    /// `user` or the name of the generator that registered the type.
    pub origin: String,
    pub unit: Option<String>,
}

#[derive(Debug)]
pub struct ModuleRoles {
    pub name: String,
    pub roles: Vec<RoleEntry>,
    /// Module-object layers, innermost first.
    pub chain: Vec<String>,
}

/// Report data from the role registry.
#[derive(Debug)]
pub struct RolesReport {
    pub modules: Vec<ModuleRoles>,
}

impl Report for RolesReport {
    fn render(&self, out: &mut dyn Output) {
        for (i, module) in self.modules.iter().enumerate() {
            if i > 0 {
                out.newline();
            }
            out.section(&module.name);
            for entry in &module.roles {
                let value = match &entry.unit {
                    Some(unit) => format!("{} ({}, {})", entry.rust_type, entry.origin, unit),
                    None => format!("{} ({})", entry.rust_type, entry.origin),
                };
                out.key_value_indented(&entry.role, &value);
            }

            out.newline();
            out.section("  layers");
            for (index, layer) in module.chain.iter().enumerate() {
                out.numbered_item(index + 1, layer);
            }
        }
    }
}
