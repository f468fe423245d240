//! Roles operation - dump the role registry after generation.

use connkit_codegen::{Pipeline, Role, TypeOrigin};
use connkit_ir::ModuleDescriptor;
use eyre::{Result, WrapErr};

use crate::reports::{ModuleRoles, RoleEntry, RolesReport};

/// Execute the roles operation.
pub fn roles(modules: &[ModuleDescriptor]) -> Result<RolesReport> {
    let ctx = Pipeline::new()
        .run(modules)
        .wrap_err("Generation failed")?;

    let modules = ctx
        .roles
        .modules()
        .into_iter()
        .map(|module| ModuleRoles {
            name: module.to_string(),
            roles: ctx
                .roles
                .roles(module)
                .map(|(role, handle)| RoleEntry {
                    role: role.to_string(),
                    rust_type: handle.rust_type.clone(),
                    origin: match handle.origin {
                        TypeOrigin::User => "user".to_string(),
                        TypeOrigin::Generated(generator) => generator.to_string(),
                    },
                    unit: handle.unit.clone(),
                })
                .collect(),
            chain: ctx
                .roles
                .layers(module, Role::ModuleObject)
                .iter()
                .map(|h| h.rust_type.clone())
                .collect(),
        })
        .collect();

    Ok(RolesReport { modules })
}
