//! The generator trait.

use connkit_ir::ModuleDescriptor;

use super::{GenerationContext, GenerationError};
use crate::roles::Role;

/// Emits generated units for one module.
///
/// `requires`, `reads` and `provides` drive scheduling: a generator that
/// consumes a role runs after every generator producing it. Required roles
/// must have a producer; read roles are looked up only when registered. A
/// generator listing a role in both `requires` and `provides` wraps the
/// previous registration of that role.
pub trait Generator {
    fn name(&self) -> &'static str;

    fn requires(&self) -> &[Role] {
        &[]
    }

    /// Roles looked up when present.
    fn reads(&self) -> &[Role] {
        &[]
    }

    fn provides(&self) -> &[Role] {
        &[]
    }

    #[allow(unused_variables)]
    fn should_generate(&self, module: &ModuleDescriptor) -> bool {
        true
    }

    fn generate(
        &self,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<(), GenerationError>;
}
