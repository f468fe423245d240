//! Pipeline plugins.

use connkit_ir::ModuleDescriptor;
use eyre::Result;

use super::GenerationContext;

/// Hooks run around every generator invocation.
///
/// Returning an error aborts the run.
pub trait Plugin {
    fn name(&self) -> &'static str;

    #[allow(unused_variables)]
    fn on_before_generator(
        &self,
        generator: &str,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<()> {
        Ok(())
    }

    #[allow(unused_variables)]
    fn on_after_generator(
        &self,
        generator: &str,
        module: &ModuleDescriptor,
        ctx: &mut GenerationContext,
    ) -> Result<()> {
        Ok(())
    }
}
