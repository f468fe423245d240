//! Lints run over each module descriptor before generation.
//!
//! Diagnostics are collected, not thrown. Any error-severity diagnostic
//! stops the run before the first generator.

mod connect;
mod docs;
mod operations;
mod sources;

use connkit_ir::ModuleDescriptor;
pub use connect::{MissingValidateLint, PoolableConnectLint};
pub use docs::EmptyDescriptionLint;
pub use operations::{
    ConnectionFieldLint, DuplicateOperationLint, InvalidateOnLint, ReservedNameLint,
};
pub use sources::SourceCallbackLint;

use crate::pipeline::Diagnostic;

/// A check over one module descriptor.
pub trait Lint {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn check(&self, module: &ModuleDescriptor, diagnostics: &mut Vec<Diagnostic>);
}

/// The built-in lints.
pub fn default_lints() -> Vec<Box<dyn Lint>> {
    vec![
        Box::new(DuplicateOperationLint),
        Box::new(ReservedNameLint),
        Box::new(PoolableConnectLint),
        Box::new(MissingValidateLint),
        Box::new(InvalidateOnLint),
        Box::new(ConnectionFieldLint),
        Box::new(SourceCallbackLint),
        Box::new(EmptyDescriptionLint),
    ]
}
