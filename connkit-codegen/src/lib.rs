//! Source synthesis for connkit connectors.
//!
//! A module manifest is lowered into a [`ModuleDescriptor`](connkit_ir::ModuleDescriptor)
//! and run through a [`Pipeline`] of generators. Each generator emits Rust
//! units against the `connkit_runtime` API and records the types it
//! produced in a [`RoleRegistry`], where later generators pick them up.
//!
//! # Module Organization
//!
//! - [`builder`] - Code generation building blocks (CodeBuilder, CodeFragment, ImportCollector)
//! - [`ast`] - Rust item builders (structs, functions, impls)
//! - [`roles`] - Class-role registry
//! - [`pipeline`] - Generator scheduling, diagnostics and plugins
//! - [`lints`] - Descriptor checks run before generation
//! - [`generators`] - The core capability generators

pub mod ast;
pub mod builder;
pub mod generators;
pub mod lints;
mod lower;
pub mod pipeline;
pub mod roles;
mod unit;

pub use lints::Lint;
pub use lower::{classify, lower, lower_all};
pub use pipeline::{
    Diagnostic, GenerationContext, GenerationError, Generator, Pipeline, Plugin, ScheduleError,
    Severity,
};
pub use roles::{Role, RoleNotFoundError, RoleRegistry, TypeHandle, TypeOrigin};
pub use unit::{GeneratedUnit, UnitRegistry, UnitWriter, unit_name};
