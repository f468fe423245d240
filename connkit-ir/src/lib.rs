//! Module descriptor types for the connkit code generation pipeline.
//!
//! # Architecture
//!
//! ```text
//! connkit.toml (TOML) → connkit-manifest (parsing) → connkit-ir (descriptor) → codegen
//! ```
//!
//! A [`ModuleDescriptor`] is built once per module at the start of a
//! generation run and is read-only afterwards. Parameter classification
//! happens during construction, so generators dispatch on
//! [`ParameterKind`] instead of inspecting type names.

mod connect;
mod module;
mod operation;
mod transform;

pub use connect::{ConnectParam, ConnectTriple};
pub use connkit_core::{ScalarType, Shape, TypeRef};
pub use module::{
    ConfigurableField, DefaultValue, ExhaustedAction, LifecycleHooks, ModuleDescriptor, OAuthDecl,
    PoolingProfileDecl,
};
pub use operation::{Operation, Parameter, ParameterKind, Source};
pub use transform::{EnumDecl, TransformerDecl};
