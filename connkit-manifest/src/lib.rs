//! Module manifest (`connkit.toml`) parsing and validation.
//!
//! A manifest declares one connector module: its configurable fields, an
//! optional connect/disconnect/validate triple, the operations and message
//! sources it exposes, and the enums and transformers its parameters use.

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod connect;
mod error;
mod field;
mod module;
mod operation;
mod parse;
mod source;
mod transform;
mod validate;

pub use connect::{ConnectParamDecl, ConnectSection};
pub use error::{Error, Result, SourceContext};
pub use field::Field;
pub use module::{ExhaustedActionDecl, LifecycleSection, ModuleSection, OAuthSection, PoolingSection};
pub use operation::{OperationDecl, ParamDecl, ParamKindDecl};
pub use parse::parse_manifest;
pub use source::SourceDecl;
pub use transform::{EnumSection, TransformerSection};
use serde::Deserialize;
pub use validate::ParseContext;

/// Root manifest for connkit.toml
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Module identity and module-wide settings
    pub module: ModuleSection,

    /// Configurable fields, in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Connect/disconnect/validate triple
    pub connect: Option<ConnectSection>,

    /// Exposed operations, in declaration order
    #[serde(default)]
    pub operations: Vec<OperationDecl>,

    /// OAuth 2 capability
    pub oauth: Option<OAuthSection>,

    /// Message sources, in declaration order
    #[serde(default)]
    pub sources: Vec<SourceDecl>,

    /// Enums coerced from strings
    #[serde(default)]
    pub enums: Vec<EnumSection>,

    /// Conversion functions registered with the runtime
    #[serde(default)]
    pub transformers: Vec<TransformerSection>,
}

impl Manifest {
    /// Look up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&OperationDecl> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn source(&self, name: &str) -> Option<&SourceDecl> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Returns true if the module declares a connect triple.
    pub fn has_connect(&self) -> bool {
        self.connect.is_some()
    }
}
