//! Module-level descriptor types.

use serde::Serialize;

use crate::{ConnectTriple, EnumDecl, Operation, Source, TransformerDecl, TypeRef};

/// A queryable view over one connector module.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDescriptor {
    /// Module name (snake_case identifier).
    pub name: String,
    /// Rust path of the user type.
    pub type_path: String,
    /// Error enum returned by the module's methods.
    pub error_type: Option<String>,
    pub description: Option<String>,
    /// Configurable fields, in declaration order.
    pub fields: Vec<ConfigurableField>,
    pub connect: Option<ConnectTriple>,
    pub operations: Vec<Operation>,
    pub poolable: bool,
    pub lifecycle: LifecycleHooks,
    /// Default pooling profile declared by the module.
    pub pooling: Option<PoolingProfileDecl>,
    pub oauth: Option<OAuthDecl>,
    /// Message sources, in declaration order.
    pub sources: Vec<Source>,
    pub enums: Vec<EnumDecl>,
    pub transformers: Vec<TransformerDecl>,
}

impl ModuleDescriptor {
    /// Final path segment of the user type.
    pub fn type_name(&self) -> &str {
        self.type_path
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_path)
    }

    /// Returns true if operations run against pooled connections.
    pub fn is_connection_managed(&self) -> bool {
        self.connect.is_some()
    }

    /// Returns true if a keyless object pool governs instance reuse.
    ///
    /// A connect triple takes precedence over the poolable flag.
    pub fn uses_object_pool(&self) -> bool {
        self.poolable && self.connect.is_none()
    }

    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Returns true if the module needs a transformer registration unit.
    pub fn has_transformers(&self) -> bool {
        !self.enums.is_empty() || !self.transformers.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&ConfigurableField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A configurable field of the module.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurableField {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<DefaultValue>,
    pub optional: bool,
    pub description: Option<String>,
}

impl ConfigurableField {
    /// The Rust type of the generated config field.
    pub fn rust_type(&self) -> String {
        if self.optional && !self.ty.is_optional() {
            format!("Option<{}>", self.ty)
        } else {
            self.ty.to_string()
        }
    }
}

/// A scalar default value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl DefaultValue {
    /// Render as a Rust expression.
    pub fn to_rust_literal(&self) -> String {
        match self {
            DefaultValue::String(s) => format!("String::from({:?})", s),
            DefaultValue::Int(i) => i.to_string(),
            DefaultValue::Float(f) => format!("{:?}", f),
            DefaultValue::Bool(b) => b.to_string(),
        }
    }

    /// Render as a `connkit_runtime::Value` constructor expression.
    pub fn to_value_expr(&self) -> String {
        match self {
            DefaultValue::String(s) => format!("Value::from({:?})", s),
            DefaultValue::Int(i) => format!("Value::Int({})", i),
            DefaultValue::Float(f) => format!("Value::Float({:?})", f),
            DefaultValue::Bool(b) => format!("Value::Bool({})", b),
        }
    }
}

/// Lifecycle hook methods declared on the user type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LifecycleHooks {
    pub initialise: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub dispose: Option<String>,
}

impl LifecycleHooks {
    pub fn is_empty(&self) -> bool {
        self.initialise.is_none()
            && self.start.is_none()
            && self.stop.is_none()
            && self.dispose.is_none()
    }
}

/// Pool exhaustion behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExhaustedAction {
    Fail,
    Block,
    Grow,
}

impl ExhaustedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExhaustedAction::Fail => "Fail",
            ExhaustedAction::Block => "Block",
            ExhaustedAction::Grow => "Grow",
        }
    }
}

/// A pooling profile declared in the manifest. Unset entries use the
/// runtime's profile defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PoolingProfileDecl {
    pub max_active: Option<i64>,
    pub max_idle: Option<i64>,
    pub max_wait_ms: Option<i64>,
    pub exhausted_action: Option<ExhaustedAction>,
}

/// OAuth 2 settings of a module.
#[derive(Debug, Clone, Serialize)]
pub struct OAuthDecl {
    pub authorization_url: String,
    pub access_token_url: String,
    pub scope: Option<String>,
    pub callback_path: Option<String>,
}
