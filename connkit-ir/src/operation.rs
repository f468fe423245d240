//! Operation descriptor types.

use serde::Serialize;

use crate::{DefaultValue, TypeRef};

/// An operation exposed for invocation inside a message-processing pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// Operation name as declared (may contain dashes).
    pub name: String,
    /// Method on the user type.
    pub method: String,
    pub returns: Option<TypeRef>,
    pub params: Vec<Parameter>,
    /// Variant of the module error type that invalidates the connection.
    pub invalidate_on: Option<String>,
    pub retry_max: u32,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

impl Operation {
    /// Default retry budget for invalidated calls.
    pub const DEFAULT_RETRY_MAX: u32 = 1;

    /// Parameters whose value is evaluated from the message.
    pub fn evaluated_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| p.kind.is_evaluated())
    }

    pub fn has_outbound_headers(&self) -> bool {
        self.params
            .iter()
            .any(|p| matches!(p.kind, ParameterKind::HeaderOut))
    }
}

/// An operation that produces messages instead of handling them.
///
/// A source runs on its own thread and hands every message its method
/// produces to a listening processor.
#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub name: String,
    pub method: String,
    pub params: Vec<Parameter>,
    pub invalidate_on: Option<String>,
    pub retry_max: u32,
    pub description: Option<String>,
}

impl Source {
    /// Sources do not retry unless asked to.
    pub const DEFAULT_RETRY_MAX: u32 = 0;

    /// The source viewed as an operation without a result, so it shares
    /// the invocation code of processors.
    pub fn as_operation(&self) -> Operation {
        Operation {
            name: self.name.clone(),
            method: self.method.clone(),
            returns: None,
            params: self.params.clone(),
            invalidate_on: self.invalidate_on.clone(),
            retry_max: self.retry_max,
            mime_type: None,
            description: self.description.clone(),
        }
    }

    pub fn callback_param(&self) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.kind == ParameterKind::SourceCallback)
    }
}

/// An operation parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub kind: ParameterKind,
    pub default: Option<DefaultValue>,
    pub optional: bool,
}

/// How a parameter receives its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ParameterKind {
    /// Evaluated from a literal, template or expression.
    Plain,
    /// A nested processor (or list of them) handed to the method.
    NestedInvokable { many: bool },
    /// A callback wrapping a sub-pipeline.
    Callback,
    /// The message payload.
    Payload,
    /// An inbound message header.
    HeaderIn { header: String },
    /// A header map the method fills; copied to outbound headers on success.
    HeaderOut,
    /// An invocation-scoped message header.
    HeaderInvocation { header: String },
    /// Filled from connection state (the OAuth access token).
    ConnectionField,
    /// The callback a message source pushes its messages through.
    SourceCallback,
}

impl ParameterKind {
    /// Returns true if the value is evaluated and coerced from the message.
    pub fn is_evaluated(&self) -> bool {
        matches!(
            self,
            ParameterKind::Plain
                | ParameterKind::Payload
                | ParameterKind::HeaderIn { .. }
                | ParameterKind::HeaderInvocation { .. }
        )
    }

    /// Returns true if the raw value is wrapped into an invocation adapter.
    pub fn is_invokable(&self) -> bool {
        matches!(
            self,
            ParameterKind::NestedInvokable { .. } | ParameterKind::Callback
        )
    }

    /// The source expression implied by the kind, if any.
    pub fn implied_expression(&self) -> Option<String> {
        match self {
            ParameterKind::Payload => Some("#[payload]".to_string()),
            ParameterKind::HeaderIn { header } => Some(format!("#[header:INBOUND:{}]", header)),
            ParameterKind::HeaderInvocation { header } => {
                Some(format!("#[header:INVOCATION:{}]", header))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::Plain => "plain",
            ParameterKind::NestedInvokable { .. } => "nested-processor",
            ParameterKind::Callback => "callback",
            ParameterKind::Payload => "payload",
            ParameterKind::HeaderIn { .. } => "header-in",
            ParameterKind::HeaderOut => "header-out",
            ParameterKind::HeaderInvocation { .. } => "header-invocation",
            ParameterKind::ConnectionField => "connection-field",
            ParameterKind::SourceCallback => "source-callback",
        }
    }
}
