//! Messages flowing through processing pipelines.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;

use crate::{TransformError, Value};

/// Header map, ordered by insertion.
pub type Headers = IndexMap<String, Value>;

/// Headers an operation fills in; copied to the outbound scope on success.
pub type OutboundHeaders = Headers;

/// Scope of a message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderScope {
    Inbound,
    Outbound,
    Invocation,
}

impl FromStr for HeaderScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INBOUND" => Ok(HeaderScope::Inbound),
            "OUTBOUND" => Ok(HeaderScope::Outbound),
            "INVOCATION" => Ok(HeaderScope::Invocation),
            other => Err(format!("unknown header scope '{}'", other)),
        }
    }
}

impl fmt::Display for HeaderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderScope::Inbound => f.write_str("INBOUND"),
            HeaderScope::Outbound => f.write_str("OUTBOUND"),
            HeaderScope::Invocation => f.write_str("INVOCATION"),
        }
    }
}

/// Message payload. `Null` is the canonical "no payload" marker.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Null,
    Value(Value),
}

impl Payload {
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    /// The payload as a value; the marker becomes `Value::Null`.
    pub fn to_value(&self) -> Value {
        match self {
            Payload::Null => Value::Null,
            Payload::Value(v) => v.clone(),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Null,
            other => Payload::Value(other),
        }
    }
}

/// A message: payload plus scoped headers.
#[derive(Debug, Clone, Default)]
pub struct Message {
    payload: Payload,
    inbound: Headers,
    outbound: Headers,
    invocation: Headers,
    mime_type: Option<String>,
}

impl Message {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            payload: Payload::from(payload.into()),
            ..Self::default()
        }
    }

    /// A message carrying the "no payload" marker.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    /// Add a header in the given scope (builder style).
    pub fn with_header(
        mut self,
        scope: HeaderScope,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.headers_mut(scope).insert(name.into(), value.into());
        self
    }

    pub fn header(&self, scope: HeaderScope, name: &str) -> Option<&Value> {
        self.headers(scope).get(name)
    }

    pub fn headers(&self, scope: HeaderScope) -> &Headers {
        match scope {
            HeaderScope::Inbound => &self.inbound,
            HeaderScope::Outbound => &self.outbound,
            HeaderScope::Invocation => &self.invocation,
        }
    }

    pub fn headers_mut(&mut self, scope: HeaderScope) -> &mut Headers {
        match scope {
            HeaderScope::Inbound => &mut self.inbound,
            HeaderScope::Outbound => &mut self.outbound,
            HeaderScope::Invocation => &mut self.invocation,
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.mime_type = Some(mime_type.into());
    }

    /// Apply transformers in order, stopping at the first failure.
    pub fn apply_transformers(
        &mut self,
        transformers: &[&dyn MessageTransformer],
    ) -> Result<(), TransformError> {
        for transformer in transformers {
            transformer.transform(self)?;
        }
        Ok(())
    }
}

/// A deferred change to a message.
pub trait MessageTransformer {
    fn transform(&self, message: &mut Message) -> Result<(), TransformError>;
}

/// Replaces the payload with an operation's return value.
#[derive(Debug, Clone)]
pub struct PayloadOverwrite {
    value: Value,
}

impl PayloadOverwrite {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl MessageTransformer for PayloadOverwrite {
    fn transform(&self, message: &mut Message) -> Result<(), TransformError> {
        message.set_payload(Payload::from(self.value.clone()));
        Ok(())
    }
}
