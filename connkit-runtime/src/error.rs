//! Error types for the connector runtime.

use std::time::Duration;

use thiserror::Error;

use crate::ValueKind;

/// Boxed error used to carry causes from user code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of a processor's `process` call.
///
/// Every variant carries the operation name and preserves the triggering
/// cause where there is one.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A required connection or config value is missing at every scope.
    #[error("failed to invoke {operation}: {message}")]
    Configuration { operation: String, message: String },

    /// The connection manager could not hand out a connection.
    #[error("failed to invoke {operation}: cannot create connection")]
    ConnectionCreation {
        operation: String,
        #[source]
        source: PoolError,
    },

    /// The declared invalidating error kept occurring until retries ran out.
    #[error("failed to invoke {operation} after {attempts} attempt(s): {message}")]
    InvalidatingOperation {
        operation: String,
        attempts: u32,
        message: String,
        #[source]
        source: BoxError,
    },

    /// Any other failure of the wrapped call or of parameter evaluation.
    #[error("failed to invoke {operation}: {message}")]
    GenericOperation {
        operation: String,
        message: String,
        #[source]
        source: BoxError,
    },
}

impl ProcessError {
    pub fn configuration(operation: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessError::Configuration {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn generic(operation: impl Into<String>, source: BoxError) -> Self {
        ProcessError::GenericOperation {
            operation: operation.into(),
            message: source.to_string(),
            source,
        }
    }

    /// The operation that failed.
    pub fn operation(&self) -> &str {
        match self {
            ProcessError::Configuration { operation, .. }
            | ProcessError::ConnectionCreation { operation, .. }
            | ProcessError::InvalidatingOperation { operation, .. }
            | ProcessError::GenericOperation { operation, .. } => operation,
        }
    }
}

/// Failure while returning or destroying a pooled resource during cleanup.
///
/// Only ever logged; never replaces the primary outcome of a call.
#[derive(Debug, Error)]
#[error("failed to release pooled resource for {operation}")]
pub struct ReleaseError {
    pub operation: String,
    #[source]
    pub source: PoolError,
}

/// Keyed pool failures.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool exhausted: {active} object(s) active for this key")]
    Exhausted { active: usize },

    #[error("timed out after {waited:?} waiting for a pooled object")]
    Timeout { waited: Duration },

    #[error("pool is closed")]
    Closed,

    #[error("pooled object factory failed")]
    Factory(#[source] BoxError),
}

/// Failure of a connect, disconnect or validate call on a module.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an error raised by module code.
    pub fn from_error(error: impl Into<BoxError>) -> Self {
        let source = error.into();
        Self {
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Failure of a lifecycle hook.
#[derive(Debug, Error)]
#[error("lifecycle phase '{phase}' failed")]
pub struct LifecycleError {
    pub phase: &'static str,
    #[source]
    pub source: BoxError,
}

impl LifecycleError {
    pub fn new(phase: &'static str, error: impl Into<BoxError>) -> Self {
        Self {
            phase,
            source: error.into(),
        }
    }
}

/// Type coercion failures.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no transformer registered from {from} to {to}")]
    NoTransformer { from: ValueKind, to: ValueKind },

    #[error("cannot convert '{value}' to {target}")]
    Conversion { value: String, target: String },

    #[error("a required value is missing")]
    Missing,

    #[error("transformer '{transformer}' failed")]
    Failed {
        transformer: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("transformer '{transformer}' has no concrete source or target kind")]
    Unkeyed { transformer: &'static str },
}

/// Expression evaluation failures.
#[derive(Debug, Error)]
pub enum ExpressionError {
    #[error("unsupported expression '{0}'")]
    Unsupported(String),

    #[error("malformed expression in '{0}'")]
    Malformed(String),
}

/// Either half of evaluate-and-transform.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Failure to produce a parameter value.
#[derive(Debug, Error)]
#[error("failed to evaluate parameter '{parameter}'")]
pub struct EvaluationError {
    pub parameter: String,
    #[source]
    pub source: CoercionError,
}
