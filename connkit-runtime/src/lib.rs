//! Runtime support for connectors generated by connkit.
//!
//! Generated processors link against this crate for the message model,
//! parameter evaluation, keyed pooling, connection management and the
//! invocation protocol with retry, plus the threads behind message sources.

mod capability;
mod connection;
mod error;
mod evaluate;
mod expression;
mod invoke;
mod lifecycle;
mod message;
mod module;
mod nested;
mod oauth;
mod pool;
mod registry;
mod source;
mod transform;
mod value;

// Capabilities
pub use capability::{Capabilities, Capability, ConnectionManagement, Pooling};
// Connections
pub use connection::{
    ConnectionFactory, ConnectionKey, ConnectionManager, KeyField, KeyHasher, ManagedConnection,
};
// Errors
pub use error::{
    BoxError, CoercionError, ConnectionError, EvaluationError, ExpressionError, LifecycleError,
    PoolError, ProcessError, ReleaseError, TransformError,
};
// Evaluation
pub use evaluate::Evaluator;
pub use expression::{ExpressionEvaluator, ExpressionPattern, MessageExpressions};
pub use transform::{
    DEFAULT_WEIGHT, Transformer, TransformerRegistry, enum_transformer, user_transformer,
};
// Invocation
pub use invoke::{Invocation, InvocationError, Outcome, RetryState, access_token, connect_param};
// Lifecycle
pub use lifecycle::{Lifecycle, LifecyclePhase, LifecycleState};
// Messages
pub use message::{
    HeaderScope, Headers, Message, MessageTransformer, OutboundHeaders, Payload, PayloadOverwrite,
};
// Modules
pub use module::{ModuleObjectFactory, ModulePool, PoolableModule, module_pool};
pub use nested::{
    Callback, MessageProcessor, NestedProcessor, NestedProcessorChain, NestedProcessorString,
    ProcessorRef,
};
pub use oauth::{OAuthConfig, OAuthState};
// Pools
pub use pool::{
    ExhaustedAction, KeyedObjectFactory, KeyedPool, ObjectPool, PoolConfig, PoolableObjectFactory,
    PoolingProfile,
};
pub use registry::{ConfigRef, ObjectRegistry, RuntimeContext};
// Sources
pub use source::{SourceCallback, SourceRunner};
pub use value::{FromValue, IntoValue, Value, ValueKind, ValueType};

/// Insertion-ordered map accepted for map-typed parameters.
pub use indexmap::IndexMap;
