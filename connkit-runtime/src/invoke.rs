//! The per-operation invocation protocol.
//!
//! Generated processors hand their closures to [`Invocation`], which owns
//! connection acquisition, the retry-on-invalidate loop and the release of
//! pooled resources on every exit path.

use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;
use tracing::{debug, error};

use crate::{
    BoxError, ConnectionManager, EvaluationError, Evaluator, FromValue, HeaderScope, Headers,
    IntoValue, ManagedConnection, Message, MessageTransformer, OAuthState, ObjectPool,
    PayloadOverwrite, PoolError, PoolableObjectFactory, ProcessError, ReleaseError, Value,
};

/// Retry counters of one processor instance.
///
/// The counters belong to the processor, not to a call: concurrent calls on
/// the same processor share them. `attempt` only goes back to zero after a
/// successful call.
#[derive(Debug, Default)]
pub struct RetryState {
    attempt: AtomicU32,
    max_retries: AtomicU32,
}

impl RetryState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            attempt: AtomicU32::new(0),
            max_retries: AtomicU32::new(max_retries),
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.load(Ordering::SeqCst)
    }

    pub fn set_retry_max(&self, max_retries: u32) {
        self.max_retries.store(max_retries, Ordering::SeqCst);
    }

    /// Count one invocation and return the new attempt number.
    pub fn record_attempt(&self) -> u32 {
        self.attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset(&self) {
        self.attempt.store(0, Ordering::SeqCst);
    }

    fn allows_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries()
    }
}

/// Failure reported by a processor's closures.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The operation's declared invalidating error: the connection is
    /// destroyed and the call may be retried.
    #[error("connection invalidated: {0}")]
    Invalidating(#[source] BoxError),

    /// Any other failure of the wrapped call or of parameter evaluation.
    #[error(transparent)]
    Failed(BoxError),

    /// A failure that is already a processor error and passes through as is.
    #[error(transparent)]
    Abort(#[from] ProcessError),
}

impl InvocationError {
    pub fn invalidating(error: impl Into<BoxError>) -> Self {
        InvocationError::Invalidating(error.into())
    }

    pub fn failed(error: impl Into<BoxError>) -> Self {
        InvocationError::Failed(error.into())
    }
}

impl From<EvaluationError> for InvocationError {
    fn from(error: EvaluationError) -> Self {
        InvocationError::Failed(Box::new(error))
    }
}

/// What a successful call leaves on the message.
#[derive(Debug, Default)]
pub struct Outcome {
    value: Option<Value>,
    outbound: Headers,
    mime_type: Option<String>,
}

impl Outcome {
    /// A call without a return value; the payload is left alone.
    pub fn void() -> Self {
        Self::default()
    }

    /// A call whose return value replaces the payload.
    pub fn returned(value: impl IntoValue) -> Self {
        Self {
            value: Some(value.into_value()),
            ..Self::default()
        }
    }

    pub fn with_outbound(mut self, headers: Headers) -> Self {
        self.outbound = headers;
        self
    }

    pub fn with_mime_type(mut self, mime_type: Option<&str>) -> Self {
        self.mime_type = mime_type.map(str::to_string);
        self
    }

    /// Apply the return value, outbound headers and mime type.
    pub fn apply(self, message: &mut Message) -> Result<(), BoxError> {
        if let Some(value) = self.value {
            PayloadOverwrite::new(value).transform(message)?;
        }
        message
            .headers_mut(HeaderScope::Outbound)
            .extend(self.outbound);
        if let Some(mime_type) = self.mime_type {
            message.set_mime_type(mime_type);
        }
        Ok(())
    }
}

/// Drives one `process` call of an operation processor.
pub struct Invocation<'a> {
    operation: &'a str,
    retry: &'a RetryState,
}

impl<'a> Invocation<'a> {
    pub fn new(operation: &'a str, retry: &'a RetryState) -> Self {
        Self { operation, retry }
    }

    /// Run an operation on a pooled connection.
    ///
    /// Each round acquires a connection for the key, evaluates the
    /// arguments and invokes `call`. An invalidating failure destroys the
    /// connection and starts a new round while the attempt count is within
    /// the retry budget. Any other outcome releases the connection.
    pub fn connected<M, A>(
        &self,
        manager: &ConnectionManager<M>,
        mut message: Message,
        key_for: impl Fn(&Message) -> Result<M::Key, ProcessError>,
        evaluate: impl Fn(&Message) -> Result<A, InvocationError>,
        mut call: impl FnMut(&mut M, A) -> Result<Outcome, InvocationError>,
    ) -> Result<Message, ProcessError>
    where
        M: ManagedConnection,
    {
        loop {
            let key = key_for(&message)?;
            let mut connection =
                manager
                    .acquire_connection(&key)
                    .map_err(|source| ProcessError::ConnectionCreation {
                        operation: self.operation.to_string(),
                        source,
                    })?;

            let args = match evaluate(&message) {
                Ok(args) => args,
                Err(err) => {
                    self.log_release(manager.release_connection(&key, connection));
                    return Err(self.fatal(err));
                }
            };

            let attempt = self.retry.record_attempt();
            match call(&mut connection, args) {
                Ok(outcome) => {
                    self.retry.reset();
                    let applied = outcome.apply(&mut message);
                    self.log_release(manager.release_connection(&key, connection));
                    applied.map_err(|e| ProcessError::generic(self.operation, e))?;
                    return Ok(message);
                }
                Err(InvocationError::Invalidating(cause)) => {
                    self.log_release(manager.destroy_connection(&key, connection));

                    if self.retry.allows_retry(attempt) {
                        debug!(
                            "Forcing a retry [time={} out of {}]",
                            attempt,
                            self.retry.max_retries()
                        );
                        continue;
                    }

                    return Err(ProcessError::InvalidatingOperation {
                        operation: self.operation.to_string(),
                        attempts: attempt,
                        message: cause.to_string(),
                        source: cause,
                    });
                }
                Err(err) => {
                    self.log_release(manager.release_connection(&key, connection));
                    return Err(self.fatal(err));
                }
            }
        }
    }

    /// Run an operation on an instance borrowed from a module pool.
    ///
    /// The instance goes back to the pool exactly once, whatever the call
    /// returned.
    pub fn pooled<V, F, A>(
        &self,
        pool: &ObjectPool<V, F>,
        mut message: Message,
        evaluate: impl FnOnce(&Message) -> Result<A, InvocationError>,
        call: impl FnOnce(&mut V, A) -> Result<Outcome, InvocationError>,
    ) -> Result<Message, ProcessError>
    where
        F: PoolableObjectFactory<V>,
    {
        let args = evaluate(&message).map_err(|e| self.fatal(e))?;
        let mut object = pool
            .borrow()
            .map_err(|e| ProcessError::generic(self.operation, Box::new(e)))?;

        self.retry.record_attempt();
        let result = call(&mut object, args);
        self.log_release(pool.return_object(object));

        let outcome = result.map_err(|e| self.fatal(e))?;
        self.retry.reset();
        outcome
            .apply(&mut message)
            .map_err(|e| ProcessError::generic(self.operation, e))?;
        Ok(message)
    }

    /// Run an operation on a plain module instance.
    pub fn direct<A>(
        &self,
        mut message: Message,
        evaluate: impl FnOnce(&Message) -> Result<A, InvocationError>,
        call: impl FnOnce(A) -> Result<Outcome, InvocationError>,
    ) -> Result<Message, ProcessError> {
        let args = evaluate(&message).map_err(|e| self.fatal(e))?;

        self.retry.record_attempt();
        let outcome = call(args).map_err(|e| self.fatal(e))?;
        self.retry.reset();
        outcome
            .apply(&mut message)
            .map_err(|e| ProcessError::generic(self.operation, e))?;
        Ok(message)
    }

    /// Map a non-retried failure to its processor error.
    ///
    /// Outside a connection an invalidating failure has nothing to destroy
    /// and is reported like any other failure.
    fn fatal(&self, error: InvocationError) -> ProcessError {
        match error {
            InvocationError::Abort(err) => err,
            InvocationError::Invalidating(cause) | InvocationError::Failed(cause) => {
                ProcessError::generic(self.operation, cause)
            }
        }
    }

    fn log_release(&self, result: Result<(), PoolError>) {
        if let Err(source) = result {
            let err = ReleaseError {
                operation: self.operation.to_string(),
                source,
            };
            error!(error = %err, cause = %err.source, "failed to release pooled resource");
        }
    }
}

/// Resolve a connect parameter: the operation-level override wins over the
/// module-level value. Missing at both scopes is a configuration error.
pub fn connect_param<T: FromValue>(
    evaluator: &Evaluator,
    operation: &str,
    message: &Message,
    name: &str,
    override_source: Option<&Value>,
    module_source: Option<&Value>,
) -> Result<T, ProcessError> {
    let source = override_source.or(module_source).ok_or_else(|| {
        ProcessError::configuration(
            operation,
            format!("connection parameter '{name}' is not set on the operation or the module"),
        )
    })?;

    evaluator
        .evaluate_as(name, message, Some(source))
        .map_err(|e| ProcessError::generic(operation, Box::new(e)))
}

/// Read the OAuth access token for a connection-field parameter.
pub fn access_token(
    state: Option<&OAuthState>,
    operation: &str,
    parameter: &str,
) -> Result<String, ProcessError> {
    state.and_then(OAuthState::access_token).ok_or_else(|| {
        ProcessError::configuration(
            operation,
            format!("no OAuth access token available for '{parameter}'"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget() {
        let retry = RetryState::new(2);
        assert_eq!(retry.record_attempt(), 1);
        assert!(retry.allows_retry(1));
        assert!(retry.allows_retry(2));
        assert!(!retry.allows_retry(3));

        retry.reset();
        assert_eq!(retry.attempt(), 0);
    }

    #[test]
    fn test_direct_applies_return_value() {
        let retry = RetryState::new(1);
        let invocation = Invocation::new("echo", &retry);

        let message = invocation
            .direct(
                Message::new("in"),
                |_| Ok(()),
                |()| Ok(Outcome::returned("out").with_mime_type(Some("text/plain"))),
            )
            .unwrap();

        assert_eq!(message.payload().to_value(), Value::from("out"));
        assert_eq!(message.mime_type(), Some("text/plain"));
        assert_eq!(retry.attempt(), 0);
    }

    #[test]
    fn test_void_keeps_payload_and_none_clears_it() {
        let retry = RetryState::new(1);
        let invocation = Invocation::new("op", &retry);

        let kept = invocation
            .direct(Message::new("in"), |_| Ok(()), |()| Ok(Outcome::void()))
            .unwrap();
        assert_eq!(kept.payload().to_value(), Value::from("in"));

        let cleared = invocation
            .direct(
                Message::new("in"),
                |_| Ok(()),
                |()| Ok(Outcome::returned(None::<String>)),
            )
            .unwrap();
        assert!(cleared.payload().is_null());
    }

    #[test]
    fn test_direct_failure_is_generic() {
        let retry = RetryState::new(1);
        let invocation = Invocation::new("op", &retry);

        let err = invocation
            .direct(
                Message::empty(),
                |_| Ok(()),
                |()| Err::<Outcome, _>(InvocationError::invalidating("expired")),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::GenericOperation { .. }));
        assert_eq!(retry.attempt(), 1);
    }

    #[test]
    fn test_connect_param_precedence() {
        let evaluator = Evaluator::default();
        let message = Message::empty();
        let module = Value::from("module");
        let op = Value::from("operation");

        let value: String =
            connect_param(&evaluator, "op", &message, "user", Some(&op), Some(&module)).unwrap();
        assert_eq!(value, "operation");

        let value: String =
            connect_param(&evaluator, "op", &message, "user", None, Some(&module)).unwrap();
        assert_eq!(value, "module");

        let err = connect_param::<String>(&evaluator, "op", &message, "user", None, None)
            .unwrap_err();
        assert!(matches!(err, ProcessError::Configuration { .. }));
    }

    #[test]
    fn test_missing_access_token() {
        let err = access_token(None, "op", "token").unwrap_err();
        assert!(matches!(err, ProcessError::Configuration { .. }));

        let state = OAuthState::default();
        state.set_access_token("t", None);
        assert_eq!(access_token(Some(&state), "op", "token").unwrap(), "t");
    }
}
