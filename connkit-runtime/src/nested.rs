//! Nested processors and callbacks passed to operations as arguments.

use std::{fmt, sync::Arc};

use crate::{Evaluator, HeaderScope, Headers, Message, Payload, ProcessError, Value};

/// Anything that processes one message: a flow, a sub-chain or a generated
/// operation processor.
pub trait MessageProcessor: Send + Sync {
    fn process(&self, message: Message) -> Result<Message, ProcessError>;
}

impl<F> MessageProcessor for F
where
    F: Fn(Message) -> Result<Message, ProcessError> + Send + Sync,
{
    fn process(&self, message: Message) -> Result<Message, ProcessError> {
        self(message)
    }
}

/// The raw, unbound source of a nested-processor or callback parameter.
#[derive(Clone)]
pub enum ProcessorRef {
    /// A sub-pipeline.
    Flow(Arc<dyn MessageProcessor>),
    /// A literal string, evaluated against the message when processed.
    Literal(String),
}

impl fmt::Debug for ProcessorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorRef::Flow(_) => f.write_str("Flow(..)"),
            ProcessorRef::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
        }
    }
}

impl ProcessorRef {
    pub fn flow(processor: impl MessageProcessor + 'static) -> Self {
        ProcessorRef::Flow(Arc::new(processor))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        ProcessorRef::Literal(value.into())
    }

    /// Bind to the message being processed.
    pub fn bind(&self, message: &Message, evaluator: &Evaluator) -> Box<dyn NestedProcessor> {
        match self {
            ProcessorRef::Flow(chain) => Box::new(NestedProcessorChain {
                message: message.clone(),
                chain: Arc::clone(chain),
            }),
            ProcessorRef::Literal(value) => Box::new(NestedProcessorString {
                value: value.clone(),
                message: message.clone(),
                evaluator: evaluator.clone(),
            }),
        }
    }

    pub fn bind_all(
        refs: &[ProcessorRef],
        message: &Message,
        evaluator: &Evaluator,
    ) -> Vec<Box<dyn NestedProcessor>> {
        refs.iter().map(|r| r.bind(message, evaluator)).collect()
    }

    pub fn bind_callback(&self, message: &Message, evaluator: &Evaluator) -> Callback {
        Callback {
            inner: self.bind(message, evaluator),
        }
    }
}

/// A processor an operation can run from inside its own call.
pub trait NestedProcessor: Send + Sync {
    /// Run against the bound message.
    fn process(&self) -> Result<Value, ProcessError>;

    /// Run with the payload replaced.
    fn process_with(&self, payload: Value) -> Result<Value, ProcessError>;

    /// Run with the payload replaced and extra invocation headers.
    fn process_with_properties(
        &self,
        payload: Value,
        properties: Headers,
    ) -> Result<Value, ProcessError>;
}

/// A bound sub-pipeline. Results are the payload the chain produced.
pub struct NestedProcessorChain {
    message: Message,
    chain: Arc<dyn MessageProcessor>,
}

impl NestedProcessorChain {
    fn run(&self, message: Message) -> Result<Value, ProcessError> {
        Ok(self.chain.process(message)?.payload().to_value())
    }
}

impl NestedProcessor for NestedProcessorChain {
    fn process(&self) -> Result<Value, ProcessError> {
        self.run(self.message.clone())
    }

    fn process_with(&self, payload: Value) -> Result<Value, ProcessError> {
        let mut message = self.message.clone();
        message.set_payload(Payload::from(payload));
        self.run(message)
    }

    fn process_with_properties(
        &self,
        payload: Value,
        properties: Headers,
    ) -> Result<Value, ProcessError> {
        let mut message = self.message.clone();
        message.set_payload(Payload::from(payload));
        message
            .headers_mut(HeaderScope::Invocation)
            .extend(properties);
        self.run(message)
    }
}

/// A bound literal. Processing evaluates it against the message.
pub struct NestedProcessorString {
    value: String,
    message: Message,
    evaluator: Evaluator,
}

impl NestedProcessorString {
    fn run(&self, message: &Message) -> Result<Value, ProcessError> {
        self.evaluator
            .evaluate(message, &Value::String(self.value.clone()))
            .map_err(|e| ProcessError::generic("nested processor", Box::new(e)))
    }
}

impl NestedProcessor for NestedProcessorString {
    fn process(&self) -> Result<Value, ProcessError> {
        self.run(&self.message)
    }

    fn process_with(&self, payload: Value) -> Result<Value, ProcessError> {
        let mut message = self.message.clone();
        message.set_payload(Payload::from(payload));
        self.run(&message)
    }

    fn process_with_properties(
        &self,
        payload: Value,
        properties: Headers,
    ) -> Result<Value, ProcessError> {
        let mut message = self.message.clone();
        message.set_payload(Payload::from(payload));
        message
            .headers_mut(HeaderScope::Invocation)
            .extend(properties);
        self.run(&message)
    }
}

/// A callback an operation fires with a payload of its own.
pub struct Callback {
    inner: Box<dyn NestedProcessor>,
}

impl Callback {
    pub fn call(&self, payload: impl Into<Value>) -> Result<Value, ProcessError> {
        self.inner.process_with(payload.into())
    }

    pub fn call_with_properties(
        &self,
        payload: impl Into<Value>,
        properties: Headers,
    ) -> Result<Value, ProcessError> {
        self.inner.process_with_properties(payload.into(), properties)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(mut message: Message) -> Result<Message, ProcessError> {
        let text = message.payload().to_value().to_string().to_uppercase();
        message.set_payload(Payload::from(Value::from(text)));
        Ok(message)
    }

    #[test]
    fn test_chain_runs_with_bound_message() {
        let evaluator = Evaluator::default();
        let nested = ProcessorRef::flow(upper).bind(&Message::new("abc"), &evaluator);

        assert_eq!(nested.process().unwrap(), Value::from("ABC"));
        assert_eq!(nested.process_with(Value::from("xyz")).unwrap(), Value::from("XYZ"));
    }

    #[test]
    fn test_literal_is_evaluated_against_message() {
        let evaluator = Evaluator::default();
        let nested = ProcessorRef::literal("#[payload]").bind(&Message::new("abc"), &evaluator);

        assert_eq!(nested.process().unwrap(), Value::from("abc"));
        assert_eq!(nested.process_with(Value::Int(3)).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_callback_passes_properties() {
        let evaluator = Evaluator::default();
        let callback = ProcessorRef::flow(|message: Message| {
            let id = message
                .header(HeaderScope::Invocation, "id")
                .cloned()
                .unwrap_or_default();
            Ok::<_, ProcessError>(Message::new(id))
        })
        .bind_callback(&Message::empty(), &evaluator);

        let mut properties = Headers::new();
        properties.insert("id".into(), Value::Int(9));
        assert_eq!(callback.call_with_properties("x", properties).unwrap(), Value::Int(9));
    }
}
