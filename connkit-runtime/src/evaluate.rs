//! Parameter evaluation and type coercion.

use std::sync::Arc;

use crate::{
    CoercionError, EvaluationError, ExpressionError, ExpressionEvaluator, ExpressionPattern,
    FromValue, Message, MessageExpressions, TransformerRegistry, Value, ValueType,
};

/// Evaluates parameter sources against a message and coerces the result to
/// the parameter's expected type.
#[derive(Clone)]
pub struct Evaluator {
    expressions: Arc<dyn ExpressionEvaluator>,
    pattern: ExpressionPattern,
    transformers: Arc<TransformerRegistry>,
}

impl Default for Evaluator {
    fn default() -> Self {
        let pattern = ExpressionPattern::default();
        Self {
            expressions: Arc::new(MessageExpressions::new(pattern.clone())),
            pattern,
            transformers: Arc::new(TransformerRegistry::with_defaults()),
        }
    }
}

impl Evaluator {
    pub fn new(
        expressions: Arc<dyn ExpressionEvaluator>,
        pattern: ExpressionPattern,
        transformers: Arc<TransformerRegistry>,
    ) -> Self {
        Self {
            expressions,
            pattern,
            transformers,
        }
    }

    pub fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    pub fn pattern(&self) -> &ExpressionPattern {
        &self.pattern
    }

    /// Evaluate a string source: expressions are evaluated, anything else is
    /// parsed as a template. Non-string sources are returned as they are.
    pub fn evaluate(&self, message: &Message, source: &Value) -> Result<Value, ExpressionError> {
        match source {
            Value::String(s) if self.pattern.is_expression(s) => {
                self.expressions.evaluate(s, message)
            }
            Value::String(s) => self.expressions.parse(s, message),
            other => Ok(other.clone()),
        }
    }

    /// Evaluate `source` and coerce the result to `expected`.
    ///
    /// Lists are rebuilt element-wise and maps entry-wise against the expected
    /// element types. A value that is already assignable is returned as it is;
    /// otherwise the transformer registered for (value kind, expected kind)
    /// converts it.
    pub fn evaluate_and_transform(
        &self,
        message: &Message,
        expected: &ValueType,
        source: &Value,
    ) -> Result<Value, CoercionError> {
        if source.is_null() {
            return Ok(Value::Null);
        }

        let expected = match expected {
            ValueType::Optional(inner) => inner.as_ref(),
            other => other,
        };

        let target = match (expected, self.evaluate(message, source)?) {
            (ValueType::List(element), Value::List(items)) => Value::List(
                items
                    .iter()
                    .map(|item| self.evaluate_and_transform(message, element, item))
                    .collect::<Result<_, _>>()?,
            ),
            (ValueType::Map(key_type, value_type), Value::Map(entries)) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            self.evaluate_and_transform(message, key_type, k)?,
                            self.evaluate_and_transform(message, value_type, v)?,
                        ))
                    })
                    .collect::<Result<_, CoercionError>>()?,
            ),
            (_, other) => other,
        };

        if target.is_null() || expected.is_assignable(&target) {
            return Ok(target);
        }

        // Any is always assignable, so a target kind exists here.
        let to = expected
            .target_kind()
            .unwrap_or_else(|| target.kind());
        Ok(self.transformers.transform(target, to)?)
    }

    /// Evaluate a parameter source into its Rust type.
    ///
    /// A missing source evaluates to `Value::Null`, which only `Option<T>`
    /// and `Value` parameters accept.
    pub fn evaluate_as<T: FromValue>(
        &self,
        parameter: &str,
        message: &Message,
        source: Option<&Value>,
    ) -> Result<T, EvaluationError> {
        let wrap = |source: CoercionError| EvaluationError {
            parameter: parameter.to_string(),
            source,
        };

        let value = match source {
            Some(source) => self
                .evaluate_and_transform(message, &T::value_type(), source)
                .map_err(wrap)?,
            None => Value::Null,
        };

        T::from_value(value).map_err(|e| wrap(CoercionError::Transform(e)))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{HeaderScope, TransformError, ValueKind};

    #[test]
    fn test_scalar_coercion() {
        let evaluator = Evaluator::default();
        let msg = Message::new("41").with_header(HeaderScope::Inbound, "n", "5");

        let payload: i64 = evaluator
            .evaluate_as("n", &msg, Some(&Value::from("#[payload]")))
            .unwrap();
        assert_eq!(payload, 41);

        let header: u32 = evaluator
            .evaluate_as("n", &msg, Some(&Value::from("#[header:INBOUND:n]")))
            .unwrap();
        assert_eq!(header, 5);
    }

    #[test]
    fn test_template_source() {
        let evaluator = Evaluator::default();
        let msg = Message::new("world");

        let greeting: String = evaluator
            .evaluate_as("greeting", &msg, Some(&Value::from("hello #[payload]")))
            .unwrap();
        assert_eq!(greeting, "hello world");
    }

    #[test]
    fn test_list_elements_rebuilt() {
        let evaluator = Evaluator::default();
        let msg = Message::new("7");
        let source = Value::List(vec![Value::from("1"), Value::from("#[payload]")]);

        let numbers: Vec<i64> = evaluator.evaluate_as("xs", &msg, Some(&source)).unwrap();
        assert_eq!(numbers, vec![1, 7]);
    }

    #[test]
    fn test_map_entries_rebuilt() {
        let evaluator = Evaluator::default();
        let msg = Message::empty();
        let source = Value::Map(vec![(Value::Int(1), Value::from("2"))]);

        let map: HashMap<String, i64> = evaluator.evaluate_as("m", &msg, Some(&source)).unwrap();
        assert_eq!(map.get("1"), Some(&2));
    }

    #[test]
    fn test_assignable_list_skips_transformers() {
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let registry = TransformerRegistry::new();
        for from in [ValueKind::Int, ValueKind::List] {
            let calls = calls.clone();
            registry.register(from, ValueKind::Int, move |v: Value| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransformError>(v)
            });
        }
        let evaluator = Evaluator::new(
            std::sync::Arc::new(MessageExpressions::default()),
            ExpressionPattern::default(),
            std::sync::Arc::new(registry),
        );

        let source = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let result = evaluator
            .evaluate_and_transform(&Message::empty(), &ValueType::list(ValueType::Int), &source)
            .unwrap();

        assert_eq!(result, source);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_transformer_is_reported() {
        let evaluator = Evaluator::default();
        let err = evaluator
            .evaluate_as::<i64>("n", &Message::empty(), Some(&Value::List(vec![])))
            .unwrap_err();
        assert_eq!(err.parameter, "n");
        assert!(matches!(
            err.source,
            CoercionError::Transform(TransformError::NoTransformer { .. })
        ));
    }

    #[test]
    fn test_missing_source() {
        let evaluator = Evaluator::default();
        let value: Option<String> = evaluator.evaluate_as("o", &Message::empty(), None).unwrap();
        assert_eq!(value, None);
        assert!(evaluator
            .evaluate_as::<String>("s", &Message::empty(), None)
            .is_err());
    }
}
