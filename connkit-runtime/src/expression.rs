//! Expression evaluation against messages.
//!
//! The runtime only consumes expression results. [`MessageExpressions`] is a
//! small default evaluator covering payload and header access; hosts with a
//! full expression language plug in their own [`ExpressionEvaluator`].

use serde::Deserialize;

use crate::{ExpressionError, HeaderScope, Message, Value};

/// Delimiters marking a string as an expression, `#[` and `]` by default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpressionPattern {
    pub prefix: String,
    pub suffix: String,
}

impl Default for ExpressionPattern {
    fn default() -> Self {
        Self {
            prefix: "#[".to_string(),
            suffix: "]".to_string(),
        }
    }
}

impl ExpressionPattern {
    /// Returns true if the whole string is one expression.
    pub fn is_expression(&self, s: &str) -> bool {
        s.len() >= self.prefix.len() + self.suffix.len()
            && s.starts_with(&self.prefix)
            && s.ends_with(&self.suffix)
    }

    /// The expression body without delimiters.
    pub fn strip<'s>(&self, s: &'s str) -> Option<&'s str> {
        if self.is_expression(s) {
            Some(&s[self.prefix.len()..s.len() - self.suffix.len()])
        } else {
            None
        }
    }
}

/// Evaluates expressions and templates against a message.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate a full expression string, delimiters included.
    fn evaluate(&self, expression: &str, message: &Message) -> Result<Value, ExpressionError>;

    /// Expand every embedded expression in a template.
    fn parse(&self, template: &str, message: &Message) -> Result<Value, ExpressionError>;
}

/// Default evaluator.
///
/// Supported expressions:
/// - `payload`
/// - `header:SCOPE:name` (scope defaults to `INBOUND` when omitted)
/// - `headers:SCOPE:a,b` or `headers:SCOPE:*`, yielding a map
/// - `headers-list:SCOPE:a,b`, yielding a list
/// - `string:text`, yielding the literal text
#[derive(Debug, Clone, Default)]
pub struct MessageExpressions {
    pattern: ExpressionPattern,
}

impl MessageExpressions {
    pub fn new(pattern: ExpressionPattern) -> Self {
        Self { pattern }
    }

    fn evaluate_body(&self, body: &str, message: &Message) -> Result<Value, ExpressionError> {
        let body = body.trim();
        if body == "payload" {
            return Ok(message.payload().to_value());
        }

        let (evaluator, rest) = body
            .split_once(':')
            .ok_or_else(|| ExpressionError::Unsupported(body.to_string()))?;

        match evaluator {
            "string" => Ok(Value::from(rest)),
            "header" => {
                let (scope, name) = scoped(rest)?;
                Ok(message.header(scope, name).cloned().unwrap_or(Value::Null))
            }
            "headers" => {
                let (scope, names) = scoped(rest)?;
                let headers = message.headers(scope);
                let entries = if names == "*" {
                    headers
                        .iter()
                        .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                        .collect()
                } else {
                    names
                        .split(',')
                        .map(str::trim)
                        .filter_map(|n| headers.get(n).map(|v| (Value::from(n), v.clone())))
                        .collect()
                };
                Ok(Value::Map(entries))
            }
            "headers-list" => {
                let (scope, names) = scoped(rest)?;
                let headers = message.headers(scope);
                Ok(Value::List(
                    names
                        .split(',')
                        .map(str::trim)
                        .filter_map(|n| headers.get(n).cloned())
                        .collect(),
                ))
            }
            _ => Err(ExpressionError::Unsupported(body.to_string())),
        }
    }
}

/// Split `SCOPE:name` into its parts; a bare name means `INBOUND`.
fn scoped(rest: &str) -> Result<(HeaderScope, &str), ExpressionError> {
    match rest.split_once(':') {
        Some((scope, name)) => {
            let scope = scope
                .parse::<HeaderScope>()
                .map_err(|_| ExpressionError::Unsupported(rest.to_string()))?;
            Ok((scope, name))
        }
        None => Ok((HeaderScope::Inbound, rest)),
    }
}

impl ExpressionEvaluator for MessageExpressions {
    fn evaluate(&self, expression: &str, message: &Message) -> Result<Value, ExpressionError> {
        let body = self.pattern.strip(expression).unwrap_or(expression);
        self.evaluate_body(body, message)
    }

    fn parse(&self, template: &str, message: &Message) -> Result<Value, ExpressionError> {
        let prefix = self.pattern.prefix.as_str();
        let suffix = self.pattern.suffix.as_str();

        if !template.contains(prefix) {
            return Ok(Value::from(template));
        }

        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find(prefix) {
            out.push_str(&rest[..start]);
            let after = &rest[start + prefix.len()..];
            let end = after
                .find(suffix)
                .ok_or_else(|| ExpressionError::Malformed(template.to_string()))?;
            let value = self.evaluate_body(&after[..end], message)?;
            out.push_str(&value.to_string());
            rest = &after[end + suffix.len()..];
        }
        out.push_str(rest);

        Ok(Value::String(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> Message {
        Message::new("hello")
            .with_header(HeaderScope::Inbound, "user", "ada")
            .with_header(HeaderScope::Inbound, "id", 7i64)
            .with_header(HeaderScope::Invocation, "trace", "t-1")
    }

    #[test]
    fn test_pattern() {
        let pattern = ExpressionPattern::default();
        assert!(pattern.is_expression("#[payload]"));
        assert!(!pattern.is_expression("payload"));
        assert!(!pattern.is_expression("#["));
        assert_eq!(pattern.strip("#[payload]"), Some("payload"));
    }

    #[test]
    fn test_evaluate() {
        let eval = MessageExpressions::default();
        let msg = message();

        assert_eq!(eval.evaluate("#[payload]", &msg).unwrap(), Value::from("hello"));
        assert_eq!(
            eval.evaluate("#[header:INBOUND:id]", &msg).unwrap(),
            Value::Int(7)
        );
        assert_eq!(
            eval.evaluate("#[header:INVOCATION:trace]", &msg).unwrap(),
            Value::from("t-1")
        );
        assert_eq!(eval.evaluate("#[header:missing]", &msg).unwrap(), Value::Null);
        assert_eq!(
            eval.evaluate("#[headers:INBOUND:user,nope]", &msg).unwrap(),
            Value::Map(vec![(Value::from("user"), Value::from("ada"))])
        );
        assert_eq!(
            eval.evaluate("#[headers-list:INBOUND:id,user]", &msg).unwrap(),
            Value::List(vec![Value::Int(7), Value::from("ada")])
        );
        assert!(eval.evaluate("#[groovy:1+1]", &msg).is_err());
    }

    #[test]
    fn test_parse_template() {
        let eval = MessageExpressions::default();
        let msg = message();

        assert_eq!(
            eval.parse("user #[header:user] says #[payload]", &msg).unwrap(),
            Value::from("user ada says hello")
        );
        assert_eq!(eval.parse("plain", &msg).unwrap(), Value::from("plain"));
        assert!(matches!(
            eval.parse("broken #[payload", &msg),
            Err(ExpressionError::Malformed(_))
        ));
    }
}
