//! Transformer lookup keyed by (source kind, target kind).

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::debug;

use crate::{BoxError, FromValue, IntoValue, TransformError, Value, ValueKind};

/// Converts a value of one kind into another.
pub trait Transformer: Send + Sync {
    fn transform(&self, value: Value) -> Result<Value, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(Value) -> Result<Value, TransformError> + Send + Sync,
{
    fn transform(&self, value: Value) -> Result<Value, TransformError> {
        self(value)
    }
}

/// Weight of transformers registered without one.
pub const DEFAULT_WEIGHT: i32 = 0;

struct Weighted {
    weight: i32,
    transformer: Arc<dyn Transformer>,
}

/// Registered transformers.
///
/// One transformer serves each (source kind, target kind) pair. A new
/// registration replaces the current one unless the current one carries a
/// higher weight.
#[derive(Default)]
pub struct TransformerRegistry {
    transformers: RwLock<HashMap<(ValueKind, ValueKind), Weighted>>,
}

impl TransformerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the scalar conversions installed.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(ValueKind::String, ValueKind::Int, |v: Value| {
            parse_scalar(&v, |s| s.trim().parse::<i64>().ok().map(Value::Int), "int")
        });
        registry.register(ValueKind::String, ValueKind::Float, |v: Value| {
            parse_scalar(&v, |s| s.trim().parse::<f64>().ok().map(Value::Float), "float")
        });
        registry.register(ValueKind::String, ValueKind::Bool, |v: Value| {
            parse_scalar(
                &v,
                |s| match s.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Bool(true)),
                    "false" => Some(Value::Bool(false)),
                    _ => None,
                },
                "bool",
            )
        });
        for kind in [ValueKind::Int, ValueKind::Float, ValueKind::Bool] {
            registry.register(kind, ValueKind::String, |v: Value| {
                Ok(Value::String(v.to_string()))
            });
        }
        registry.register(ValueKind::Int, ValueKind::Float, |v: Value| match v {
            Value::Int(i) => Ok(Value::Float(i as f64)),
            other => Err(conversion(&other, "float")),
        });
        registry.register(ValueKind::Float, ValueKind::Int, |v: Value| match v {
            Value::Float(x) if is_whole_i64(x) => Ok(Value::Int(x as i64)),
            other => Err(conversion(&other, "int")),
        });
        registry
    }

    pub fn register(&self, from: ValueKind, to: ValueKind, transformer: impl Transformer + 'static) {
        self.register_weighted(from, to, DEFAULT_WEIGHT, transformer);
    }

    /// Register `transformer` for the pair unless a heavier one is already
    /// present. Returns true if it was installed.
    pub fn register_weighted(
        &self,
        from: ValueKind,
        to: ValueKind,
        weight: i32,
        transformer: impl Transformer + 'static,
    ) -> bool {
        let mut transformers = self.transformers.write();
        if let Some(current) = transformers.get(&(from, to))
            && current.weight > weight
        {
            debug!(%from, %to, weight, current = current.weight, "keeping heavier transformer");
            return false;
        }
        transformers.insert(
            (from, to),
            Weighted {
                weight,
                transformer: Arc::new(transformer),
            },
        );
        true
    }

    /// Register a typed conversion function. The pair is derived from the
    /// source and target types.
    pub fn register_fn<S, T, E, F>(
        &self,
        name: &'static str,
        weight: i32,
        f: F,
    ) -> Result<bool, TransformError>
    where
        S: FromValue + 'static,
        T: IntoValue + FromValue + 'static,
        E: Into<BoxError> + 'static,
        F: Fn(S) -> Result<T, E> + Send + Sync + 'static,
    {
        let unkeyed = || TransformError::Unkeyed { transformer: name };
        let from = S::value_type().target_kind().ok_or_else(unkeyed)?;
        let to = T::value_type().target_kind().ok_or_else(unkeyed)?;
        Ok(self.register_weighted(from, to, weight, user_transformer(name, f)))
    }

    pub fn lookup(&self, from: ValueKind, to: ValueKind) -> Result<Arc<dyn Transformer>, TransformError> {
        self.transformers
            .read()
            .get(&(from, to))
            .map(|entry| Arc::clone(&entry.transformer))
            .ok_or(TransformError::NoTransformer { from, to })
    }

    /// Convert `value` to `to`, looking up the transformer by the value's kind.
    pub fn transform(&self, value: Value, to: ValueKind) -> Result<Value, TransformError> {
        let transformer = self.lookup(value.kind(), to)?;
        transformer.transform(value)
    }
}

/// Strings to the canonical variant name of an enum, ignoring ASCII case.
pub fn enum_transformer(
    type_name: &'static str,
    variants: &'static [&'static str],
) -> impl Transformer {
    move |value: Value| -> Result<Value, TransformError> {
        value
            .as_str()
            .and_then(|s| variants.iter().find(|v| v.eq_ignore_ascii_case(s.trim())))
            .map(|variant| Value::from(*variant))
            .ok_or_else(|| conversion(&value, type_name))
    }
}

/// Adapt a typed conversion function. Its errors are reported as failures
/// of the transformer `name`.
pub fn user_transformer<S, T, E, F>(name: &'static str, f: F) -> impl Transformer
where
    S: FromValue + 'static,
    T: IntoValue + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(S) -> Result<T, E> + Send + Sync + 'static,
{
    move |value: Value| -> Result<Value, TransformError> {
        let source = S::from_value(value)?;
        f(source)
            .map(IntoValue::into_value)
            .map_err(|e| TransformError::Failed {
                transformer: name,
                source: e.into(),
            })
    }
}

fn conversion(value: &Value, target: &str) -> TransformError {
    TransformError::Conversion {
        value: value.to_string(),
        target: target.to_string(),
    }
}

/// Finite, integral and inside `i64` (`2^63` itself is out of range).
fn is_whole_i64(x: f64) -> bool {
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    x.is_finite() && x.fract() == 0.0 && (-BOUND..BOUND).contains(&x)
}

fn parse_scalar(
    value: &Value,
    parse: impl Fn(&str) -> Option<Value>,
    target: &str,
) -> Result<Value, TransformError> {
    value
        .as_str()
        .and_then(parse)
        .ok_or_else(|| conversion(value, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conversions() {
        let registry = TransformerRegistry::with_defaults();

        assert_eq!(
            registry.transform(Value::from(" 42 "), ValueKind::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            registry.transform(Value::from("TRUE"), ValueKind::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            registry.transform(Value::Int(3), ValueKind::String).unwrap(),
            Value::from("3")
        );
        assert_eq!(
            registry.transform(Value::Float(2.0), ValueKind::Int).unwrap(),
            Value::Int(2)
        );
        assert!(registry.transform(Value::Float(2.5), ValueKind::Int).is_err());
        assert!(registry.transform(Value::from("abc"), ValueKind::Int).is_err());
    }

    #[test]
    fn test_float_to_int_rejects_out_of_range() {
        let registry = TransformerRegistry::with_defaults();

        for x in [f64::NAN, f64::INFINITY, 1e19, -1e19, 9_223_372_036_854_775_808.0] {
            assert!(
                matches!(
                    registry.transform(Value::Float(x), ValueKind::Int),
                    Err(TransformError::Conversion { .. })
                ),
                "{} converted",
                x
            );
        }
        assert_eq!(
            registry
                .transform(Value::Float(-9_223_372_036_854_775_808.0), ValueKind::Int)
                .unwrap(),
            Value::Int(i64::MIN)
        );
    }

    #[test]
    fn test_missing_transformer() {
        let registry = TransformerRegistry::new();
        let err = registry.lookup(ValueKind::List, ValueKind::Int).err().unwrap();
        assert!(matches!(
            err,
            TransformError::NoTransformer {
                from: ValueKind::List,
                to: ValueKind::Int
            }
        ));
    }

    #[test]
    fn test_register_overwrites() {
        let registry = TransformerRegistry::with_defaults();
        registry.register(ValueKind::String, ValueKind::Int, |_: Value| Ok(Value::Int(0)));
        assert_eq!(
            registry.transform(Value::from("9"), ValueKind::Int).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_heavier_transformer_is_kept() {
        let registry = TransformerRegistry::with_defaults();
        assert!(registry.register_weighted(ValueKind::String, ValueKind::Int, 5, |_: Value| {
            Ok(Value::Int(5))
        }));
        assert!(!registry.register_weighted(ValueKind::String, ValueKind::Int, 1, |_: Value| {
            Ok(Value::Int(1))
        }));
        registry.register(ValueKind::String, ValueKind::Int, |_: Value| Ok(Value::Int(0)));

        assert_eq!(
            registry.transform(Value::from("9"), ValueKind::Int).unwrap(),
            Value::Int(5)
        );
    }

    #[test]
    fn test_enum_transformer_normalizes_case() {
        let status = ValueKind::Named("crate::Status");
        let registry = TransformerRegistry::new();
        registry.register(
            ValueKind::String,
            status,
            enum_transformer("crate::Status", &["Open", "Closed"]),
        );

        assert_eq!(
            registry.transform(Value::from(" closed"), status).unwrap(),
            Value::from("Closed")
        );
        let err = registry.transform(Value::from("pending"), status).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert 'pending' to crate::Status");
        assert!(matches!(
            registry.transform(Value::Int(1), status),
            Err(TransformError::NoTransformer { .. })
        ));
    }

    #[test]
    fn test_register_fn_derives_pair() {
        let registry = TransformerRegistry::new();
        let installed = registry
            .register_fn("parse_hex", DEFAULT_WEIGHT + 1, |s: String| {
                i64::from_str_radix(s.trim_start_matches("0x"), 16)
            })
            .unwrap();
        assert!(installed);

        assert_eq!(
            registry.transform(Value::from("0x1f"), ValueKind::Int).unwrap(),
            Value::Int(31)
        );
        let err = registry.transform(Value::from("zz"), ValueKind::Int).unwrap_err();
        assert!(matches!(err, TransformError::Failed { transformer: "parse_hex", .. }));
    }

    #[test]
    fn test_register_fn_rejects_untyped_values() {
        let registry = TransformerRegistry::new();
        let err = registry
            .register_fn("passthrough", DEFAULT_WEIGHT, |v: Value| {
                Ok::<_, std::io::Error>(v.to_string())
            })
            .unwrap_err();
        assert!(matches!(err, TransformError::Unkeyed { transformer: "passthrough" }));
    }
}
