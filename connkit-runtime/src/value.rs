//! Dynamic values flowing through messages and parameter evaluation.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
};

use indexmap::IndexMap;

use crate::TransformError;

/// A dynamically typed value.
///
/// Maps keep entries as ordered pairs so keys can be coerced like values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

/// The runtime kind of a [`Value`], used to key transformer lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    /// A user type (an enum or a transformer target), by type name.
    ///
    /// No [`Value`] has this kind; reaching it always takes a transformer.
    Named(&'static str),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Named(name) => *name,
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a map entry by string key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// The type a parameter expects, derived from its Rust type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Bool,
    Int,
    Float,
    String,
    List(Box<ValueType>),
    Map(Box<ValueType>, Box<ValueType>),
    Optional(Box<ValueType>),
    Named(&'static str),
}

impl ValueType {
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn map(key: ValueType, value: ValueType) -> Self {
        ValueType::Map(Box::new(key), Box::new(value))
    }

    /// The kind a value must have to satisfy this type, `None` for `Any`.
    pub fn target_kind(&self) -> Option<ValueKind> {
        match self {
            ValueType::Any => None,
            ValueType::Bool => Some(ValueKind::Bool),
            ValueType::Int => Some(ValueKind::Int),
            ValueType::Float => Some(ValueKind::Float),
            ValueType::String => Some(ValueKind::String),
            ValueType::List(_) => Some(ValueKind::List),
            ValueType::Map(_, _) => Some(ValueKind::Map),
            ValueType::Optional(inner) => inner.target_kind(),
            ValueType::Named(name) => Some(ValueKind::Named(*name)),
        }
    }

    /// Shallow assignability: containers are checked by kind only.
    pub fn is_assignable(&self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Optional(inner) => value.is_null() || inner.is_assignable(value),
            other => other.target_kind() == Some(value.kind()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::String => f.write_str("string"),
            ValueType::List(inner) => write!(f, "list<{}>", inner),
            ValueType::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            ValueType::Optional(inner) => write!(f, "optional<{}>", inner),
            ValueType::Named(name) => f.write_str(name),
        }
    }
}

/// Conversion from an evaluated [`Value`] into a Rust parameter type.
pub trait FromValue: Sized {
    /// The expected type used when coercing evaluated values.
    fn value_type() -> ValueType;

    fn from_value(value: Value) -> Result<Self, TransformError>;
}

/// Conversion of a Rust return value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn mismatch(value: &Value, target: ValueType) -> TransformError {
    TransformError::Conversion {
        value: value.to_string(),
        target: target.to_string(),
    }
}

impl FromValue for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn value_type() -> ValueType {
        ValueType::String
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, ValueType::String)),
        }
    }
}

impl FromValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, ValueType::Bool)),
        }
    }
}

impl FromValue for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, ValueType::Float)),
        }
    }
}

impl FromValue for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

macro_rules! int_value {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn value_type() -> ValueType {
                ValueType::Int
            }

            fn from_value(value: Value) -> Result<Self, TransformError> {
                match value {
                    Value::Int(i) => {
                        <$ty>::try_from(i).map_err(|_| mismatch(&Value::Int(i), ValueType::Int))
                    }
                    Value::Null => Err(TransformError::Missing),
                    other => Err(mismatch(&other, ValueType::Int)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                i64::try_from(self).map(Value::Int).unwrap_or(Value::Float(self as f64))
            }
        }
    )*};
}

int_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: FromValue> FromValue for Option<T> {
    fn value_type() -> ValueType {
        ValueType::Optional(Box::new(T::value_type()))
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::list(T::value_type())
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, Self::value_type())),
        }
    }
}

impl<K, V> FromValue for HashMap<K, V>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
{
    fn value_type() -> ValueType {
        ValueType::map(K::value_type(), V::value_type())
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, Self::value_type())),
        }
    }
}

impl<K, V> FromValue for IndexMap<K, V>
where
    K: FromValue + Eq + Hash,
    V: FromValue,
{
    fn value_type() -> ValueType {
        ValueType::map(K::value_type(), V::value_type())
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, Self::value_type())),
        }
    }
}

impl<K, V> FromValue for BTreeMap<K, V>
where
    K: FromValue + Ord,
    V: FromValue,
{
    fn value_type() -> ValueType {
        ValueType::map(K::value_type(), V::value_type())
    }

    fn from_value(value: Value) -> Result<Self, TransformError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Err(TransformError::Missing),
            other => Err(mismatch(&other, Self::value_type())),
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map(IntoValue::into_value).unwrap_or(Value::Null)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for HashMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for BTreeMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

impl<K: IntoValue, V: IntoValue> IntoValue for IndexMap<K, V> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}
