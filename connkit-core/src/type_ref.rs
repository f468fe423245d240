//! Declared Rust types as written in a module manifest.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

/// Scalar kinds recognized in declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Int,
    Float,
    Bool,
}

impl ScalarType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "String" | "str" | "&str" => Some(ScalarType::String),
            "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize" => {
                Some(ScalarType::Int)
            }
            "f32" | "f64" => Some(ScalarType::Float),
            "bool" => Some(ScalarType::Bool),
            _ => None,
        }
    }

    /// Get the manifest name of this scalar kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::String => "string",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::Bool => "bool",
        }
    }
}

/// Structural shape of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Scalar(ScalarType),
    /// `Vec<T>`
    List(Box<TypeRef>),
    /// `HashMap<K, V>`, `BTreeMap<K, V>` or `IndexMap<K, V>`
    Map(Box<TypeRef>, Box<TypeRef>),
    /// `Option<T>`
    Optional(Box<TypeRef>),
    /// Any other path, kept verbatim.
    Named(String),
}

/// A declared type: its spelling plus a parsed shape.
///
/// The spelling is what generated code uses for annotations; the shape drives
/// parameter classification and coercion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct TypeRef {
    spelled: String,
    shape: Shape,
}

impl TypeRef {
    /// Parse a declared type such as `Vec<String>` or `Option<i64>`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let spelled = s.trim();
        if spelled.is_empty() {
            return Err("type must not be empty".to_string());
        }

        let shape = match split_generic(spelled)? {
            None => match ScalarType::from_name(spelled) {
                Some(scalar) => Shape::Scalar(scalar),
                None => Shape::Named(spelled.to_string()),
            },
            Some((head, args)) => {
                let last = head.rsplit("::").next().unwrap_or(head);
                match (last, args.as_slice()) {
                    ("Vec", [inner]) => Shape::List(Box::new(Self::parse(inner)?)),
                    ("Option", [inner]) => Shape::Optional(Box::new(Self::parse(inner)?)),
                    ("HashMap" | "BTreeMap" | "IndexMap", [key, value]) => Shape::Map(
                        Box::new(Self::parse(key)?),
                        Box::new(Self::parse(value)?),
                    ),
                    _ => Shape::Named(spelled.to_string()),
                }
            }
        };

        Ok(Self {
            spelled: spelled.to_string(),
            shape,
        })
    }

    /// The type as written.
    pub fn as_str(&self) -> &str {
        &self.spelled
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.shape, Shape::Optional(_))
    }

    /// Strip one level of `Option`.
    pub fn without_option(&self) -> &TypeRef {
        match &self.shape {
            Shape::Optional(inner) => inner,
            _ => self,
        }
    }

    /// Path before the generic arguments (`std::collections::HashMap<K, V>`
    /// -> `std::collections::HashMap`), or the whole spelling.
    pub fn generic_head(&self) -> &str {
        self.spelled
            .find('<')
            .map_or(self.spelled.as_str(), |open| self.spelled[..open].trim())
    }

    /// Final path segment of a named type (`crate::x::Callback` -> `Callback`).
    pub fn last_segment(&self) -> Option<&str> {
        match &self.shape {
            Shape::Named(path) => path.rsplit("::").next(),
            _ => None,
        }
    }
}

/// Split `Head<A, B>` into `("Head", ["A", "B"])` honoring nested brackets.
fn split_generic(s: &str) -> Result<Option<(&str, Vec<&str>)>, String> {
    let Some(open) = s.find('<') else {
        return Ok(None);
    };
    if !s.ends_with('>') {
        return Err(format!("unbalanced generic arguments in '{}'", s));
    }

    let head = s[..open].trim();
    let body = &s[open + 1..s.len() - 1];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced generic arguments in '{}'", s))?;
            }
            ',' if depth == 0 => {
                args.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(format!("unbalanced generic arguments in '{}'", s));
    }
    args.push(body[start..].trim());

    if args.iter().any(|a| a.is_empty()) {
        return Err(format!("empty generic argument in '{}'", s));
    }

    Ok(Some((head, args)))
}

impl TryFrom<String> for TypeRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl FromStr for TypeRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TypeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.spelled)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelled)
    }
}
