//! User-declared conversions.

use serde::Serialize;

use crate::TypeRef;

/// A user enum that parameters can be coerced into from strings.
#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl {
    /// Rust path of the enum.
    pub type_path: String,
    /// Unit variants, spelled as in the enum.
    pub variants: Vec<String>,
}

impl EnumDecl {
    pub fn type_name(&self) -> &str {
        self.type_path
            .rsplit("::")
            .next()
            .unwrap_or(&self.type_path)
    }
}

/// An associated function of the module type converting one type into
/// another, registered with the runtime transformer registry.
#[derive(Debug, Clone, Serialize)]
pub struct TransformerDecl {
    pub method: String,
    pub from: TypeRef,
    pub to: TypeRef,
    /// Added to the runtime's default weight; the heavier transformer wins
    /// a (from, to) pair.
    pub weight: i32,
    pub description: Option<String>,
}
