use connkit_core::TypeRef;
use serde::Deserialize;

use crate::{Result, validate::ParseContext};

/// A user enum coerced from strings (`[[enums]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumSection {
    /// Rust path of the enum
    #[serde(rename = "type")]
    pub type_path: String,

    /// Unit variants; all of them must be listed
    pub variants: Vec<String>,
}

/// A conversion function on the module type (`[[transformers]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformerSection {
    /// Associated function taking `from` and returning `Result<to, E>`
    pub method: String,

    pub from: TypeRef,

    pub to: TypeRef,

    /// Priority over other transformers for the same pair
    #[serde(default)]
    pub weight: i32,

    pub description: Option<String>,
}

impl EnumSection {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_path(&self.type_path, "enum type")?;
        if self.variants.is_empty() {
            return Err(ctx.error_at(
                format!("enum '{}' must list its variants", self.type_path),
                &self.type_path,
            ));
        }
        for variant in &self.variants {
            ctx.validate_ident(variant, "enum variant")?;
        }
        ctx.check_unique(self.variants.iter().map(String::as_str), "enum variant")
    }
}

impl TransformerSection {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_ident(&self.method, "transformer method")?;
        if self.from.is_optional() || self.to.is_optional() {
            return Err(ctx.error_at(
                format!("transformer '{}' cannot convert optional types", self.method),
                &self.method,
            ));
        }
        Ok(())
    }
}
