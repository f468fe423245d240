use connkit_core::TypeRef;
use serde::Deserialize;

use crate::{Result, validate::ParseContext};

/// A configurable field of the module (`[[fields]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    /// Default value used when the field is not configured
    pub default: Option<toml::Value>,

    /// Optional fields are generated as `Option<T>`
    #[serde(default)]
    pub optional: bool,

    pub description: Option<String>,
}

impl Field {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_ident(&self.name, "field")?;

        if let Some(default) = &self.default
            && connkit_core::toml_value_to_literal(default).is_none()
        {
            return Err(ctx.error_at(
                format!("default of field '{}' must be a scalar value", self.name),
                &self.name,
            ));
        }

        Ok(())
    }
}
