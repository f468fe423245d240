use connkit_core::TypeRef;
use serde::Deserialize;

use crate::{Result, validate::ParseContext};

/// The `[connect]` table: connect/disconnect/validate methods of the module.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectSection {
    /// Method establishing a connection
    pub method: String,

    /// Method tearing a connection down
    pub disconnect: String,

    /// Method reporting whether the connection is still usable
    pub validate: Option<String>,

    /// Method returning a connection identifier for logging
    pub identifier: Option<String>,

    /// Parameters of the connect method, in call order
    #[serde(default)]
    pub params: Vec<ConnectParamDecl>,
}

/// A parameter of the connect method (`[[connect.params]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectParamDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    /// Key parameters form the connection key used to index pooled connections
    #[serde(default)]
    pub key: bool,

    pub description: Option<String>,
}

impl ConnectSection {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_ident(&self.method, "connect method")?;
        ctx.validate_ident(&self.disconnect, "disconnect method")?;
        if let Some(validate) = &self.validate {
            ctx.validate_ident(validate, "validate method")?;
        }
        if let Some(identifier) = &self.identifier {
            ctx.validate_ident(identifier, "identifier method")?;
        }

        for param in &self.params {
            ctx.validate_ident(&param.name, "connect parameter")?;
        }
        ctx.check_unique(
            self.params.iter().map(|p| p.name.as_str()),
            "connect parameter",
        )?;

        Ok(())
    }

    /// Iterate over the key parameters in declaration order.
    pub fn key_params(&self) -> impl Iterator<Item = &ConnectParamDecl> {
        self.params.iter().filter(|p| p.key)
    }
}
