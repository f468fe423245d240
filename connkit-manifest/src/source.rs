use serde::Deserialize;

use crate::{ParamDecl, ParamKindDecl, Result, validate::ParseContext};

/// A message source of the module (`[[sources]]`).
///
/// The method runs on a thread of its own and pushes messages through the
/// `source-callback` parameter it receives.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SourceDecl {
    pub name: String,

    /// Method on the user type, defaults to the snake_cased name
    pub method: Option<String>,

    #[serde(default)]
    pub params: Vec<ParamDecl>,

    /// Variant of the module error type that invalidates the connection
    pub invalidate_on: Option<String>,

    /// How many times an invalidated run is retried
    pub retry_max: Option<u32>,

    pub description: Option<String>,
}

impl SourceDecl {
    pub fn method_name(&self) -> String {
        self.method
            .clone()
            .unwrap_or_else(|| connkit_core::to_snake_case(&self.name))
    }

    pub(crate) fn validate<'a>(&'a self, ctx: &ParseContext<'a>) -> Result<()> {
        ctx.validate_name(&self.name, "source")?;
        if let Some(method) = &self.method {
            ctx.validate_ident(method, "source method")?;
        }
        if let Some(variant) = &self.invalidate_on {
            ctx.validate_ident(variant, "invalidating error variant")?;
        }

        let source_ctx = ctx.push(&self.name);
        for param in &self.params {
            param.validate(&source_ctx)?;
        }
        source_ctx.check_unique(self.params.iter().map(|p| p.name.as_str()), "parameter")?;

        let callbacks = self
            .params
            .iter()
            .filter(|p| p.kind == Some(ParamKindDecl::SourceCallback))
            .count();
        if callbacks > 1 {
            return Err(ctx.error_at(
                format!("source '{}' declares more than one source-callback", self.name),
                &self.name,
            ));
        }

        Ok(())
    }
}
