use connkit_core::TypeRef;
use serde::Deserialize;

use crate::{Result, validate::ParseContext};

/// An operation exposed by the module (`[[operations]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OperationDecl {
    /// Operation name (may contain dashes)
    pub name: String,

    /// Method on the user type, defaults to the snake_cased name
    pub method: Option<String>,

    /// Return type of the method, omitted for operations without a result
    pub returns: Option<TypeRef>,

    /// Parameters, in call order
    #[serde(default)]
    pub params: Vec<ParamDecl>,

    /// Variant of the module error type that invalidates the connection
    pub invalidate_on: Option<String>,

    /// How many times an invalidated call is retried
    pub retry_max: Option<u32>,

    /// Mime type set on the outbound message
    pub mime_type: Option<String>,

    pub description: Option<String>,
}

/// A parameter of an operation (`[[operations.params]]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: TypeRef,

    /// Explicit classification; inferred from the type when omitted
    pub kind: Option<ParamKindDecl>,

    /// Default source value (a literal, a template or an expression)
    pub default: Option<toml::Value>,

    #[serde(default)]
    pub optional: bool,

    /// Header name for `header-in` and `header-invocation` parameters
    pub header: Option<String>,

    pub description: Option<String>,
}

/// Parameter kinds accepted in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamKindDecl {
    Plain,
    NestedProcessor,
    Callback,
    Payload,
    HeaderIn,
    HeaderOut,
    HeaderInvocation,
    ConnectionField,
    /// Only valid on `[[sources]]`
    SourceCallback,
}

impl OperationDecl {
    /// The method invoked on the user type.
    pub fn method_name(&self) -> String {
        self.method
            .clone()
            .unwrap_or_else(|| connkit_core::to_snake_case(&self.name))
    }

    pub(crate) fn validate<'a>(&'a self, ctx: &ParseContext<'a>) -> Result<()> {
        ctx.validate_name(&self.name, "operation")?;
        if let Some(method) = &self.method {
            ctx.validate_ident(method, "operation method")?;
        }
        if let Some(variant) = &self.invalidate_on {
            ctx.validate_ident(variant, "invalidating error variant")?;
        }

        let op_ctx = ctx.push(&self.name);
        for param in &self.params {
            param.validate(&op_ctx)?;
            if param.kind == Some(ParamKindDecl::SourceCallback) {
                return Err(op_ctx.error_at(
                    format!(
                        "'{}' is a source-callback, which only sources accept",
                        param.name
                    ),
                    &param.name,
                ));
            }
        }
        op_ctx.check_unique(self.params.iter().map(|p| p.name.as_str()), "parameter")?;

        Ok(())
    }
}

impl ParamDecl {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_ident(&self.name, "parameter")?;

        match (self.kind, &self.header) {
            (Some(ParamKindDecl::HeaderIn | ParamKindDecl::HeaderInvocation), None) => {
                Err(ctx.error_at(
                    format!("header parameter '{}' must name a header", self.name),
                    &self.name,
                ))
            }
            (Some(ParamKindDecl::HeaderIn | ParamKindDecl::HeaderInvocation), Some(_)) => Ok(()),
            (_, Some(_)) => Err(ctx.error_at(
                format!(
                    "'header' is only valid for header-in and header-invocation parameters (on '{}')",
                    self.name
                ),
                &self.name,
            )),
            (_, None) => Ok(()),
        }
    }
}
