use serde::Deserialize;

use crate::{Result, validate::ParseContext};

/// The `[module]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModuleSection {
    /// Module name, used to derive generated type names
    pub name: String,

    /// Rust path of the user type implementing the module
    #[serde(rename = "type")]
    pub type_path: String,

    /// Error enum returned by the module's operations
    pub error: Option<String>,

    /// Whether instances should be pooled and reused
    #[serde(default)]
    pub poolable: bool,

    /// Description for generated docs
    pub description: Option<String>,

    /// Lifecycle hook methods on the user type
    #[serde(default)]
    pub lifecycle: LifecycleSection,

    /// Default pooling profile for generated pools
    pub pooling: Option<PoolingSection>,
}

/// The `[module.lifecycle]` table. Each entry names a method on the user type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleSection {
    pub initialise: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub dispose: Option<String>,
}

impl LifecycleSection {
    /// Returns true if no hook is declared.
    pub fn is_empty(&self) -> bool {
        self.hooks().all(|(_, hook)| hook.is_none())
    }

    /// Iterate over `(phase, hook)` pairs in lifecycle order.
    pub fn hooks(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> {
        [
            ("initialise", self.initialise.as_deref()),
            ("start", self.start.as_deref()),
            ("stop", self.stop.as_deref()),
            ("dispose", self.dispose.as_deref()),
        ]
        .into_iter()
    }
}

/// The `[module.pooling]` table.
///
/// Negative limits mean "unlimited"; a non-positive `max-wait-ms` blocks
/// until an object is available.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PoolingSection {
    pub max_active: Option<i64>,
    pub max_idle: Option<i64>,
    pub max_wait_ms: Option<i64>,
    pub exhausted_action: Option<ExhaustedActionDecl>,
}

/// What a pool does when no object is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustedActionDecl {
    Fail,
    Block,
    Grow,
}

/// The `[oauth]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OAuthSection {
    pub authorization_url: String,
    pub access_token_url: String,
    pub scope: Option<String>,
    /// Path the provider redirects back to after authorization
    pub callback_path: Option<String>,
}

impl ModuleSection {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        ctx.validate_ident(&self.name, "module")?;
        ctx.validate_path(&self.type_path, "module type")?;

        if let Some(error) = &self.error {
            ctx.validate_path(error, "error type")?;
        }

        let lifecycle_ctx = ctx.push("lifecycle");
        for (phase, hook) in self.lifecycle.hooks() {
            if let Some(hook) = hook {
                lifecycle_ctx.validate_ident(hook, phase)?;
            }
        }

        Ok(())
    }
}

impl OAuthSection {
    pub(crate) fn validate(&self, ctx: &ParseContext<'_>) -> Result<()> {
        for url in [&self.authorization_url, &self.access_token_url] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ctx.error_at(
                    format!("'{}' is not an http(s) URL", url),
                    url,
                ));
            }
        }
        Ok(())
    }
}
