//! Info command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from a module descriptor.
#[derive(Debug)]
pub struct InfoReport {
    pub name: String,
    pub type_path: String,
    pub description: Option<String>,
    pub config_path: PathBuf,
    /// Capability layers the module gets.
    pub capabilities: Vec<String>,
    /// `name: type` per configurable field.
    pub fields: Vec<String>,
    pub connect: Option<ConnectInfo>,
    pub operations: Vec<OperationInfo>,
    pub sources: Vec<OperationInfo>,
    /// Enum and user transformers, one line each.
    pub conversions: Vec<String>,
}

#[derive(Debug)]
pub struct ConnectInfo {
    pub method: String,
    pub disconnect: String,
    pub validate: Option<String>,
    pub key_params: Vec<String>,
    pub extra_params: Vec<String>,
}

#[derive(Debug)]
pub struct OperationInfo {
    pub name: String,
    pub returns: Option<String>,
    pub retry_max: u32,
    pub invalidate_on: Option<String>,
    /// `name: type (kind)` per parameter.
    pub params: Vec<String>,
}

impl Report for InfoReport {
    fn render(&self, out: &mut dyn Output) {
        out.newline();
        out.preformatted(&format!("  {} ({})", self.name, self.type_path));
        out.preformatted(&format!("  {}", "─".repeat(self.name.len())));
        if let Some(desc) = &self.description {
            out.preformatted(&format!("  {}", desc));
        }
        out.newline();
        out.key_value_indented("Config", &self.config_path.display().to_string());
        if !self.capabilities.is_empty() {
            out.key_value_indented("Capabilities", &self.capabilities.join(", "));
        }

        if !self.fields.is_empty() {
            out.newline();
            out.section("Fields");
            for field in &self.fields {
                out.list_item(field);
            }
        }

        if let Some(connect) = &self.connect {
            out.newline();
            out.section("Connect");
            out.key_value_indented("connect", &connect.method);
            out.key_value_indented("disconnect", &connect.disconnect);
            out.key_value_indented("validate", connect.validate.as_deref().unwrap_or("(none)"));
            out.key_value_indented("key", &connect.key_params.join(", "));
            if !connect.extra_params.is_empty() {
                out.key_value_indented("other", &connect.extra_params.join(", "));
            }
        }

        render_operations(out, "Operations", &self.operations);
        render_operations(out, "Sources", &self.sources);

        if !self.conversions.is_empty() {
            out.newline();
            out.section("Conversions");
            for conversion in &self.conversions {
                out.list_item(conversion);
            }
        }
    }
}

fn render_operations(out: &mut dyn Output, title: &str, operations: &[OperationInfo]) {
    if operations.is_empty() {
        return;
    }
    out.newline();
    out.section(title);
    for op in operations {
        let returns = op.returns.as_deref().unwrap_or("()");
        let mut line = format!("{} -> {}", op.name, returns);
        if let Some(variant) = &op.invalidate_on {
            line.push_str(&format!(" [retries {} on {}]", op.retry_max, variant));
        }
        out.list_item(&line);
        for param in &op.params {
            out.preformatted(&format!("      {}", param));
        }
    }
}
