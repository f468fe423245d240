//! `use` statement collection.

use std::collections::BTreeSet;

use indexmap::IndexMap;

/// Collects and deduplicates imports, keeping module insertion order.
#[derive(Debug, Clone, Default)]
pub struct ImportCollector {
    imports: IndexMap<String, BTreeSet<String>>,
}

impl ImportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: &str, symbol: &str) {
        self.imports
            .entry(module.to_string())
            .or_default()
            .insert(symbol.to_string());
    }

    pub fn add_all<'a>(&mut self, module: &str, symbols: impl IntoIterator<Item = &'a str>) {
        for symbol in symbols {
            self.add(module, symbol);
        }
    }

    /// Import a path as is, e.g. `super::*`.
    pub fn add_module(&mut self, module: &str) {
        self.imports.entry(module.to_string()).or_default();
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }

    /// Render as Rust `use` statements.
    pub fn render(&self) -> String {
        self.imports
            .iter()
            .map(|(module, symbols)| match symbols.len() {
                0 => format!("use {};", module),
                1 => format!(
                    "use {}::{};",
                    module,
                    symbols.iter().next().map_or("", String::as_str)
                ),
                _ => {
                    let symbols: Vec<_> = symbols.iter().map(String::as_str).collect();
                    format!("use {}::{{{}}};", module, symbols.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_imports() {
        let mut imports = ImportCollector::new();
        imports.add_module("super::*");
        imports.add("std::sync", "Arc");
        imports.add_all("connkit_runtime", ["Value", "Message", "Value"]);

        assert_eq!(
            imports.render(),
            "use super::*;\nuse std::sync::Arc;\nuse connkit_runtime::{Message, Value};"
        );
    }
}
