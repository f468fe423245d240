//! Generated source units.

use indexmap::IndexMap;

use crate::builder::{CodeBuilder, ImportCollector, Renderable};

/// One generated Rust source file.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// Path relative to the output root, e.g. `salesforce/config.rs`.
    pub name: String,
    pub module: String,
    pub generator: &'static str,
    pub content: String,
}

impl GeneratedUnit {
    /// File stem of the unit, used as its Rust module name.
    pub fn stem(&self) -> &str {
        let file = self.name.rsplit('/').next().unwrap_or(&self.name);
        file.strip_suffix(".rs").unwrap_or(file)
    }
}

/// Path of the unit `file` of `module`.
pub fn unit_name(module: &str, file: &str) -> String {
    format!("{}/{}.rs", module, file)
}

/// Assembles the text of a unit: header comment, imports, then items
/// separated by blank lines.
#[derive(Debug)]
pub struct UnitWriter {
    imports: ImportCollector,
    builder: CodeBuilder,
    items: usize,
}

impl UnitWriter {
    /// A unit importing its sibling units through `super::*`.
    pub fn new() -> Self {
        let mut imports = ImportCollector::new();
        imports.add_module("super::*");
        Self {
            imports,
            builder: CodeBuilder::rust(),
            items: 0,
        }
    }

    pub fn import(&mut self, module: &str, symbol: &str) -> &mut Self {
        self.imports.add(module, symbol);
        self
    }

    /// Import symbols from the runtime crate.
    pub fn runtime<'a>(&mut self, symbols: impl IntoIterator<Item = &'a str>) -> &mut Self {
        self.imports.add_all("connkit_runtime", symbols);
        self
    }

    pub fn item(&mut self, item: &impl Renderable) -> &mut Self {
        if self.items > 0 {
            self.builder.push_blank();
        }
        self.builder.emit(item);
        self.items += 1;
        self
    }

    pub fn finish(self, module: &str, generator: &'static str, file: &str) -> GeneratedUnit {
        let mut content = format!(
            "// Generated by connkit ({}). Do not edit.\n\n{}\n\n",
            generator,
            self.imports.render()
        );
        content.push_str(&self.builder.build());

        GeneratedUnit {
            name: unit_name(module, file),
            module: module.to_string(),
            generator,
            content,
        }
    }
}

impl Default for UnitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Units emitted during a run, in emission order.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: IndexMap<String, GeneratedUnit>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit, replacing an earlier unit with the same name.
    pub fn add(&mut self, unit: GeneratedUnit) {
        tracing::debug!(unit = %unit.name, generator = unit.generator, "emitted unit");
        self.units.insert(unit.name.clone(), unit);
    }

    pub fn get(&self, name: &str) -> Option<&GeneratedUnit> {
        self.units.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneratedUnit> {
        self.units.values()
    }

    pub fn for_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a GeneratedUnit> {
        self.units.values().filter(move |u| u.module == module)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Build the `mod.rs` unit declaring and re-exporting every unit of
    /// `module`.
    pub fn index(&self, module: &str) -> GeneratedUnit {
        let mut builder = CodeBuilder::rust()
            .line("// Generated by connkit. Do not edit.")
            .blank();
        let stems: Vec<&str> = self
            .for_module(module)
            .map(GeneratedUnit::stem)
            .filter(|stem| *stem != "mod")
            .collect();

        for stem in &stems {
            builder.push_line(&format!("mod {};", stem));
        }
        builder.push_blank();
        for stem in &stems {
            builder.push_line(&format!("pub use {}::*;", stem));
        }

        GeneratedUnit {
            name: unit_name(module, "mod"),
            module: module.to_string(),
            generator: "index",
            content: builder.build(),
        }
    }

    /// Render every unit, each preceded by a path banner.
    pub fn preview(&self) -> String {
        self.units
            .values()
            .map(|u| format!("// ---- {} ----\n{}", u.name, u.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Field, Struct};

    #[test]
    fn test_unit_writer() {
        let mut writer = UnitWriter::new();
        writer.runtime(["Value"]);
        writer.item(&Struct::new("A").field(Field::new("x", "Value")));
        writer.item(&Struct::new("B"));
        let unit = writer.finish("demo", "config", "config");

        assert_eq!(unit.name, "demo/config.rs");
        assert_eq!(unit.stem(), "config");
        insta::assert_snapshot!(unit.content, @r"
        // Generated by connkit (config). Do not edit.

        use super::*;
        use connkit_runtime::Value;

        pub struct A {
            pub x: Value,
        }

        pub struct B;
        ");
    }

    #[test]
    fn test_index_lists_units() {
        let mut units = UnitRegistry::new();
        units.add(UnitWriter::new().finish("demo", "config", "config"));
        units.add(UnitWriter::new().finish("demo", "lifecycle", "lifecycle"));
        units.add(UnitWriter::new().finish("other", "config", "config"));

        let index = units.index("demo");
        assert_eq!(index.name, "demo/mod.rs");
        assert!(index.content.contains("mod config;\nmod lifecycle;\n"));
        assert!(index.content.contains("pub use lifecycle::*;"));
        assert!(!index.content.contains("other"));
    }
}
