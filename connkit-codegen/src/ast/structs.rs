//! Rust struct builder.

use super::preamble;
use crate::builder::{CodeBuilder, CodeFragment, Renderable};

/// A field in a Rust struct.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: String,
    pub doc: Option<String>,
    pub is_public: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            doc: None,
            is_public: true,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn doc_opt(mut self, doc: Option<&str>) -> Self {
        self.doc = doc.map(str::to_string);
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Builder for Rust structs.
#[derive(Debug, Clone)]
pub struct Struct {
    name: String,
    doc: Option<String>,
    derives: Vec<String>,
    attrs: Vec<String>,
    fields: Vec<Field>,
}

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            derives: Vec::new(),
            attrs: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn derive(mut self, derive: impl Into<String>) -> Self {
        self.derives.push(derive.into());
        self
    }

    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.attrs.push(attr.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn build(&self) -> String {
        let mut builder = CodeBuilder::rust();
        builder.emit(self);
        builder.build()
    }
}

impl Renderable for Struct {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        let mut attrs = Vec::new();
        if !self.derives.is_empty() {
            attrs.push(format!("derive({})", self.derives.join(", ")));
        }
        attrs.extend(self.attrs.iter().cloned());

        let mut fragments = preamble(self.doc.as_deref(), &attrs);
        if self.fields.is_empty() {
            fragments.push(CodeFragment::line(format!("pub struct {};", self.name)));
            return fragments;
        }

        let body = self
            .fields
            .iter()
            .flat_map(|field| {
                let vis = if field.is_public { "pub " } else { "" };
                let mut lines = preamble(field.doc.as_deref(), &[]);
                lines.push(CodeFragment::line(format!(
                    "{}{}: {},",
                    vis, field.name, field.ty
                )));
                lines
            })
            .collect();
        fragments.push(CodeFragment::block(
            format!("pub struct {} {{", self.name),
            body,
        ));
        fragments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_with_fields() {
        let code = Struct::new("SalesforceConfig")
            .doc("Configuration of the salesforce module.")
            .derive("Debug")
            .derive("Clone")
            .field(Field::new("url", "String").doc("Login URL."))
            .field(Field::new("retry", "RetryState").private())
            .build();

        insta::assert_snapshot!(code, @r"
        /// Configuration of the salesforce module.
        #[derive(Debug, Clone)]
        pub struct SalesforceConfig {
            /// Login URL.
            pub url: String,
            retry: RetryState,
        }
        ");
    }

    #[test]
    fn test_unit_struct() {
        let code = Struct::new("Marker").derive("Default").build();
        assert_eq!(code, "#[derive(Default)]\npub struct Marker;\n");
    }
}
