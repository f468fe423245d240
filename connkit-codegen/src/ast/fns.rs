//! Rust function builder.

use super::preamble;
use crate::builder::{CodeBuilder, CodeFragment, Renderable};

/// A parameter in a Rust function.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// How a method takes `self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    Ref,
    Mut,
    Owned,
    OwnedMut,
    /// `self: &Arc<Self>`, for methods that hand a clone to another thread.
    Arc,
}

impl Receiver {
    fn as_str(&self) -> &'static str {
        match self {
            Receiver::Ref => "&self",
            Receiver::Mut => "&mut self",
            Receiver::Owned => "self",
            Receiver::OwnedMut => "mut self",
            Receiver::Arc => "self: &Arc<Self>",
        }
    }
}

/// Builder for Rust functions and methods.
#[derive(Debug, Clone)]
pub struct Fn {
    name: String,
    doc: Option<String>,
    attrs: Vec<String>,
    is_public: bool,
    receiver: Option<Receiver>,
    generics: Option<String>,
    params: Vec<Param>,
    return_type: Option<String>,
    body: Vec<CodeFragment>,
}

impl Fn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            attrs: Vec::new(),
            is_public: true,
            receiver: None,
            generics: None,
            params: Vec::new(),
            return_type: None,
            body: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn attr(mut self, attr: impl Into<String>) -> Self {
        self.attrs.push(attr.into());
        self
    }

    /// Drop the `pub` keyword, as trait methods require.
    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }

    pub fn receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = Some(receiver);
        self
    }

    /// Generic parameters, written without the angle brackets.
    pub fn generics(mut self, generics: impl Into<String>) -> Self {
        self.generics = Some(generics.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = Some(ty.into());
        self
    }

    pub fn body_line(mut self, line: impl Into<String>) -> Self {
        self.body.push(CodeFragment::Line(line.into()));
        self
    }

    /// Add multi-line body text. Relative indentation is kept.
    pub fn body(mut self, content: &str) -> Self {
        self.body.extend(CodeFragment::lines(content));
        self
    }

    pub fn body_fragment(mut self, fragment: CodeFragment) -> Self {
        self.body.push(fragment);
        self
    }

    fn signature(&self) -> String {
        let vis = if self.is_public { "pub " } else { "" };
        let generics = self
            .generics
            .as_ref()
            .map(|g| format!("<{}>", g))
            .unwrap_or_default();
        let params: Vec<String> = self
            .receiver
            .iter()
            .map(|r| r.as_str().to_string())
            .chain(self.params.iter().map(|p| format!("{}: {}", p.name, p.ty)))
            .collect();

        match &self.return_type {
            Some(ret) => format!(
                "{}fn {}{}({}) -> {} {{",
                vis,
                self.name,
                generics,
                params.join(", "),
                ret
            ),
            None => format!(
                "{}fn {}{}({}) {{",
                vis,
                self.name,
                generics,
                params.join(", ")
            ),
        }
    }

    pub fn build(&self) -> String {
        let mut builder = CodeBuilder::rust();
        builder.emit(self);
        builder.build()
    }
}

impl Renderable for Fn {
    fn to_fragments(&self) -> Vec<CodeFragment> {
        let mut fragments = preamble(self.doc.as_deref(), &self.attrs);
        fragments.push(CodeFragment::block(self.signature(), self.body.clone()));
        fragments
    }
}
