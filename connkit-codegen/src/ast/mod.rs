//! Rust AST builders for generated units.
//!
//! Nodes render to [`CodeFragment`](crate::builder::CodeFragment)s so they
//! can be nested inside each other and emitted through one builder.

mod fns;
mod impls;
mod structs;

pub use fns::{Fn, Param, Receiver};
pub use impls::Impl;
pub use structs::{Field, Struct};

use crate::builder::CodeFragment;

/// Doc lines followed by `#[...]` attribute lines.
fn preamble(doc: Option<&str>, attrs: &[String]) -> Vec<CodeFragment> {
    let mut fragments: Vec<CodeFragment> = doc
        .into_iter()
        .flat_map(str::lines)
        .map(|line| CodeFragment::Doc(line.to_string()))
        .collect();
    fragments.extend(attrs.iter().map(|a| CodeFragment::line(format!("#[{}]", a))));
    fragments
}
