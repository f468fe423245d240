//! Code generation building blocks.
//!
//! - [`CodeBuilder`] writes indented text
//! - [`CodeFragment`] and [`Renderable`] decouple AST nodes from the builder
//! - [`ImportCollector`] gathers `use` statements for a generated unit

mod code_builder;
mod imports;
mod indent;
mod renderable;

pub use code_builder::CodeBuilder;
pub use imports::ImportCollector;
pub use indent::Indent;
pub use renderable::{CodeFragment, Renderable};
