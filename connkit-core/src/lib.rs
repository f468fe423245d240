//! Core utilities and types for the connkit connector generator.
//!
//! This crate provides naming helpers and the declared-type model shared by
//! the manifest, IR and codegen crates.

mod type_ref;
mod utils;

pub use type_ref::{ScalarType, Shape, TypeRef};
pub use utils::{to_pascal_case, to_snake_case, toml_value_to_literal};
