//! Core operations.
//!
//! This module contains the business logic for connkit commands,
//! separated from CLI argument parsing and output rendering.

pub mod check;
pub mod generate;
pub mod info;
pub mod roles;

pub use check::check;
pub use generate::generate;
pub use info::info;
pub use roles::roles;
