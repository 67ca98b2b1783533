//! CLI command implementations.

pub mod catalogue;
pub mod validate;
