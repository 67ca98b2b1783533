//! Declarative rule catalogue describing the expected table shape.

mod catalogue;
mod column;
mod types;

pub use catalogue::Catalogue;
pub use column::ColumnRule;
pub use types::{ColumnType, Domain, parse_integer, parse_number};
