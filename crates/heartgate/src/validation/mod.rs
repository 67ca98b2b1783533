//! Schema sections, class-balance check and the validation report.

mod outcome;
mod proportions;
mod sections;

pub use outcome::{Outcome, Section, SectionOutcome, ValidationReport};
pub use proportions::{DEFAULT_TOLERANCE, check_proportions};
pub use sections::{
    CategoryLevelsCheck, ClassBalanceCheck, ColumnTypesCheck, DuplicatesCheck, EmptyRowsCheck,
    MissingnessCheck, NumericRangeCheck, SchemaRules, SectionCheck,
};
