//! Heartgate: validation gate for cleaned heart-disease datasets.
//!
//! A cleaned CSV is checked against a fixed catalogue of column rules before
//! it is used for modelling. Seven schema sections report pass or fail
//! independently; a correlation audit then rejects datasets where a feature
//! leaks the label or two features are near-duplicates.
//!
//! # Core Principles
//!
//! - **Rules as data**: the [`Catalogue`] lists every column's type, domain
//!   and null ceiling; one generic checker interprets it
//! - **Report, don't abort**: schema failures are recorded in the
//!   [`ValidationReport`]; only unreadable input and correlation breaches
//!   are errors
//!
//! # Example
//!
//! ```no_run
//! use heartgate::Validator;
//!
//! let validator = Validator::new();
//! let report = validator.validate("data/processed/heart_clean.csv").unwrap();
//!
//! for line in report.lines() {
//!     println!("{}", line);
//! }
//! ```

pub mod audit;
pub mod error;
pub mod input;
pub mod schema;
pub mod validation;

mod validator;

pub use crate::validator::{Validator, ValidatorConfig};
pub use audit::{AuditConfig, AuditScores, CorrelationAuditor};
pub use error::{HeartgateError, Result};
pub use input::{DataTable, SourceMetadata};
pub use schema::{Catalogue, ColumnRule, ColumnType, Domain};
pub use validation::{
    Outcome, SchemaRules, Section, SectionOutcome, ValidationReport, check_proportions,
};
