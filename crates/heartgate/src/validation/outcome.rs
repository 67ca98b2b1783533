//! Section outcomes and the structured validation report.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::audit::AuditScores;
use crate::error::{HeartgateError, Result};
use crate::input::SourceMetadata;

/// One named check of the schema catalogue, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// No row is entirely null.
    EmptyRows,
    /// Null rates within each column's ceiling.
    Missingness,
    /// Columns present and coercible to their declared type.
    ColumnTypes,
    /// No two rows identical.
    Duplicates,
    /// Numeric values within their declared bounds.
    NumericRange,
    /// Categorical values within their enumerated levels.
    CategoryLevels,
    /// Label classes balanced within tolerance.
    ClassBalance,
}

impl Section {
    /// All sections in evaluation order.
    pub const ALL: [Section; 7] = [
        Section::EmptyRows,
        Section::Missingness,
        Section::ColumnTypes,
        Section::Duplicates,
        Section::NumericRange,
        Section::CategoryLevels,
        Section::ClassBalance,
    ];

    /// Stable snake_case identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Section::EmptyRows => "empty_rows",
            Section::Missingness => "missingness",
            Section::ColumnTypes => "column_types",
            Section::Duplicates => "duplicates",
            Section::NumericRange => "numeric_range",
            Section::CategoryLevels => "category_levels",
            Section::ClassBalance => "class_balance",
        }
    }

    /// What a passing section reports.
    pub fn pass_description(&self) -> &'static str {
        match self {
            Section::EmptyRows => "No empty observations found",
            Section::Missingness => "No missingness beyond expected threshold",
            Section::ColumnTypes => "All columns have correct data types",
            Section::Duplicates => "No duplicates found",
            Section::NumericRange => "No outliers found",
            Section::CategoryLevels => "All categorical mappings are correct",
            Section::ClassBalance => "Class proportions are as expected",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a single section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail {
        reason: String,
        /// Sample of offending 1-based data row numbers, when rows are to blame.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sample_rows: Vec<usize>,
    },
}

impl Outcome {
    /// A failure without row evidence.
    pub fn fail(reason: impl Into<String>) -> Self {
        Outcome::Fail {
            reason: reason.into(),
            sample_rows: Vec::new(),
        }
    }

    /// A failure pointing at specific 0-based row indices.
    pub fn fail_rows(reason: impl Into<String>, rows: &[usize]) -> Self {
        Outcome::Fail {
            reason: reason.into(),
            sample_rows: rows.iter().take(5).map(|r| r + 1).collect(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }
}

/// A section paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutcome {
    pub section: Section,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl SectionOutcome {
    pub fn new(section: Section, outcome: Outcome) -> Self {
        Self { section, outcome }
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_pass()
    }

    /// Failure reason, if the section failed.
    pub fn reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Pass => None,
            Outcome::Fail { reason, .. } => Some(reason),
        }
    }

    /// Console line for this outcome.
    pub fn line(&self) -> String {
        match &self.outcome {
            Outcome::Pass => format!("Validation passed: {}.", self.section.pass_description()),
            Outcome::Fail { reason, .. } => format!("Validation failed: {}.", reason),
        }
    }
}

/// Everything one validation call found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Metadata about the validated input.
    pub source: SourceMetadata,
    /// One outcome per section, in evaluation order.
    pub sections: Vec<SectionOutcome>,
    /// Correlation audit scores, when the audit ran and passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditScores>,
}

impl ValidationReport {
    pub fn new(source: SourceMetadata, sections: Vec<SectionOutcome>) -> Self {
        Self {
            source,
            sections,
            audit: None,
        }
    }

    /// Attach the scores of a passed correlation audit.
    pub fn with_audit(mut self, scores: AuditScores) -> Self {
        self.audit = Some(scores);
        self
    }

    /// True when every section passed.
    pub fn passed(&self) -> bool {
        self.sections.iter().all(|s| s.passed())
    }

    /// Sections that failed, in order.
    pub fn failures(&self) -> impl Iterator<Item = &SectionOutcome> {
        self.sections.iter().filter(|s| !s.passed())
    }

    /// Outcome of one section.
    pub fn section(&self, section: Section) -> Option<&SectionOutcome> {
        self.sections.iter().find(|s| s.section == section)
    }

    /// Console lines for all sections.
    pub fn lines(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.line()).collect()
    }

    /// Turn the first failed section into an error.
    pub fn into_result(self) -> Result<Self> {
        let first = self
            .failures()
            .next()
            .map(|s| (s.section, s.reason().unwrap_or_default().to_string()));

        match first {
            Some((section, reason)) => Err(HeartgateError::SchemaViolation {
                section: section.name().to_string(),
                reason,
            }),
            None => Ok(self),
        }
    }
}
