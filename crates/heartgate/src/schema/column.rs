//! Per-column validation rule.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, Domain};

/// Declared expectations for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRule {
    /// Column name.
    pub name: String,
    /// Declared data type.
    pub column_type: ColumnType,
    /// Allowed values, if constrained.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub domain: Option<Domain>,
    /// Highest tolerated fraction of null cells (0.0-1.0).
    #[serde(default)]
    pub max_null_rate: f64,
}

impl ColumnRule {
    /// A required column with no domain.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            domain: None,
            max_null_rate: 0.0,
        }
    }

    /// Restrict values to a numeric range.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.domain = Some(Domain::Range { min, max });
        self
    }

    /// Restrict values to an enumerated set.
    pub fn with_levels(mut self, values: &[&str]) -> Self {
        self.domain = Some(Domain::set(values));
        self
    }

    /// Allow nulls up to the given fraction of rows.
    pub fn with_max_null_rate(mut self, rate: f64) -> Self {
        self.max_null_rate = rate;
        self
    }

    /// Whether any nulls are tolerated.
    pub fn nullable(&self) -> bool {
        self.max_null_rate > 0.0
    }

    /// Whether a non-null cell satisfies the domain (always true without one).
    pub fn admits(&self, value: &str) -> bool {
        self.domain
            .as_ref()
            .is_none_or(|d| d.admits(self.column_type, value))
    }
}
