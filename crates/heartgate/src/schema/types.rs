//! Core type definitions for the rule catalogue.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declared data type for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Text labels.
    String,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    /// Whether a single non-null cell can be coerced to this type.
    ///
    /// Integers written with a zero fraction (`1.0`) are accepted.
    pub fn coerces(&self, value: &str) -> bool {
        let trimmed = value.trim();
        match self {
            ColumnType::Integer => parse_integer(trimmed).is_some(),
            ColumnType::Float => parse_number(trimmed).is_some(),
            ColumnType::String => true,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

/// Parse a finite number.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an integer, accepting a float spelling with no fractional part.
pub fn parse_integer(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    parse_number(trimmed)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

/// Allowed values for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Domain {
    /// Numeric values must lie in `[min, max]`.
    Range { min: f64, max: f64 },
    /// Values must be one of an enumerated set.
    Set { values: Vec<String> },
}

impl Domain {
    /// Build a set domain from string literals.
    pub fn set(values: &[&str]) -> Self {
        Domain::Set {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Whether a non-null cell belongs to this domain.
    ///
    /// Set members of numeric columns compare numerically, so `1.0` matches `1`.
    pub fn admits(&self, column_type: ColumnType, value: &str) -> bool {
        let trimmed = value.trim();
        match self {
            Domain::Range { min, max } => {
                parse_number(trimmed).is_some_and(|v| v >= *min && v <= *max)
            }
            Domain::Set { values } if column_type.is_numeric() => match parse_number(trimmed) {
                Some(v) => values
                    .iter()
                    .filter_map(|allowed| parse_number(allowed))
                    .any(|allowed| allowed == v),
                None => false,
            },
            Domain::Set { values } => values.iter().any(|allowed| allowed == trimmed),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Range { min, max } => write!(f, "[{}, {}]", min, max),
            Domain::Set { values } => write!(f, "{{{}}}", values.join(", ")),
        }
    }
}
