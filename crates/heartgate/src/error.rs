//! Error types for the heartgate library.

use std::path::PathBuf;
use thiserror::Error;

use crate::audit::AuditScores;

/// Main error type for heartgate operations.
///
/// Only fatal conditions live here. Schema sections record their failures in
/// the [`ValidationReport`](crate::ValidationReport) instead of raising.
#[derive(Debug, Error)]
pub enum HeartgateError {
    /// Error reading or accessing a file.
    #[error("Error reading the CSV file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library (ragged rows, bad quoting, invalid UTF-8).
    #[error("Error reading the CSV file: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or missing header row.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// A schema section failed, surfaced through `ValidationReport::into_result`.
    #[error("Schema violation in section '{section}': {reason}")]
    SchemaViolation { section: String, reason: String },

    /// A feature predicts the label too well.
    #[error(
        "Feature-Label correlation exceeds the acceptable threshold: \
         '{feature}' has predictive power score {score:.3} (threshold {threshold})"
    )]
    FeatureLabelCorrelation {
        feature: String,
        score: f64,
        threshold: f64,
        /// Feature-label scores behind the breach.
        scores: Box<AuditScores>,
    },

    /// Two features are associated too strongly.
    #[error(
        "Anomalous correlations between features found: \
         '{left}' and '{right}' have association {score:.3} (threshold {threshold})"
    )]
    FeatureFeatureCorrelation {
        left: String,
        right: String,
        score: f64,
        threshold: f64,
        /// Both score tables behind the breach.
        scores: Box<AuditScores>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HeartgateError {
    /// True for errors raised while loading the input file.
    pub fn is_file_read(&self) -> bool {
        matches!(
            self,
            HeartgateError::Io { .. } | HeartgateError::Csv(_) | HeartgateError::EmptyData(_)
        )
    }

    /// True for the two fatal correlation-audit breaches.
    pub fn is_correlation_breach(&self) -> bool {
        matches!(
            self,
            HeartgateError::FeatureLabelCorrelation { .. }
                | HeartgateError::FeatureFeatureCorrelation { .. }
        )
    }

    /// Audit scores carried by a correlation breach.
    pub fn audit_scores(&self) -> Option<&AuditScores> {
        match self {
            HeartgateError::FeatureLabelCorrelation { scores, .. }
            | HeartgateError::FeatureFeatureCorrelation { scores, .. } => Some(scores),
            _ => None,
        }
    }
}

/// Result type alias for heartgate operations.
pub type Result<T> = std::result::Result<T, HeartgateError>;
