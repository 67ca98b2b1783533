//! Correlation audit: label leakage and collinear features.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

use super::association::{AssociationMethod, correlation_ratio, cramers_v, spearman};
use super::pps::{FeatureValues, PpsSettings, predictive_power_score};
use crate::error::{HeartgateError, Result};
use crate::input::DataTable;
use crate::schema::{Catalogue, ColumnType, parse_integer, parse_number};

/// Settings for the correlation audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Run the audit at all.
    pub enabled: bool,
    /// Predictive power score at or above which a feature leaks the label.
    pub pps_threshold: f64,
    /// Pairwise association at or above which two features are collinear.
    pub correlation_threshold: f64,
    /// Cross-validation folds for the predictive power score.
    pub cv_folds: usize,
    /// Depth limit of the numeric decision tree.
    pub max_tree_depth: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pps_threshold: 0.9,
            correlation_threshold: 0.9,
            cv_folds: 4,
            max_tree_depth: 8,
        }
    }
}

impl AuditConfig {
    /// Reject thresholds outside (0, 1] and fewer than two folds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("pps_threshold", self.pps_threshold),
            ("correlation_threshold", self.correlation_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(HeartgateError::Config(format!(
                    "{} must be within (0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.cv_folds < 2 {
            return Err(HeartgateError::Config(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.max_tree_depth == 0 {
            return Err(HeartgateError::Config(
                "max_tree_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn pps_settings(&self) -> PpsSettings {
        PpsSettings {
            folds: self.cv_folds,
            max_depth: self.max_tree_depth,
        }
    }
}

/// Predictive power of one feature for the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLabelScore {
    pub feature: String,
    pub score: f64,
}

/// Association between two features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePairScore {
    pub left: String,
    pub right: String,
    pub method: AssociationMethod,
    pub score: f64,
}

/// Full score tables of one audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditScores {
    pub feature_label: Vec<FeatureLabelScore>,
    pub feature_feature: Vec<FeaturePairScore>,
}

impl AuditScores {
    /// Highest feature-label score.
    pub fn max_feature_label(&self) -> Option<&FeatureLabelScore> {
        self.feature_label
            .iter()
            .reduce(|best, s| if s.score > best.score { s } else { best })
    }

    /// Highest pairwise score.
    pub fn max_feature_feature(&self) -> Option<&FeaturePairScore> {
        self.feature_feature
            .iter()
            .reduce(|best, s| if s.score > best.score { s } else { best })
    }
}

struct Feature {
    name: String,
    values: FeatureValues,
}

/// Scores features against the label and against each other.
pub struct CorrelationAuditor {
    config: AuditConfig,
}

impl CorrelationAuditor {
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Predictive power score of every feature for the label column.
    ///
    /// Empty when the label column is absent.
    pub fn feature_label_scores(
        &self,
        table: &DataTable,
        catalogue: &Catalogue,
    ) -> Vec<FeatureLabelScore> {
        let Some(labels) = label_codes(table, &catalogue.label) else {
            return Vec::new();
        };

        features(table, catalogue)
            .into_iter()
            .map(|feature| {
                let score =
                    predictive_power_score(&feature.values, &labels, self.config.pps_settings());
                debug!(feature = %feature.name, score, "Predictive power score");
                FeatureLabelScore {
                    feature: feature.name,
                    score,
                }
            })
            .collect()
    }

    /// Association of every unordered feature pair, in header order.
    pub fn feature_feature_scores(
        &self,
        table: &DataTable,
        catalogue: &Catalogue,
    ) -> Vec<FeaturePairScore> {
        let features = features(table, catalogue);
        let mut scores = Vec::new();

        for (i, left) in features.iter().enumerate() {
            for right in &features[i + 1..] {
                let (method, score) = associate(&left.values, &right.values);
                debug!(left = %left.name, right = %right.name, ?method, score, "Association");
                scores.push(FeaturePairScore {
                    left: left.name.clone(),
                    right: right.name.clone(),
                    method,
                    score,
                });
            }
        }

        scores
    }

    /// Both score tables, without applying thresholds.
    pub fn scores(&self, table: &DataTable, catalogue: &Catalogue) -> AuditScores {
        AuditScores {
            feature_label: self.feature_label_scores(table, catalogue),
            feature_feature: self.feature_feature_scores(table, catalogue),
        }
    }

    /// Run the audit, failing on the first breached check.
    ///
    /// Feature-label leakage is checked first; the pairwise check only runs
    /// when no feature leaks the label. A breach error carries the scores
    /// computed up to that point.
    #[instrument(skip(self, table, catalogue), fields(rows = table.row_count()))]
    pub fn audit(&self, table: &DataTable, catalogue: &Catalogue) -> Result<AuditScores> {
        if table.column_index(&catalogue.label).is_none() {
            warn!(label = %catalogue.label, "Label column missing; skipping correlation audit");
            return Ok(AuditScores::default());
        }

        let feature_label = self.feature_label_scores(table, catalogue);
        let worst = feature_label
            .iter()
            .filter(|s| s.score >= self.config.pps_threshold)
            .reduce(|best, s| if s.score > best.score { s } else { best });
        if let Some(worst) = worst {
            error!(
                feature = %worst.feature,
                score = worst.score,
                "Feature-label correlation breach"
            );
            return Err(HeartgateError::FeatureLabelCorrelation {
                feature: worst.feature.clone(),
                score: worst.score,
                threshold: self.config.pps_threshold,
                scores: Box::new(AuditScores {
                    feature_label,
                    feature_feature: Vec::new(),
                }),
            });
        }

        let feature_feature = self.feature_feature_scores(table, catalogue);
        let worst = feature_feature
            .iter()
            .filter(|s| s.score >= self.config.correlation_threshold)
            .reduce(|best, s| if s.score > best.score { s } else { best });
        if let Some(worst) = worst {
            error!(
                left = %worst.left,
                right = %worst.right,
                score = worst.score,
                "Feature-feature correlation breach"
            );
            return Err(HeartgateError::FeatureFeatureCorrelation {
                left: worst.left.clone(),
                right: worst.right.clone(),
                score: worst.score,
                threshold: self.config.correlation_threshold,
                scores: Box::new(AuditScores {
                    feature_label,
                    feature_feature,
                }),
            });
        }

        Ok(AuditScores {
            feature_label,
            feature_feature,
        })
    }
}

impl Default for CorrelationAuditor {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

/// Label cells coded by sorted integer value.
///
/// Cells are read the way the class-balance section reads them, so `1` and
/// `1.0` are the same class. Cells that are not integers count as null.
fn label_codes(table: &DataTable, label: &str) -> Option<Vec<Option<usize>>> {
    let values: Vec<Option<i64>> = table
        .column_by_name(label)?
        .iter()
        .map(|c| {
            let c = c.trim();
            if DataTable::is_null_value(c) {
                None
            } else {
                parse_integer(c)
            }
        })
        .collect();

    let levels: Vec<i64> = values
        .iter()
        .flatten()
        .copied()
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect();

    Some(
        values
            .iter()
            .map(|v| v.and_then(|v| levels.binary_search(&v).ok()))
            .collect(),
    )
}

/// Every non-label column, typed by the catalogue or by its contents.
fn features(table: &DataTable, catalogue: &Catalogue) -> Vec<Feature> {
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, name)| **name != catalogue.label)
        .map(|(index, name)| {
            let cells: Vec<&str> = table.column_values(index).map(str::trim).collect();
            let categorical = match catalogue.get(name) {
                Some(rule) => rule.column_type == ColumnType::String,
                None => cells
                    .iter()
                    .any(|c| !DataTable::is_null_value(c) && parse_number(c).is_none()),
            };

            let values = if categorical {
                FeatureValues::Categorical(category_codes(&cells))
            } else {
                FeatureValues::Numeric(
                    cells
                        .iter()
                        .map(|c| {
                            if DataTable::is_null_value(c) {
                                None
                            } else {
                                parse_number(c)
                            }
                        })
                        .collect(),
                )
            };

            Feature {
                name: name.clone(),
                values,
            }
        })
        .collect()
}

fn category_codes(cells: &[&str]) -> Vec<Option<usize>> {
    let mut levels: IndexMap<&str, usize> = IndexMap::new();
    cells
        .iter()
        .map(|c| {
            if DataTable::is_null_value(c) {
                None
            } else {
                let next = levels.len();
                Some(*levels.entry(*c).or_insert(next))
            }
        })
        .collect()
}

/// Pick the measure for a pair and score it over rows where both are present.
fn associate(left: &FeatureValues, right: &FeatureValues) -> (AssociationMethod, f64) {
    use FeatureValues::{Categorical, Numeric};

    match (left, right) {
        (Numeric(a), Numeric(b)) => {
            let (x, y): (Vec<f64>, Vec<f64>) = present_pairs(a, b).unzip();
            (AssociationMethod::Spearman, spearman(&x, &y))
        }
        (Categorical(a), Categorical(b)) => {
            let (x, y): (Vec<usize>, Vec<usize>) = present_pairs(a, b).unzip();
            (AssociationMethod::CramersV, cramers_v(&x, &y))
        }
        (Categorical(c), Numeric(v)) | (Numeric(v), Categorical(c)) => {
            let (x, y): (Vec<usize>, Vec<f64>) = present_pairs(c, v).unzip();
            (AssociationMethod::CorrelationRatio, correlation_ratio(&x, &y))
        }
    }
}

fn present_pairs<'a, A: Copy, B: Copy>(
    a: &'a [Option<A>],
    b: &'a [Option<B>],
) -> impl Iterator<Item = (A, B)> + 'a {
    a.iter().zip(b).filter_map(|(x, y)| Some(((*x)?, (*y)?)))
}
