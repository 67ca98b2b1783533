//! Correlation audit over features and the label.

mod association;
mod auditor;
mod pps;

pub use association::{
    AssociationMethod, compute_ranks, correlation_ratio, cramers_v, pearson, spearman,
};
pub use auditor::{
    AuditConfig, AuditScores, CorrelationAuditor, FeatureLabelScore, FeaturePairScore,
};
pub use pps::{FeatureValues, PpsSettings, predictive_power_score, weighted_f1};
