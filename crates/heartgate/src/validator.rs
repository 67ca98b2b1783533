//! Main Validator struct and public API.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::audit::{AuditConfig, CorrelationAuditor};
use crate::error::{HeartgateError, Result};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::schema::Catalogue;
use crate::validation::{DEFAULT_TOLERANCE, SchemaRules, SectionOutcome, ValidationReport};

/// Configuration for a validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Allowed deviation of each label class from an even split.
    pub proportion_tolerance: f64,
    /// Correlation audit settings.
    pub audit: AuditConfig,
    /// Column rules to validate against.
    pub catalogue: Catalogue,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            proportion_tolerance: DEFAULT_TOLERANCE,
            audit: AuditConfig::default(),
            catalogue: Catalogue::heart_disease(),
        }
    }
}

impl ValidatorConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| HeartgateError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: ValidatorConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.proportion_tolerance.is_finite() || self.proportion_tolerance < 0.0 {
            return Err(HeartgateError::Config(format!(
                "proportion_tolerance must be a non-negative number, got {}",
                self.proportion_tolerance
            )));
        }
        self.audit.validate()
    }
}

/// Validates a cleaned heart-disease CSV.
pub struct Validator {
    config: ValidatorConfig,
    parser: Parser,
    rules: SchemaRules,
    auditor: CorrelationAuditor,
}

impl Validator {
    /// Create a validator with the canonical catalogue and thresholds.
    pub fn new() -> Self {
        Self::build(ValidatorConfig::default())
    }

    /// Create a validator with custom configuration.
    ///
    /// Fails with [`HeartgateError::Config`] when a threshold is unusable.
    pub fn with_config(config: ValidatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ValidatorConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let rules = SchemaRules::new(config.proportion_tolerance);
        let auditor = CorrelationAuditor::new(config.audit.clone());

        Self {
            config,
            parser,
            rules,
            auditor,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// The auditor used after the schema sections.
    pub fn auditor(&self) -> &CorrelationAuditor {
        &self.auditor
    }

    /// Load and validate a CSV file.
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<ValidationReport> {
        self.validate_with(path, |_: &SectionOutcome| {})
    }

    /// Load and validate a CSV file, handing each section outcome to
    /// `on_section` as soon as it is known.
    pub fn validate_with(
        &self,
        path: impl AsRef<Path>,
        mut on_section: impl FnMut(&SectionOutcome),
    ) -> Result<ValidationReport> {
        let (table, source) = self.parser.parse_file(path)?;
        info!(
            file = %source.file,
            rows = source.row_count,
            columns = source.column_count,
            hash = %source.hash,
            "Loaded dataset"
        );
        self.run(&table, source, &mut on_section)
    }

    /// Validate a table that is already in memory.
    pub fn validate_table(
        &self,
        table: &DataTable,
        source: SourceMetadata,
    ) -> Result<ValidationReport> {
        self.run(table, source, &mut |_: &SectionOutcome| {})
    }

    #[instrument(skip_all, fields(file = %source.file, rows = table.row_count()))]
    fn run(
        &self,
        table: &DataTable,
        source: SourceMetadata,
        on_section: &mut dyn FnMut(&SectionOutcome),
    ) -> Result<ValidationReport> {
        let catalogue = &self.config.catalogue;
        let sections = self.rules.evaluate_with(table, catalogue, on_section);

        let mut report = ValidationReport::new(source, sections);
        if self.config.audit.enabled {
            report = report.with_audit(self.auditor.audit(table, catalogue)?);
        } else {
            info!("Correlation audit disabled");
        }

        info!(
            passed = report.passed(),
            failures = report.failures().count(),
            "Validation finished"
        );
        Ok(report)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "age,sex,chest_pain_type,resting_blood_pressure,cholesterol,\
        fasting_blood_sugar,rest_ecg,max_heart_rate,exercise_induced_angina,st_depression,\
        slope,num_of_vessels,thalassemia,diagnosis";

    fn reference_table() -> DataTable {
        let rows = [
            "63,1,typical angina,145,233,1,normal,150,no,2.3,flat,2,fixed defect,1",
            "67,1,typical angina,160,286,0,normal,108,yes,3.1,downsloping,3,reversable defect,1",
            "67,1,asymptomatic,120,229,0,normal,129,no,2.2,flat,1,normal,1",
            "37,1,non-anginal pain,130,250,0,normal,187,no,3.0,upsloping,0,fixed defect,0",
            "41,0,typical angina,130,204,0,normal,172,yes,1.5,upsloping,0,fixed defect,1",
            "56,0,atypical angina,120,236,0,normal,178,no,2.6,flat,1,reversable defect,0",
            "62,0,non-anginal pain,140,275,0,normal,148,no,2.9,downsloping,0,fixed defect,0",
        ];
        DataTable::new(
            HEADER.split(',').map(String::from).collect(),
            rows.iter()
                .map(|r| r.split(',').map(String::from).collect())
                .collect(),
        )
    }

    fn schema_only() -> Validator {
        Validator::with_config(ValidatorConfig {
            audit: AuditConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_reference_table_passes_sections() {
        let table = reference_table();
        let report = schema_only()
            .validate_table(&table, SourceMetadata::in_memory(&table))
            .unwrap();
        assert_eq!(report.sections.len(), 7);
        assert!(report.passed(), "{:?}", report.lines());
        assert!(report.audit.is_none());
    }

    #[test]
    fn test_audit_breach_is_fatal() {
        // cholesterol and st_depression rank almost identically in this sample
        let table = reference_table();
        let err = Validator::new()
            .validate_table(&table, SourceMetadata::in_memory(&table))
            .unwrap_err();
        assert!(err.is_correlation_breach());
        assert_eq!(err.audit_scores().unwrap().feature_label.len(), 13);
    }

    #[test]
    fn test_passed_audit_scores_are_on_the_report() {
        let table = reference_table();
        let validator = Validator::with_config(ValidatorConfig {
            audit: AuditConfig {
                pps_threshold: 1.0,
                correlation_threshold: 1.0,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        let report = validator
            .validate_table(&table, SourceMetadata::in_memory(&table))
            .unwrap();

        let audit = report.audit.expect("audit ran");
        assert_eq!(audit.feature_label.len(), 13);
        assert_eq!(audit.feature_feature.len(), 13 * 12 / 2);
    }

    #[test]
    fn test_with_config_rejects_invalid_config() {
        let bad_tolerance = ValidatorConfig {
            proportion_tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            Validator::with_config(bad_tolerance),
            Err(HeartgateError::Config(_))
        ));

        let bad_threshold = ValidatorConfig {
            audit: AuditConfig {
                pps_threshold: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            Validator::with_config(bad_threshold),
            Err(HeartgateError::Config(_))
        ));
    }

    #[test]
    fn test_validate_with_reports_sections_before_audit_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for row in reference_table().rows {
            writeln!(file, "{}", row.join(",")).unwrap();
        }

        let mut seen = Vec::new();
        let result = Validator::new().validate_with(file.path(), |outcome: &SectionOutcome| {
            seen.push(outcome.line())
        });

        assert!(result.is_err());
        assert_eq!(seen.len(), 7);
        assert_eq!(seen[0], "Validation passed: No empty observations found.");
    }

    #[test]
    fn test_missing_file() {
        let err = Validator::new().validate("does/not/exist.csv").unwrap_err();
        assert!(err.is_file_read());
    }

    #[test]
    fn test_config_from_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"proportion_tolerance": 0.2, "audit": {{"pps_threshold": 0.8}}}}"#
        )
        .unwrap();

        let config = ValidatorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.proportion_tolerance, 0.2);
        assert_eq!(config.audit.pps_threshold, 0.8);
        assert_eq!(config.audit.correlation_threshold, 0.9);
        assert_eq!(config.catalogue.label, "diagnosis");
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"audit": {{"correlation_threshold": 0}}}}"#).unwrap();

        let err = ValidatorConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, HeartgateError::Config(_)));
    }
}
