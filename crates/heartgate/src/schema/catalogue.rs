//! The rule catalogue for the cleaned heart-disease table.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::column::ColumnRule;
use super::types::ColumnType;

const CHEST_PAIN_TYPES: &[&str] = &[
    "typical angina",
    "atypical angina",
    "non-anginal pain",
    "asymptomatic",
];
const REST_ECG: &[&str] = &[
    "normal",
    "ST-T wave abnormality",
    "left ventricular hypertrophy",
];
const SLOPES: &[&str] = &["upsloping", "flat", "downsloping"];
const THALASSEMIA: &[&str] = &["normal", "fixed defect", "reversable defect"];
const BINARY: &[&str] = &["0", "1"];

static HEART_DISEASE: Lazy<Catalogue> = Lazy::new(|| Catalogue {
    columns: vec![
        ColumnRule::new("age", ColumnType::Integer).with_range(0.0, 120.0),
        ColumnRule::new("sex", ColumnType::Integer).with_levels(BINARY),
        ColumnRule::new("chest_pain_type", ColumnType::String).with_levels(CHEST_PAIN_TYPES),
        ColumnRule::new("resting_blood_pressure", ColumnType::Integer).with_range(70.0, 200.0),
        ColumnRule::new("cholesterol", ColumnType::Integer).with_range(100.0, 600.0),
        ColumnRule::new("fasting_blood_sugar", ColumnType::Integer).with_levels(BINARY),
        ColumnRule::new("rest_ecg", ColumnType::String).with_levels(REST_ECG),
        ColumnRule::new("max_heart_rate", ColumnType::Integer).with_range(60.0, 220.0),
        ColumnRule::new("exercise_induced_angina", ColumnType::String).with_levels(&["no", "yes"]),
        ColumnRule::new("st_depression", ColumnType::Float).with_max_null_rate(1.0),
        ColumnRule::new("slope", ColumnType::String).with_levels(SLOPES),
        ColumnRule::new("num_of_vessels", ColumnType::Float)
            .with_range(0.0, 4.0)
            .with_max_null_rate(0.05),
        ColumnRule::new("thalassemia", ColumnType::String)
            .with_levels(THALASSEMIA)
            .with_max_null_rate(0.05),
        ColumnRule::new("diagnosis", ColumnType::Integer).with_levels(BINARY),
    ],
    label: "diagnosis".to_string(),
    range_columns: to_strings(&[
        "age",
        "resting_blood_pressure",
        "cholesterol",
        "max_heart_rate",
        "fasting_blood_sugar",
    ]),
    category_columns: to_strings(&[
        "chest_pain_type",
        "fasting_blood_sugar",
        "rest_ecg",
        "exercise_induced_angina",
        "slope",
        "thalassemia",
        "diagnosis",
    ]),
});

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Ordered column rules plus the column lists each domain section covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalogue {
    /// Rules in canonical column order.
    pub columns: Vec<ColumnRule>,
    /// Binary label column.
    pub label: String,
    /// Columns checked by the numeric-range section.
    pub range_columns: Vec<String>,
    /// Columns checked by the category-level section.
    pub category_columns: Vec<String>,
}

impl Catalogue {
    /// The canonical catalogue for the cleaned heart-disease dataset.
    pub fn heart_disease() -> Self {
        HEART_DISEASE.clone()
    }

    /// Get a rule by column name.
    pub fn get(&self, name: &str) -> Option<&ColumnRule> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All declared column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Rules for the numeric-range section, in catalogue order of the list.
    pub fn range_rules(&self) -> impl Iterator<Item = &ColumnRule> {
        self.range_columns.iter().filter_map(|name| self.get(name))
    }

    /// Rules for the category-level section.
    pub fn category_rules(&self) -> impl Iterator<Item = &ColumnRule> {
        self.category_columns.iter().filter_map(|name| self.get(name))
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::heart_disease()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Domain;

    #[test]
    fn test_canonical_columns() {
        let catalogue = Catalogue::heart_disease();
        assert_eq!(catalogue.columns.len(), 14);
        assert_eq!(catalogue.column_names()[0], "age");
        assert_eq!(catalogue.column_names()[13], "diagnosis");
        assert_eq!(catalogue.label, "diagnosis");
    }

    #[test]
    fn test_nullable_columns() {
        let catalogue = Catalogue::heart_disease();
        let nullable: Vec<_> = catalogue
            .columns
            .iter()
            .filter(|c| c.nullable())
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(nullable, vec!["st_depression", "num_of_vessels", "thalassemia"]);
        assert_eq!(catalogue.get("thalassemia").unwrap().max_null_rate, 0.05);
    }

    #[test]
    fn test_section_columns_resolve() {
        let catalogue = Catalogue::heart_disease();
        assert_eq!(catalogue.range_rules().count(), 5);
        assert_eq!(catalogue.category_rules().count(), 7);
        assert_eq!(
            catalogue.get("cholesterol").unwrap().domain,
            Some(Domain::Range { min: 100.0, max: 600.0 })
        );
    }

    #[test]
    fn test_catalogue_json_round_trip() {
        let catalogue = Catalogue::heart_disease();
        let json = serde_json::to_string(&catalogue).unwrap();
        let restored: Catalogue = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, catalogue);
    }
}
