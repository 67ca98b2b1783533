//! The seven schema sections and the engine that runs them in order.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::input::DataTable;
use crate::schema::{Catalogue, ColumnRule, ColumnType, parse_integer, parse_number};

use super::outcome::{Outcome, Section, SectionOutcome};
use super::proportions::{DEFAULT_TOLERANCE, check_proportions};

/// A single schema section.
pub trait SectionCheck {
    /// Which section this check reports as.
    fn section(&self) -> Section;

    /// Evaluate the table. Never raises; problems become `Outcome::Fail`.
    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome;
}

/// Join per-column problems into one failure, or pass when there are none.
fn collect(problems: Vec<String>, rows: Vec<usize>) -> Outcome {
    if problems.is_empty() {
        Outcome::Pass
    } else {
        Outcome::fail_rows(problems.join("; "), &rows)
    }
}

fn not_in_dataframe(name: &str) -> String {
    format!("column '{}' not in dataframe", name)
}

/// Rows breaking a column rule.
#[derive(Debug, Default)]
struct RuleViolations {
    /// Nulls counted against the rule.
    nulls: Vec<usize>,
    /// Non-null cells outside the domain, with their text.
    outside: Vec<(usize, String)>,
}

impl RuleViolations {
    fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.nulls.iter().copied().chain(self.outside.iter().map(|(r, _)| *r))
    }

    /// Distinct offending values, first few only.
    fn sample_values(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for (_, value) in &self.outside {
            if !seen.contains(&value.as_str()) {
                seen.push(value);
            }
            if seen.len() == 3 {
                break;
            }
        }
        seen
    }
}

/// Apply a rule's domain to one column.
///
/// Nulls are skipped in nullable columns when `skip_nulls` is set and count
/// as violations otherwise.
fn rule_violations(
    table: &DataTable,
    index: usize,
    rule: &ColumnRule,
    skip_nulls: bool,
) -> RuleViolations {
    let mut violations = RuleViolations::default();

    for (row_idx, value) in table.column_values(index).enumerate() {
        if DataTable::is_null_value(value) {
            if !(skip_nulls && rule.nullable()) {
                violations.nulls.push(row_idx);
            }
        } else if !rule.admits(value) {
            violations.outside.push((row_idx, value.trim().to_string()));
        }
    }

    violations
}

/// Domain problems for a list of rules, shared by the range and level sections.
fn domain_section<'a>(
    table: &DataTable,
    rules: impl Iterator<Item = &'a ColumnRule>,
    skip_nulls: bool,
    describe: impl Fn(&ColumnRule, &RuleViolations) -> String,
) -> Outcome {
    let mut problems = Vec::new();
    let mut rows = Vec::new();

    for rule in rules {
        let Some(index) = table.column_index(&rule.name) else {
            problems.push(not_in_dataframe(&rule.name));
            continue;
        };

        let violations = rule_violations(table, index, rule, skip_nulls);
        if !violations.nulls.is_empty() {
            problems.push(format!(
                "Column '{}' has {} null value(s)",
                rule.name,
                violations.nulls.len()
            ));
        }
        if !violations.outside.is_empty() {
            problems.push(describe(rule, &violations));
        }
        rows.extend(violations.rows());
    }

    rows.sort_unstable();
    rows.dedup();
    collect(problems, rows)
}

fn domain_text(rule: &ColumnRule) -> String {
    rule.domain
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default()
}

/// Section 1: no row may be null in every field.
pub struct EmptyRowsCheck;

impl SectionCheck for EmptyRowsCheck {
    fn section(&self) -> Section {
        Section::EmptyRows
    }

    fn check(&self, table: &DataTable, _catalogue: &Catalogue) -> Outcome {
        let empty: Vec<usize> = (0..table.row_count())
            .filter(|&row| table.row_is_empty(row))
            .collect();

        if empty.is_empty() {
            Outcome::Pass
        } else {
            Outcome::fail_rows(
                format!("Empty rows found ({} row(s) with every field null)", empty.len()),
                &empty,
            )
        }
    }
}

/// Section 2: null rates within each column's ceiling, plus the domains of
/// the nullable columns.
pub struct MissingnessCheck;

impl SectionCheck for MissingnessCheck {
    fn section(&self) -> Section {
        Section::Missingness
    }

    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome {
        let mut problems = Vec::new();
        let mut rows = Vec::new();

        for rule in &catalogue.columns {
            let Some(index) = table.column_index(&rule.name) else {
                problems.push(not_in_dataframe(&rule.name));
                continue;
            };

            let violations = rule_violations(table, index, rule, true);

            if !rule.nullable() {
                if !violations.nulls.is_empty() {
                    problems.push(format!(
                        "Column '{}' contains {} null value(s)",
                        rule.name,
                        violations.nulls.len()
                    ));
                    rows.extend(violations.nulls.iter().copied());
                }
                continue;
            }

            let null_count = table
                .column_values(index)
                .filter(|v| DataTable::is_null_value(v))
                .count();
            let rate = if table.row_count() == 0 {
                0.0
            } else {
                null_count as f64 / table.row_count() as f64
            };

            if rate > rule.max_null_rate {
                problems.push(format!(
                    "Too many null values in '{}' column ({:.1}% null, at most {:.1}% allowed)",
                    rule.name,
                    rate * 100.0,
                    rule.max_null_rate * 100.0
                ));
            }

            if !violations.outside.is_empty() {
                problems.push(format!(
                    "Column '{}' has {} value(s) outside {}: {:?}",
                    rule.name,
                    violations.outside.len(),
                    domain_text(rule),
                    violations.sample_values()
                ));
                rows.extend(violations.outside.iter().map(|(r, _)| *r));
            }
        }

        rows.sort_unstable();
        rows.dedup();
        collect(problems, rows)
    }
}

/// Section 3: every declared column present and coercible to its type.
pub struct ColumnTypesCheck;

impl ColumnTypesCheck {
    fn type_problem(
        table: &DataTable,
        index: usize,
        rule: &ColumnRule,
    ) -> Option<(String, Vec<usize>)> {
        let values: Vec<(usize, &str)> = table
            .column_values(index)
            .enumerate()
            .filter(|(_, v)| !DataTable::is_null_value(v))
            .collect();

        match rule.column_type {
            ColumnType::String => {
                // A label column made only of numbers was never relabeled.
                let all_numeric =
                    !values.is_empty() && values.iter().all(|(_, v)| parse_number(v).is_some());
                all_numeric.then(|| {
                    (
                        format!(
                            "expected series '{}' to have type string, found numeric codes",
                            rule.name
                        ),
                        Vec::new(),
                    )
                })
            }
            column_type => {
                let bad: Vec<usize> = values
                    .iter()
                    .filter(|(_, v)| !column_type.coerces(v))
                    .map(|(r, _)| *r)
                    .collect();
                (!bad.is_empty()).then(|| {
                    (
                        format!(
                            "expected series '{}' to have type {}, {} value(s) cannot be coerced",
                            rule.name,
                            column_type,
                            bad.len()
                        ),
                        bad,
                    )
                })
            }
        }
    }
}

impl SectionCheck for ColumnTypesCheck {
    fn section(&self) -> Section {
        Section::ColumnTypes
    }

    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome {
        let mut problems = Vec::new();
        let mut rows = Vec::new();

        for rule in &catalogue.columns {
            match table.column_index(&rule.name) {
                None => problems.push(not_in_dataframe(&rule.name)),
                Some(index) => {
                    if let Some((problem, bad_rows)) = Self::type_problem(table, index, rule) {
                        problems.push(problem);
                        rows.extend(bad_rows);
                    }
                }
            }
        }

        rows.sort_unstable();
        rows.dedup();
        collect(problems, rows)
    }
}

/// Section 4: no two rows identical across all columns.
pub struct DuplicatesCheck;

impl DuplicatesCheck {
    /// Row key with trimmed text; every null token maps to the same `None`.
    fn row_key(row: &[String]) -> Vec<Option<&str>> {
        row.iter()
            .map(|v| (!DataTable::is_null_value(v)).then(|| v.trim()))
            .collect()
    }
}

impl SectionCheck for DuplicatesCheck {
    fn section(&self) -> Section {
        Section::Duplicates
    }

    fn check(&self, table: &DataTable, _catalogue: &Catalogue) -> Outcome {
        let mut groups: IndexMap<Vec<Option<&str>>, Vec<usize>> = IndexMap::new();
        for (row_idx, row) in table.rows.iter().enumerate() {
            groups.entry(Self::row_key(row)).or_default().push(row_idx);
        }

        let repeats: Vec<usize> = groups
            .values()
            .filter(|rows| rows.len() > 1)
            .flat_map(|rows| rows.iter().skip(1).copied())
            .collect();

        if repeats.is_empty() {
            Outcome::Pass
        } else {
            Outcome::fail_rows(
                format!(
                    "Duplicate rows found ({} row(s) repeat an earlier row)",
                    repeats.len()
                ),
                &repeats,
            )
        }
    }
}

/// Section 5: numeric columns within their declared bounds.
pub struct NumericRangeCheck;

impl SectionCheck for NumericRangeCheck {
    fn section(&self) -> Section {
        Section::NumericRange
    }

    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome {
        domain_section(table, catalogue.range_rules(), true, |rule, violations| {
            format!(
                "Column '{}' has {} value(s) outside {}: {:?}",
                rule.name,
                violations.outside.len(),
                domain_text(rule),
                violations.sample_values()
            )
        })
    }
}

/// Section 6: categorical columns within their enumerated levels. Nulls fail.
pub struct CategoryLevelsCheck;

impl SectionCheck for CategoryLevelsCheck {
    fn section(&self) -> Section {
        Section::CategoryLevels
    }

    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome {
        // A missing category is not one of the levels, even where the
        // missingness ceiling tolerates it.
        domain_section(table, catalogue.category_rules(), false, |rule, violations| {
            format!(
                "Column '{}' has {} value(s) not in the allowed set {}: {:?}",
                rule.name,
                violations.outside.len(),
                domain_text(rule),
                violations.sample_values()
            )
        })
    }
}

/// Section 7: label classes balanced within a tolerance.
pub struct ClassBalanceCheck {
    tolerance: f64,
}

impl ClassBalanceCheck {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Default for ClassBalanceCheck {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

impl SectionCheck for ClassBalanceCheck {
    fn section(&self) -> Section {
        Section::ClassBalance
    }

    fn check(&self, table: &DataTable, catalogue: &Catalogue) -> Outcome {
        let Some(index) = table.column_index(&catalogue.label) else {
            return Outcome::fail(not_in_dataframe(&catalogue.label));
        };

        let mut labels = Vec::new();
        let mut unparsed = Vec::new();
        for (row_idx, value) in table.column_values(index).enumerate() {
            if DataTable::is_null_value(value) {
                continue;
            }
            match parse_integer(value) {
                Some(label) => labels.push(label),
                None => unparsed.push(row_idx),
            }
        }

        if !unparsed.is_empty() {
            return Outcome::fail_rows(
                format!(
                    "Column '{}' has {} value(s) that are not integer labels",
                    catalogue.label,
                    unparsed.len()
                ),
                &unparsed,
            );
        }

        if check_proportions(&labels, self.tolerance) {
            Outcome::Pass
        } else {
            let share = |class: i64| {
                labels.iter().filter(|&&v| v == class).count() as f64 / labels.len() as f64 * 100.0
            };
            Outcome::fail(format!(
                "Class proportions are not balanced (0: {:.1}%, 1: {:.1}%, tolerance {})",
                share(0),
                share(1),
                self.tolerance
            ))
        }
    }
}

/// Runs every section in order without stopping on failure.
pub struct SchemaRules {
    checks: Vec<Box<dyn SectionCheck>>,
}

impl SchemaRules {
    /// The seven sections, with the given class-balance tolerance.
    pub fn new(tolerance: f64) -> Self {
        Self {
            checks: vec![
                Box::new(EmptyRowsCheck),
                Box::new(MissingnessCheck),
                Box::new(ColumnTypesCheck),
                Box::new(DuplicatesCheck),
                Box::new(NumericRangeCheck),
                Box::new(CategoryLevelsCheck),
                Box::new(ClassBalanceCheck::new(tolerance)),
            ],
        }
    }

    /// Evaluate all sections and collect their outcomes.
    pub fn evaluate(&self, table: &DataTable, catalogue: &Catalogue) -> Vec<SectionOutcome> {
        self.evaluate_with(table, catalogue, &mut |_: &SectionOutcome| {})
    }

    /// Evaluate all sections, handing each outcome to `on_section` as it is produced.
    pub fn evaluate_with(
        &self,
        table: &DataTable,
        catalogue: &Catalogue,
        on_section: &mut dyn FnMut(&SectionOutcome),
    ) -> Vec<SectionOutcome> {
        let mut outcomes = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let outcome = SectionOutcome::new(check.section(), check.check(table, catalogue));

            match outcome.reason() {
                None => debug!(section = %outcome.section, "section passed"),
                Some(reason) => warn!(section = %outcome.section, reason, "section failed"),
            }

            on_section(&outcome);
            outcomes.push(outcome);
        }

        outcomes
    }
}

impl Default for SchemaRules {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "age,sex,chest_pain_type,resting_blood_pressure,cholesterol,\
fasting_blood_sugar,rest_ecg,max_heart_rate,exercise_induced_angina,st_depression,slope,\
num_of_vessels,thalassemia,diagnosis";

    const ROWS: [&str; 7] = [
        "63,1,typical angina,145,233,1,normal,150,no,2.3,flat,2,fixed defect,1",
        "67,1,typical angina,160,286,0,normal,108,yes,3.1,downsloping,3,reversable defect,1",
        "67,1,asymptomatic,120,229,0,normal,129,no,2.2,flat,1,normal,1",
        "37,1,non-anginal pain,130,250,0,normal,187,no,3.0,upsloping,0,fixed defect,0",
        "41,0,typical angina,130,204,0,normal,172,yes,1.5,upsloping,0,fixed defect,1",
        "56,0,atypical angina,120,236,0,normal,178,no,2.6,flat,1,reversable defect,0",
        "62,0,non-anginal pain,140,275,0,normal,148,no,2.9,downsloping,0,fixed defect,0",
    ];

    fn split(line: &str) -> Vec<String> {
        line.split(',').map(String::from).collect()
    }

    fn reference_table() -> DataTable {
        DataTable::new(split(HEADER), ROWS.iter().map(|r| split(r)).collect())
    }

    fn set_cell(table: &mut DataTable, row: usize, column: &str, value: &str) {
        let index = table.column_index(column).unwrap();
        table.rows[row][index] = value.to_string();
    }

    fn run(check: &dyn SectionCheck, table: &DataTable) -> Outcome {
        check.check(table, &Catalogue::heart_disease())
    }

    fn reason(outcome: &Outcome) -> &str {
        match outcome {
            Outcome::Fail { reason, .. } => reason,
            Outcome::Pass => panic!("expected failure"),
        }
    }

    #[test]
    fn test_reference_table_passes_every_section() {
        let outcomes =
            SchemaRules::default().evaluate(&reference_table(), &Catalogue::heart_disease());
        assert_eq!(outcomes.len(), 7);
        for outcome in &outcomes {
            assert!(outcome.passed(), "{} failed: {:?}", outcome.section, outcome.reason());
        }
        let order: Vec<_> = outcomes.iter().map(|o| o.section).collect();
        assert_eq!(order, Section::ALL.to_vec());
    }

    #[test]
    fn test_empty_row_fails() {
        let mut table = reference_table();
        table.rows.push(vec![String::new(); 14]);
        let outcome = run(&EmptyRowsCheck, &table);
        assert!(reason(&outcome).contains("Empty rows found"));
        assert!(matches!(
            outcome,
            Outcome::Fail { ref sample_rows, .. } if sample_rows == &vec![8]
        ));
    }

    #[test]
    fn test_partially_null_row_is_not_empty() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "st_depression", "");
        assert!(run(&EmptyRowsCheck, &table).is_pass());
    }

    #[test]
    fn test_too_many_vessel_nulls() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "num_of_vessels", "");
        set_cell(&mut table, 1, "num_of_vessels", "NaN");
        let outcome = run(&MissingnessCheck, &table);
        assert!(reason(&outcome).contains("Too many null values in 'num_of_vessels' column"));
    }

    #[test]
    fn test_st_depression_may_be_null() {
        let mut table = reference_table();
        for row in 0..7 {
            set_cell(&mut table, row, "st_depression", "");
        }
        assert!(run(&MissingnessCheck, &table).is_pass());
    }

    #[test]
    fn test_required_column_null() {
        let mut table = reference_table();
        set_cell(&mut table, 2, "sex", "");
        let outcome = run(&MissingnessCheck, &table);
        assert!(reason(&outcome).contains("Column 'sex' contains 1 null value(s)"));
    }

    #[test]
    fn test_nullable_column_domain_in_missingness() {
        let mut table = reference_table();
        set_cell(&mut table, 3, "num_of_vessels", "7");
        let outcome = run(&MissingnessCheck, &table);
        assert!(reason(&outcome).contains("'num_of_vessels'"));
        assert!(reason(&outcome).contains("[0, 4]"));
    }

    #[test]
    fn test_missing_column_fails_type_check() {
        let mut table = reference_table();
        let index = table.column_index("age").unwrap();
        table.headers.remove(index);
        for row in &mut table.rows {
            row.remove(index);
        }
        let outcome = run(&ColumnTypesCheck, &table);
        assert_eq!(reason(&outcome), "column 'age' not in dataframe");
    }

    #[test]
    fn test_uncoercible_integer() {
        let mut table = reference_table();
        set_cell(&mut table, 4, "cholesterol", "high");
        let outcome = run(&ColumnTypesCheck, &table);
        assert!(reason(&outcome).contains("expected series 'cholesterol' to have type integer"));
    }

    #[test]
    fn test_numeric_codes_in_string_column() {
        let mut table = reference_table();
        for row in 0..7 {
            set_cell(&mut table, row, "slope", "2");
        }
        let outcome = run(&ColumnTypesCheck, &table);
        assert!(reason(&outcome).contains("'slope'"));
    }

    #[test]
    fn test_duplicate_rows() {
        let mut table = reference_table();
        table.rows.push(table.rows[0].clone());
        let outcome = run(&DuplicatesCheck, &table);
        assert!(reason(&outcome).contains("Duplicate rows found"));
    }

    #[test]
    fn test_null_tokens_compare_equal_for_duplicates() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "st_depression", "");
        let mut copy = table.rows[0].clone();
        copy[9] = "NA".to_string();
        table.rows.push(copy);
        assert!(!run(&DuplicatesCheck, &table).is_pass());
    }

    #[test]
    fn test_age_out_of_range() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "age", "150");
        let outcome = run(&NumericRangeCheck, &table);
        assert!(reason(&outcome).contains("Column 'age' has 1 value(s) outside [0, 120]"));
    }

    #[test]
    fn test_fasting_blood_sugar_checked_in_range_section() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "fasting_blood_sugar", "2");
        assert!(reason(&run(&NumericRangeCheck, &table)).contains("'fasting_blood_sugar'"));
    }

    #[test]
    fn test_unknown_category() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "chest_pain_type", "unknown");
        let outcome = run(&CategoryLevelsCheck, &table);
        assert!(reason(&outcome).contains("'chest_pain_type'"));
        assert!(reason(&outcome).contains("\"unknown\""));
    }

    #[test]
    fn test_thalassemia_null_fails_levels() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "thalassemia", "");
        let outcome = run(&CategoryLevelsCheck, &table);
        assert_eq!(reason(&outcome), "Column 'thalassemia' has 1 null value(s)");
    }

    #[test]
    fn test_question_mark_is_not_a_level() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "thalassemia", "?");
        let outcome = run(&CategoryLevelsCheck, &table);
        assert!(reason(&outcome).contains("'thalassemia' has 1 value(s) not in the allowed set"));
        assert!(reason(&outcome).contains("\"?\""));
    }

    #[test]
    fn test_unbalanced_labels() {
        let mut table = reference_table();
        for row in 0..7 {
            set_cell(&mut table, row, "diagnosis", "1");
        }
        let outcome = run(&ClassBalanceCheck::default(), &table);
        assert!(reason(&outcome).contains("Class proportions are not balanced"));
    }

    #[test]
    fn test_empty_table_is_balanced() {
        let table = DataTable::new(split(HEADER), Vec::new());
        assert!(run(&ClassBalanceCheck::default(), &table).is_pass());
    }

    #[test]
    fn test_missing_label_column() {
        let table = DataTable::new(vec!["age".to_string()], vec![vec!["40".to_string()]]);
        let outcome = run(&ClassBalanceCheck::default(), &table);
        assert_eq!(reason(&outcome), "column 'diagnosis' not in dataframe");
    }

    #[test]
    fn test_failures_do_not_stop_later_sections() {
        let mut table = reference_table();
        set_cell(&mut table, 0, "age", "150");
        table.rows.push(table.rows[1].clone());

        let outcomes = SchemaRules::default().evaluate(&table, &Catalogue::heart_disease());
        assert_eq!(outcomes.len(), 7);
        assert!(!outcomes[3].passed());
        assert!(!outcomes[4].passed());
        assert!(outcomes[5].passed());
    }

    #[test]
    fn test_evaluate_with_reports_each_section() {
        let mut seen = Vec::new();
        SchemaRules::default().evaluate_with(
            &reference_table(),
            &Catalogue::heart_disease(),
            &mut |outcome: &SectionOutcome| seen.push(outcome.section),
        );
        assert_eq!(seen, Section::ALL.to_vec());
    }
}
