//! Validate command - run the schema sections and correlation audit.

use std::path::PathBuf;

use colored::Colorize;
use heartgate::{AuditScores, SectionOutcome, Validator, ValidatorConfig};

/// Arguments of `heartgate validate`.
pub struct ValidateArgs {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub tolerance: Option<f64>,
    pub pps_threshold: Option<f64>,
    pub correlation_threshold: Option<f64>,
    pub skip_audit: bool,
    pub strict: bool,
    pub json: bool,
}

pub fn run(args: ValidateArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;
    let validator = Validator::with_config(config)?;

    if args.json {
        let report = validator.validate(&args.file)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if args.strict {
            report.into_result()?;
        }
        return Ok(());
    }

    println!(
        "{} {}",
        "Validating".cyan().bold(),
        args.file.display().to_string().white()
    );
    println!();

    let report = match validator.validate_with(&args.file, print_outcome) {
        Ok(report) => report,
        Err(err) => {
            if let (true, Some(scores)) = (verbose, err.audit_scores()) {
                print_scores(scores, &validator);
            }
            return Err(err.into());
        }
    };

    println!();
    let failed = report.failures().count();
    if failed == 0 {
        println!("{}", "All sections passed.".green().bold());
    } else {
        println!(
            "{}",
            format!("{} of {} sections failed.", failed, report.sections.len())
                .yellow()
                .bold()
        );
    }

    if let Some(scores) = &report.audit {
        println!("{}", "Correlation audit passed.".green());
        if verbose {
            print_scores(scores, &validator);
        }
    }

    if args.strict {
        report.into_result()?;
    }

    Ok(())
}

/// File values first, then command-line overrides.
fn build_config(args: &ValidateArgs) -> heartgate::Result<ValidatorConfig> {
    let mut config = match &args.config {
        Some(path) => ValidatorConfig::from_json_file(path)?,
        None => ValidatorConfig::default(),
    };

    if let Some(tolerance) = args.tolerance {
        config.proportion_tolerance = tolerance;
    }
    if let Some(threshold) = args.pps_threshold {
        config.audit.pps_threshold = threshold;
    }
    if let Some(threshold) = args.correlation_threshold {
        config.audit.correlation_threshold = threshold;
    }
    if args.skip_audit {
        config.audit.enabled = false;
    }

    config.validate()?;
    Ok(config)
}

fn print_outcome(outcome: &SectionOutcome) {
    if outcome.passed() {
        println!("  {} {}", "✓".green(), outcome.line());
    } else {
        println!("  {} {}", "✗".red(), outcome.line().red());
    }
}

fn print_scores(scores: &AuditScores, validator: &Validator) {
    let audit = &validator.config().audit;

    println!();
    println!(
        "{} (threshold {})",
        "Feature-label predictive power:".yellow().bold(),
        audit.pps_threshold
    );
    let mut feature_label: Vec<_> = scores.feature_label.iter().collect();
    feature_label.sort_by(|a, b| b.score.total_cmp(&a.score));
    for score in feature_label {
        println!("  {:<26} {}", score.feature, colored_score(score.score));
    }

    if scores.feature_feature.is_empty() {
        return;
    }
    println!();
    println!(
        "{} (threshold {})",
        "Strongest feature associations:".yellow().bold(),
        audit.correlation_threshold
    );
    let mut pairs: Vec<_> = scores.feature_feature.iter().collect();
    pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
    for pair in pairs.into_iter().take(10) {
        println!(
            "  {:<52} {} {}",
            format!("{} / {}", pair.left, pair.right),
            colored_score(pair.score),
            format!("({:?})", pair.method).dimmed()
        );
    }
}

fn colored_score(score: f64) -> colored::ColoredString {
    let text = format!("{:.3}", score);
    if score >= 0.7 {
        text.red()
    } else if score >= 0.4 {
        text.yellow()
    } else {
        text.green()
    }
}
