//! Catalogue command - print the column rules.

use colored::Colorize;
use heartgate::{Catalogue, Section};

pub fn run(json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalogue = Catalogue::heart_disease();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&catalogue)?);
        return Ok(());
    }

    println!("{}", "Column catalogue".cyan().bold());
    println!();
    println!(
        "  {:<26} {:<8} {:<10} {}",
        "column".bold(),
        "type".bold(),
        "max nulls".bold(),
        "domain".bold()
    );

    for rule in &catalogue.columns {
        let domain = rule
            .domain
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let name = if rule.name == catalogue.label {
            format!("{} (label)", rule.name)
        } else {
            rule.name.clone()
        };

        println!(
            "  {:<26} {:<8} {:<10} {}",
            name.white(),
            rule.column_type.to_string(),
            format!("{:.0}%", rule.max_null_rate * 100.0),
            domain.dimmed()
        );
    }

    println!();
    println!("{}", "Sections:".yellow().bold());
    for (i, section) in Section::ALL.iter().enumerate() {
        println!("  {}. {:<16} {}", i + 1, section.name(), section.pass_description());
    }

    Ok(())
}
