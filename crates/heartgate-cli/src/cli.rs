//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Heartgate: validation gate for cleaned heart-disease datasets
#[derive(Parser)]
#[command(name = "heartgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (info logs and audit score tables)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a cleaned CSV against the column catalogue
    Validate {
        /// Path to the cleaned CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Allowed deviation of each class from an even split
        #[arg(long)]
        tolerance: Option<f64>,

        /// Predictive power score that counts as label leakage
        #[arg(long)]
        pps_threshold: Option<f64>,

        /// Pairwise association that counts as collinear features
        #[arg(long)]
        correlation_threshold: Option<f64>,

        /// Skip the correlation audit
        #[arg(long)]
        skip_audit: bool,

        /// Exit with an error when any section fails
        #[arg(long)]
        strict: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the column catalogue
    Catalogue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from([
            "heartgate",
            "validate",
            "heart.csv",
            "--tolerance",
            "0.2",
            "--strict",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Validate {
                file,
                tolerance,
                strict,
                json,
                ..
            } => {
                assert_eq!(file, PathBuf::from("heart.csv"));
                assert_eq!(tolerance, Some(0.2));
                assert!(strict);
                assert!(!json);
            }
            Commands::Catalogue { .. } => panic!("expected validate"),
        }
    }

    #[test]
    fn test_parse_catalogue() {
        let cli = Cli::parse_from(["heartgate", "--debug", "catalogue", "--json"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Catalogue { json: true }));
    }
}
