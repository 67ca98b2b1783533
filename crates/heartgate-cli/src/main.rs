//! Heartgate CLI - validation gate for cleaned heart-disease datasets.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    let result = match cli.command {
        Commands::Validate {
            file,
            config,
            tolerance,
            pps_threshold,
            correlation_threshold,
            skip_audit,
            strict,
            json,
        } => commands::validate::run(
            commands::validate::ValidateArgs {
                file,
                config,
                tolerance,
                pps_threshold,
                correlation_threshold,
                skip_audit,
                strict,
                json,
            },
            cli.verbose,
        ),

        Commands::Catalogue { json } => commands::catalogue::run(json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for report lines and JSON.
fn init_tracing(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
