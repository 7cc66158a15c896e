//! Microgrid simulator entry point: CLI wiring, logging and reporting.

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use microgrid_sim::cli::Args;
use microgrid_sim::io::export::export_csv;
use microgrid_sim::runner::{RunError, run_scenario};

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(args.quiet);

    let scenario = match args.scenario_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let outcome = match run_scenario(&scenario, args.profile.as_deref()) {
        Ok(outcome) => outcome,
        Err(RunError::Invalid(errors)) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&outcome.report()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: failed to serialize report: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{}", outcome.summary);
        println!("\n{}", outcome.costs);
    }

    if let Some(ref path) = args.flows_out {
        if let Err(e) = export_csv(&outcome.records, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        info!(path = %path.display(), rows = outcome.records.len(), "flow table written");
    }
}
