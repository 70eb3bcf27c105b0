mod cases;
mod config;
mod database;
mod generator;
mod harness;
mod schema;
mod session;

use clap::Parser;
use config::{BenchConfig, Cli};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // a missing .env is fine, the environment may be set up otherwise
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match BenchConfig::load(&cli) {
        Ok(config) => config,
        Err(error) => {
            error!(error = ?error, "Failed to load config: {error}");
            return ExitCode::FAILURE;
        }
    };

    if config.preflight_checks() {
        error!("Config contains errors, aborting");
        return ExitCode::FAILURE;
    }

    info!(
        database = %session::describe(&config.database),
        volumes = config.volumes.len(),
        cases = config.cases.len(),
        runs = config.runs,
        "Starting index benchmark"
    );

    match session::run(&config) {
        Ok(series) => {
            let measured = series
                .iter()
                .filter(|series| !series.measurements.is_empty())
                .count();
            info!(
                "Benchmark finished, {measured} of {} cases measured, results in {:?}",
                series.len(),
                config.output
            );

            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = ?error, "Benchmark aborted: {error}");

            ExitCode::FAILURE
        }
    }
}
