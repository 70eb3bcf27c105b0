use crate::{
    config::{BenchConfig, ConnectionConfig},
    database::{ConnectionAdapters, ConnectionError},
    generator::{populate, GenerateError, Generator},
    harness::Harness,
    schema,
};
use idxbench_analysis::{chart, Measurement, PlanWriter, ReportError, TimingLog};
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Results of one index case across all volume tiers of a session
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSeries {
    pub case: String,
    pub measurements: Vec<Measurement>,
}

/// Full benchmark: prepare the database, then generate and measure every
/// volume tier, and finally render the charts.
pub fn run(config: &BenchConfig) -> Result<Vec<CaseSeries>, SessionError> {
    schema::ensure_database(&config.database)?;

    let mut connection = ConnectionAdapters::load(&config.database)?;
    let result = run_with(&mut connection, config);
    let closed = connection.close();

    let series = result?;
    closed?;

    Ok(series)
}

#[instrument(skip_all, fields(backend = %connection.dialect()), level = "info")]
pub fn run_with(
    connection: &mut ConnectionAdapters,
    config: &BenchConfig,
) -> Result<Vec<CaseSeries>, SessionError> {
    schema::reset_schema(connection)?;

    let timings = TimingLog::new(config.timings_dir())?;
    let plans = PlanWriter::new(config.plans_dir())?;
    let mut generator = Generator::new(config.seed);
    let mut series = config
        .cases
        .iter()
        .map(|case| CaseSeries {
            case: case.name.clone(),
            measurements: Vec::new(),
        })
        .collect::<Vec<_>>();

    for (tier, volume) in config.volumes.iter().enumerate() {
        info!(
            customers = volume.customers,
            orders = volume.orders,
            "Volume tier {}/{}",
            tier + 1,
            config.volumes.len()
        );

        populate(
            connection,
            &mut generator,
            volume.customers,
            volume.orders,
            config.batch_size,
        )?;

        let mut harness = Harness::new(connection, config.runs, &timings, &plans);
        for (case, results) in config.cases.iter().zip(series.iter_mut()) {
            if let Some(measurement) = harness.measure(case, volume) {
                results.measurements.push(measurement);
            }
        }
    }

    report(&series, &config.charts_dir())?;

    Ok(series)
}

/// render the charts of every case with at least one measurement
fn report(series: &[CaseSeries], dir: &Path) -> Result<(), ReportError> {
    for CaseSeries { case, measurements } in series.iter() {
        if measurements.is_empty() {
            warn!(case = %case, "No measurement, skipping charts");
            continue;
        }

        chart::plot(measurements, case, dir)?;
    }

    Ok(())
}

/// the database is described without its credentials
pub fn describe(config: &ConnectionConfig) -> String {
    match config {
        ConnectionConfig::MySQL {
            host,
            port,
            user,
            database,
            ..
        } => format!("mysql://{user}@{host}:{port}/{database}"),
        ConnectionConfig::SQLite { path } => format!("sqlite://{}", path.display()),
    }
}
