use clap::Parser;
use idxbench_analysis::{chart, ReportError, TimingLog};
use std::{path::PathBuf, process::ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Re-render index benchmark charts from the timing series on disk
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding one `<case>.csv` timing series per index case
    #[arg(long, default_value = "results/timings")]
    timings: PathBuf,
    /// Directory the charts are written to
    #[arg(long, default_value = "results/charts")]
    charts: PathBuf,
    /// Only render the given cases
    #[arg(long = "case")]
    cases: Vec<String>,
}

fn render(args: &Args) -> Result<usize, ReportError> {
    let log = TimingLog::new(&args.timings)?;
    let cases = if args.cases.is_empty() {
        log.cases()?
    } else {
        args.cases.clone()
    };
    let mut rendered = 0;

    for case in cases.iter() {
        let series = log.read(case)?;

        if series.is_empty() {
            warn!(case = %case, "Timing series is empty, skipping");
            continue;
        }

        chart::plot(&series, case, &args.charts)?;
        rendered += 1;
    }

    Ok(rendered)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match render(&args) {
        Ok(rendered) => {
            info!("Rendered charts for {rendered} cases into {:?}", args.charts);
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = ?error, "Failed to render charts: {error}");
            ExitCode::FAILURE
        }
    }
}
