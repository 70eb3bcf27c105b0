use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to access artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("No measurements to plot for {0}")]
    EmptySeries(String),
}
