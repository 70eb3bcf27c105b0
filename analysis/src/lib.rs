//! Statistics, artifact writers and chart rendering for index benchmarks.
//!
//! The runner feeds raw query durations into [`stats`], appends the resulting
//! [`Measurement`]s through [`TimingLog`], stores explain output through
//! [`PlanWriter`] and finally hands every finished series to [`chart::plot`].

pub mod chart;
pub mod error;
pub mod plans;
pub mod stats;
pub mod timings;

pub use error::ReportError;
pub use plans::{IndexState, PlanSnapshot, PlanWriter};
pub use stats::{improvement_percent, mean_excluding_warmup, Measurement};
pub use timings::TimingLog;
