use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One row of a timing series, i.e., the result of one index case on one volume tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub volume: String,
    #[serde(rename = "unindexed_s")]
    pub unindexed: f64,
    #[serde(rename = "indexed_s")]
    pub indexed: f64,
    #[serde(rename = "improvement_pct")]
    pub improvement: f64,
}

impl Measurement {
    pub fn new(volume: impl Into<String>, unindexed: f64, indexed: f64) -> Self {
        Self {
            volume: volume.into(),
            unindexed,
            indexed,
            improvement: improvement_percent(unindexed, indexed),
        }
    }
}

/// Mean in seconds over every sample except the first one.
///
/// Returns `None` when there are fewer than two samples.
pub fn mean_excluding_warmup(samples: &[Duration]) -> Option<f64> {
    match samples.split_first() {
        Some((_, rest)) if !rest.is_empty() => {
            Some(rest.iter().map(Duration::as_secs_f64).sum::<f64>() / rest.len() as f64)
        }
        _ => None,
    }
}

/// Relative speedup of the indexed run in percent, 0 if there is no baseline
pub fn improvement_percent(unindexed: f64, indexed: f64) -> f64 {
    if unindexed == 0.0 {
        0.0
    } else {
        (unindexed - indexed) / unindexed * 100.0
    }
}
