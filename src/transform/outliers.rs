use tracing::debug;

use crate::error::{EtlError, Result};
use crate::record::Record;
use crate::transform::utility::{mean, sample_stddev};

/// Width of the retained band, in standard deviations.
pub const Z_SCORE_THRESHOLD: f64 = 3.0;

/// Inclusive `[low, high]` band on the death rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub mean: f64,
    pub stddev: Option<f64>,
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// Computes the z-score band over every non-missing death rate.
///
/// With fewer than two values, or zero spread, the band collapses to the
/// mean itself.
pub fn death_rate_band(rows: &[Record]) -> Result<Band> {
    let values: Vec<f64> = rows.iter().filter_map(|r| r.death_rate).collect();

    let mu = mean(&values)
        .filter(|m| m.is_finite())
        .ok_or_else(|| EtlError::Statistics("death rate column has no values".into()))?;
    let sigma = sample_stddev(&values, mu);

    let spread = match sigma {
        Some(s) if s > 0.0 && s.is_finite() => Z_SCORE_THRESHOLD * s,
        _ => 0.0,
    };

    Ok(Band {
        mean: mu,
        stddev: sigma,
        low: mu - spread,
        high: mu + spread,
    })
}

/// Keeps rows whose death rate lies inside the z-score band.
/// Rows with a missing death rate are dropped.
pub fn remove_outliers(rows: &[Record]) -> Result<Vec<Record>> {
    let band = death_rate_band(rows)?;
    debug!(mean = band.mean, stddev = ?band.stddev, low = band.low, high = band.high, "Outlier band");

    Ok(rows
        .iter()
        .filter(|r| r.death_rate.is_some_and(|v| band.contains(v)))
        .cloned()
        .collect())
}
