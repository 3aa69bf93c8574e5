//! Descriptive statistics over prediction errors.
//!
//! - [`Summary`]: count, mean, RMSE, median, p90, p95, extremes
//! - [`mean`], [`median`], [`rmse`]: basic functions
//! - [`percentile`]: R-7 linear interpolation

use serde::{Deserialize, Serialize};

/// Descriptive statistics for a set of errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Arithmetic mean. For absolute errors this is the MAE.
    pub mean: f64,
    /// Root mean square.
    pub rmse: f64,
    /// Median value.
    pub median: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty or holds a non-finite value.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let sorted = sorted(values);
        let count = sorted.len();

        Some(Self {
            count,
            mean: mean(&sorted),
            rmse: rmse(&sorted),
            median: percentile_sorted(&sorted, 0.5),
            p90: percentile_sorted(&sorted, 0.9),
            p95: percentile_sorted(&sorted, 0.95),
            min: sorted[0],
            max: sorted[count - 1],
        })
    }
}

/// Arithmetic mean, 0 for an empty slice.
///
/// ```
/// use inkcal::stats::mean;
///
/// assert!((mean(&[0.1, 0.2, 0.3]) - 0.2).abs() < 1e-12);
/// assert_eq!(mean(&[]), 0.0);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Root mean square, 0 for an empty slice.
#[must_use]
pub fn rmse(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Median. For even-length slices, the average of the two middle values.
///
/// ```
/// use inkcal::stats::median;
///
/// assert_eq!(median(&[0.3, 0.1, 0.2]), 0.2);
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
/// ```
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    percentile_sorted(&sorted(values), 0.5)
}

/// Percentile using linear interpolation (R-7). `p` is in `[0, 1]`.
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    percentile_sorted(&sorted(values), p)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }
    let idx = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_compute() {
        let summary = Summary::compute(&[0.05, 0.01, 0.03, 0.02, 0.04]).unwrap();
        assert_eq!(summary.count, 5);
        assert!((summary.mean - 0.03).abs() < 1e-12);
        assert!((summary.median - 0.03).abs() < 1e-12);
        assert_eq!(summary.min, 0.01);
        assert_eq!(summary.max, 0.05);
        assert!((summary.p90 - 0.046).abs() < 1e-12);
        assert!(summary.rmse >= summary.mean);
    }

    #[test]
    fn test_summary_rejects_empty_and_nan() {
        assert!(Summary::compute(&[]).is_none());
        assert!(Summary::compute(&[0.1, f64::NAN]).is_none());
    }

    #[test]
    fn test_percentile() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile(&values, 0.0) - 1.0).abs() < 0.001);
        assert!((percentile(&values, 0.25) - 2.0).abs() < 0.001);
        assert!((percentile(&values, 1.0) - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_rmse() {
        assert!((rmse(&[3.0, 4.0]) - (12.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(rmse(&[]), 0.0);
    }
}
