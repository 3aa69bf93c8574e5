//! Coarse-to-fine grid search over a single scalar factor.

use serde::{Deserialize, Serialize};

use super::evaluator::{ErrorWeighting, StratifiedSamples};
use crate::ink::Channel;
use crate::sample::PreparedSample;

/// Qualifying samples a search needs before it may move a factor.
pub const MIN_QUALIFYING_SAMPLES: usize = 3;

/// Significant figures of every optimized value.
pub const SIGNIFICANT_FIGURES: u32 = 5;

/// Bounds and effort of one factor search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorSearch {
    /// Lower search bound.
    pub min: f64,
    /// Upper search bound.
    pub max: f64,
    /// Grid points per round, and number of rounds. Values below 2 act as 2.
    pub iterations: usize,
    /// Error weighting used to score candidates.
    #[serde(default)]
    pub weighting: ErrorWeighting,
    /// Qualifying samples required to search at all.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

fn default_min_samples() -> usize {
    MIN_QUALIFYING_SAMPLES
}

impl FactorSearch {
    /// Search over `[min, max]` with stratified weighting.
    #[must_use]
    pub fn new(min: f64, max: f64, iterations: usize) -> Self {
        Self {
            min,
            max,
            iterations,
            weighting: ErrorWeighting::Stratified,
            min_samples: MIN_QUALIFYING_SAMPLES,
        }
    }

    /// Whether the bounds describe a usable interval.
    #[must_use]
    pub fn has_valid_bounds(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// A strictly better value was found.
    Improved,
    /// Nothing beat the current value.
    Unchanged,
    /// Fewer qualifying samples than required.
    InsufficientData,
    /// Bounds were inverted or non-finite.
    InvalidBounds,
}

/// Result of [`search_factor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Value to use from now on.
    pub value: f64,
    /// Objective at the starting value, if the search ran.
    pub initial_error: Option<f64>,
    /// Objective at `value`, if the search ran.
    pub final_error: Option<f64>,
    /// Samples that qualified for the channel.
    pub qualifying_samples: usize,
    pub status: SearchStatus,
}

/// Round to `digits` significant figures.
///
/// ```
/// use inkcal::calibration::round_significant;
///
/// assert_eq!(round_significant(0.000390294, 5), 0.00039029);
/// assert_eq!(round_significant(0.0, 5), 0.0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let digits = digits.max(1) as i32;
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = digits - 1 - magnitude;
    // Formatting gives a correctly rounded decimal; parsing it back yields the
    // closest f64 to that decimal.
    if decimals >= 0 {
        format!("{value:.prec$}", prec = decimals as usize)
            .parse()
            .unwrap_or(value)
    } else {
        let scale = 10f64.powi(-decimals);
        (value / scale).round() * scale
    }
}

/// Optimized value of one factor. See [`search_factor`].
pub fn optimize_factor<F>(
    samples: &[&PreparedSample],
    channel: Channel,
    current_value: f64,
    error_fn: F,
    search: &FactorSearch,
) -> f64
where
    F: Fn(f64, &[&PreparedSample]) -> f64,
{
    search_factor(samples, channel, current_value, error_fn, search).value
}

/// Search `[search.min, search.max]` for the value of one factor that
/// minimizes the blended error over the samples qualifying for `channel`.
///
/// `error_fn(candidate, samples)` scores a candidate on a subset of samples
/// with every other parameter held fixed.
///
/// Each round evaluates `iterations` evenly spaced points and then narrows the
/// window to two steps either side of the best point, clipped to the initial
/// bounds. The current value is the incumbent: a candidate replaces it only if
/// it lowers the blended error and does not raise the unblended error over all
/// qualifying samples. The winner is rounded to [`SIGNIFICANT_FIGURES`] and
/// must pass the same test against the input, otherwise the input is kept.
pub fn search_factor<F>(
    samples: &[&PreparedSample],
    channel: Channel,
    current_value: f64,
    error_fn: F,
    search: &FactorSearch,
) -> SearchOutcome
where
    F: Fn(f64, &[&PreparedSample]) -> f64,
{
    let strata = StratifiedSamples::new(samples, channel, search.weighting);
    let qualifying_samples = strata.len();
    let unchanged = |status| SearchOutcome {
        value: current_value,
        initial_error: None,
        final_error: None,
        qualifying_samples,
        status,
    };

    if qualifying_samples < search.min_samples.max(1) {
        tracing::debug!(
            %channel,
            qualifying_samples,
            required = search.min_samples,
            "not enough samples, factor left unchanged"
        );
        return unchanged(SearchStatus::InsufficientData);
    }
    if !search.has_valid_bounds() {
        tracing::warn!(%channel, min = search.min, max = search.max, "invalid search bounds");
        return unchanged(SearchStatus::InvalidBounds);
    }

    let objective = |candidate: f64| nan_as_worst(strata.error(candidate, &error_fn));
    let overall = |candidate: f64| nan_as_worst(strata.overall_error(candidate, &error_fn));

    let initial_error = objective(current_value);
    let initial_overall = overall(current_value);
    let acceptable = |candidate: f64, error: f64, than: f64| {
        error < than && overall(candidate) <= initial_overall
    };

    let mut best_value = current_value;
    let mut best_error = initial_error;

    let points = search.iterations.max(2);
    let (mut lo, mut hi) = (search.min, search.max);
    for _ in 0..points {
        let step = (hi - lo) / (points - 1) as f64;
        for i in 0..points {
            let candidate = if i + 1 == points { hi } else { lo + step * i as f64 };
            let e = objective(candidate);
            if acceptable(candidate, e, best_error) {
                best_error = e;
                best_value = candidate;
            }
        }
        let center = if best_value.is_finite() {
            best_value.clamp(search.min, search.max)
        } else {
            search.min
        };
        lo = (center - 2.0 * step).max(search.min);
        hi = (center + 2.0 * step).min(search.max);
        if hi <= lo {
            break;
        }
    }

    let unchanged_after_search = SearchOutcome {
        value: current_value,
        initial_error: Some(initial_error),
        final_error: Some(initial_error),
        qualifying_samples,
        status: SearchStatus::Unchanged,
    };
    if best_value.to_bits() == current_value.to_bits() {
        return unchanged_after_search;
    }

    let rounded = round_significant(best_value, SIGNIFICANT_FIGURES);
    let rounded_error = objective(rounded);
    if acceptable(rounded, rounded_error, initial_error) {
        SearchOutcome {
            value: rounded,
            initial_error: Some(initial_error),
            final_error: Some(rounded_error),
            qualifying_samples,
            status: SearchStatus::Improved,
        }
    } else {
        tracing::debug!(%channel, best_value, rounded, "rounded value no better than current");
        unchanged_after_search
    }
}

fn nan_as_worst(error: f64) -> f64 {
    if error.is_nan() { f64::INFINITY } else { error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::evaluator::whole_sample_mae;
    use crate::ink::{InkMode, PerChannel};
    use crate::params::{AreaMultipliers, CalibrationParameters, Factor, Quality};
    use proptest::prelude::*;

    fn cyan_sample(measured: f64, coverage: f64, area: f64) -> PreparedSample {
        let mut cov = PerChannel::splat(None);
        let mut ml = PerChannel::splat(None);
        cov.set(Channel::Cyan, Some(coverage));
        ml.set(Channel::Cyan, Some(measured));
        PreparedSample {
            index: 0,
            ink_mode: InkMode::Cmyk,
            quality: Quality::Standard,
            area_sq_in: area,
            coverage: cov,
            measured: ml,
        }
    }

    fn flat_params(scaling: f64) -> CalibrationParameters {
        let mut params = CalibrationParameters::default();
        params.base_consumption.set(Channel::Cyan, 0.01);
        params.channel_scaling_factor.set(Channel::Cyan, scaling);
        params.quality_multiplier.standard = PerChannel::splat(1.0);
        params.area_scaling_multiplier = AreaMultipliers {
            small: 1.0,
            medium: 1.0,
            large: 1.0,
            xlarge: 1.0,
        };
        params
    }

    fn scaling_error(params: &CalibrationParameters) -> impl Fn(f64, &[&PreparedSample]) -> f64 + '_ {
        let factor = Factor::ScalingFactor {
            channel: Channel::Cyan,
        };
        move |candidate, subset| {
            whole_sample_mae(subset, Channel::Cyan, &params.with_factor(factor, candidate))
                .unwrap_or(0.0)
        }
    }

    #[test]
    fn test_round_significant() {
        assert_eq!(round_significant(123_456.7, 5), 123_460.0);
        assert_eq!(round_significant(0.012_345_67, 5), 0.012_346);
        assert_eq!(round_significant(-2.000_004, 5), -2.0);
        assert!(round_significant(f64::NAN, 5).is_nan());
    }

    #[test]
    fn test_hundredfold_scaling_defect_recovers() {
        // 24x36 in at 86% coverage, cyan measured around 0.30 mL
        let samples: Vec<PreparedSample> = [0.30, 0.31, 0.29]
            .into_iter()
            .map(|m| cyan_sample(m, 86.0, 864.0))
            .collect();
        let refs: Vec<&PreparedSample> = samples.iter().collect();
        let params = flat_params(0.000_003_9);
        let search = FactorSearch::new(1e-5, 1e-3, 8);

        let outcome = search_factor(&refs, Channel::Cyan, 0.000_003_9, scaling_error(&params), &search);

        assert_eq!(outcome.status, SearchStatus::Improved);
        assert!(
            (3e-4..=5e-4).contains(&outcome.value),
            "scaling factor {} should be near 3.9e-4",
            outcome.value
        );
        assert!(outcome.final_error.unwrap() < outcome.initial_error.unwrap());
        assert!(outcome.final_error.unwrap() < 0.02);
        assert_eq!(round_significant(outcome.value, SIGNIFICANT_FIGURES), outcome.value);
    }

    #[test]
    fn test_two_samples_is_noop() {
        let samples = [cyan_sample(0.30, 86.0, 864.0), cyan_sample(0.31, 86.0, 864.0)];
        let refs: Vec<&PreparedSample> = samples.iter().collect();
        let params = flat_params(0.000_003_9);
        let search = FactorSearch::new(1e-5, 1e-3, 8);
        let outcome = search_factor(&refs, Channel::Cyan, 0.000_003_9, scaling_error(&params), &search);
        assert_eq!(outcome.value, 0.000_003_9);
        assert_eq!(outcome.status, SearchStatus::InsufficientData);
        assert_eq!(outcome.qualifying_samples, 2);
    }

    #[test]
    fn test_samples_for_other_channels_do_not_count() {
        let samples = [
            cyan_sample(0.30, 86.0, 864.0),
            cyan_sample(0.31, 86.0, 864.0),
            cyan_sample(0.29, 86.0, 864.0),
        ];
        let refs: Vec<&PreparedSample> = samples.iter().collect();
        let params = flat_params(0.000_003_9);
        let search = FactorSearch::new(1e-5, 1e-3, 8);
        let outcome = search_factor(&refs, Channel::Magenta, 0.4, scaling_error(&params), &search);
        assert_eq!(outcome.status, SearchStatus::InsufficientData);
        assert_eq!(outcome.value, 0.4);
    }

    #[test]
    fn test_inverted_bounds_leave_value() {
        let samples: Vec<PreparedSample> = [0.30, 0.31, 0.29]
            .into_iter()
            .map(|m| cyan_sample(m, 86.0, 864.0))
            .collect();
        let refs: Vec<&PreparedSample> = samples.iter().collect();
        let params = flat_params(0.000_003_9);
        let search = FactorSearch::new(1e-3, 1e-5, 8);
        let outcome = search_factor(&refs, Channel::Cyan, 0.000_003_9, scaling_error(&params), &search);
        assert_eq!(outcome.status, SearchStatus::InvalidBounds);
        assert_eq!(outcome.value, 0.000_003_9);
    }

    #[test]
    fn test_already_optimal_stays() {
        let samples: Vec<PreparedSample> = [0.30, 0.30, 0.30]
            .into_iter()
            .map(|m| cyan_sample(m, 50.0, 400.0))
            .collect();
        let refs: Vec<&PreparedSample> = samples.iter().collect();
        // 0.01 + 0.5 * 400 * s = 0.30  =>  s = 0.00145
        let params = flat_params(0.001_45);
        let search = FactorSearch::new(1e-4, 1e-2, 8);
        let outcome = search_factor(&refs, Channel::Cyan, 0.001_45, scaling_error(&params), &search);
        assert_eq!(outcome.value, 0.001_45);
        assert_eq!(outcome.status, SearchStatus::Unchanged);
    }

    proptest! {
        #[test]
        fn prop_search_never_worsens(
            measured in prop::collection::vec(0.005f64..2.0, 3..12),
            coverage in 1.0f64..100.0,
            area in 1.0f64..2000.0,
            start in 1e-6f64..5e-2,
            iterations in 0usize..10,
        ) {
            let samples: Vec<PreparedSample> = measured
                .iter()
                .map(|&m| cyan_sample(m, coverage, area))
                .collect();
            let refs: Vec<&PreparedSample> = samples.iter().collect();
            let params = flat_params(start);
            let search = FactorSearch::new(1e-5, 1e-2, iterations);
            let error_fn = scaling_error(&params);

            let strata = StratifiedSamples::new(&refs, Channel::Cyan, search.weighting);
            let before = strata.error(start, &error_fn);
            let value = optimize_factor(&refs, Channel::Cyan, start, &error_fn, &search);
            let after = strata.error(value, &error_fn);

            prop_assert!(after <= before, "error rose from {} to {}", before, after);
        }

        #[test]
        fn prop_search_never_raises_whole_sample_error(
            samples in prop::collection::vec((0.005f64..2.0, 1.0f64..100.0, 1.0f64..1600.0), 3..12),
            start in 1e-5f64..1e-3,
        ) {
            let samples: Vec<PreparedSample> = samples
                .iter()
                .map(|&(m, coverage, area)| cyan_sample(m, coverage, area))
                .collect();
            let refs: Vec<&PreparedSample> = samples.iter().collect();
            let params = flat_params(start);
            let search = FactorSearch::new(1e-5, 1e-3, 8);
            let factor = Factor::ScalingFactor { channel: Channel::Cyan };

            let value = optimize_factor(&refs, Channel::Cyan, start, scaling_error(&params), &search);

            let before = whole_sample_mae(&refs, Channel::Cyan, &params).unwrap();
            let after = whole_sample_mae(&refs, Channel::Cyan, &params.with_factor(factor, value)).unwrap();
            prop_assert!(after <= before, "whole-sample MAE rose from {} to {} ({} -> {})", before, after, start, value);
        }
    }
}
