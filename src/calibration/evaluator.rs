//! Error evaluation: absolute errors, volume stratification and MAE.
//!
//! A single global MAE is dominated by large-volume samples. Stratifying by
//! measured volume lets the optimizer target the region where data exists.
//! The blend between strata is a fixed table:
//!
//! | tiers present (>= 2 samples each) | blend                                   |
//! |-----------------------------------|-----------------------------------------|
//! | none                              | global                                  |
//! | one tier                          | 0.3 global + 0.7 tier                   |
//! | large + medium                    | 0.6 large + 0.4 medium                  |
//! | medium + small                    | 0.6 medium + 0.4 small                  |
//! | large + small                     | 0.7 large + 0.3 small                   |
//! | large + medium + small            | 0.4 large + 0.4 medium + 0.2 small      |
//!
//! "small" always includes the very-small category.

use serde::{Deserialize, Serialize};

use crate::ink::Channel;
use crate::model::predict;
use crate::params::CalibrationParameters;
use crate::sample::PreparedSample;

/// Upper bound (exclusive) of the very-small category, mL.
pub const VERY_SMALL_ML: f64 = 0.02;
/// Upper bound (exclusive) of the small category, mL.
pub const SMALL_ML: f64 = 0.1;
/// Upper bound (exclusive) of the medium category, mL.
pub const MEDIUM_ML: f64 = 0.5;

/// Weight of a very-small sample in the whole-sample MAE.
pub const VERY_SMALL_WEIGHT: f64 = 0.5;

/// Samples a tier needs before it takes part in the blend.
pub const MIN_TIER_SAMPLES: usize = 2;

/// `|predicted - actual|`.
#[inline]
#[must_use]
pub fn absolute_error(predicted: f64, actual: f64) -> f64 {
    (predicted - actual).abs()
}

/// Band of a measured volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeCategory {
    /// Below 0.02 mL.
    VerySmall,
    /// 0.02 to 0.1 mL.
    Small,
    /// 0.1 to 0.5 mL.
    Medium,
    /// 0.5 mL and above.
    Large,
}

impl VolumeCategory {
    /// Category of a measured volume.
    #[must_use]
    pub fn for_volume(ml: f64) -> Self {
        if ml < VERY_SMALL_ML {
            Self::VerySmall
        } else if ml < SMALL_ML {
            Self::Small
        } else if ml < MEDIUM_ML {
            Self::Medium
        } else {
            Self::Large
        }
    }

    /// Tier used by the weighting table.
    #[must_use]
    pub fn tier(self) -> ErrorTier {
        match self {
            Self::VerySmall | Self::Small => ErrorTier::Small,
            Self::Medium => ErrorTier::Medium,
            Self::Large => ErrorTier::Large,
        }
    }
}

/// Tier of the weighting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTier {
    Small,
    Medium,
    Large,
}

/// How a candidate's error is turned into a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorWeighting {
    /// Blend per-tier errors with the fixed table.
    #[default]
    Stratified,
    /// Plain error over all qualifying samples.
    Unweighted,
}

/// Blend weights for the tiers present in a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TierWeights {
    pub global: f64,
    pub large: f64,
    pub medium: f64,
    pub small: f64,
}

impl TierWeights {
    /// Look up the fixed table.
    #[must_use]
    pub fn for_presence(large: bool, medium: bool, small: bool) -> Self {
        let w = |global, large, medium, small| Self {
            global,
            large,
            medium,
            small,
        };
        match (large, medium, small) {
            (false, false, false) => w(1.0, 0.0, 0.0, 0.0),
            (true, false, false) => w(0.3, 0.7, 0.0, 0.0),
            (false, true, false) => w(0.3, 0.0, 0.7, 0.0),
            (false, false, true) => w(0.3, 0.0, 0.0, 0.7),
            (true, true, false) => w(0.0, 0.6, 0.4, 0.0),
            (false, true, true) => w(0.0, 0.0, 0.6, 0.4),
            (true, false, true) => w(0.0, 0.7, 0.0, 0.3),
            (true, true, true) => w(0.0, 0.4, 0.4, 0.2),
        }
    }
}

/// Weight of one sample in the whole-sample MAE.
#[inline]
#[must_use]
pub fn sample_weight(measured_ml: f64) -> f64 {
    if measured_ml < VERY_SMALL_ML {
        VERY_SMALL_WEIGHT
    } else {
        1.0
    }
}

/// Weighted MAE of `params` for `channel` over the samples that qualify.
///
/// Very-small samples count half. Returns `None` when no sample qualifies.
#[must_use]
pub fn whole_sample_mae(
    samples: &[&PreparedSample],
    channel: Channel,
    params: &CalibrationParameters,
) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for sample in samples {
        if let Some((measured, coverage)) = sample.qualifying(channel) {
            let predicted = predict(channel, coverage, sample.area_sq_in, sample.quality, params);
            let w = sample_weight(measured);
            weighted += w * absolute_error(predicted, measured);
            total_weight += w;
        }
    }
    (total_weight > 0.0).then(|| weighted / total_weight)
}

/// Absolute errors of `params` for `channel`, one per qualifying sample.
#[must_use]
pub fn channel_errors(
    samples: &[&PreparedSample],
    channel: Channel,
    params: &CalibrationParameters,
) -> Vec<f64> {
    samples
        .iter()
        .filter_map(|sample| {
            let (measured, coverage) = sample.qualifying(channel)?;
            let predicted = predict(channel, coverage, sample.area_sq_in, sample.quality, params);
            Some(absolute_error(predicted, measured))
        })
        .collect()
}

/// MAE of `candidate` over one volume tier, or `None` when the tier has
/// fewer than [`MIN_TIER_SAMPLES`] qualifying samples.
///
/// `error_fn` substitutes the candidate into an otherwise fixed parameter
/// set and scores the given samples.
pub fn evaluate_volume_specific_error<F>(
    samples: &[&PreparedSample],
    channel: Channel,
    candidate: f64,
    tier: ErrorTier,
    error_fn: F,
) -> Option<f64>
where
    F: Fn(f64, &[&PreparedSample]) -> f64,
{
    let in_tier: Vec<&PreparedSample> = samples
        .iter()
        .copied()
        .filter(|s| {
            s.qualifying(channel)
                .is_some_and(|(m, _)| VolumeCategory::for_volume(m).tier() == tier)
        })
        .collect();
    (in_tier.len() >= MIN_TIER_SAMPLES).then(|| error_fn(candidate, in_tier.as_slice()))
}

/// Qualifying samples of one channel with the blend weights their tier
/// populations select.
#[derive(Debug, Clone)]
pub struct StratifiedSamples<'a> {
    channel: Channel,
    all: Vec<&'a PreparedSample>,
    weights: TierWeights,
}

impl<'a> StratifiedSamples<'a> {
    /// Collect the samples that qualify for `channel`.
    #[must_use]
    pub fn new(samples: &[&'a PreparedSample], channel: Channel, weighting: ErrorWeighting) -> Self {
        let all: Vec<&PreparedSample> = samples
            .iter()
            .copied()
            .filter(|s| s.qualifying(channel).is_some())
            .collect();
        let weights = match weighting {
            ErrorWeighting::Unweighted => TierWeights::for_presence(false, false, false),
            ErrorWeighting::Stratified => {
                let present = |tier: ErrorTier| {
                    all.iter()
                        .filter_map(|s| s.qualifying(channel))
                        .filter(|&(m, _)| VolumeCategory::for_volume(m).tier() == tier)
                        .count()
                        >= MIN_TIER_SAMPLES
                };
                TierWeights::for_presence(
                    present(ErrorTier::Large),
                    present(ErrorTier::Medium),
                    present(ErrorTier::Small),
                )
            }
        };
        Self {
            channel,
            all,
            weights,
        }
    }

    /// Number of qualifying samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// The blend weights selected for this sample set.
    #[must_use]
    pub fn weights(&self) -> TierWeights {
        self.weights
    }

    /// Unblended error of `candidate` over every qualifying sample.
    pub fn overall_error<F>(&self, candidate: f64, error_fn: F) -> f64
    where
        F: Fn(f64, &[&PreparedSample]) -> f64,
    {
        error_fn(candidate, self.all.as_slice())
    }

    /// Blended error of `candidate`.
    ///
    /// Only terms with a non-zero weight are evaluated.
    pub fn error<F>(&self, candidate: f64, error_fn: F) -> f64
    where
        F: Fn(f64, &[&PreparedSample]) -> f64,
    {
        if self.all.is_empty() {
            return 0.0;
        }
        let w = self.weights;
        let mut total = 0.0;
        if w.global > 0.0 {
            total += w.global * self.overall_error(candidate, &error_fn);
        }
        for (weight, tier) in [
            (w.large, ErrorTier::Large),
            (w.medium, ErrorTier::Medium),
            (w.small, ErrorTier::Small),
        ] {
            if weight > 0.0 {
                if let Some(e) =
                    evaluate_volume_specific_error(&self.all, self.channel, candidate, tier, &error_fn)
                {
                    total += weight * e;
                }
            }
        }
        total
    }
}
