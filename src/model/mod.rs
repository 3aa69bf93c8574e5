//! The ink volume estimation model.
//!
//! ```text
//! mL = base[channel]
//!    + (coverage / 100) * area * scaling[channel]
//!      * quality_multiplier[quality][channel]
//!      * area_multiplier[bucket(area)]
//! ```
//!
//! Everything here is a pure function of its arguments and the
//! [`CalibrationParameters`] value passed in.
//!
//! ## Example
//!
//! ```
//! use inkcal::model::{estimate_channel_volume};
//! use inkcal::{CalibrationParameters, Channel, Quality};
//!
//! let params = CalibrationParameters::default();
//! let ml = estimate_channel_volume(Channel::Cyan, 0.0, 25.0, Quality::Standard, &params)?;
//! assert_eq!(ml, 0.01);
//! # Ok::<(), inkcal::Error>(())
//! ```

mod geometry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use geometry::{LengthUnit, PrintSize};

use crate::error::{Error, Result};
use crate::ink::Channel;
use crate::params::{AreaBucket, CalibrationParameters, Quality, validate_channels};

/// Predicted volume without input checks. Callers guarantee
/// `coverage_percent` in `[0, 100]` and a positive, finite area.
#[inline]
pub(crate) fn predict(
    channel: Channel,
    coverage_percent: f64,
    area_sq_in: f64,
    quality: Quality,
    params: &CalibrationParameters,
) -> f64 {
    let base = *params.base_consumption.get(channel);
    let scaling = *params.channel_scaling_factor.get(channel);
    let quality_multiplier = *params.quality_multiplier.get(quality).get(channel);
    let area_multiplier = params
        .area_scaling_multiplier
        .get(AreaBucket::for_area(area_sq_in));
    base + (coverage_percent / 100.0) * area_sq_in * scaling * quality_multiplier * area_multiplier
}

pub(crate) fn check_coverage(coverage_percent: f64) -> Result<f64> {
    if coverage_percent.is_finite() && (0.0..=100.0).contains(&coverage_percent) {
        Ok(coverage_percent)
    } else {
        Err(Error::InvalidCoverage(coverage_percent))
    }
}

/// Predicted ink volume (mL) for one channel.
///
/// Coverage of exactly 0 yields exactly the channel's base consumption. The
/// channel's factors and the area multipliers must pass validation, so a
/// defective parameter set is an [`Error::Validation`] instead of a number.
pub fn estimate_channel_volume(
    channel: Channel,
    coverage_percent: f64,
    area_sq_in: f64,
    quality: Quality,
    params: &CalibrationParameters,
) -> Result<f64> {
    check_coverage(coverage_percent)?;
    if !area_sq_in.is_finite() || area_sq_in <= 0.0 {
        return Err(Error::InvalidDimensions {
            width: area_sq_in,
            height: 1.0,
            reason: "area must be > 0 sq in".to_string(),
        });
    }
    validate_channels(params, &[channel])?;
    Ok(predict(channel, coverage_percent, area_sq_in, quality, params))
}

/// A print job to estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    /// Active channels of the ink mode.
    pub channels: Vec<Channel>,
    /// Print quality tier.
    pub quality: Quality,
    /// Physical print size.
    pub size: PrintSize,
    /// Coverage for channels without their own entry (percent).
    pub coverage_percent: f64,
    /// Per-channel coverage overrides (percent).
    #[serde(default)]
    pub channel_coverage: BTreeMap<Channel, f64>,
}

impl PrintJob {
    /// Job with uniform coverage across its channels.
    #[must_use]
    pub fn new(
        channels: impl Into<Vec<Channel>>,
        quality: Quality,
        size: PrintSize,
        coverage_percent: f64,
    ) -> Self {
        Self {
            channels: channels.into(),
            quality,
            size,
            coverage_percent,
            channel_coverage: BTreeMap::new(),
        }
    }

    /// Override coverage for one channel.
    #[must_use]
    pub fn with_channel_coverage(mut self, channel: Channel, coverage_percent: f64) -> Self {
        self.channel_coverage.insert(channel, coverage_percent);
        self
    }
}

/// Per-channel estimate for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkEstimate {
    /// Predicted mL per active channel.
    pub per_channel: BTreeMap<Channel, f64>,
    /// Sum over channels (mL).
    pub total_ml: f64,
    /// Normalized print area.
    pub area_sq_in: f64,
    /// Area bucket the job fell into.
    pub area_bucket: AreaBucket,
}

/// Estimate every channel of a job's ink mode.
///
/// The result contains exactly the job's channels. A coverage override for a
/// channel outside the ink mode is a caller error.
pub fn estimate(job: &PrintJob, params: &CalibrationParameters) -> Result<InkEstimate> {
    if let Some(stray) = job
        .channel_coverage
        .keys()
        .find(|c| !job.channels.contains(c))
    {
        return Err(Error::UnknownChannel {
            channel: *stray,
            ink_mode: job
                .channels
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
        });
    }

    let area_sq_in = job.size.area_sq_in()?;
    validate_channels(params, &job.channels)?;
    let mut per_channel = BTreeMap::new();
    for &channel in &job.channels {
        let coverage = job
            .channel_coverage
            .get(&channel)
            .copied()
            .unwrap_or(job.coverage_percent);
        let coverage = check_coverage(coverage)?;
        per_channel.insert(channel, predict(channel, coverage, area_sq_in, job.quality, params));
    }
    let total_ml = per_channel.values().sum();

    Ok(InkEstimate {
        per_channel,
        total_ml,
        area_sq_in,
        area_bucket: AreaBucket::for_area(area_sq_in),
    })
}
