//! Measured print samples.
//!
//! A [`MeasuredSample`] is the raw empirical record as it arrives from an
//! upload or a CSV file. Before calibration each sample is resolved against
//! the reference ink-mode table into a [`PreparedSample`]; samples that cannot
//! be resolved are reported as [`SkippedSample`]s instead of failing the batch.

mod import;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use import::{SampleImporter, SampleSchema, SampleSchemaBuilder};

use crate::ink::{Channel, InkMode, PerChannel};
use crate::model::{PrintSize, check_coverage};
use crate::params::Quality;

/// One empirical print record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredSample {
    /// Optional identifier for logs and reports.
    #[serde(default)]
    pub id: Option<String>,

    /// Ink mode name, resolved through [`InkMode::from_name`].
    pub ink_mode: String,

    /// Print quality tier.
    pub quality: Quality,

    /// Physical print size.
    pub size: PrintSize,

    /// Coverage applying to channels without their own entry (percent).
    #[serde(default)]
    pub coverage_percent: Option<f64>,

    /// Per-channel coverage (percent).
    #[serde(default)]
    pub channel_coverage: BTreeMap<Channel, f64>,

    /// Measured ink volume per channel (mL). Absent channels were not measured.
    #[serde(default)]
    pub measured_ml: BTreeMap<Channel, f64>,
}

impl MeasuredSample {
    /// Sample with uniform coverage and no measurements yet.
    #[must_use]
    pub fn new(ink_mode: impl Into<String>, quality: Quality, size: PrintSize, coverage_percent: f64) -> Self {
        Self {
            id: None,
            ink_mode: ink_mode.into(),
            quality,
            size,
            coverage_percent: Some(coverage_percent),
            channel_coverage: BTreeMap::new(),
            measured_ml: BTreeMap::new(),
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Record a measured volume for a channel.
    #[must_use]
    pub fn with_measurement(mut self, channel: Channel, ml: f64) -> Self {
        self.measured_ml.insert(channel, ml);
        self
    }

    /// Override coverage for a channel.
    #[must_use]
    pub fn with_channel_coverage(mut self, channel: Channel, coverage_percent: f64) -> Self {
        self.channel_coverage.insert(channel, coverage_percent);
        self
    }

    /// Label for logs: the id, or the position in the batch.
    #[must_use]
    pub fn label(&self, index: usize) -> String {
        self.id.clone().unwrap_or_else(|| format!("#{index}"))
    }
}

/// Why a whole sample was left out of calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Ink mode not present in the reference table.
    UnknownInkMode { ink_mode: String },
    /// Dimensions that do not give a positive, finite area.
    InvalidDimensions,
    /// No channel had both a usable measurement and a usable coverage.
    NoUsableChannels,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInkMode { ink_mode } => write!(f, "unknown ink mode '{ink_mode}'"),
            Self::InvalidDimensions => write!(f, "invalid dimensions"),
            Self::NoUsableChannels => write!(f, "no usable channel measurements"),
        }
    }
}

/// A sample left out of calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSample {
    /// Position in the input batch.
    pub index: usize,
    /// Sample id, if any.
    pub id: Option<String>,
    /// Why it was skipped.
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A sample resolved against the ink-mode table.
///
/// Only channels of the sample's ink mode carry values; measurements for
/// other channels, non-positive measurements and out-of-range coverage are
/// dropped during preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSample {
    /// Position in the input batch.
    pub index: usize,
    /// Resolved ink mode.
    pub ink_mode: InkMode,
    /// Print quality tier.
    pub quality: Quality,
    /// Print area in square inches, always > 0.
    pub area_sq_in: f64,
    /// Usable coverage per channel (percent).
    pub coverage: PerChannel<Option<f64>>,
    /// Usable measured volume per channel (mL, always > 0).
    pub measured: PerChannel<Option<f64>>,
}

impl PreparedSample {
    /// Measured value and coverage when this sample counts for `channel`.
    #[must_use]
    pub fn qualifying(&self, channel: Channel) -> Option<(f64, f64)> {
        Some(((*self.measured.get(channel))?, (*self.coverage.get(channel))?))
    }
}

/// Outcome of [`prepare_samples`].
#[derive(Debug, Clone, Default)]
pub struct Preparation {
    pub samples: Vec<PreparedSample>,
    pub skipped: Vec<SkippedSample>,
}

/// Resolve a batch of samples, logging and collecting the ones that cannot be used.
#[must_use]
pub fn prepare_samples(samples: &[MeasuredSample]) -> Preparation {
    let mut out = Preparation::default();
    for (index, sample) in samples.iter().enumerate() {
        match prepare_one(index, sample) {
            Ok(prepared) => out.samples.push(prepared),
            Err(reason) => {
                tracing::warn!(sample = %sample.label(index), %reason, "skipping sample");
                out.skipped.push(SkippedSample {
                    index,
                    id: sample.id.clone(),
                    reason,
                });
            }
        }
    }
    out
}

fn prepare_one(index: usize, sample: &MeasuredSample) -> Result<PreparedSample, SkipReason> {
    let ink_mode = InkMode::from_name(&sample.ink_mode).ok_or_else(|| SkipReason::UnknownInkMode {
        ink_mode: sample.ink_mode.clone(),
    })?;
    let area_sq_in = sample
        .size
        .area_sq_in()
        .map_err(|_| SkipReason::InvalidDimensions)?;

    let mut coverage = PerChannel::splat(None);
    let mut measured = PerChannel::splat(None);

    for (&channel, &ml) in &sample.measured_ml {
        if !ink_mode.contains(channel) {
            tracing::warn!(
                sample = %sample.label(index),
                %channel,
                %ink_mode,
                "measurement for channel outside ink mode excluded"
            );
            continue;
        }
        if !ml.is_finite() || ml <= 0.0 {
            continue;
        }
        let channel_coverage = sample
            .channel_coverage
            .get(&channel)
            .copied()
            .or(sample.coverage_percent);
        match channel_coverage.map(check_coverage) {
            Some(Ok(c)) => {
                coverage.set(channel, Some(c));
                measured.set(channel, Some(ml));
            }
            Some(Err(_)) => {
                tracing::warn!(
                    sample = %sample.label(index),
                    %channel,
                    coverage = ?channel_coverage,
                    "coverage out of range, channel excluded"
                );
            }
            None => {
                tracing::warn!(sample = %sample.label(index), %channel, "no coverage, channel excluded");
            }
        }
    }

    if measured.iter().all(|(_, m)| m.is_none()) {
        return Err(SkipReason::NoUsableChannels);
    }

    Ok(PreparedSample {
        index,
        ink_mode,
        quality: sample.quality,
        area_sq_in,
        coverage,
        measured,
    })
}
