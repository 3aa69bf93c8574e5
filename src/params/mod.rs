//! Calibration parameters of the estimation model.
//!
//! [`CalibrationParameters`] is a fixed, strongly-typed record: one value per
//! channel for base consumption and scaling factor, one per (quality, channel)
//! for the quality multiplier, and one per area bucket for the area
//! correction. It is an immutable value: calibration produces a new record
//! rather than mutating a shared one.
//!
//! - [`bands`]: expected magnitude bands per calibration family
//! - [`validate`](validate()): typed validation against those bands
//! - [`merge_by_channel_group`]: pure precedence merge of persisted scopes

pub mod bands;
mod merge;
mod validate;

use serde::{Deserialize, Serialize};

use crate::ink::{Channel, PerChannel};

pub use merge::{MergedParameters, ParameterSource, merge_by_channel_group};
pub use validate::{
    ValidationError, Violation, validate, validate_calibration_input, validate_channels, validate_scoped,
};

/// Print-quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Fast, low ink laydown.
    Draft,
    /// Baseline tier; its multipliers are conceptually 1.0.
    Standard,
    /// Slow, high ink laydown.
    High,
}

impl Quality {
    /// Every tier, lowest first.
    pub const ALL: [Self; 3] = [Self::Draft, Self::Standard, Self::High];

    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "fast" | "low" | "economy" => Some(Self::Draft),
            "standard" | "normal" | "medium" | "default" => Some(Self::Standard),
            "high" | "best" | "fine" | "photo" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Standard => write!(f, "standard"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| crate::Error::UnknownQuality(s.to_string()))
    }
}

/// One value per quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerQuality<T> {
    pub draft: T,
    pub standard: T,
    pub high: T,
}

impl<T> PerQuality<T> {
    /// Value for `quality`.
    #[must_use]
    pub fn get(&self, quality: Quality) -> &T {
        match quality {
            Quality::Draft => &self.draft,
            Quality::Standard => &self.standard,
            Quality::High => &self.high,
        }
    }

    /// Mutable value for `quality`.
    pub fn get_mut(&mut self, quality: Quality) -> &mut T {
        match quality {
            Quality::Draft => &mut self.draft,
            Quality::Standard => &mut self.standard,
            Quality::High => &mut self.high,
        }
    }
}

/// Upper bound (exclusive) of the small bucket, square inches.
pub const SMALL_AREA_MAX_SQ_IN: f64 = 16.0;
/// Upper bound (exclusive) of the medium bucket, square inches.
pub const MEDIUM_AREA_MAX_SQ_IN: f64 = 100.0;
/// Upper bound (exclusive) of the large bucket, square inches.
pub const LARGE_AREA_MAX_SQ_IN: f64 = 400.0;

/// Print-area range selecting an area correction multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaBucket {
    /// Below 16 sq in.
    Small,
    /// 16 to 100 sq in.
    Medium,
    /// 100 to 400 sq in.
    Large,
    /// 400 sq in and above.
    XLarge,
}

impl AreaBucket {
    /// Bucket for a print area in square inches.
    #[must_use]
    pub fn for_area(area_sq_in: f64) -> Self {
        if area_sq_in < SMALL_AREA_MAX_SQ_IN {
            Self::Small
        } else if area_sq_in < MEDIUM_AREA_MAX_SQ_IN {
            Self::Medium
        } else if area_sq_in < LARGE_AREA_MAX_SQ_IN {
            Self::Large
        } else {
            Self::XLarge
        }
    }
}

impl std::fmt::Display for AreaBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
            Self::XLarge => write!(f, "xlarge"),
        }
    }
}

/// Area correction multiplier per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaMultipliers {
    pub small: f64,
    pub medium: f64,
    pub large: f64,
    pub xlarge: f64,
}

impl AreaMultipliers {
    /// Multiplier for `bucket`.
    #[must_use]
    pub fn get(&self, bucket: AreaBucket) -> f64 {
        match bucket {
            AreaBucket::Small => self.small,
            AreaBucket::Medium => self.medium,
            AreaBucket::Large => self.large,
            AreaBucket::XLarge => self.xlarge,
        }
    }

    /// `(bucket, multiplier)` pairs, smallest bucket first.
    pub fn iter(&self) -> impl Iterator<Item = (AreaBucket, f64)> + '_ {
        [AreaBucket::Small, AreaBucket::Medium, AreaBucket::Large, AreaBucket::XLarge]
            .into_iter()
            .map(move |b| (b, self.get(b)))
    }
}

impl Default for AreaMultipliers {
    fn default() -> Self {
        Self {
            small: 1.1,
            medium: 1.0,
            large: 0.95,
            xlarge: 0.9,
        }
    }
}

/// The three parameter groups tuned by calibration, in descent order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterGroup {
    BaseConsumption,
    ScalingFactor,
    QualityMultiplier,
}

impl std::fmt::Display for ParameterGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseConsumption => write!(f, "base_consumption"),
            Self::ScalingFactor => write!(f, "scaling_factor"),
            Self::QualityMultiplier => write!(f, "quality_multiplier"),
        }
    }
}

/// Address of a single tunable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum Factor {
    BaseConsumption { channel: Channel },
    ScalingFactor { channel: Channel },
    QualityMultiplier { quality: Quality, channel: Channel },
}

impl Factor {
    /// Channel the factor belongs to.
    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            Self::BaseConsumption { channel }
            | Self::ScalingFactor { channel }
            | Self::QualityMultiplier { channel, .. } => channel,
        }
    }

    /// Parameter group of the factor.
    #[must_use]
    pub fn group(self) -> ParameterGroup {
        match self {
            Self::BaseConsumption { .. } => ParameterGroup::BaseConsumption,
            Self::ScalingFactor { .. } => ParameterGroup::ScalingFactor,
            Self::QualityMultiplier { .. } => ParameterGroup::QualityMultiplier,
        }
    }

    /// Quality tier, for quality multipliers.
    #[must_use]
    pub fn quality(self) -> Option<Quality> {
        match self {
            Self::QualityMultiplier { quality, .. } => Some(quality),
            _ => None,
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QualityMultiplier { quality, channel } => {
                write!(f, "quality_multiplier.{quality}.{channel}")
            }
            other => write!(f, "{}.{}", other.group(), other.channel()),
        }
    }
}

/// Tunable constants of the estimation formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationParameters {
    /// Minimum ink used regardless of coverage (mL).
    pub base_consumption: PerChannel<f64>,

    /// Slope relating coverage x area to ink volume (mL per sq in at 100%).
    pub channel_scaling_factor: PerChannel<f64>,

    /// Relative multiplier per quality tier and channel.
    pub quality_multiplier: PerQuality<PerChannel<f64>>,

    /// Correction per area bucket.
    pub area_scaling_multiplier: AreaMultipliers,
}

impl Default for CalibrationParameters {
    /// Hardcoded defaults. Process colors sit a decade below the finishing
    /// layers in scaling factor, matching [`bands`].
    fn default() -> Self {
        let base_consumption = PerChannel::from_fn(|c| match c.family() {
            crate::ink::CalibrationFamily::Standard => 0.01,
            crate::ink::CalibrationFamily::Special => 0.02,
        });
        let channel_scaling_factor = PerChannel::from_fn(|c| match c.family() {
            crate::ink::CalibrationFamily::Standard => 0.00004,
            crate::ink::CalibrationFamily::Special => 0.0004,
        });
        Self {
            base_consumption,
            channel_scaling_factor,
            quality_multiplier: PerQuality {
                draft: PerChannel::splat(0.8),
                standard: PerChannel::splat(1.0),
                high: PerChannel::splat(1.3),
            },
            area_scaling_multiplier: AreaMultipliers::default(),
        }
    }
}

impl CalibrationParameters {
    /// Current value of `factor`.
    #[must_use]
    pub fn factor(&self, factor: Factor) -> f64 {
        match factor {
            Factor::BaseConsumption { channel } => *self.base_consumption.get(channel),
            Factor::ScalingFactor { channel } => *self.channel_scaling_factor.get(channel),
            Factor::QualityMultiplier { quality, channel } => {
                *self.quality_multiplier.get(quality).get(channel)
            }
        }
    }

    /// Copy of `self` with `factor` replaced by `value`.
    #[must_use]
    pub fn with_factor(&self, factor: Factor, value: f64) -> Self {
        let mut next = self.clone();
        next.set_factor(factor, value);
        next
    }

    pub(crate) fn set_factor(&mut self, factor: Factor, value: f64) {
        match factor {
            Factor::BaseConsumption { channel } => self.base_consumption.set(channel, value),
            Factor::ScalingFactor { channel } => self.channel_scaling_factor.set(channel, value),
            Factor::QualityMultiplier { quality, channel } => {
                self.quality_multiplier.get_mut(quality).set(channel, value);
            }
        }
    }

    /// Copy of `self` where every value owned by `channel` comes from `source`.
    #[must_use]
    pub(crate) fn with_channel_from(&self, channel: Channel, source: &Self) -> Self {
        let mut next = self.clone();
        next.base_consumption.set(channel, *source.base_consumption.get(channel));
        next.channel_scaling_factor
            .set(channel, *source.channel_scaling_factor.get(channel));
        for quality in Quality::ALL {
            let value = *source.quality_multiplier.get(quality).get(channel);
            next.quality_multiplier.get_mut(quality).set(channel, value);
        }
        next
    }

    /// Load parameters from a JSON file, validating them before returning.
    pub fn load(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(Self::from_json_value(value)?)
    }

    /// Save parameters to a JSON file after validating them.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        validate(self.clone())?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Decode and fully validate a JSON value.
    ///
    /// Missing or unknown fields surface as a [`ValidationError`], not a
    /// bare JSON error, so callers can treat every untrusted input the same.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        let params = Self::decode_json_value(value)?;
        validate(params)
    }

    pub(crate) fn decode_json_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        serde_json::from_value(value).map_err(|e| ValidationError::malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_bucket_thresholds() {
        assert_eq!(AreaBucket::for_area(1.0), AreaBucket::Small);
        assert_eq!(AreaBucket::for_area(15.99), AreaBucket::Small);
        assert_eq!(AreaBucket::for_area(16.0), AreaBucket::Medium);
        assert_eq!(AreaBucket::for_area(25.0), AreaBucket::Medium);
        assert_eq!(AreaBucket::for_area(100.0), AreaBucket::Large);
        assert_eq!(AreaBucket::for_area(399.0), AreaBucket::Large);
        assert_eq!(AreaBucket::for_area(400.0), AreaBucket::XLarge);
    }

    #[test]
    fn test_quality_from_str_loose() {
        assert_eq!(Quality::from_str_loose("HIGH"), Some(Quality::High));
        assert_eq!(Quality::from_str_loose("normal"), Some(Quality::Standard));
        assert_eq!(Quality::from_str_loose("ultra"), None);
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_with_factor_copies() {
        let params = CalibrationParameters::default();
        let factor = Factor::QualityMultiplier {
            quality: Quality::High,
            channel: Channel::Black,
        };
        let next = params.with_factor(factor, 1.7);
        assert_eq!(next.factor(factor), 1.7);
        assert_eq!(params.factor(factor), 1.3);
        assert_eq!(
            next.factor(Factor::QualityMultiplier {
                quality: Quality::High,
                channel: Channel::Cyan,
            }),
            1.3
        );
    }

    #[test]
    fn test_factor_display() {
        let factor = Factor::ScalingFactor {
            channel: Channel::White,
        };
        assert_eq!(factor.to_string(), "scaling_factor.white");
        let factor = Factor::QualityMultiplier {
            quality: Quality::Draft,
            channel: Channel::Cyan,
        };
        assert_eq!(factor.to_string(), "quality_multiplier.draft.cyan");
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(CalibrationParameters::default()).is_ok());
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let mut value = serde_json::to_value(CalibrationParameters::default()).unwrap();
        value
            .as_object_mut()
            .unwrap()
            .remove("channel_scaling_factor");
        let err = CalibrationParameters::from_json_value(value).unwrap_err();
        assert!(err.to_string().contains("channel_scaling_factor"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = CalibrationParameters::default();
        params.save(&path).unwrap();
        assert_eq!(CalibrationParameters::load(&path).unwrap(), params);
    }
}
