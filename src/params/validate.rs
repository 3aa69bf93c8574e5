//! Validation of calibration parameters against the magnitude bands.

use thiserror::Error;

use super::bands::{self, MagnitudeBand};
use super::{CalibrationParameters, Quality};
use crate::ink::{CalibrationFamily, Channel};

/// A single reason a parameter set was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// The record could not be decoded (missing or unknown fields, wrong types).
    #[error("malformed parameters: {reason}")]
    Malformed {
        /// Decoder message.
        reason: String,
    },

    /// NaN or infinite value.
    #[error("{field} is not finite ({value})")]
    NonFinite {
        /// Dotted field path.
        field: String,
        /// Offending value.
        value: f64,
    },

    /// Value below zero, or zero where a strictly positive value is required.
    #[error("{field} must be {requirement}, got {value}")]
    NonPositive {
        /// Dotted field path.
        field: String,
        /// Offending value.
        value: f64,
        /// `"> 0"` or `">= 0"`.
        requirement: &'static str,
    },

    /// Value outside the family's expected magnitude band.
    #[error("{field} = {value} is outside the expected band {band}")]
    OutOfBand {
        /// Dotted field path.
        field: String,
        /// Offending value.
        value: f64,
        /// Expected band.
        band: MagnitudeBand,
    },
}

impl Violation {
    /// Dotted path of the offending field, if the violation names one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Malformed { .. } => None,
            Self::NonFinite { field, .. }
            | Self::NonPositive { field, .. }
            | Self::OutOfBand { field, .. } => Some(field),
        }
    }
}

/// Parameters rejected by [`validate`] or [`validate_scoped`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid calibration parameters: {}", join_violations(.violations))]
pub struct ValidationError {
    /// Every violation found, in field order.
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation::Malformed {
                reason: reason.into(),
            }],
        }
    }

    /// Whether any violation concerns `channel`.
    #[must_use]
    pub fn involves(&self, channel: Channel) -> bool {
        let suffix = format!(".{channel}");
        self.violations
            .iter()
            .filter_map(Violation::field)
            .any(|f| f.ends_with(&suffix))
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate every channel against its own family's band.
pub fn validate(params: CalibrationParameters) -> Result<CalibrationParameters, ValidationError> {
    validate_scoped(params, None)
}

/// Validate the channels of `family` (or all channels when `None`) plus the
/// area multipliers.
///
/// A family-scoped record only vouches for its own channels; values it holds
/// for the other family are ignored by [`super::merge_by_channel_group`] and
/// therefore not checked here.
pub fn validate_scoped(
    params: CalibrationParameters,
    family: Option<CalibrationFamily>,
) -> Result<CalibrationParameters, ValidationError> {
    let channels: Vec<Channel> = Channel::ALL
        .into_iter()
        .filter(|c| family.is_none_or(|f| f.contains(*c)))
        .collect();
    validate_channels(&params, &channels)?;
    Ok(params)
}

/// Validate the values an estimate for `channels` reads: each channel's own
/// factors and every area multiplier.
pub fn validate_channels(
    params: &CalibrationParameters,
    channels: &[Channel],
) -> Result<(), ValidationError> {
    into_result(collect_violations(params, channels))
}

/// Reject a calibration starting point the search cannot work from.
///
/// Non-finite values and negative or zero multipliers are rejected. Values
/// outside their band, and scaling factors at or below zero, pass: the
/// first are what calibration repairs and the second restart from the
/// configured fallback.
pub fn validate_calibration_input(params: &CalibrationParameters) -> Result<(), ValidationError> {
    let violations = collect_violations(params, &Channel::ALL)
        .into_iter()
        .filter(|v| match v {
            Violation::NonFinite { .. } => true,
            Violation::NonPositive { field, .. } => !field.starts_with("channel_scaling_factor."),
            Violation::OutOfBand { .. } | Violation::Malformed { .. } => false,
        })
        .collect();
    into_result(violations)
}

fn collect_violations(params: &CalibrationParameters, channels: &[Channel]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for &channel in channels {
        channel_violations(params, channel, &mut violations);
    }
    for (bucket, value) in params.area_scaling_multiplier.iter() {
        check(
            &mut violations,
            format!("area_scaling_multiplier.{bucket}"),
            value,
            true,
            bands::AREA_MULTIPLIER,
        );
    }
    violations
}

fn into_result(violations: Vec<Violation>) -> Result<(), ValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}

/// Violations for the values owned by one channel.
pub(crate) fn channel_violations(
    params: &CalibrationParameters,
    channel: Channel,
    out: &mut Vec<Violation>,
) {
    let band = bands::for_family(channel.family());
    check(
        out,
        format!("base_consumption.{channel}"),
        *params.base_consumption.get(channel),
        false,
        band.base_consumption,
    );
    check(
        out,
        format!("channel_scaling_factor.{channel}"),
        *params.channel_scaling_factor.get(channel),
        true,
        band.scaling_factor,
    );
    for quality in Quality::ALL {
        check(
            out,
            format!("quality_multiplier.{quality}.{channel}"),
            *params.quality_multiplier.get(quality).get(channel),
            true,
            band.quality_multiplier,
        );
    }
}

fn check(
    out: &mut Vec<Violation>,
    field: String,
    value: f64,
    strictly_positive: bool,
    band: MagnitudeBand,
) {
    if !value.is_finite() {
        out.push(Violation::NonFinite { field, value });
    } else if strictly_positive && value <= 0.0 {
        out.push(Violation::NonPositive {
            field,
            value,
            requirement: "> 0",
        });
    } else if value < 0.0 {
        out.push(Violation::NonPositive {
            field,
            value,
            requirement: ">= 0",
        });
    } else if !band.contains(value) {
        out.push(Violation::OutOfBand { field, value, band });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundredfold_defect_is_flagged() {
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Cyan, 0.0000039);
        let err = validate(params).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(matches!(
            &err.violations[0],
            Violation::OutOfBand { field, .. } if field == "channel_scaling_factor.cyan"
        ));
        assert!(err.involves(Channel::Cyan));
        assert!(!err.involves(Channel::Magenta));
    }

    #[test]
    fn test_special_scaling_in_standard_band_is_flagged() {
        // 0.0004 is fine for cyan but a decade too small for white
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::White, 0.00004);
        assert!(validate(params).is_err());
    }

    #[test]
    fn test_non_positive_scaling() {
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Black, 0.0);
        let err = validate(params).unwrap_err();
        assert!(matches!(err.violations[0], Violation::NonPositive { .. }));
    }

    #[test]
    fn test_zero_base_is_allowed() {
        let mut params = CalibrationParameters::default();
        params.base_consumption.set(Channel::Yellow, 0.0);
        assert!(validate(params).is_ok());
    }

    #[test]
    fn test_nan_is_flagged() {
        let mut params = CalibrationParameters::default();
        params.area_scaling_multiplier.large = f64::NAN;
        let err = validate(params).unwrap_err();
        assert!(matches!(err.violations[0], Violation::NonFinite { .. }));
    }

    #[test]
    fn test_channels_only_checks_named_channels() {
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Magenta, 0.000_003_9);
        assert!(validate_channels(&params, &[Channel::Cyan, Channel::White]).is_ok());
        assert!(validate_channels(&params, &[Channel::Magenta]).is_err());
        params.area_scaling_multiplier.small = 0.0;
        assert!(validate_channels(&params, &[Channel::Cyan]).is_err());
    }

    #[test]
    fn test_calibration_input_accepts_repairable_values() {
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Cyan, 0.000_003_9);
        params.channel_scaling_factor.set(Channel::Black, 0.0);
        assert!(validate_calibration_input(&params).is_ok());
    }

    #[test]
    fn test_calibration_input_rejects_nan_and_negative_multiplier() {
        let mut params = CalibrationParameters::default();
        params.quality_multiplier.draft.set(Channel::Yellow, f64::NAN);
        params.area_scaling_multiplier.medium = -1.0;
        let err = validate_calibration_input(&params).unwrap_err();
        assert_eq!(err.violations.len(), 2);
    }

    #[test]
    fn test_scoped_ignores_other_family() {
        let mut params = CalibrationParameters::default();
        params.channel_scaling_factor.set(Channel::Gloss, 5.0);
        assert!(validate_scoped(params.clone(), Some(CalibrationFamily::Standard)).is_ok());
        assert!(validate_scoped(params, Some(CalibrationFamily::Special)).is_err());
    }

    #[test]
    fn test_error_message_lists_all() {
        let mut params = CalibrationParameters::default();
        params.base_consumption.set(Channel::Cyan, -1.0);
        params.quality_multiplier.high.set(Channel::White, 9.0);
        let err = validate(params).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("base_consumption.cyan"));
        assert!(msg.contains("quality_multiplier.high.white"));
    }
}
