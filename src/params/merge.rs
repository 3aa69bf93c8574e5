//! Pure precedence merge of persisted parameter scopes.
//!
//! Precedence, per channel (all values owned by the channel move together):
//!
//! | channel family | 1st                      | 2nd      | 3rd      |
//! |----------------|--------------------------|----------|----------|
//! | standard       | standard-family record   | combined | defaults |
//! | special        | special-family record    | combined | defaults |
//!
//! Area multipliers: combined, then standard-family record, then defaults.
//!
//! A candidate is taken only if its values for that channel pass the band
//! check; otherwise the next one is tried. Defaults always terminate the
//! chain, so every channel resolves to exactly one source.

use serde::{Deserialize, Serialize};

use super::bands;
use super::validate::channel_violations;
use super::CalibrationParameters;
use crate::ink::{CalibrationFamily, Channel, PerChannel};

/// Where a merged value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterSource {
    /// The record persisted for the channel's own family.
    Family,
    /// The combined (all-family) record.
    Combined,
    /// Hardcoded defaults.
    Default,
}

/// Result of [`merge_by_channel_group`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedParameters {
    /// The merged record.
    pub parameters: CalibrationParameters,
    /// Source of each channel's values.
    pub channel_sources: PerChannel<ParameterSource>,
    /// Source of the area multipliers.
    pub area_source: ParameterSource,
}

/// Merge family-scoped records, a combined record and defaults.
#[must_use]
pub fn merge_by_channel_group(
    standard: Option<&CalibrationParameters>,
    special: Option<&CalibrationParameters>,
    combined: Option<&CalibrationParameters>,
    defaults: &CalibrationParameters,
) -> MergedParameters {
    let mut parameters = defaults.clone();
    let mut channel_sources = PerChannel::splat(ParameterSource::Default);

    for channel in Channel::ALL {
        let family_record = match channel.family() {
            CalibrationFamily::Standard => standard,
            CalibrationFamily::Special => special,
        };
        let candidates = [
            (family_record, ParameterSource::Family),
            (combined, ParameterSource::Combined),
        ];
        let chosen = candidates
            .into_iter()
            .find_map(|(record, source)| {
                record
                    .filter(|r| channel_is_valid(r, channel))
                    .map(|r| (r, source))
            });
        if let Some((record, source)) = chosen {
            parameters = parameters.with_channel_from(channel, record);
            channel_sources.set(channel, source);
        }
    }

    let area_candidates = [
        (combined, ParameterSource::Combined),
        (standard, ParameterSource::Family),
    ];
    let area_source = match area_candidates
        .into_iter()
        .find_map(|(record, source)| record.filter(|r| area_is_valid(r)).map(|r| (r, source)))
    {
        Some((record, source)) => {
            parameters.area_scaling_multiplier = record.area_scaling_multiplier;
            source
        }
        None => ParameterSource::Default,
    };

    MergedParameters {
        parameters,
        channel_sources,
        area_source,
    }
}

fn channel_is_valid(params: &CalibrationParameters, channel: Channel) -> bool {
    let mut violations = Vec::new();
    channel_violations(params, channel, &mut violations);
    violations.is_empty()
}

fn area_is_valid(params: &CalibrationParameters) -> bool {
    params
        .area_scaling_multiplier
        .iter()
        .all(|(_, v)| v > 0.0 && bands::AREA_MULTIPLIER.contains(v))
}
