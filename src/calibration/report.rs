//! Accuracy report of a calibration run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::evaluator::whole_sample_mae;
use crate::ink::Channel;
use crate::params::{CalibrationParameters, Factor};
use crate::sample::{PreparedSample, SkippedSample};
use crate::stats;

/// Per-channel accuracy before and after calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAccuracy {
    /// Samples with a usable measurement for the channel.
    pub samples: usize,
    /// Weighted MAE with the input parameters (mL).
    pub mae_before: f64,
    /// Weighted MAE with the calibrated parameters (mL).
    pub mae_after: f64,
}

impl ChannelAccuracy {
    /// Relative MAE reduction in percent. Positive means better.
    #[must_use]
    pub fn improvement_percent(&self) -> f64 {
        if self.mae_before > 0.0 {
            (self.mae_before - self.mae_after) / self.mae_before * 100.0
        } else {
            0.0
        }
    }
}

/// What happened to one factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    Updated,
    Unchanged,
    InsufficientData,
}

/// Before/after value of one searched factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorOutcome {
    pub factor: Factor,
    pub before: f64,
    pub after: f64,
    pub qualifying_samples: usize,
    pub status: FactorStatus,
}

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// At least one factor moved.
    Applied,
    /// Every factor with enough data was already optimal.
    NoChangeNeeded,
    /// No factor had enough data to search.
    InsufficientData,
}

impl std::fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::NoChangeNeeded => write!(f, "no change needed"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Report of a calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// When the report was produced.
    #[serde(with = "crate::rfc3339")]
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Accuracy per observed channel.
    pub per_channel: BTreeMap<Channel, ChannelAccuracy>,

    /// Mean of the per-channel MAEs before calibration.
    pub overall_before: f64,

    /// Mean of the per-channel MAEs after calibration.
    pub overall_after: f64,

    /// Every factor the run considered, in search order.
    pub factors: Vec<FactorOutcome>,

    /// Samples left out of the run.
    #[serde(default)]
    pub skipped: Vec<SkippedSample>,

    /// Band violations remaining in the output, typically for channels the
    /// samples did not cover.
    #[serde(default)]
    pub remaining_violations: Vec<String>,
}

impl AccuracyReport {
    /// Build the report from the prepared samples and both parameter sets.
    #[must_use]
    pub fn new(
        samples: &[&PreparedSample],
        before: &CalibrationParameters,
        after: &CalibrationParameters,
        factors: Vec<FactorOutcome>,
        skipped: Vec<SkippedSample>,
    ) -> Self {
        let mut per_channel = BTreeMap::new();
        for channel in Channel::ALL {
            let count = samples
                .iter()
                .filter(|s| s.qualifying(channel).is_some())
                .count();
            if let (Some(mae_before), Some(mae_after)) = (
                whole_sample_mae(samples, channel, before),
                whole_sample_mae(samples, channel, after),
            ) {
                per_channel.insert(
                    channel,
                    ChannelAccuracy {
                        samples: count,
                        mae_before,
                        mae_after,
                    },
                );
            }
        }
        let befores: Vec<f64> = per_channel.values().map(|a| a.mae_before).collect();
        let afters: Vec<f64> = per_channel.values().map(|a| a.mae_after).collect();

        Self {
            timestamp: chrono::Utc::now(),
            overall_before: stats::mean(&befores),
            overall_after: stats::mean(&afters),
            per_channel,
            factors,
            skipped,
            remaining_violations: Vec::new(),
        }
    }

    /// Overall status derived from the factor outcomes.
    #[must_use]
    pub fn status(&self) -> CalibrationStatus {
        if self.factors.iter().any(|f| f.status == FactorStatus::Updated) {
            CalibrationStatus::Applied
        } else if self
            .factors
            .iter()
            .any(|f| f.status == FactorStatus::Unchanged)
        {
            CalibrationStatus::NoChangeNeeded
        } else {
            CalibrationStatus::InsufficientData
        }
    }

    /// Factors that moved.
    pub fn updated(&self) -> impl Iterator<Item = &FactorOutcome> {
        self.factors
            .iter()
            .filter(|f| f.status == FactorStatus::Updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Quality;

    fn outcome(status: FactorStatus) -> FactorOutcome {
        FactorOutcome {
            factor: Factor::QualityMultiplier {
                quality: Quality::High,
                channel: Channel::Black,
            },
            before: 1.3,
            after: 1.3,
            qualifying_samples: 3,
            status,
        }
    }

    fn report(factors: Vec<FactorOutcome>) -> AccuracyReport {
        let params = CalibrationParameters::default();
        AccuracyReport::new(&[], &params, &params, factors, Vec::new())
    }

    #[test]
    fn test_status() {
        assert_eq!(report(vec![]).status(), CalibrationStatus::InsufficientData);
        assert_eq!(
            report(vec![outcome(FactorStatus::InsufficientData)]).status(),
            CalibrationStatus::InsufficientData
        );
        assert_eq!(
            report(vec![outcome(FactorStatus::Unchanged), outcome(FactorStatus::InsufficientData)])
                .status(),
            CalibrationStatus::NoChangeNeeded
        );
        assert_eq!(
            report(vec![outcome(FactorStatus::Unchanged), outcome(FactorStatus::Updated)]).status(),
            CalibrationStatus::Applied
        );
    }

    #[test]
    fn test_improvement_percent() {
        let acc = ChannelAccuracy {
            samples: 4,
            mae_before: 0.2,
            mae_after: 0.05,
        };
        assert!((acc.improvement_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_json_roundtrip() {
        let r = report(vec![outcome(FactorStatus::Updated)]);
        let json = serde_json::to_string_pretty(&r).unwrap();
        assert!(json.contains("\"group\": \"quality_multiplier\""));
        let back: AccuracyReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.factors, r.factors);
        assert_eq!(back.timestamp.timestamp(), r.timestamp.timestamp());
    }
}
