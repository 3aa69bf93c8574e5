//! Coordinate descent over the three parameter groups.
//!
//! A run makes one pass per group in a fixed order: base consumption, then
//! channel scaling factors, then quality multipliers per quality tier. Each
//! pass searches one factor per observed channel with every other value held
//! at its latest setting. A channel's error depends only on that channel's
//! own values, so the searches inside a pass are independent and may run
//! concurrently on a snapshot without changing the result.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::config::CalibrationConfig;
use super::evaluator::whole_sample_mae;
use super::optimizer::{FactorSearch, SearchOutcome, SearchStatus, search_factor};
use super::report::{AccuracyReport, FactorOutcome, FactorStatus};
use crate::error::Result;
use crate::ink::Channel;
use crate::params::{
    CalibrationParameters, Factor, ParameterGroup, Quality, validate, validate_calibration_input,
};
use crate::sample::{MeasuredSample, Preparation, PreparedSample, prepare_samples};

/// Calibrated parameters and the accuracy report of the run.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationOutcome {
    pub parameters: CalibrationParameters,
    pub report: AccuracyReport,
}

/// Runs calibrations with a validated [`CalibrationConfig`].
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    config: CalibrationConfig,
}

struct SearchJob<'a> {
    factor: Factor,
    samples: Vec<&'a PreparedSample>,
    start: f64,
    search: FactorSearch,
}

impl Calibrator {
    /// Create a calibrator, rejecting inconsistent search bounds.
    pub fn new(config: CalibrationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Fit `initial` to the measured samples.
    ///
    /// Samples with an unknown ink mode or unusable geometry are skipped and
    /// listed in the report. A factor whose channel has too few qualifying
    /// samples keeps its input value, so a run with no usable data returns
    /// `initial` unchanged.
    ///
    /// `initial` may be out of band, which is what calibration repairs, but
    /// NaN, infinite or non-positive multipliers are an [`Error::Validation`].
    ///
    /// [`Error::Validation`]: crate::Error::Validation
    pub fn calibrate(
        &self,
        samples: &[MeasuredSample],
        initial: &CalibrationParameters,
    ) -> Result<CalibrationOutcome> {
        validate_calibration_input(initial)?;
        let Preparation {
            samples: prepared,
            skipped,
        } = prepare_samples(samples);
        let refs: Vec<&PreparedSample> = prepared.iter().collect();
        let observed: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|&c| refs.iter().any(|s| s.qualifying(c).is_some()))
            .collect();

        info!(
            samples = refs.len(),
            skipped = skipped.len(),
            channels = observed.len(),
            parallel = self.config.parallel,
            "starting calibration"
        );

        let mut working = initial.clone();
        let mut factors = Vec::new();

        let base_jobs = observed
            .iter()
            .filter(|&&channel| *initial.base_consumption.get(channel) != 0.0)
            .map(|&channel| self.job(Factor::BaseConsumption { channel }, &refs, &working))
            .collect();
        self.run_pass(ParameterGroup::BaseConsumption, base_jobs, &mut working, &mut factors);

        let scaling_jobs = observed
            .iter()
            .map(|&channel| {
                let mut job = self.job(Factor::ScalingFactor { channel }, &refs, &working);
                if !job.start.is_finite() || job.start <= 0.0 {
                    debug!(
                        %channel,
                        start = job.start,
                        fallback = self.config.scaling_fallback,
                        "scaling search starts from fallback"
                    );
                    job.start = self.config.scaling_fallback;
                }
                job
            })
            .collect();
        self.run_pass(ParameterGroup::ScalingFactor, scaling_jobs, &mut working, &mut factors);

        let mut quality_jobs = Vec::new();
        for quality in Quality::ALL {
            let tier: Vec<&PreparedSample> = refs
                .iter()
                .copied()
                .filter(|s| s.quality == quality)
                .collect();
            if tier.len() < self.config.min_quality_tier_samples {
                debug!(%quality, samples = tier.len(), "quality tier skipped");
                continue;
            }
            for &channel in &observed {
                if tier.iter().any(|s| s.qualifying(channel).is_some()) {
                    quality_jobs.push(self.job(
                        Factor::QualityMultiplier { quality, channel },
                        &tier,
                        &working,
                    ));
                }
            }
        }
        self.run_pass(ParameterGroup::QualityMultiplier, quality_jobs, &mut working, &mut factors);

        let mut report = AccuracyReport::new(&refs, initial, &working, factors, skipped);
        if let Err(e) = validate(working.clone()) {
            warn!(error = %e, "calibrated parameters still violate expected bands");
            report.remaining_violations = e.violations.iter().map(ToString::to_string).collect();
        }

        info!(
            status = %report.status(),
            updated = report.updated().count(),
            mae_before = report.overall_before,
            mae_after = report.overall_after,
            "calibration finished"
        );

        Ok(CalibrationOutcome {
            parameters: working,
            report,
        })
    }

    fn job<'a>(
        &self,
        factor: Factor,
        samples: &[&'a PreparedSample],
        params: &CalibrationParameters,
    ) -> SearchJob<'a> {
        SearchJob {
            factor,
            samples: samples.to_vec(),
            start: params.factor(factor),
            search: *self
                .config
                .search(factor.group())
                .get(factor.channel().family()),
        }
    }

    fn run_pass(
        &self,
        group: ParameterGroup,
        jobs: Vec<SearchJob<'_>>,
        working: &mut CalibrationParameters,
        factors: &mut Vec<FactorOutcome>,
    ) {
        debug!(%group, factors = jobs.len(), "calibration pass");
        if self.config.parallel {
            let snapshot = working.clone();
            let outcomes: Vec<SearchOutcome> = jobs
                .par_iter()
                .map(|job| run_search(job, &snapshot))
                .collect();
            for (job, outcome) in jobs.iter().zip(outcomes) {
                factors.push(apply(job, &outcome, working));
            }
        } else {
            for job in &jobs {
                let outcome = run_search(job, working);
                factors.push(apply(job, &outcome, working));
            }
        }
    }
}

fn run_search(job: &SearchJob<'_>, params: &CalibrationParameters) -> SearchOutcome {
    let factor = job.factor;
    let channel = factor.channel();
    let error_fn = |candidate: f64, subset: &[&PreparedSample]| {
        whole_sample_mae(subset, channel, &params.with_factor(factor, candidate)).unwrap_or(0.0)
    };
    search_factor(&job.samples, channel, job.start, error_fn, &job.search)
}

fn apply(
    job: &SearchJob<'_>,
    outcome: &SearchOutcome,
    working: &mut CalibrationParameters,
) -> FactorOutcome {
    let before = working.factor(job.factor);
    let (after, status) = match outcome.status {
        SearchStatus::InsufficientData => (before, FactorStatus::InsufficientData),
        SearchStatus::InvalidBounds => (before, FactorStatus::Unchanged),
        SearchStatus::Improved | SearchStatus::Unchanged => {
            if outcome.value.to_bits() == before.to_bits() {
                (before, FactorStatus::Unchanged)
            } else {
                (outcome.value, FactorStatus::Updated)
            }
        }
    };
    working.set_factor(job.factor, after);
    debug!(
        factor = %job.factor,
        before,
        after,
        samples = outcome.qualifying_samples,
        ?status,
        "factor searched"
    );
    FactorOutcome {
        factor: job.factor,
        before,
        after,
        qualifying_samples: outcome.qualifying_samples,
        status,
    }
}

/// Calibrate with the default configuration.
pub fn calibrate(samples: &[MeasuredSample], initial: &CalibrationParameters) -> Result<CalibrationOutcome> {
    Calibrator::default().calibrate(samples, initial)
}
