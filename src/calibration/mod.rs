//! Auto-calibration of [`CalibrationParameters`](crate::CalibrationParameters)
//! against measured samples.
//!
//! - [`evaluator`]: absolute error, volume stratification, weighted MAE
//! - [`optimize_factor`] / [`search_factor`]: coarse-to-fine grid search of one factor
//! - [`Calibrator`]: coordinate descent over base, scaling and quality multiplier
//! - [`AccuracyReport`]: before/after accuracy and per-factor outcomes
//!
//! ## Example
//!
//! ```
//! use inkcal::calibration::calibrate;
//! use inkcal::model::PrintSize;
//! use inkcal::{CalibrationParameters, Channel, MeasuredSample, Quality};
//!
//! let samples: Vec<MeasuredSample> = [0.30, 0.31, 0.29]
//!     .into_iter()
//!     .map(|ml| {
//!         MeasuredSample::new("CMYK", Quality::Standard, PrintSize::inches(24.0, 36.0), 86.0)
//!             .with_measurement(Channel::Cyan, ml)
//!     })
//!     .collect();
//!
//! let outcome = calibrate(&samples, &CalibrationParameters::default())?;
//! assert!(outcome.report.overall_after <= outcome.report.overall_before);
//! # Ok::<(), inkcal::Error>(())
//! ```

mod config;
pub mod evaluator;
mod optimizer;
mod orchestrator;
mod report;

pub use config::{CalibrationConfig, CalibrationConfigBuilder, FamilySearch};
pub use evaluator::{ErrorWeighting, VolumeCategory, absolute_error, whole_sample_mae};
pub use optimizer::{
    FactorSearch, MIN_QUALIFYING_SAMPLES, SIGNIFICANT_FIGURES, SearchOutcome, SearchStatus,
    optimize_factor, round_significant, search_factor,
};
pub use orchestrator::{CalibrationOutcome, Calibrator, calibrate};
pub use report::{AccuracyReport, CalibrationStatus, ChannelAccuracy, FactorOutcome, FactorStatus};
