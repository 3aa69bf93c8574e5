//! # inkcal
//!
//! Ink volume estimation and auto-calibration for print jobs.
//!
//! The estimation model predicts the ink volume (mL) each channel of an ink
//! mode consumes for a print, from coverage, print area, quality tier and a
//! set of [`CalibrationParameters`]. Calibration fits those parameters to
//! measured samples by coordinate descent, and the store layer keeps the
//! result in validated, family-scoped records.
//!
//! ## Quick Start
//!
//! ```
//! use inkcal::model::{PrintJob, PrintSize, estimate};
//! use inkcal::{CalibrationParameters, InkMode, Quality};
//!
//! let params = CalibrationParameters::default();
//! let job = PrintJob::new(
//!     InkMode::CmykWhite.channels(),
//!     Quality::High,
//!     PrintSize::inches(8.0, 10.0),
//!     35.0,
//! );
//! let est = estimate(&job, &params)?;
//! assert_eq!(est.per_channel.len(), 5);
//! # Ok::<(), inkcal::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`error`]: Error types for the library
//! - [`ink`]: Channels, calibration families and ink modes
//! - [`model`]: The estimation formula and print geometry
//! - [`params`]: Calibration parameters, magnitude bands, validation, merge
//! - [`sample`]: Measured samples and CSV import
//! - [`calibration`]: Error evaluation, factor search and orchestration
//! - [`store`]: Parameter persistence
//! - [`stats`]: Error statistics

pub mod calibration;
pub mod error;
pub mod ink;
pub mod model;
pub mod params;
mod rfc3339;
pub mod sample;
pub mod stats;
pub mod store;

// Re-export commonly used types
pub use calibration::{AccuracyReport, CalibrationConfig, CalibrationOutcome, Calibrator, calibrate};
pub use error::{Error, Result};
pub use ink::{CalibrationFamily, Channel, InkMode, PerChannel};
pub use model::{InkEstimate, PrintJob, PrintSize, estimate, estimate_channel_volume};
pub use params::{CalibrationParameters, Quality, ValidationError, merge_by_channel_group, validate};
pub use sample::{MeasuredSample, SampleImporter};
pub use stats::Summary;
pub use store::{JsonFileStore, MemoryStore, ParameterStore};
