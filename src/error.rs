//! Error types for inkcal operations.

use thiserror::Error;

use crate::ink::Channel;
use crate::params::ValidationError;

/// Result type alias for inkcal operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during estimation, calibration or parameter storage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Coverage outside `[0, 100]` or not a finite number.
    #[error("Invalid coverage: {0} (expected 0.0-100.0 percent)")]
    InvalidCoverage(f64),

    /// Print dimensions that do not describe a positive, finite area.
    #[error("Invalid dimensions: {width} x {height} ({reason})")]
    InvalidDimensions {
        /// Width in the caller's unit.
        width: f64,
        /// Height in the caller's unit.
        height: f64,
        /// Why the geometry was rejected.
        reason: String,
    },

    /// A channel was referenced that is not part of the active ink mode.
    #[error("Channel {channel} is not part of ink mode [{ink_mode}]")]
    UnknownChannel {
        /// The offending channel.
        channel: Channel,
        /// The active ink mode's channels, comma separated.
        ink_mode: String,
    },

    /// Ink mode name missing from the reference channel-to-mode table.
    #[error("Unknown ink mode: {0}")]
    UnknownInkMode(String),

    /// Channel name that does not parse.
    #[error("Unknown channel name: {0}")]
    UnknownChannelName(String),

    /// Calibration family name that does not parse.
    #[error("Unknown calibration family: {0}")]
    UnknownFamily(String),

    /// Quality tier name that does not parse.
    #[error("Unknown quality tier: {0}")]
    UnknownQuality(String),

    /// Length unit name that does not parse.
    #[error("Unknown length unit: {0}")]
    UnknownUnit(String),

    /// Parameters failed the expected-magnitude validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Calibration configuration is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// Error importing measured samples from CSV.
    #[error("CSV import error at line {line}: {reason}")]
    CsvImport {
        /// Line number where the error occurred.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A save was not observed by the read that followed it.
    #[error("Store mismatch for {scope} calibration: re-read parameters differ from saved")]
    StoreMismatch {
        /// Scope that was written (`combined`, `standard` or `special`).
        scope: String,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
