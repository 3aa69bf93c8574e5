//! Channels, calibration families and ink modes.

mod channel;
mod mode;

pub use channel::{CalibrationFamily, Channel, PerChannel};
pub use mode::InkMode;
