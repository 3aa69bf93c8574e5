//! Expected magnitude bands per calibration family.
//!
//! A parameter outside its band is treated as a defect, not as a valid
//! calibration. The bands are wide enough for real drift between printers
//! but narrow enough to catch unit mistakes: a standard-channel scaling
//! factor persisted 100x too small (e.g. `3.9e-6` instead of `3.9e-4`)
//! falls below [`STANDARD`]'s scaling band.

use serde::{Deserialize, Serialize};

use crate::ink::CalibrationFamily;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagnitudeBand {
    pub min: f64,
    pub max: f64,
}

impl MagnitudeBand {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` is finite and inside the band.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Whether `[lo, hi]` lies entirely inside the band.
    #[must_use]
    pub fn covers(&self, lo: f64, hi: f64) -> bool {
        self.contains(lo) && self.contains(hi) && lo <= hi
    }
}

impl std::fmt::Display for MagnitudeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Bands for one calibration family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilyBands {
    pub base_consumption: MagnitudeBand,
    pub scaling_factor: MagnitudeBand,
    pub quality_multiplier: MagnitudeBand,
}

/// Process colors.
pub const STANDARD: FamilyBands = FamilyBands {
    base_consumption: MagnitudeBand::new(0.0, 0.1),
    scaling_factor: MagnitudeBand::new(1e-5, 1e-3),
    quality_multiplier: MagnitudeBand::new(0.25, 4.0),
};

/// Finishing layers.
pub const SPECIAL: FamilyBands = FamilyBands {
    base_consumption: MagnitudeBand::new(0.0, 0.5),
    scaling_factor: MagnitudeBand::new(1e-4, 1e-2),
    quality_multiplier: MagnitudeBand::new(0.25, 4.0),
};

/// Area correction multipliers, shared by both families.
pub const AREA_MULTIPLIER: MagnitudeBand = MagnitudeBand::new(0.25, 4.0);

/// Bands for `family`.
#[must_use]
pub fn for_family(family: CalibrationFamily) -> &'static FamilyBands {
    match family {
        CalibrationFamily::Standard => &STANDARD,
        CalibrationFamily::Special => &SPECIAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains() {
        let band = MagnitudeBand::new(1e-5, 1e-3);
        assert!(band.contains(1e-5));
        assert!(band.contains(3.9e-4));
        assert!(!band.contains(3.9e-6));
        assert!(!band.contains(f64::NAN));
        assert!(!band.contains(f64::INFINITY));
    }

    #[test]
    fn test_special_scaling_is_a_decade_higher() {
        assert!(SPECIAL.scaling_factor.min > STANDARD.scaling_factor.min);
        assert!(SPECIAL.scaling_factor.max > STANDARD.scaling_factor.max);
    }

    #[test]
    fn test_covers() {
        let band = MagnitudeBand::new(0.0, 0.1);
        assert!(band.covers(0.001, 0.1));
        assert!(!band.covers(0.001, 0.5));
        assert!(!band.covers(0.05, 0.01));
    }
}
