//! Physical print dimensions.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length unit of measured print dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Inches,
    Millimeters,
    Centimeters,
}

impl LengthUnit {
    /// Length of one unit in inches.
    #[must_use]
    pub fn inches_per_unit(self) -> f64 {
        match self {
            Self::Inches => 1.0,
            Self::Millimeters => 1.0 / 25.4,
            Self::Centimeters => 1.0 / 2.54,
        }
    }

    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "in" | "inch" | "inches" | "\"" => Some(Self::Inches),
            "mm" | "millimeter" | "millimeters" | "millimetre" | "millimetres" => {
                Some(Self::Millimeters)
            }
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Some(Self::Centimeters)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inches => write!(f, "in"),
            Self::Millimeters => write!(f, "mm"),
            Self::Centimeters => write!(f, "cm"),
        }
    }
}

impl std::str::FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| Error::UnknownUnit(s.to_string()))
    }
}

/// Width x height of a print in some unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrintSize {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub unit: LengthUnit,
}

impl PrintSize {
    #[must_use]
    pub fn new(width: f64, height: f64, unit: LengthUnit) -> Self {
        Self {
            width,
            height,
            unit,
        }
    }

    /// Size given in inches.
    #[must_use]
    pub fn inches(width: f64, height: f64) -> Self {
        Self::new(width, height, LengthUnit::Inches)
    }

    /// Area in square inches.
    ///
    /// Rejects zero, negative and non-finite sides so a degenerate sample
    /// can never feed NaN or infinity into an aggregate.
    pub fn area_sq_in(&self) -> Result<f64> {
        let invalid = |reason: &str| Error::InvalidDimensions {
            width: self.width,
            height: self.height,
            reason: reason.to_string(),
        };
        if !self.width.is_finite() || !self.height.is_finite() {
            return Err(invalid("non-finite side"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(invalid("sides must be > 0"));
        }
        let k = self.unit.inches_per_unit();
        let area = (self.width * k) * (self.height * k);
        if !area.is_finite() || area <= 0.0 {
            return Err(invalid("area out of range"));
        }
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_inches() {
        assert_eq!(PrintSize::inches(5.0, 5.0).area_sq_in().unwrap(), 25.0);
    }

    #[test]
    fn test_area_millimeters() {
        let area = PrintSize::new(254.0, 127.0, LengthUnit::Millimeters)
            .area_sq_in()
            .unwrap();
        assert!((area - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_area_rejected() {
        assert!(PrintSize::inches(0.0, 5.0).area_sq_in().is_err());
        assert!(PrintSize::inches(-1.0, 5.0).area_sq_in().is_err());
        assert!(PrintSize::inches(f64::NAN, 5.0).area_sq_in().is_err());
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!(LengthUnit::from_str_loose("MM"), Some(LengthUnit::Millimeters));
        assert_eq!(LengthUnit::from_str_loose("inch"), Some(LengthUnit::Inches));
        assert!("furlong".parse::<LengthUnit>().is_err());
    }
}
