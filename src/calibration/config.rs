//! Search bounds and run options for calibration.

use serde::{Deserialize, Serialize};

use super::optimizer::FactorSearch;
use crate::error::{Error, Result};
use crate::ink::CalibrationFamily;
use crate::params::bands::{self, MagnitudeBand};
use crate::params::ParameterGroup;

/// One [`FactorSearch`] per calibration family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FamilySearch {
    pub standard: FactorSearch,
    pub special: FactorSearch,
}

impl FamilySearch {
    /// Search settings for `family`.
    #[must_use]
    pub fn get(&self, family: CalibrationFamily) -> &FactorSearch {
        match family {
            CalibrationFamily::Standard => &self.standard,
            CalibrationFamily::Special => &self.special,
        }
    }

    fn get_mut(&mut self, family: CalibrationFamily) -> &mut FactorSearch {
        match family {
            CalibrationFamily::Standard => &mut self.standard,
            CalibrationFamily::Special => &mut self.special,
        }
    }
}

/// Configuration of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Search for base consumption.
    pub base_consumption: FamilySearch,

    /// Search for channel scaling factors.
    pub scaling_factor: FamilySearch,

    /// Search for quality multipliers.
    pub quality_multiplier: FamilySearch,

    /// Samples a quality tier needs before its multipliers are searched.
    pub min_quality_tier_samples: usize,

    /// Starting point for a scaling search whose current value is not positive.
    pub scaling_fallback: f64,

    /// Search the channels of one pass concurrently.
    pub parallel: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            base_consumption: FamilySearch {
                standard: FactorSearch::new(0.001, 0.1, 8),
                special: FactorSearch::new(0.001, 0.5, 8),
            },
            scaling_factor: FamilySearch {
                standard: FactorSearch::new(0.000_01, 0.001, 8),
                special: FactorSearch::new(0.0001, 0.01, 8),
            },
            quality_multiplier: FamilySearch {
                standard: FactorSearch::new(0.5, 2.0, 6),
                special: FactorSearch::new(0.5, 2.0, 6),
            },
            min_quality_tier_samples: 2,
            scaling_fallback: 0.0001,
            parallel: false,
        }
    }
}

impl CalibrationConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> CalibrationConfigBuilder {
        CalibrationConfigBuilder::default()
    }

    /// Search settings of a parameter group.
    #[must_use]
    pub fn search(&self, group: ParameterGroup) -> &FamilySearch {
        match group {
            ParameterGroup::BaseConsumption => &self.base_consumption,
            ParameterGroup::ScalingFactor => &self.scaling_factor,
            ParameterGroup::QualityMultiplier => &self.quality_multiplier,
        }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every search interval against the magnitude band of its group.
    ///
    /// A search that could return a value outside the band would produce
    /// parameters the store refuses to save.
    pub fn validate(&self) -> Result<()> {
        for group in [
            ParameterGroup::BaseConsumption,
            ParameterGroup::ScalingFactor,
            ParameterGroup::QualityMultiplier,
        ] {
            for family in CalibrationFamily::ALL {
                let search = self.search(group).get(family);
                let band = band_for(group, family);
                if !search.has_valid_bounds() {
                    return Err(Error::Config(format!(
                        "{group} search for {family} channels has invalid bounds [{}, {}]",
                        search.min, search.max
                    )));
                }
                if !band.covers(search.min, search.max) {
                    return Err(Error::Config(format!(
                        "{group} search for {family} channels [{}, {}] leaves the band {band}",
                        search.min, search.max
                    )));
                }
                if search.iterations < 2 {
                    return Err(Error::Config(format!(
                        "{group} search for {family} channels needs at least 2 iterations"
                    )));
                }
            }
        }
        if !self.scaling_fallback.is_finite() || self.scaling_fallback <= 0.0 {
            return Err(Error::Config(format!(
                "scaling fallback must be > 0, got {}",
                self.scaling_fallback
            )));
        }
        Ok(())
    }
}

fn band_for(group: ParameterGroup, family: CalibrationFamily) -> MagnitudeBand {
    let bands = bands::for_family(family);
    match group {
        ParameterGroup::BaseConsumption => bands.base_consumption,
        ParameterGroup::ScalingFactor => bands.scaling_factor,
        ParameterGroup::QualityMultiplier => bands.quality_multiplier,
    }
}

/// Builder for [`CalibrationConfig`].
#[derive(Debug, Default)]
pub struct CalibrationConfigBuilder {
    config: CalibrationConfig,
}

impl CalibrationConfigBuilder {
    /// Set the search for one group and family.
    #[must_use]
    pub fn search(mut self, group: ParameterGroup, family: CalibrationFamily, search: FactorSearch) -> Self {
        let target = match group {
            ParameterGroup::BaseConsumption => &mut self.config.base_consumption,
            ParameterGroup::ScalingFactor => &mut self.config.scaling_factor,
            ParameterGroup::QualityMultiplier => &mut self.config.quality_multiplier,
        };
        *target.get_mut(family) = search;
        self
    }

    /// Set the iteration count of every search.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        for group in [
            &mut self.config.base_consumption,
            &mut self.config.scaling_factor,
            &mut self.config.quality_multiplier,
        ] {
            group.standard.iterations = iterations;
            group.special.iterations = iterations;
        }
        self
    }

    /// Set the sample count a quality tier needs.
    #[must_use]
    pub fn min_quality_tier_samples(mut self, n: usize) -> Self {
        self.config.min_quality_tier_samples = n;
        self
    }

    /// Search channels concurrently.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<CalibrationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        CalibrationConfig::default().validate().unwrap();
    }

    #[test]
    fn test_bounds_outside_band_rejected() {
        let err = CalibrationConfig::builder()
            .search(
                ParameterGroup::ScalingFactor,
                CalibrationFamily::Standard,
                FactorSearch::new(0.000_01, 0.01, 8),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("scaling_factor")));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = CalibrationConfig::builder()
            .search(
                ParameterGroup::QualityMultiplier,
                CalibrationFamily::Special,
                FactorSearch::new(2.0, 0.5, 6),
            )
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_sets_iterations() {
        let config = CalibrationConfig::builder()
            .iterations(12)
            .parallel(true)
            .build()
            .unwrap();
        assert!(config.parallel);
        assert_eq!(config.scaling_factor.special.iterations, 12);
        assert_eq!(config.quality_multiplier.standard.iterations, 12);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: CalibrationConfig = serde_json::from_str(r#"{ "parallel": true }"#).unwrap();
        assert!(config.parallel);
        assert_eq!(config.base_consumption, CalibrationConfig::default().base_consumption);
    }
}
