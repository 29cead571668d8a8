//! Public configuration types for the route cost model.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::ScoringConfigError;

/// Score points per litre of estimated fuel.
pub const FUEL_TO_SCORE: f64 = 300.0;

/// Score points per unit of traffic factor above 1.0.
pub const TRAFFIC_TO_SCORE: f64 = 1000.0;

/// Relative importance of each cost component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Multiplier applied to the duration in seconds.
    pub time: f64,
    /// Multiplier applied to the scaled fuel estimate.
    pub fuel: f64,
    /// Multiplier applied to the scaled traffic penalty.
    pub traffic: f64,
}

impl ScoringWeights {
    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ScoringConfigError::InvalidWeights`] when a value is not
    /// finite or negative, or when every weight is zero.
    pub fn validate(self) -> Result<Self, ScoringConfigError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(ScoringConfigError::InvalidWeights {
                time: self.time,
                fuel: self.fuel,
                traffic: self.traffic,
            })
        }
    }

    const fn is_valid(self) -> bool {
        self.has_finite_values() && self.has_non_negative_values() && self.has_non_zero_total()
    }

    const fn has_finite_values(self) -> bool {
        self.time.is_finite() && self.fuel.is_finite() && self.traffic.is_finite()
    }

    const fn has_non_negative_values(self) -> bool {
        self.time >= 0.0 && self.fuel >= 0.0 && self.traffic >= 0.0
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "validation sums weights to ensure a non-zero total"
    )]
    const fn has_non_zero_total(self) -> bool {
        (self.time + self.fuel + self.traffic) > 0.0
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            time: 0.5,
            fuel: 0.3,
            traffic: 0.2,
        }
    }
}

/// Cost model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Fuel efficiency in free-flowing traffic, in kilometres per litre.
    pub base_efficiency_km_per_liter: f64,
    /// Component weights.
    pub weights: ScoringWeights,
}

impl ScoringConfig {
    /// Validate the configuration and return a copy.
    ///
    /// # Errors
    /// Returns [`ScoringConfigError`] for a non-positive efficiency or
    /// invalid weights.
    pub fn validate(self) -> Result<Self, ScoringConfigError> {
        let efficiency = self.base_efficiency_km_per_liter;
        if !efficiency.is_finite() || efficiency <= 0.0 {
            return Err(ScoringConfigError::InvalidEfficiency { value: efficiency });
        }
        self.weights.validate()?;
        Ok(self)
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_efficiency_km_per_liter: 12.0,
            weights: ScoringWeights::default(),
        }
    }
}
