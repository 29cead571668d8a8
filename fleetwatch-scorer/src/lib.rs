//! Route scoring for the fleetwatch engine.
//!
//! [`CostModelScorer`] implements [`RouteScorer`] with a fuel, time and
//! traffic cost model:
//!
//! 1. The implied average speed of each candidate selects a traffic factor:
//!    below 20 km/h gives 1.4, below 40 km/h gives 1.2, anything faster 1.0.
//! 2. Fuel is `distance_km / base_efficiency * traffic_factor`.
//! 3. The score is `duration_s * w_time + fuel * 300 * w_fuel +
//!    (traffic_factor - 1) * 1000 * w_traffic`. Lower is better.
//!
//! Results are ranked by ascending score and the first is recommended. The
//! shortest route is labelled `Fastest` and the thriftiest `FuelEfficient`;
//! when one route is both it keeps `Fastest`. Ties go to the earlier input.
//!
//! # Examples
//!
//! ```
//! use fleetwatch_core::{CandidateRoute, RouteScorer, RouteType};
//! use fleetwatch_scorer::CostModelScorer;
//!
//! let scorer = CostModelScorer::default();
//! let routes = [
//!     CandidateRoute::new(10_000.0, 600.0, Vec::new())?,
//!     CandidateRoute::new(12_000.0, 900.0, Vec::new())?,
//! ];
//! let ranked = scorer.score(&routes);
//! assert!(ranked[0].is_recommended);
//! assert_eq!(ranked[0].route_type, RouteType::Fastest);
//! # Ok::<(), fleetwatch_core::RouteError>(())
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use fleetwatch_core::{CandidateRoute, RouteScorer, RouteType, ScoredRoute};
use log::debug;

mod error;
mod types;

pub use error::ScoringConfigError;
pub use types::{FUEL_TO_SCORE, ScoringConfig, ScoringWeights, TRAFFIC_TO_SCORE};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Map an average speed to its traffic factor.
///
/// Non-finite speeds (zero-duration routes) count as free-flowing.
///
/// ```
/// use fleetwatch_scorer::traffic_factor_for_speed;
///
/// assert_eq!(traffic_factor_for_speed(15.0), 1.4);
/// assert_eq!(traffic_factor_for_speed(30.0), 1.2);
/// assert_eq!(traffic_factor_for_speed(40.0), 1.0);
/// ```
#[must_use]
pub fn traffic_factor_for_speed(speed_kmh: f64) -> f64 {
    if speed_kmh < 20.0 {
        1.4
    } else if speed_kmh < 40.0 {
        1.2
    } else {
        1.0
    }
}

/// Cost-model evaluation of a single candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteCost {
    /// Implied average speed in km/h; infinite for zero-duration routes.
    pub average_speed_kmh: f64,
    /// Traffic multiplier.
    pub traffic_factor: f64,
    /// Estimated fuel in litres.
    pub fuel_liters: f64,
    /// Weighted score, lower is better.
    pub score: f64,
}

/// Weighted fuel/time/traffic route scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModelScorer {
    config: ScoringConfig,
}

impl CostModelScorer {
    /// Construct a scorer from a validated configuration.
    ///
    /// # Errors
    /// Returns [`ScoringConfigError`] when the configuration is invalid.
    pub fn new(config: ScoringConfig) -> Result<Self, ScoringConfigError> {
        Ok(Self {
            config: config.validate()?,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate one candidate without ranking it.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the cost model is a floating-point formula"
    )]
    pub fn evaluate(&self, candidate: &CandidateRoute) -> RouteCost {
        let distance_km = candidate.distance_km();
        let hours = candidate.expected_duration_seconds() / SECONDS_PER_HOUR;
        let average_speed_kmh = if hours > 0.0 {
            distance_km / hours
        } else {
            f64::INFINITY
        };
        let traffic_factor = traffic_factor_for_speed(average_speed_kmh);
        let fuel_liters = distance_km / self.config.base_efficiency_km_per_liter * traffic_factor;
        let weights = self.config.weights;
        let score = candidate.expected_duration_seconds() * weights.time
            + fuel_liters * FUEL_TO_SCORE * weights.fuel
            + (traffic_factor - 1.0) * TRAFFIC_TO_SCORE * weights.traffic;
        RouteCost {
            average_speed_kmh,
            traffic_factor,
            fuel_liters,
            score,
        }
    }
}

impl Default for CostModelScorer {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
        }
    }
}

impl RouteScorer for CostModelScorer {
    fn score(&self, candidates: &[CandidateRoute]) -> Vec<ScoredRoute> {
        let costs: Vec<RouteCost> = candidates.iter().map(|c| self.evaluate(c)).collect();
        let fastest = first_minimum(candidates.iter().map(CandidateRoute::expected_duration_seconds));
        let thriftiest = first_minimum(costs.iter().map(|cost| cost.fuel_liters));

        let mut ranked: Vec<(usize, &CandidateRoute, RouteCost)> = candidates
            .iter()
            .zip(costs)
            .enumerate()
            .map(|(index, (candidate, cost))| (index, candidate, cost))
            .collect();
        ranked.sort_by(|a, b| a.2.score.total_cmp(&b.2.score));

        let scored: Vec<ScoredRoute> = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (index, candidate, cost))| ScoredRoute {
                candidate: candidate.clone(),
                route_type: label(index, fastest, thriftiest),
                score: cost.score,
                fuel_estimate_liters: cost.fuel_liters,
                traffic_factor: cost.traffic_factor,
                is_recommended: rank == 0,
            })
            .collect();
        if let Some(best) = scored.first() {
            debug!(
                "scored {} candidate routes; best score {:.1} ({:?})",
                scored.len(),
                best.score,
                best.route_type
            );
        }
        scored
    }
}

fn label(index: usize, fastest: Option<usize>, thriftiest: Option<usize>) -> RouteType {
    if fastest == Some(index) {
        RouteType::Fastest
    } else if thriftiest == Some(index) {
        RouteType::FuelEfficient
    } else {
        RouteType::Balanced
    }
}

/// Index of the first smallest value.
fn first_minimum(values: impl Iterator<Item = f64>) -> Option<usize> {
    values
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, value)| match best {
            Some((_, lowest)) if lowest <= value => best,
            _ => Some((index, value)),
        })
        .map(|(index, _)| index)
}
