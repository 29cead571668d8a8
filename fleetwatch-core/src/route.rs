//! Candidate routes supplied by the routing collaborator and their scored
//! counterparts.

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`CandidateRoute::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// The declared distance was negative or not finite.
    #[error("route distance must be finite and non-negative, got {distance_meters}")]
    InvalidDistance {
        /// The rejected distance in metres.
        distance_meters: f64,
    },
    /// The declared duration was negative or not finite.
    #[error("route duration must be finite and non-negative, got {duration_seconds}")]
    InvalidDuration {
        /// The rejected duration in seconds.
        duration_seconds: f64,
    },
}

/// A route proposed by the external routing service.
///
/// The engine never computes directions; it only evaluates the declared
/// distance and duration.
///
/// # Examples
/// ```
/// use fleetwatch_core::CandidateRoute;
///
/// let route = CandidateRoute::new(10_000.0, 600.0, Vec::new())?;
/// assert_eq!(route.distance_km(), 10.0);
/// # Ok::<(), fleetwatch_core::RouteError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "CandidateRecord", into = "CandidateRecord")
)]
pub struct CandidateRoute {
    distance_meters: f64,
    expected_duration_seconds: f64,
    waypoints: Vec<Coord<f64>>,
}

impl CandidateRoute {
    /// Validate and construct a candidate route.
    ///
    /// # Errors
    /// Returns [`RouteError`] when the distance or duration is negative or
    /// not finite.
    pub fn new(
        distance_meters: f64,
        expected_duration_seconds: f64,
        waypoints: Vec<Coord<f64>>,
    ) -> Result<Self, RouteError> {
        if !distance_meters.is_finite() || distance_meters < 0.0 {
            return Err(RouteError::InvalidDistance { distance_meters });
        }
        if !expected_duration_seconds.is_finite() || expected_duration_seconds < 0.0 {
            return Err(RouteError::InvalidDuration {
                duration_seconds: expected_duration_seconds,
            });
        }
        Ok(Self {
            distance_meters,
            expected_duration_seconds,
            waypoints,
        })
    }

    /// Declared length in metres.
    #[must_use]
    pub const fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    /// Declared length in kilometres.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "unit conversion")]
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    /// Declared travel time in seconds.
    #[must_use]
    pub const fn expected_duration_seconds(&self) -> f64 {
        self.expected_duration_seconds
    }

    /// Path geometry, possibly empty.
    #[must_use]
    pub fn waypoints(&self) -> &[Coord<f64>] {
        &self.waypoints
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CandidateRecord {
    distance_meters: f64,
    expected_duration_seconds: f64,
    #[serde(default)]
    waypoints: Vec<Coord<f64>>,
}

#[cfg(feature = "serde")]
impl TryFrom<CandidateRecord> for CandidateRoute {
    type Error = RouteError;

    fn try_from(record: CandidateRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.distance_meters,
            record.expected_duration_seconds,
            record.waypoints,
        )
    }
}

#[cfg(feature = "serde")]
impl From<CandidateRoute> for CandidateRecord {
    fn from(route: CandidateRoute) -> Self {
        Self {
            distance_meters: route.distance_meters,
            expected_duration_seconds: route.expected_duration_seconds,
            waypoints: route.waypoints,
        }
    }
}

/// Categorical label attached to a scored route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteType {
    /// Shortest declared duration in the batch.
    Fastest,
    /// Lowest estimated fuel use in the batch.
    ///
    /// The fastest label takes precedence, so a batch whose fastest route is
    /// also its thriftiest has no `FuelEfficient` route at all.
    FuelEfficient,
    /// Neither of the above.
    Balanced,
}

/// A candidate annotated with its cost-model evaluation.
///
/// Lower scores are better. `is_recommended` and `route_type` are
/// independent: the recommended route may also be the fastest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScoredRoute {
    /// The evaluated candidate.
    pub candidate: CandidateRoute,
    /// Categorical label.
    pub route_type: RouteType,
    /// Scalar cost, lower is better.
    pub score: f64,
    /// Estimated fuel consumption in litres.
    pub fuel_estimate_liters: f64,
    /// Traffic multiplier derived from the implied average speed.
    pub traffic_factor: f64,
    /// Whether this route has the lowest score in its batch.
    pub is_recommended: bool,
}
