//! Planned-route corridors for deviation monitoring.

use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{is_valid_coordinate, min_distance_to_polyline};
use crate::polyline::{PolylineError, decode_polyline};

/// Errors returned when constructing a [`RouteCorridor`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CorridorError {
    /// The corridor radius was not a positive finite number.
    #[error("corridor radius must be positive and finite, got {radius_meters}")]
    InvalidRadius {
        /// The rejected radius.
        radius_meters: f64,
    },
    /// A waypoint was non-finite or outside WGS84 bounds.
    #[error("waypoint {index} ({longitude}, {latitude}) is not a valid WGS84 position")]
    InvalidWaypoint {
        /// Position of the offending waypoint.
        index: usize,
        /// Longitude of the offending waypoint.
        longitude: f64,
        /// Latitude of the offending waypoint.
        latitude: f64,
    },
    /// The encoded route geometry could not be decoded.
    #[error("route geometry could not be decoded")]
    Polyline(#[from] PolylineError),
}

/// The planned path of one trip and its allowed deviation.
///
/// A corridor with fewer than two waypoints is accepted but cannot be
/// measured against; [`RouteCorridor::distance_from`] then returns `None`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use uuid::Uuid;
/// use fleetwatch_core::RouteCorridor;
///
/// let corridor = RouteCorridor::new(
///     Uuid::new_v4(),
///     vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.01, y: 0.0 }],
///     100.0,
/// )?;
/// assert_eq!(corridor.distance_from(Coord { x: 0.005, y: 0.0 }).map(f64::round), Some(0.0));
/// # Ok::<(), fleetwatch_core::CorridorError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "CorridorRecord", into = "CorridorRecord")
)]
pub struct RouteCorridor {
    trip_id: Uuid,
    waypoints: Vec<Coord<f64>>,
    corridor_radius_meters: f64,
}

impl RouteCorridor {
    /// Validate and construct a corridor.
    ///
    /// # Errors
    /// Returns [`CorridorError::InvalidRadius`] for non-positive or
    /// non-finite radii and [`CorridorError::InvalidWaypoint`] for invalid
    /// coordinates.
    pub fn new(
        trip_id: Uuid,
        waypoints: Vec<Coord<f64>>,
        corridor_radius_meters: f64,
    ) -> Result<Self, CorridorError> {
        if !corridor_radius_meters.is_finite() || corridor_radius_meters <= 0.0 {
            return Err(CorridorError::InvalidRadius {
                radius_meters: corridor_radius_meters,
            });
        }
        if let Some((index, bad)) = waypoints
            .iter()
            .enumerate()
            .find(|(_, coord)| !is_valid_coordinate(**coord))
        {
            return Err(CorridorError::InvalidWaypoint {
                index,
                longitude: bad.x,
                latitude: bad.y,
            });
        }
        Ok(Self {
            trip_id,
            waypoints,
            corridor_radius_meters,
        })
    }

    /// Build a corridor from an encoded polyline as produced by routing
    /// services.
    ///
    /// # Errors
    /// Returns [`CorridorError::Polyline`] when decoding fails and the
    /// errors of [`RouteCorridor::new`] otherwise.
    pub fn from_encoded(
        trip_id: Uuid,
        encoded: &str,
        precision: u32,
        corridor_radius_meters: f64,
    ) -> Result<Self, CorridorError> {
        let waypoints = decode_polyline(encoded, precision)?;
        Self::new(trip_id, waypoints, corridor_radius_meters)
    }

    /// Trip this corridor belongs to.
    #[must_use]
    pub const fn trip_id(&self) -> Uuid {
        self.trip_id
    }

    /// Ordered waypoints of the planned path.
    #[must_use]
    pub fn waypoints(&self) -> &[Coord<f64>] {
        &self.waypoints
    }

    /// Maximum allowed distance from the path in metres.
    #[must_use]
    pub const fn corridor_radius_meters(&self) -> f64 {
        self.corridor_radius_meters
    }

    /// Minimum distance from `location` to the path, or `None` when the
    /// corridor has fewer than two waypoints.
    #[must_use]
    pub fn distance_from(&self, location: Coord<f64>) -> Option<f64> {
        min_distance_to_polyline(location, &self.waypoints)
    }
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorridorRecord {
    trip_id: Uuid,
    waypoints: Vec<Coord<f64>>,
    corridor_radius_meters: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<CorridorRecord> for RouteCorridor {
    type Error = CorridorError;

    fn try_from(record: CorridorRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.trip_id,
            record.waypoints,
            record.corridor_radius_meters,
        )
    }
}

#[cfg(feature = "serde")]
impl From<RouteCorridor> for CorridorRecord {
    fn from(corridor: RouteCorridor) -> Self {
        Self {
            trip_id: corridor.trip_id,
            waypoints: corridor.waypoints,
            corridor_radius_meters: corridor.corridor_radius_meters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline::{DEFAULT_PRECISION, encode_polyline};
    use rstest::rstest;

    fn path() -> Vec<Coord<f64>> {
        vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.01, y: 0.0 }]
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn rejects_bad_radius(#[case] radius: f64) {
        let err = RouteCorridor::new(Uuid::nil(), path(), radius).expect_err("radius");
        assert!(matches!(err, CorridorError::InvalidRadius { .. }));
    }

    #[rstest]
    fn rejects_invalid_waypoint() {
        let mut waypoints = path();
        waypoints.push(Coord { x: 200.0, y: 0.0 });
        let err = RouteCorridor::new(Uuid::nil(), waypoints, 100.0).expect_err("waypoint");
        assert!(matches!(err, CorridorError::InvalidWaypoint { index: 2, .. }));
    }

    #[rstest]
    fn short_corridor_has_no_distance() {
        let corridor = RouteCorridor::new(Uuid::nil(), vec![Coord { x: 0.0, y: 0.0 }], 100.0)
            .expect("corridor");
        assert_eq!(corridor.distance_from(Coord { x: 1.0, y: 1.0 }), None);
    }

    #[rstest]
    fn decodes_encoded_geometry() {
        let encoded = encode_polyline(&path(), DEFAULT_PRECISION).expect("encode");
        let corridor = RouteCorridor::from_encoded(Uuid::nil(), &encoded, DEFAULT_PRECISION, 50.0)
            .expect("corridor");
        assert_eq!(corridor.waypoints().len(), 2);
        assert_eq!(corridor.trip_id(), Uuid::nil());
    }

    #[rstest]
    fn reports_decoding_failures() {
        let err = RouteCorridor::from_encoded(Uuid::nil(), "_p~i", DEFAULT_PRECISION, 50.0)
            .expect_err("truncated");
        assert!(matches!(err, CorridorError::Polyline(PolylineError::Truncated { .. })));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    #[case::negative_radius(
        r#"{"trip_id":"00000000-0000-0000-0000-000000000000","waypoints":[{"x":0.0,"y":0.0},{"x":0.01,"y":0.0}],"corridor_radius_meters":-5.0}"#
    )]
    #[case::zero_radius(
        r#"{"trip_id":"00000000-0000-0000-0000-000000000000","waypoints":[{"x":0.0,"y":0.0},{"x":0.01,"y":0.0}],"corridor_radius_meters":0.0}"#
    )]
    #[case::out_of_range_waypoint(
        r#"{"trip_id":"00000000-0000-0000-0000-000000000000","waypoints":[{"x":0.0,"y":0.0},{"x":500.0,"y":0.0}],"corridor_radius_meters":50.0}"#
    )]
    fn deserialising_validates_corridors(#[case] json: &str) {
        assert!(serde_json::from_str::<RouteCorridor>(json).is_err());
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialised_corridors_load_back() {
        let corridor = RouteCorridor::new(Uuid::nil(), path(), 75.0).expect("corridor");
        let json = serde_json::to_string(&corridor).expect("serialise corridor");
        let loaded: RouteCorridor = serde_json::from_str(&json).expect("deserialise corridor");
        assert_eq!(loaded, corridor);
    }
}
