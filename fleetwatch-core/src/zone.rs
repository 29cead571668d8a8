//! Stationary circular zones and their membership classification.

use chrono::{DateTime, Utc};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::geometry::{distance_meters, is_valid_coordinate};

/// Smallest radius a zone may have after ingestion.
pub const MIN_ZONE_RADIUS_METERS: f64 = 100.0;

/// Largest radius a zone may have after ingestion.
pub const MAX_ZONE_RADIUS_METERS: f64 = 100_000.0;

/// Errors returned by [`CircularZone::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ZoneError {
    /// The centre was non-finite or outside WGS84 bounds.
    #[error("zone {id} has an invalid centre ({longitude}, {latitude})")]
    InvalidCenter {
        /// Identifier of the rejected zone.
        id: Uuid,
        /// Longitude of the rejected centre.
        longitude: f64,
        /// Latitude of the rejected centre.
        latitude: f64,
    },
    /// The radius was NaN or infinite.
    #[error("zone {id} has a non-finite radius")]
    NonFiniteRadius {
        /// Identifier of the rejected zone.
        id: Uuid,
    },
}

/// Inside/outside classification of a vehicle relative to one zone.
///
/// `Unknown` is the state before any sample has been evaluated, which keeps
/// the first evaluation from reporting a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Membership {
    /// No sample has been evaluated yet.
    #[default]
    Unknown,
    /// The last evaluated sample lay within the radius.
    Inside,
    /// The last evaluated sample lay beyond the radius.
    Outside,
}

/// A stationary circular geofence.
///
/// The engine holds a read-only copy of the definition owned by the storage
/// collaborator. Radii are clamped to
/// [`MIN_ZONE_RADIUS_METERS`]`..=`[`MAX_ZONE_RADIUS_METERS`] on construction
/// and on deserialisation.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use uuid::Uuid;
/// use fleetwatch_core::CircularZone;
///
/// let zone = CircularZone::new(Uuid::new_v4(), "Depot", Coord { x: 0.0, y: 0.0 }, 20.0)?;
/// assert_eq!(zone.radius_meters(), 100.0);
/// assert!(zone.contains(Coord { x: 0.0, y: 0.0 }));
/// # Ok::<(), fleetwatch_core::ZoneError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "ZoneRecord", into = "ZoneRecord")
)]
pub struct CircularZone {
    id: Uuid,
    name: String,
    center: Coord<f64>,
    radius_meters: f64,
    notify_on_entry: bool,
    notify_on_exit: bool,
    is_active: bool,
    activated_at: DateTime<Utc>,
}

impl CircularZone {
    /// Validate and construct an active zone that notifies on entry and exit.
    ///
    /// The activation timestamp defaults to the current time; use
    /// [`CircularZone::with_activated_at`] to set the stored value.
    ///
    /// # Errors
    /// Returns [`ZoneError`] when the centre is not a valid WGS84 position or
    /// the radius is not finite.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        center: Coord<f64>,
        radius_meters: f64,
    ) -> Result<Self, ZoneError> {
        if !is_valid_coordinate(center) {
            return Err(ZoneError::InvalidCenter {
                id,
                longitude: center.x,
                latitude: center.y,
            });
        }
        if !radius_meters.is_finite() {
            return Err(ZoneError::NonFiniteRadius { id });
        }
        Ok(Self {
            id,
            name: name.into(),
            center,
            radius_meters: radius_meters.clamp(MIN_ZONE_RADIUS_METERS, MAX_ZONE_RADIUS_METERS),
            notify_on_entry: true,
            notify_on_exit: true,
            is_active: true,
            activated_at: Utc::now(),
        })
    }

    /// Set which transitions produce events.
    #[must_use]
    pub const fn with_notifications(mut self, on_entry: bool, on_exit: bool) -> Self {
        self.notify_on_entry = on_entry;
        self.notify_on_exit = on_exit;
        self
    }

    /// Set whether the zone is eligible for monitoring.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Set the activation timestamp used to break capacity ties.
    #[must_use]
    pub const fn with_activated_at(mut self, activated_at: DateTime<Utc>) -> Self {
        self.activated_at = activated_at;
        self
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Human-readable label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zone centre (`x` = longitude, `y` = latitude).
    #[must_use]
    pub const fn center(&self) -> Coord<f64> {
        self.center
    }

    /// Clamped radius in metres.
    #[must_use]
    pub const fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Whether entering the zone produces an event.
    #[must_use]
    pub const fn notify_on_entry(&self) -> bool {
        self.notify_on_entry
    }

    /// Whether leaving the zone produces an event.
    #[must_use]
    pub const fn notify_on_exit(&self) -> bool {
        self.notify_on_exit
    }

    /// Whether the zone may occupy a monitoring slot.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// When the zone was last activated.
    #[must_use]
    pub const fn activated_at(&self) -> DateTime<Utc> {
        self.activated_at
    }

    /// Classify a position against the zone.
    ///
    /// A position exactly on the boundary counts as inside.
    #[must_use]
    pub fn membership_of(&self, location: Coord<f64>) -> Membership {
        if distance_meters(location, self.center) <= self.radius_meters {
            Membership::Inside
        } else {
            Membership::Outside
        }
    }

    /// Report whether `location` lies within the zone.
    #[must_use]
    pub fn contains(&self, location: Coord<f64>) -> bool {
        self.membership_of(location) == Membership::Inside
    }

    /// Report whether two definitions describe the same circle.
    #[must_use]
    #[expect(
        clippy::float_cmp,
        reason = "definitions are compared for exact equality after clamping"
    )]
    pub fn same_geometry(&self, other: &Self) -> bool {
        self.center == other.center && self.radius_meters == other.radius_meters
    }
}

/// Serialised form of [`CircularZone`]; deserialising re-applies validation
/// and clamping.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ZoneRecord {
    id: Uuid,
    name: String,
    center: Coord<f64>,
    radius_meters: f64,
    #[serde(default = "default_true")]
    notify_on_entry: bool,
    #[serde(default = "default_true")]
    notify_on_exit: bool,
    #[serde(default = "default_true")]
    is_active: bool,
    activated_at: DateTime<Utc>,
}

#[cfg(feature = "serde")]
const fn default_true() -> bool {
    true
}

#[cfg(feature = "serde")]
impl TryFrom<ZoneRecord> for CircularZone {
    type Error = ZoneError;

    fn try_from(record: ZoneRecord) -> Result<Self, Self::Error> {
        Ok(Self::new(record.id, record.name, record.center, record.radius_meters)?
            .with_notifications(record.notify_on_entry, record.notify_on_exit)
            .with_active(record.is_active)
            .with_activated_at(record.activated_at))
    }
}

#[cfg(feature = "serde")]
impl From<CircularZone> for ZoneRecord {
    fn from(zone: CircularZone) -> Self {
        Self {
            id: zone.id,
            name: zone.name,
            center: zone.center,
            radius_meters: zone.radius_meters,
            notify_on_entry: zone.notify_on_entry,
            notify_on_exit: zone.notify_on_exit,
            is_active: zone.is_active,
            activated_at: zone.activated_at,
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "tests offset coordinates by metric distances"
)]
mod tests {
    use super::*;
    use crate::geometry::METERS_PER_DEGREE;
    use rstest::rstest;

    fn origin() -> Coord<f64> {
        Coord { x: 0.0, y: 0.0 }
    }

    #[rstest]
    #[case(20.0, MIN_ZONE_RADIUS_METERS)]
    #[case(500.0, 500.0)]
    #[case(250_000.0, MAX_ZONE_RADIUS_METERS)]
    fn radius_is_clamped(#[case] requested: f64, #[case] expected: f64) {
        let zone = CircularZone::new(Uuid::nil(), "zone", origin(), requested).expect("zone");
        assert_eq!(zone.radius_meters(), expected);
    }

    #[rstest]
    fn rejects_non_finite_radius() {
        let err = CircularZone::new(Uuid::nil(), "zone", origin(), f64::NAN).expect_err("nan");
        assert_eq!(err, ZoneError::NonFiniteRadius { id: Uuid::nil() });
    }

    #[rstest]
    fn rejects_out_of_range_centre() {
        let centre = Coord { x: 0.0, y: 95.0 };
        let err = CircularZone::new(Uuid::nil(), "zone", centre, 500.0).expect_err("centre");
        assert!(matches!(err, ZoneError::InvalidCenter { .. }));
    }

    #[rstest]
    fn boundary_counts_as_inside() {
        let zone = CircularZone::new(Uuid::nil(), "zone", origin(), 500.0).expect("zone");
        let on_boundary = Coord {
            x: 0.0,
            y: 500.0 / METERS_PER_DEGREE,
        };
        let beyond = Coord {
            x: 0.0,
            y: 500.5 / METERS_PER_DEGREE,
        };
        assert!(zone.contains(on_boundary));
        assert_eq!(zone.membership_of(beyond), Membership::Outside);
    }

    #[rstest]
    fn metadata_changes_keep_geometry() {
        let zone = CircularZone::new(Uuid::nil(), "zone", origin(), 500.0).expect("zone");
        let renamed = CircularZone::new(Uuid::nil(), "renamed", origin(), 500.0)
            .expect("zone")
            .with_notifications(false, true);
        let resized = CircularZone::new(Uuid::nil(), "zone", origin(), 800.0).expect("zone");
        assert!(zone.same_geometry(&renamed));
        assert!(!zone.same_geometry(&resized));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialising_clamps_radius_and_defaults_flags() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "name": "Yard",
            "center": {"x": 0.0, "y": 0.0},
            "radius_meters": 5.0,
            "activated_at": "2024-01-01T00:00:00Z"
        }"#;
        let zone: CircularZone = serde_json::from_str(json).expect("deserialise zone");
        assert_eq!(zone.radius_meters(), MIN_ZONE_RADIUS_METERS);
        assert!(zone.is_active());
        assert!(zone.notify_on_entry());
        assert!(zone.notify_on_exit());
    }
}
