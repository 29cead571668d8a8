//! Events emitted by the monitors and handed to external collaborators.

use chrono::{DateTime, Utc};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a confirmed zone transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GeofenceEventType {
    /// The vehicle moved from outside to inside.
    Enter,
    /// The vehicle moved from inside to outside.
    Exit,
}

/// A confirmed zone transition. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeofenceEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Zone that was entered or left.
    pub zone_id: Uuid,
    /// Vehicle that crossed the boundary.
    pub vehicle_id: Uuid,
    /// Transition direction.
    pub event_type: GeofenceEventType,
    /// Timestamp of the sample that confirmed the transition.
    pub timestamp: DateTime<Utc>,
}

impl GeofenceEvent {
    /// Create an event with a fresh random identifier.
    #[must_use]
    pub fn new(
        zone_id: Uuid,
        vehicle_id: Uuid,
        event_type: GeofenceEventType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            zone_id,
            vehicle_id,
            event_type,
            timestamp,
        }
    }
}

/// A recorded breach of a trip's corridor tolerance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorridorViolation {
    /// Unique violation identifier.
    pub id: Uuid,
    /// Trip whose corridor was left.
    pub trip_id: Uuid,
    /// Position of the offending sample.
    pub driver_location: Coord<f64>,
    /// Distance from the planned path in metres.
    pub distance_from_route_meters: f64,
    /// Timestamp of the offending sample.
    pub timestamp: DateTime<Utc>,
}

impl CorridorViolation {
    /// Create a violation with a fresh random identifier.
    #[must_use]
    pub fn new(
        trip_id: Uuid,
        driver_location: Coord<f64>,
        distance_from_route_meters: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            driver_location,
            distance_from_route_meters,
            timestamp,
        }
    }
}

/// Everything the monitors publish.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum MonitorEvent {
    /// A zone was entered or left.
    Geofence(GeofenceEvent),
    /// A trip's off-route flag flipped.
    CorridorStateChanged {
        /// Trip whose state changed.
        trip_id: Uuid,
        /// New off-route flag.
        is_off_route: bool,
        /// Timestamp of the sample that caused the change.
        timestamp: DateTime<Utc>,
    },
    /// A throttled corridor violation record.
    CorridorViolation(CorridorViolation),
}

impl MonitorEvent {
    /// Timestamp of the sample that produced the event.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Geofence(event) => event.timestamp,
            Self::CorridorStateChanged { timestamp, .. } => *timestamp,
            Self::CorridorViolation(violation) => violation.timestamp,
        }
    }
}

impl From<GeofenceEvent> for MonitorEvent {
    fn from(event: GeofenceEvent) -> Self {
        Self::Geofence(event)
    }
}

impl From<CorridorViolation> for MonitorEvent {
    fn from(violation: CorridorViolation) -> Self {
        Self::CorridorViolation(violation)
    }
}
