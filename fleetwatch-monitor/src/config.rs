//! Monitor configuration.

use std::time::Duration;

use uuid::Uuid;

/// Accuracy ceiling applied when no other value is configured.
pub const DEFAULT_ACCURACY_CEILING_METERS: f64 = 50.0;

/// Minimum spacing between two violation records for the same trip.
pub const DEFAULT_VIOLATION_COOLDOWN: Duration = Duration::from_secs(300);

/// Number of zones that may be monitored at once by default.
pub const DEFAULT_ZONE_CAPACITY: usize = 20;

/// Configuration for [`GeofenceEngine`](crate::GeofenceEngine).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceConfig {
    /// Vehicle whose samples the engine evaluates; stamped on every event.
    pub vehicle_id: Uuid,
    /// Samples with a worse horizontal accuracy are discarded.
    pub accuracy_ceiling_meters: f64,
}

impl GeofenceConfig {
    /// Configuration for `vehicle_id` with the default accuracy ceiling.
    #[must_use]
    pub const fn for_vehicle(vehicle_id: Uuid) -> Self {
        Self {
            vehicle_id,
            accuracy_ceiling_meters: DEFAULT_ACCURACY_CEILING_METERS,
        }
    }
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self::for_vehicle(Uuid::nil())
    }
}

/// Configuration for [`CorridorMonitor`](crate::CorridorMonitor).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorConfig {
    /// Samples with a worse horizontal accuracy are discarded.
    pub accuracy_ceiling_meters: f64,
    /// Minimum sample-time spacing between violation records.
    pub violation_cooldown: Duration,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            accuracy_ceiling_meters: DEFAULT_ACCURACY_CEILING_METERS,
            violation_cooldown: DEFAULT_VIOLATION_COOLDOWN,
        }
    }
}

/// Configuration for [`RegionCapacityManager`](crate::RegionCapacityManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityConfig {
    /// Maximum number of simultaneously monitored zones.
    pub capacity: usize,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_ZONE_CAPACITY,
        }
    }
}
