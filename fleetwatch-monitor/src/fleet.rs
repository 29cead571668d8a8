//! Sample fan-out across a vehicle's monitors.

use std::sync::Arc;

use fleetwatch_core::{EventSink, LocationSample};
use uuid::Uuid;

use crate::config::{CapacityConfig, CorridorConfig, GeofenceConfig};
use crate::corridor::CorridorMonitor;
use crate::geofence::GeofenceEngine;

/// A vehicle's geofence engine and corridor monitor sharing one sink.
///
/// Every sample goes to the geofence engine; it also goes to the corridor
/// monitor when the caller names the trip it belongs to.
#[derive(Debug)]
pub struct FleetMonitor<S>
where
    S: EventSink,
{
    geofence: GeofenceEngine<Arc<S>>,
    corridor: CorridorMonitor<Arc<S>>,
}

impl<S> FleetMonitor<S>
where
    S: EventSink,
{
    /// Build both monitors around `sink`.
    #[must_use]
    pub fn new(
        geofence: GeofenceConfig,
        capacity: CapacityConfig,
        corridor: CorridorConfig,
        sink: S,
    ) -> Self {
        let shared = Arc::new(sink);
        Self {
            geofence: GeofenceEngine::new(geofence, capacity, Arc::clone(&shared)),
            corridor: CorridorMonitor::new(corridor, shared),
        }
    }

    /// The geofence engine.
    #[must_use]
    pub const fn geofence(&self) -> &GeofenceEngine<Arc<S>> {
        &self.geofence
    }

    /// The corridor monitor.
    #[must_use]
    pub const fn corridor(&self) -> &CorridorMonitor<Arc<S>> {
        &self.corridor
    }

    /// Route one sample to the active monitors.
    pub fn process(&self, sample: &LocationSample, trip_id: Option<Uuid>) {
        self.geofence.process(sample);
        if let Some(trip) = trip_id {
            self.corridor.process(trip, sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_core::test_support::{RecordingSink, offset_north, sample_at};
    use fleetwatch_core::{CircularZone, MonitorEvent, RouteCorridor};
    use geo::Coord;
    use rstest::rstest;

    #[rstest]
    fn samples_reach_both_monitors() {
        let fleet = FleetMonitor::new(
            GeofenceConfig::default(),
            CapacityConfig::default(),
            CorridorConfig::default(),
            RecordingSink::new(),
        );
        let origin = Coord { x: 0.0, y: 0.0 };
        let trip = Uuid::from_u128(3);
        fleet
            .geofence()
            .admit(CircularZone::new(Uuid::from_u128(1), "yard", origin, 200.0).expect("zone"))
            .expect("admit");
        fleet.corridor().start(
            RouteCorridor::new(trip, vec![origin, Coord { x: 0.0, y: 0.01 }], 50.0)
                .expect("corridor"),
        );

        fleet.process(&sample_at(origin, 0), Some(trip));
        let away = Coord { x: 0.01, y: 0.005 };
        fleet.process(&sample_at(away, 60), Some(trip));
        fleet.process(&sample_at(offset_north(away, 10.0), 70), None);

        assert_eq!(
            fleet.geofence().membership(Uuid::from_u128(1)),
            Some(fleetwatch_core::Membership::Outside)
        );
        assert_eq!(fleet.corridor().is_off_route(trip), Some(true));
    }

    #[rstest]
    fn shared_sink_records_both_kinds() {
        let recorder = Arc::new(RecordingSink::new());
        let fleet = FleetMonitor::new(
            GeofenceConfig::default(),
            CapacityConfig::default(),
            CorridorConfig::default(),
            Arc::clone(&recorder),
        );
        let origin = Coord { x: 0.0, y: 0.0 };
        let trip = Uuid::from_u128(3);
        fleet
            .geofence()
            .admit(CircularZone::new(Uuid::from_u128(1), "yard", origin, 200.0).expect("zone"))
            .expect("admit");
        fleet.corridor().start(
            RouteCorridor::new(trip, vec![origin, Coord { x: 0.0, y: 0.01 }], 50.0)
                .expect("corridor"),
        );
        fleet.process(&sample_at(origin, 0), Some(trip));
        fleet.process(&sample_at(Coord { x: 0.01, y: 0.005 }, 60), Some(trip));

        let events = recorder.events();
        assert!(events.iter().any(|event| matches!(event, MonitorEvent::Geofence(_))));
        assert!(
            events
                .iter()
                .any(|event| matches!(event, MonitorEvent::CorridorViolation(_)))
        );
    }
}
