//! Route corridor monitor.
//!
//! Tracks whether each active trip's vehicle is within its planned corridor.
//! The off-route flag follows every usable sample, while violation records
//! are throttled by a cooldown measured in sample time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fleetwatch_core::{CorridorViolation, EventSink, LocationSample, MonitorEvent, RouteCorridor};
use log::{debug, info};
use uuid::Uuid;

use crate::config::CorridorConfig;

/// What a sample did to a trip's corridor state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CorridorStep {
    /// New value of the off-route flag when it flipped.
    pub state_change: Option<bool>,
    /// Whether a violation record is due.
    pub violation: bool,
    /// Whether the sample was ignored as out of order.
    pub stale: bool,
}

/// Per-trip runtime state, created when monitoring starts and dropped when
/// it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorridorRuntimeState {
    is_off_route: bool,
    last_violation_at: Option<DateTime<Utc>>,
    last_sample_at: Option<DateTime<Utc>>,
}

impl CorridorRuntimeState {
    /// Whether the last usable sample lay outside the corridor.
    #[must_use]
    pub const fn is_off_route(&self) -> bool {
        self.is_off_route
    }

    /// Timestamp of the last emitted violation.
    #[must_use]
    pub const fn last_violation_at(&self) -> Option<DateTime<Utc>> {
        self.last_violation_at
    }

    /// Apply a sample taken at `at` lying `distance_meters` from the path.
    pub fn observe(
        &mut self,
        distance_meters: f64,
        radius_meters: f64,
        at: DateTime<Utc>,
        cooldown: Duration,
    ) -> CorridorStep {
        if self.last_sample_at.is_some_and(|last| at < last) {
            return CorridorStep {
                stale: true,
                ..CorridorStep::default()
            };
        }
        self.last_sample_at = Some(at);
        let outside = distance_meters > radius_meters;
        let state_change = (outside != self.is_off_route).then_some(outside);
        self.is_off_route = outside;
        let violation = outside && self.cooldown_elapsed(at, cooldown);
        if violation {
            self.last_violation_at = Some(at);
        }
        CorridorStep {
            state_change,
            violation,
            stale: false,
        }
    }

    fn cooldown_elapsed(&self, at: DateTime<Utc>, cooldown: Duration) -> bool {
        self.last_violation_at.is_none_or(|last| {
            at.signed_duration_since(last)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= cooldown)
        })
    }
}

#[derive(Debug)]
struct TripMonitor {
    corridor: RouteCorridor,
    state: Mutex<CorridorRuntimeState>,
}

/// Off-route detection for any number of concurrent trips.
///
/// Each trip's state sits behind its own lock, so samples for different
/// trips proceed in parallel.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use uuid::Uuid;
/// use fleetwatch_core::{NullSink, RouteCorridor};
/// use fleetwatch_monitor::{CorridorConfig, CorridorMonitor};
///
/// let monitor = CorridorMonitor::new(CorridorConfig::default(), NullSink);
/// let trip_id = Uuid::new_v4();
/// let path = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.01, y: 0.0 }];
/// monitor.start(RouteCorridor::new(trip_id, path, 50.0)?);
/// assert_eq!(monitor.is_off_route(trip_id), Some(false));
/// monitor.stop(trip_id);
/// assert_eq!(monitor.is_off_route(trip_id), None);
/// # Ok::<(), fleetwatch_core::CorridorError>(())
/// ```
#[derive(Debug)]
pub struct CorridorMonitor<S>
where
    S: EventSink,
{
    config: CorridorConfig,
    trips: RwLock<HashMap<Uuid, Arc<TripMonitor>>>,
    sink: S,
}

impl<S> CorridorMonitor<S>
where
    S: EventSink,
{
    /// Create a monitor with no active trips.
    #[must_use]
    pub fn new(config: CorridorConfig, sink: S) -> Self {
        Self {
            config,
            trips: RwLock::new(HashMap::new()),
            sink,
        }
    }

    /// Monitor configuration.
    #[must_use]
    pub const fn config(&self) -> &CorridorConfig {
        &self.config
    }

    /// Begin monitoring a trip, replacing any previous corridor for it.
    pub fn start(&self, corridor: RouteCorridor) {
        let trip_id = corridor.trip_id();
        if corridor.waypoints().len() < 2 {
            debug!("trip {trip_id}: corridor has fewer than two waypoints; samples will be skipped");
        }
        let monitor = Arc::new(TripMonitor {
            corridor,
            state: Mutex::new(CorridorRuntimeState::default()),
        });
        let previous = self
            .trips
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(trip_id, monitor);
        if previous.is_some() {
            info!("trip {trip_id}: corridor replaced");
        } else {
            info!("trip {trip_id}: corridor monitoring started");
        }
    }

    /// Stop monitoring a trip; unknown trips are ignored.
    pub fn stop(&self, trip_id: Uuid) {
        let removed = self
            .trips
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&trip_id);
        if removed.is_some() {
            info!("trip {trip_id}: corridor monitoring stopped");
        }
    }

    /// Off-route flag for an active trip, or `None` when it is not
    /// monitored.
    #[must_use]
    pub fn is_off_route(&self, trip_id: Uuid) -> Option<bool> {
        self.trip(trip_id).map(|monitor| {
            monitor
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_off_route()
        })
    }

    /// Identifiers of all monitored trips, sorted.
    #[must_use]
    pub fn active_trips(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .trips
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Evaluate a sample for `trip_id` and publish state changes and
    /// violations.
    ///
    /// Samples for unknown trips, imprecise samples and samples against a
    /// corridor with fewer than two waypoints are skipped.
    pub fn process(&self, trip_id: Uuid, sample: &LocationSample) {
        let Some(monitor) = self.trip(trip_id) else {
            debug!("trip {trip_id}: not monitored; ignoring sample");
            return;
        };
        if !sample.is_usable(self.config.accuracy_ceiling_meters) {
            debug!(
                "trip {trip_id}: discarding sample at {} with accuracy {} m",
                sample.timestamp, sample.horizontal_accuracy_meters
            );
            return;
        }
        let Some(distance) = monitor.corridor.distance_from(sample.location) else {
            debug!("trip {trip_id}: corridor too short to evaluate");
            return;
        };
        let mut state = monitor.state.lock().unwrap_or_else(PoisonError::into_inner);
        let step = state.observe(
            distance,
            monitor.corridor.corridor_radius_meters(),
            sample.timestamp,
            self.config.violation_cooldown,
        );
        if step.stale {
            debug!("trip {trip_id}: ignoring out-of-order sample at {}", sample.timestamp);
            return;
        }
        // Publish while holding the trip lock so events keep sample order.
        if let Some(is_off_route) = step.state_change {
            info!(
                "trip {trip_id}: {} ({distance:.1} m from route)",
                if is_off_route { "left corridor" } else { "back on route" }
            );
            self.sink.publish(MonitorEvent::CorridorStateChanged {
                trip_id,
                is_off_route,
                timestamp: sample.timestamp,
            });
        }
        if step.violation {
            info!("trip {trip_id}: corridor violation at {distance:.1} m");
            self.sink.publish(
                CorridorViolation::new(trip_id, sample.location, distance, sample.timestamp).into(),
            );
        }
    }

    fn trip(&self, trip_id: Uuid) -> Option<Arc<TripMonitor>> {
        self.trips
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&trip_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_core::test_support::{RecordingSink, at_seconds, offset_north, sample_at};
    use geo::Coord;
    use rstest::{fixture, rstest};

    const TRIP: Uuid = Uuid::from_u128(42);

    fn corridor() -> RouteCorridor {
        let path = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 0.01, y: 0.0 },
            Coord { x: 0.02, y: 0.0 },
        ];
        RouteCorridor::new(TRIP, path, 50.0).expect("corridor")
    }

    #[fixture]
    fn sink() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::new())
    }

    fn monitor(sink: &Arc<RecordingSink>) -> CorridorMonitor<Arc<RecordingSink>> {
        let monitor = CorridorMonitor::new(CorridorConfig::default(), Arc::clone(sink));
        monitor.start(corridor());
        monitor
    }

    fn off_route(metres: f64, seconds: i64) -> LocationSample {
        sample_at(offset_north(Coord { x: 0.005, y: 0.0 }, metres), seconds)
    }

    #[rstest]
    #[case(10, 1)]
    #[case(299, 1)]
    #[case(300, 2)]
    #[case(301, 2)]
    fn violations_respect_cooldown(
        sink: Arc<RecordingSink>,
        #[case] gap: i64,
        #[case] expected: usize,
    ) {
        let monitor = monitor(&sink);
        monitor.process(TRIP, &off_route(80.0, 0));
        monitor.process(TRIP, &off_route(90.0, gap));
        assert_eq!(sink.violations().len(), expected);
        assert_eq!(monitor.is_off_route(TRIP), Some(true));
    }

    #[rstest]
    fn state_changes_follow_every_sample(sink: Arc<RecordingSink>) {
        let monitor = monitor(&sink);
        monitor.process(TRIP, &off_route(10.0, 0));
        monitor.process(TRIP, &off_route(80.0, 10));
        monitor.process(TRIP, &off_route(20.0, 20));
        let kinds: Vec<String> = sink
            .events()
            .iter()
            .map(|event| match event {
                MonitorEvent::CorridorStateChanged { is_off_route, .. } => {
                    format!("state:{is_off_route}")
                }
                MonitorEvent::CorridorViolation(_) => "violation".to_owned(),
                MonitorEvent::Geofence(_) => "geofence".to_owned(),
            })
            .collect();
        assert_eq!(kinds, ["state:true", "violation", "state:false"]);
    }

    #[rstest]
    fn reentry_does_not_reset_cooldown(sink: Arc<RecordingSink>) {
        let monitor = monitor(&sink);
        monitor.process(TRIP, &off_route(80.0, 0));
        monitor.process(TRIP, &off_route(0.0, 30));
        monitor.process(TRIP, &off_route(80.0, 60));
        assert_eq!(sink.violations().len(), 1);
    }

    #[rstest]
    fn imprecise_and_unknown_samples_are_skipped(sink: Arc<RecordingSink>) {
        let monitor = monitor(&sink);
        let mut noisy = off_route(500.0, 0);
        noisy.horizontal_accuracy_meters = 51.0;
        monitor.process(TRIP, &noisy);
        monitor.process(Uuid::from_u128(7), &off_route(500.0, 0));
        assert!(sink.events().is_empty());
        assert_eq!(monitor.is_off_route(TRIP), Some(false));
    }

    #[rstest]
    fn degenerate_corridor_is_skipped(sink: Arc<RecordingSink>) {
        let monitor = CorridorMonitor::new(CorridorConfig::default(), Arc::clone(&sink));
        let single = RouteCorridor::new(TRIP, vec![Coord { x: 0.0, y: 0.0 }], 50.0)
            .expect("corridor");
        monitor.start(single);
        monitor.process(TRIP, &off_route(500.0, 0));
        assert!(sink.events().is_empty());
    }

    #[rstest]
    fn stale_samples_are_ignored() {
        let mut state = CorridorRuntimeState::default();
        let cooldown = Duration::from_secs(300);
        let _ = state.observe(80.0, 50.0, at_seconds(100), cooldown);
        let step = state.observe(0.0, 50.0, at_seconds(50), cooldown);
        assert!(step.stale);
        assert!(state.is_off_route());
        assert_eq!(state.last_violation_at(), Some(at_seconds(100)));
    }

    #[rstest]
    fn stop_and_restart_reset_state(sink: Arc<RecordingSink>) {
        let monitor = monitor(&sink);
        monitor.process(TRIP, &off_route(80.0, 0));
        monitor.stop(TRIP);
        monitor.stop(TRIP);
        assert!(monitor.active_trips().is_empty());
        monitor.start(corridor());
        assert_eq!(monitor.active_trips(), vec![TRIP]);
        monitor.process(TRIP, &off_route(80.0, 10));
        assert_eq!(sink.violations().len(), 2);
    }
}
