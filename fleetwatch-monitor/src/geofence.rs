//! Circular geofence engine.
//!
//! Each monitored zone runs a three-state machine over
//! [`Membership`]: `Unknown` until the first usable sample, then `Inside` or
//! `Outside`. Only a change between `Inside` and `Outside` is a transition;
//! the first classification is silent so startup never reports a spurious
//! exit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fleetwatch_core::{
    CircularZone, EventSink, GeofenceEvent, GeofenceEventType, LocationSample, Membership,
};
use log::{debug, info};
use uuid::Uuid;

use crate::capacity::{CapacityError, MonitoredSet, RegionCapacityManager};
use crate::config::{CapacityConfig, GeofenceConfig};

/// Outcome of feeding one sample to a zone's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The sample predates one already evaluated and was ignored.
    Stale,
    /// The first sample fixed the initial membership.
    Initialised(Membership),
    /// Membership did not change.
    Unchanged,
    /// Membership flipped in the given direction.
    Transition(GeofenceEventType),
}

/// Per-zone runtime state, created on admission and dropped on eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneRuntimeState {
    membership: Membership,
    last_transition_at: Option<DateTime<Utc>>,
    last_sample_at: Option<DateTime<Utc>>,
}

impl ZoneRuntimeState {
    /// Current classification.
    #[must_use]
    pub const fn membership(&self) -> Membership {
        self.membership
    }

    /// Timestamp of the last confirmed transition.
    #[must_use]
    pub const fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.last_transition_at
    }

    /// Apply the classification of a sample taken at `at`.
    ///
    /// `observed` must be `Inside` or `Outside`.
    pub fn observe(&mut self, observed: Membership, at: DateTime<Utc>) -> Observation {
        if self.last_sample_at.is_some_and(|last| at < last) {
            return Observation::Stale;
        }
        self.last_sample_at = Some(at);
        let direction = match (self.membership, observed) {
            (_, Membership::Unknown) => return Observation::Unchanged,
            (Membership::Unknown, _) => {
                self.membership = observed;
                return Observation::Initialised(observed);
            }
            (current, next) if current == next => return Observation::Unchanged,
            (_, Membership::Inside) => GeofenceEventType::Enter,
            (_, Membership::Outside) => GeofenceEventType::Exit,
        };
        self.membership = observed;
        self.last_transition_at = Some(at);
        Observation::Transition(direction)
    }
}

/// Evaluates one vehicle's samples against its monitored zones.
///
/// The engine owns the vehicle's [`RegionCapacityManager`]; zones reach the
/// engine only through [`GeofenceEngine::reconcile`] or
/// [`GeofenceEngine::admit`]. Samples for different zones touch disjoint
/// state, while samples for the same zone are serialised by that zone's lock.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use uuid::Uuid;
/// use fleetwatch_core::{ChannelSink, CircularZone, LocationSample, Membership};
/// use fleetwatch_monitor::{CapacityConfig, GeofenceConfig, GeofenceEngine};
///
/// let (sink, _events) = ChannelSink::new();
/// let engine = GeofenceEngine::new(GeofenceConfig::default(), CapacityConfig::default(), sink);
/// let zone = CircularZone::new(Uuid::new_v4(), "Depot", Coord { x: 0.0, y: 0.0 }, 500.0)?;
/// let zone_id = zone.id();
/// engine.admit(zone)?;
/// engine.process(&LocationSample::new(Coord { x: 0.0, y: 0.001 }, 5.0, chrono::Utc::now()));
/// assert_eq!(engine.membership(zone_id), Some(Membership::Inside));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct GeofenceEngine<S>
where
    S: EventSink,
{
    config: GeofenceConfig,
    zones: RegionCapacityManager,
    sink: S,
}

impl<S> GeofenceEngine<S>
where
    S: EventSink,
{
    /// Create an engine with no monitored zones.
    #[must_use]
    pub fn new(config: GeofenceConfig, capacity: CapacityConfig, sink: S) -> Self {
        Self {
            config,
            zones: RegionCapacityManager::new(capacity),
            sink,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    /// The capacity manager holding the monitored set.
    #[must_use]
    pub const fn zones(&self) -> &RegionCapacityManager {
        &self.zones
    }

    /// Replace the monitored set from the full zone catalogue.
    ///
    /// See [`RegionCapacityManager::reconcile`].
    pub fn reconcile(&self, all_zones: &[CircularZone]) -> Arc<MonitoredSet> {
        self.zones.reconcile(all_zones)
    }

    /// Start monitoring a single zone.
    ///
    /// # Errors
    /// Propagates [`CapacityError`] from [`RegionCapacityManager::admit`].
    pub fn admit(&self, zone: CircularZone) -> Result<(), CapacityError> {
        self.zones.admit(zone)
    }

    /// Stop monitoring a zone; unknown ids are ignored.
    pub fn evict(&self, zone_id: Uuid) {
        self.zones.evict(zone_id);
    }

    /// Whether `zone_id` is currently monitored.
    #[must_use]
    pub fn is_monitored(&self, zone_id: Uuid) -> bool {
        self.zones.is_monitored(zone_id)
    }

    /// Current membership for a monitored zone, or `None` when the zone is
    /// not monitored.
    #[must_use]
    pub fn membership(&self, zone_id: Uuid) -> Option<Membership> {
        self.zones
            .snapshot()
            .get(zone_id)
            .map(|member| member.state().membership())
    }

    /// Evaluate a sample against every monitored zone and publish the
    /// resulting transitions.
    ///
    /// Imprecise samples are discarded without touching any state. Zones
    /// that are not monitored receive nothing.
    pub fn process(&self, sample: &LocationSample) {
        if !sample.is_usable(self.config.accuracy_ceiling_meters) {
            debug!(
                "vehicle {}: discarding sample at {} with accuracy {} m",
                self.config.vehicle_id, sample.timestamp, sample.horizontal_accuracy_meters
            );
            return;
        }
        let monitored = self.zones.snapshot();
        for member in monitored.iter() {
            let zone = member.zone();
            match member.observe(sample) {
                Observation::Transition(direction) => self.emit(zone, direction, sample.timestamp),
                Observation::Stale => debug!(
                    "zone {}: ignoring out-of-order sample at {}",
                    zone.id(),
                    sample.timestamp
                ),
                Observation::Initialised(_) | Observation::Unchanged => {}
            }
        }
    }

    fn emit(&self, zone: &CircularZone, direction: GeofenceEventType, at: DateTime<Utc>) {
        let notify = match direction {
            GeofenceEventType::Enter => zone.notify_on_entry(),
            GeofenceEventType::Exit => zone.notify_on_exit(),
        };
        info!(
            "vehicle {} {:?} zone {} ({}){}",
            self.config.vehicle_id,
            direction,
            zone.id(),
            zone.name(),
            if notify { "" } else { "; notification disabled" }
        );
        if notify {
            let event = GeofenceEvent::new(zone.id(), self.config.vehicle_id, direction, at);
            self.sink.publish(event.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_core::test_support::{RecordingSink, at_seconds, offset_north, sample_at};
    use geo::Coord;
    use rstest::{fixture, rstest};

    const ORIGIN: Coord<f64> = Coord { x: 0.0, y: 0.0 };

    type Engine = GeofenceEngine<Arc<RecordingSink>>;

    #[fixture]
    fn sink() -> Arc<RecordingSink> {
        Arc::new(RecordingSink::new())
    }

    fn engine_with(sink: &Arc<RecordingSink>, zone: CircularZone) -> Engine {
        let engine = GeofenceEngine::new(
            GeofenceConfig::for_vehicle(Uuid::from_u128(7)),
            CapacityConfig::default(),
            Arc::clone(sink),
        );
        engine.admit(zone).expect("admit zone");
        engine
    }

    fn depot() -> CircularZone {
        CircularZone::new(Uuid::from_u128(1), "Depot", ORIGIN, 500.0).expect("zone")
    }

    #[rstest]
    #[case(Membership::Inside)]
    #[case(Membership::Outside)]
    fn first_observation_is_silent(#[case] observed: Membership) {
        let mut state = ZoneRuntimeState::default();
        assert_eq!(
            state.observe(observed, at_seconds(0)),
            Observation::Initialised(observed)
        );
        assert_eq!(state.last_transition_at(), None);
    }

    #[rstest]
    fn transitions_alternate() {
        let mut state = ZoneRuntimeState::default();
        let _ = state.observe(Membership::Outside, at_seconds(0));
        assert_eq!(
            state.observe(Membership::Inside, at_seconds(1)),
            Observation::Transition(GeofenceEventType::Enter)
        );
        assert_eq!(
            state.observe(Membership::Inside, at_seconds(2)),
            Observation::Unchanged
        );
        assert_eq!(
            state.observe(Membership::Outside, at_seconds(3)),
            Observation::Transition(GeofenceEventType::Exit)
        );
        assert_eq!(state.last_transition_at(), Some(at_seconds(3)));
    }

    #[rstest]
    fn older_samples_are_stale() {
        let mut state = ZoneRuntimeState::default();
        let _ = state.observe(Membership::Inside, at_seconds(10));
        assert_eq!(
            state.observe(Membership::Outside, at_seconds(9)),
            Observation::Stale
        );
        assert_eq!(state.membership(), Membership::Inside);
        assert_eq!(
            state.observe(Membership::Outside, at_seconds(10)),
            Observation::Transition(GeofenceEventType::Exit)
        );
    }

    #[rstest]
    fn exit_is_reported_after_inside(sink: Arc<RecordingSink>) {
        let engine = engine_with(&sink, depot());
        engine.process(&sample_at(offset_north(ORIGIN, 400.0), 0));
        engine.process(&sample_at(offset_north(ORIGIN, 600.0), 10));
        let events = sink.geofence_events();
        assert_eq!(events.len(), 1);
        let exit = events.first().expect("one event");
        assert_eq!(exit.event_type, GeofenceEventType::Exit);
        assert_eq!(exit.zone_id, Uuid::from_u128(1));
        assert_eq!(exit.vehicle_id, Uuid::from_u128(7));
        assert_eq!(exit.timestamp, at_seconds(10));
    }

    #[rstest]
    fn imprecise_samples_change_nothing(sink: Arc<RecordingSink>) {
        let engine = engine_with(&sink, depot());
        let mut noisy = sample_at(offset_north(ORIGIN, 100.0), 0);
        noisy.horizontal_accuracy_meters = 80.0;
        engine.process(&noisy);
        assert_eq!(engine.membership(Uuid::from_u128(1)), Some(Membership::Unknown));
    }

    #[rstest]
    fn disabled_notifications_still_track_state(sink: Arc<RecordingSink>) {
        let engine = engine_with(&sink, depot().with_notifications(false, true));
        engine.process(&sample_at(offset_north(ORIGIN, 900.0), 0));
        engine.process(&sample_at(offset_north(ORIGIN, 100.0), 5));
        assert!(sink.events().is_empty());
        assert_eq!(engine.membership(Uuid::from_u128(1)), Some(Membership::Inside));
        engine.process(&sample_at(offset_north(ORIGIN, 900.0), 10));
        assert_eq!(sink.geofence_events().len(), 1);
    }

    #[rstest]
    fn evicted_zones_receive_nothing(sink: Arc<RecordingSink>) {
        let engine = engine_with(&sink, depot());
        engine.process(&sample_at(offset_north(ORIGIN, 100.0), 0));
        engine.evict(Uuid::from_u128(1));
        engine.process(&sample_at(offset_north(ORIGIN, 900.0), 5));
        assert!(sink.events().is_empty());
        assert_eq!(engine.membership(Uuid::from_u128(1)), None);
    }
}
