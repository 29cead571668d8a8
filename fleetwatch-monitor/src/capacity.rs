//! Admission control over the bounded set of monitored zones.
//!
//! The [`RegionCapacityManager`] publishes its monitored set as an immutable
//! [`MonitoredSet`] snapshot behind an `RwLock<Arc<_>>`. Mutations build a
//! replacement snapshot while holding the write lock and swap it in whole, so
//! a sample router holding a snapshot never observes a half-applied update.
//!
//! Runtime state is shared between consecutive snapshots for zones that stay
//! monitored with unchanged geometry. A redefined circle starts again from
//! [`Membership::Unknown`](fleetwatch_core::Membership::Unknown).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use fleetwatch_core::{CircularZone, LocationSample};
use log::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::config::CapacityConfig;
use crate::geofence::{Observation, ZoneRuntimeState};

/// Errors returned by [`RegionCapacityManager::admit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// Every monitoring slot is taken.
    #[error("cannot monitor zone {zone_id}: all {capacity} slots are in use")]
    Full {
        /// Zone that was refused.
        zone_id: Uuid,
        /// Configured capacity.
        capacity: usize,
    },
    /// Only active zones may occupy a slot.
    #[error("cannot monitor zone {zone_id}: zone is not active")]
    Inactive {
        /// Zone that was refused.
        zone_id: Uuid,
    },
}

/// A zone under observation together with its runtime state.
#[derive(Debug)]
pub struct MonitoredZone {
    zone: CircularZone,
    state: Arc<Mutex<ZoneRuntimeState>>,
}

impl MonitoredZone {
    fn fresh(zone: CircularZone) -> Self {
        Self {
            zone,
            state: Arc::new(Mutex::new(ZoneRuntimeState::default())),
        }
    }

    /// Carry `previous`'s state over to `zone` unless the circle changed.
    fn succeed(previous: &Self, zone: CircularZone) -> Self {
        if previous.zone.same_geometry(&zone) {
            Self {
                zone,
                state: Arc::clone(&previous.state),
            }
        } else {
            debug!("zone {} geometry changed; resetting membership", zone.id());
            Self::fresh(zone)
        }
    }

    /// The admitted definition.
    #[must_use]
    pub const fn zone(&self) -> &CircularZone {
        &self.zone
    }

    /// Snapshot of the runtime state.
    #[must_use]
    pub fn state(&self) -> ZoneRuntimeState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evaluate `sample` against this zone, serialised with any other
    /// evaluation of the same zone.
    pub(crate) fn observe(&self, sample: &LocationSample) -> Observation {
        let membership = self.zone.membership_of(sample.location);
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(membership, sample.timestamp)
    }
}

/// Immutable snapshot of the monitored zones.
///
/// Members keep the order in which they were selected: retained zones first,
/// then newly admitted ones.
#[derive(Debug, Default)]
pub struct MonitoredSet {
    zones: Vec<Arc<MonitoredZone>>,
}

impl MonitoredSet {
    /// Number of monitored zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether no zone is monitored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Whether `zone_id` is monitored.
    #[must_use]
    pub fn contains(&self, zone_id: Uuid) -> bool {
        self.get(zone_id).is_some()
    }

    /// Look up a monitored zone.
    #[must_use]
    pub fn get(&self, zone_id: Uuid) -> Option<&Arc<MonitoredZone>> {
        self.zones.iter().find(|member| member.zone.id() == zone_id)
    }

    /// Iterate over the monitored zones.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MonitoredZone>> {
        self.zones.iter()
    }

    /// Identifiers of the monitored zones in set order.
    #[must_use]
    pub fn ids(&self) -> Vec<Uuid> {
        self.zones.iter().map(|member| member.zone.id()).collect()
    }
}

/// Enforces a hard cap on concurrently monitored zones.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use uuid::Uuid;
/// use fleetwatch_core::CircularZone;
/// use fleetwatch_monitor::{CapacityConfig, CapacityError, RegionCapacityManager};
///
/// let manager = RegionCapacityManager::new(CapacityConfig { capacity: 1 });
/// let first = CircularZone::new(Uuid::new_v4(), "a", Coord { x: 0.0, y: 0.0 }, 200.0)?;
/// let second = CircularZone::new(Uuid::new_v4(), "b", Coord { x: 1.0, y: 0.0 }, 200.0)?;
/// manager.admit(first)?;
/// assert!(matches!(manager.admit(second), Err(CapacityError::Full { .. })));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct RegionCapacityManager {
    capacity: usize,
    current: RwLock<Arc<MonitoredSet>>,
}

impl RegionCapacityManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new(config: CapacityConfig) -> Self {
        Self {
            capacity: config.capacity,
            current: RwLock::new(Arc::new(MonitoredSet::default())),
        }
    }

    /// Configured number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The current monitored set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<MonitoredSet> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Whether `zone_id` currently occupies a slot.
    #[must_use]
    pub fn is_monitored(&self, zone_id: Uuid) -> bool {
        self.snapshot().contains(zone_id)
    }

    /// Select up to `capacity` active zones from the full catalogue.
    ///
    /// Already-monitored zones are kept in preference to newly activated
    /// ones; within each group the earliest activation wins. Duplicate ids
    /// keep their first occurrence. Zones left out are simply not monitored.
    pub fn reconcile(&self, all_zones: &[CircularZone]) -> Arc<MonitoredSet> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut seen = HashSet::new();
        let (mut retained, mut incoming): (Vec<&CircularZone>, Vec<&CircularZone>) = all_zones
            .iter()
            .filter(|zone| zone.is_active() && seen.insert(zone.id()))
            .partition(|zone| current.contains(zone.id()));
        let eligible = retained.len() + incoming.len();
        retained.sort_by_key(|zone| zone.activated_at());
        incoming.sort_by_key(|zone| zone.activated_at());

        let zones: Vec<Arc<MonitoredZone>> = retained
            .into_iter()
            .chain(incoming)
            .take(self.capacity)
            .map(|zone| successor(&current, zone.clone()))
            .collect();

        let next = Arc::new(MonitoredSet { zones });
        log_changes(&current, &next);
        if eligible > next.len() {
            warn!(
                "{} active zones left unmonitored (capacity {})",
                eligible - next.len(),
                self.capacity
            );
        }
        *current = Arc::clone(&next);
        next
    }

    /// Add a single zone.
    ///
    /// Re-admitting an id that is already monitored replaces its definition
    /// and never fails for capacity.
    ///
    /// # Errors
    /// Returns [`CapacityError::Inactive`] for inactive zones and
    /// [`CapacityError::Full`] when a new zone meets a full set.
    pub fn admit(&self, zone: CircularZone) -> Result<(), CapacityError> {
        let zone_id = zone.id();
        if !zone.is_active() {
            return Err(CapacityError::Inactive { zone_id });
        }
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut zones: Vec<Arc<MonitoredZone>> = current.zones.clone();
        if let Some(slot) = zones.iter_mut().find(|member| member.zone.id() == zone_id) {
            let replacement = Arc::new(MonitoredZone::succeed(slot, zone));
            *slot = replacement;
            debug!("zone {zone_id} re-admitted");
        } else if zones.len() >= self.capacity {
            return Err(CapacityError::Full {
                zone_id,
                capacity: self.capacity,
            });
        } else {
            zones.push(Arc::new(MonitoredZone::fresh(zone)));
            info!("zone {zone_id} admitted ({}/{})", zones.len(), self.capacity);
        }
        *current = Arc::new(MonitoredSet { zones });
        Ok(())
    }

    /// Remove a zone; removing an absent zone is a no-op.
    pub fn evict(&self, zone_id: Uuid) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if !current.contains(zone_id) {
            debug!("zone {zone_id} not monitored; nothing to evict");
            return;
        }
        let zones = current
            .zones
            .iter()
            .filter(|member| member.zone.id() != zone_id)
            .cloned()
            .collect();
        *current = Arc::new(MonitoredSet { zones });
        info!("zone {zone_id} evicted");
    }
}

fn successor(current: &MonitoredSet, zone: CircularZone) -> Arc<MonitoredZone> {
    match current.get(zone.id()) {
        Some(existing) if existing.zone == zone => Arc::clone(existing),
        Some(existing) => Arc::new(MonitoredZone::succeed(existing, zone)),
        None => Arc::new(MonitoredZone::fresh(zone)),
    }
}

fn log_changes(previous: &MonitoredSet, next: &MonitoredSet) {
    let admitted = next
        .iter()
        .filter(|member| !previous.contains(member.zone.id()))
        .count();
    let evicted = previous
        .iter()
        .filter(|member| !next.contains(member.zone.id()))
        .count();
    if admitted > 0 || evicted > 0 {
        info!(
            "monitored set reconciled: {admitted} admitted, {evicted} evicted, {} monitored",
            next.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use fleetwatch_core::Membership;
    use fleetwatch_core::test_support::{at_seconds, offset_north, sample_at};
    use geo::Coord;
    use rstest::{fixture, rstest};

    fn zone(seed: u128, activated: i64) -> CircularZone {
        zone_at(seed, activated, Coord { x: 0.0, y: 0.0 }, 500.0)
    }

    fn zone_at(seed: u128, activated: i64, center: Coord<f64>, radius: f64) -> CircularZone {
        CircularZone::new(Uuid::from_u128(seed), format!("zone-{seed}"), center, radius)
            .expect("valid zone")
            .with_activated_at(activated_time(activated))
    }

    fn activated_time(seconds: i64) -> DateTime<Utc> {
        at_seconds(seconds)
    }

    #[fixture]
    fn manager() -> RegionCapacityManager {
        RegionCapacityManager::new(CapacityConfig { capacity: 2 })
    }

    #[rstest]
    fn reconcile_caps_and_prefers_earliest(manager: RegionCapacityManager) {
        let zones = [zone(1, 30), zone(2, 10), zone(3, 20)];
        let set = manager.reconcile(&zones);
        assert_eq!(set.ids(), vec![Uuid::from_u128(2), Uuid::from_u128(3)]);
    }

    #[rstest]
    fn reconcile_retains_monitored_zones_over_earlier_newcomers(manager: RegionCapacityManager) {
        manager.reconcile(&[zone(1, 30), zone(2, 40)]);
        let set = manager.reconcile(&[zone(3, 0), zone(2, 40), zone(1, 30)]);
        assert_eq!(set.ids(), vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
    }

    #[rstest]
    fn reconcile_skips_inactive_and_duplicate_zones(manager: RegionCapacityManager) {
        let zones = [
            zone(1, 0).with_active(false),
            zone(2, 5),
            zone(2, 1),
            zone(3, 9),
        ];
        let set = manager.reconcile(&zones);
        assert_eq!(set.ids(), vec![Uuid::from_u128(2), Uuid::from_u128(3)]);
    }

    #[rstest]
    fn admit_rejects_new_zone_when_full(manager: RegionCapacityManager) {
        manager.admit(zone(1, 0)).expect("first slot");
        manager.admit(zone(2, 0)).expect("second slot");
        let err = manager.admit(zone(3, 0)).expect_err("full");
        assert_eq!(
            err,
            CapacityError::Full {
                zone_id: Uuid::from_u128(3),
                capacity: 2
            }
        );
        manager.admit(zone(2, 0)).expect("re-admission never fails");
        assert_eq!(manager.snapshot().len(), 2);
    }

    #[rstest]
    fn admit_rejects_inactive_zone(manager: RegionCapacityManager) {
        let err = manager.admit(zone(1, 0).with_active(false)).expect_err("inactive");
        assert_eq!(
            err,
            CapacityError::Inactive {
                zone_id: Uuid::from_u128(1)
            }
        );
        assert!(manager.snapshot().is_empty());
    }

    #[rstest]
    fn evict_is_idempotent(manager: RegionCapacityManager) {
        manager.admit(zone(1, 0)).expect("admit");
        manager.evict(Uuid::from_u128(1));
        manager.evict(Uuid::from_u128(1));
        manager.evict(Uuid::from_u128(99));
        assert!(!manager.is_monitored(Uuid::from_u128(1)));
    }

    #[rstest]
    fn snapshots_are_unaffected_by_later_updates(manager: RegionCapacityManager) {
        manager.admit(zone(1, 0)).expect("admit");
        let before = manager.snapshot();
        manager.evict(Uuid::from_u128(1));
        assert!(before.contains(Uuid::from_u128(1)));
        assert!(manager.snapshot().is_empty());
    }

    #[rstest]
    fn metadata_change_keeps_state_but_geometry_change_resets(manager: RegionCapacityManager) {
        let origin = Coord { x: 0.0, y: 0.0 };
        manager.admit(zone_at(1, 0, origin, 500.0)).expect("admit");
        let member = manager.snapshot().get(Uuid::from_u128(1)).cloned().expect("member");
        let _ = member.observe(&sample_at(offset_north(origin, 100.0), 0));
        assert_eq!(member.state().membership(), Membership::Inside);

        manager
            .admit(zone_at(1, 0, origin, 500.0).with_notifications(false, false))
            .expect("metadata update");
        let renamed = manager.snapshot().get(Uuid::from_u128(1)).cloned().expect("member");
        assert_eq!(renamed.state().membership(), Membership::Inside);

        manager.reconcile(&[zone_at(1, 0, origin, 800.0)]);
        let resized = manager.snapshot().get(Uuid::from_u128(1)).cloned().expect("member");
        assert_eq!(resized.state().membership(), Membership::Unknown);
    }

    #[rstest]
    fn zero_capacity_monitors_nothing() {
        let manager = RegionCapacityManager::new(CapacityConfig { capacity: 0 });
        assert!(manager.reconcile(&[zone(1, 0)]).is_empty());
        assert!(manager.admit(zone(1, 0)).is_err());
    }
}
