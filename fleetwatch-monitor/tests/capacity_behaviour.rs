#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

//! Behavioural tests for `RegionCapacityManager` using rstest-bdd.

use std::cell::RefCell;

use fleetwatch_core::CircularZone;
use fleetwatch_core::test_support::at_seconds;
use fleetwatch_monitor::{CapacityConfig, CapacityError, RegionCapacityManager};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use uuid::Uuid;

#[derive(Debug, Default)]
struct CapacityWorld {
    manager: RefCell<Option<RegionCapacityManager>>,
    catalogue: RefCell<Vec<CircularZone>>,
    admission: RefCell<Option<Result<(), CapacityError>>>,
}

impl CapacityWorld {
    fn with_manager<T>(&self, f: impl FnOnce(&RegionCapacityManager) -> T) -> T {
        f(self
            .manager
            .borrow()
            .as_ref()
            .expect("manager should be configured"))
    }
}

fn active_zone(seed: u128) -> CircularZone {
    let offset = f64::from(u32::try_from(seed).expect("small seed"));
    #[expect(clippy::float_arithmetic, reason = "spreading test zones apart")]
    let center = Coord {
        x: offset * 0.01,
        y: 0.0,
    };
    let activated = i64::try_from(seed).expect("small seed");
    CircularZone::new(Uuid::from_u128(seed), format!("zone-{seed}"), center, 250.0)
        .expect("valid zone")
        .with_activated_at(at_seconds(activated))
}

#[fixture]
fn world() -> CapacityWorld {
    CapacityWorld::default()
}

#[given("a capacity manager with capacity {capacity}")]
fn given_manager(world: &CapacityWorld, capacity: usize) {
    world
        .manager
        .replace(Some(RegionCapacityManager::new(CapacityConfig { capacity })));
}

#[when("{count} active zones are reconciled")]
fn when_reconciled(world: &CapacityWorld, count: u128) {
    let zones: Vec<CircularZone> = (1..=count).map(active_zone).collect();
    world.with_manager(|manager| manager.reconcile(&zones));
    world.catalogue.replace(zones);
}

#[when("a new active zone is admitted")]
fn when_new_zone_admitted(world: &CapacityWorld) {
    let outcome = world.with_manager(|manager| manager.admit(active_zone(1_000)));
    world.admission.replace(Some(outcome));
}

#[when("an unknown zone is evicted")]
fn when_unknown_evicted(world: &CapacityWorld) {
    world.with_manager(|manager| manager.evict(Uuid::from_u128(u128::MAX)));
}

#[then("{count} zones are monitored")]
fn then_monitored(world: &CapacityWorld, count: usize) {
    let monitored = world.with_manager(|manager| manager.snapshot().len());
    assert_eq!(monitored, count);
}

#[then("{count} active zones are not monitored")]
fn then_unmonitored(world: &CapacityWorld, count: usize) {
    let unmonitored = world.with_manager(|manager| {
        world
            .catalogue
            .borrow()
            .iter()
            .filter(|zone| !manager.is_monitored(zone.id()))
            .count()
    });
    assert_eq!(unmonitored, count);
}

#[then("the admission fails because the set is full")]
fn then_admission_full(world: &CapacityWorld) {
    let outcome = world
        .admission
        .borrow()
        .clone()
        .expect("admission should be attempted");
    assert!(matches!(outcome, Err(CapacityError::Full { capacity: 20, .. })));
}

#[scenario(path = "tests/features/capacity.feature", index = 0)]
fn reconcile_beyond_capacity(world: CapacityWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/capacity.feature", index = 1)]
fn admit_into_full_set(world: CapacityWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/capacity.feature", index = 2)]
fn evict_unknown_zone(world: CapacityWorld) {
    let _ = world;
}
