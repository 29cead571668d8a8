#![expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]

//! Behavioural tests for `CorridorMonitor` using rstest-bdd.

use std::cell::RefCell;
use std::sync::Arc;

use fleetwatch_core::RouteCorridor;
use fleetwatch_core::test_support::{RecordingSink, offset_north, sample_at};
use fleetwatch_monitor::{CorridorConfig, CorridorMonitor};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use uuid::Uuid;

const TRIP_ID: Uuid = Uuid::from_u128(77);

/// Point on the first leg of the route, well away from the second.
const FIRST_LEG_MIDPOINT: Coord<f64> = Coord { x: 0.005, y: 0.0 };

#[derive(Debug)]
struct CorridorWorld {
    sink: Arc<RecordingSink>,
    monitor: RefCell<Option<CorridorMonitor<Arc<RecordingSink>>>>,
}

impl CorridorWorld {
    fn with_monitor<T>(&self, f: impl FnOnce(&CorridorMonitor<Arc<RecordingSink>>) -> T) -> T {
        f(self
            .monitor
            .borrow()
            .as_ref()
            .expect("monitor should be configured"))
    }
}

#[fixture]
fn world() -> CorridorWorld {
    CorridorWorld {
        sink: Arc::new(RecordingSink::new()),
        monitor: RefCell::new(None),
    }
}

#[given("a trip corridor of radius {radius} metres along a three-waypoint route")]
fn given_corridor(world: &CorridorWorld, radius: f64) {
    let route = vec![
        Coord { x: 0.0, y: 0.0 },
        Coord { x: 0.01, y: 0.0 },
        Coord { x: 0.01, y: 0.01 },
    ];
    let corridor = RouteCorridor::new(TRIP_ID, route, radius).expect("valid corridor");
    let monitor = CorridorMonitor::new(CorridorConfig::default(), Arc::clone(&world.sink));
    monitor.start(corridor);
    world.monitor.replace(Some(monitor));
}

#[when("a sample arrives {metres} metres from the route at second {second}")]
fn when_sample(world: &CorridorWorld, metres: f64, second: i64) {
    let sample = sample_at(offset_north(FIRST_LEG_MIDPOINT, metres), second);
    world.with_monitor(|monitor| monitor.process(TRIP_ID, &sample));
}

#[then("the trip is off route")]
fn then_off_route(world: &CorridorWorld) {
    assert_eq!(
        world.with_monitor(|monitor| monitor.is_off_route(TRIP_ID)),
        Some(true)
    );
}

#[then("the trip is on route")]
fn then_on_route(world: &CorridorWorld) {
    assert_eq!(
        world.with_monitor(|monitor| monitor.is_off_route(TRIP_ID)),
        Some(false)
    );
}

#[then("the violation count is {count}")]
fn then_violation_count(world: &CorridorWorld, count: usize) {
    assert_eq!(world.sink.violations().len(), count);
}

#[scenario(path = "tests/features/corridor.feature", index = 0)]
fn violations_within_cooldown(world: CorridorWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/corridor.feature", index = 1)]
fn violations_after_cooldown(world: CorridorWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/corridor.feature", index = 2)]
fn returning_clears_flag(world: CorridorWorld) {
    let _ = world;
}
