//! Core domain types for the fleetwatch engine.
//!
//! The crate holds everything the monitors and the scorer share: location
//! samples, zone and corridor definitions, candidate routes, emitted events,
//! the geometry kernel and the polyline codec. Constructors return `Result`
//! so invalid definitions are rejected before they reach a monitor.
//!
//! Coordinates use [`geo::Coord`] with `x` holding longitude and `y`
//! holding latitude.

#![forbid(unsafe_code)]

pub mod corridor;
pub mod event;
pub mod geometry;
pub mod polyline;
pub mod route;
pub mod sample;
pub mod scorer;
pub mod sink;
pub mod zone;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use corridor::{CorridorError, RouteCorridor};
pub use event::{CorridorViolation, GeofenceEvent, GeofenceEventType, MonitorEvent};
pub use polyline::PolylineError;
pub use route::{CandidateRoute, RouteError, RouteType, ScoredRoute};
pub use sample::LocationSample;
pub use scorer::RouteScorer;
pub use sink::{ChannelSink, EventSink, NullSink};
pub use zone::{CircularZone, MAX_ZONE_RADIUS_METERS, MIN_ZONE_RADIUS_METERS, Membership, ZoneError};
