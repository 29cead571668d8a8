//! Facade crate for the fleetwatch engine.
//!
//! This crate re-exports the core domain types and exposes the monitors and
//! the route scorer behind feature flags.

#![forbid(unsafe_code)]

pub use fleetwatch_core::{
    CandidateRoute, ChannelSink, CircularZone, CorridorError, CorridorViolation, EventSink,
    GeofenceEvent, GeofenceEventType, LocationSample, MAX_ZONE_RADIUS_METERS,
    MIN_ZONE_RADIUS_METERS, Membership, MonitorEvent, NullSink, PolylineError, RouteCorridor,
    RouteError, RouteScorer, RouteType, ScoredRoute, ZoneError, geometry, polyline,
};

#[cfg(feature = "monitor")]
pub use fleetwatch_monitor::{
    CapacityConfig, CapacityError, CorridorConfig, CorridorMonitor, FleetMonitor, GeofenceConfig,
    GeofenceEngine, RegionCapacityManager,
};

#[cfg(feature = "scorer")]
pub use fleetwatch_scorer::{CostModelScorer, ScoringConfig, ScoringConfigError, ScoringWeights};
