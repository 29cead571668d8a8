//! Live monitoring for the fleetwatch engine.
//!
//! This crate turns a stream of [`LocationSample`](fleetwatch_core::LocationSample)
//! values into events:
//!
//! - [`RegionCapacityManager`] bounds how many zones are watched at once and
//!   publishes the watched set as atomic snapshots.
//! - [`GeofenceEngine`] runs the enter/exit state machine for each watched
//!   zone of one vehicle.
//! - [`CorridorMonitor`] tracks per-trip deviation from a planned route and
//!   throttles violation records with a cooldown.
//! - [`FleetMonitor`] routes each sample to both.
//!
//! Engines are plain values owned by the host process. Events leave through
//! an [`EventSink`](fleetwatch_core::EventSink) and never block evaluation.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod capacity;
mod config;
mod corridor;
mod fleet;
mod geofence;

pub use capacity::{CapacityError, MonitoredSet, MonitoredZone, RegionCapacityManager};
pub use config::{
    CapacityConfig, CorridorConfig, DEFAULT_ACCURACY_CEILING_METERS, DEFAULT_VIOLATION_COOLDOWN,
    DEFAULT_ZONE_CAPACITY, GeofenceConfig,
};
pub use corridor::{CorridorMonitor, CorridorRuntimeState, CorridorStep};
pub use fleet::FleetMonitor;
pub use geofence::{GeofenceEngine, Observation, ZoneRuntimeState};
