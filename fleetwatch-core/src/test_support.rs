//! Test helpers shared by unit, behaviour and property tests across the
//! workspace.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use geo::Coord;

use crate::geometry::METERS_PER_DEGREE;
use crate::{CorridorViolation, EventSink, GeofenceEvent, LocationSample, MonitorEvent};

/// Fixed epoch used by test clocks (2023-11-14T22:13:20Z).
pub const TEST_EPOCH_SECONDS: i64 = 1_700_000_000;

/// `EventSink` that records every published event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    #[must_use]
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Geofence events published so far.
    #[must_use]
    pub fn geofence_events(&self) -> Vec<GeofenceEvent> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MonitorEvent::Geofence(geofence) => Some(geofence),
                _ => None,
            })
            .collect()
    }

    /// Corridor violations published so far.
    #[must_use]
    pub fn violations(&self) -> Vec<CorridorViolation> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MonitorEvent::CorridorViolation(violation) => Some(violation),
                _ => None,
            })
            .collect()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<MonitorEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: MonitorEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Timestamp `seconds` after [`TEST_EPOCH_SECONDS`].
#[must_use]
pub fn at_seconds(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(TEST_EPOCH_SECONDS, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
        + TimeDelta::seconds(seconds)
}

/// Move `origin` north by `meters` along its meridian.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "metric offsets in degrees")]
pub fn offset_north(origin: Coord<f64>, meters: f64) -> Coord<f64> {
    Coord {
        x: origin.x,
        y: origin.y + meters / METERS_PER_DEGREE,
    }
}

/// Move `origin` east by `meters` along its parallel.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "metric offsets in degrees")]
pub fn offset_east(origin: Coord<f64>, meters: f64) -> Coord<f64> {
    Coord {
        x: origin.x + meters / (METERS_PER_DEGREE * origin.y.to_radians().cos()),
        y: origin.y,
    }
}

/// Build a precise sample (5 m accuracy) at `location`, `seconds` after the
/// test epoch.
#[must_use]
pub fn sample_at(location: Coord<f64>, seconds: i64) -> LocationSample {
    LocationSample::new(location, 5.0, at_seconds(seconds))
}
