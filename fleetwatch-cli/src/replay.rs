//! Replay command implementation for the fleetwatch CLI.
//!
//! Samples are fed through a [`FleetMonitor`] in file order. Every event the
//! monitors publish is written as one JSON object per line.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use fleetwatch_core::{ChannelSink, CircularZone, LocationSample, MonitorEvent, RouteCorridor};
use fleetwatch_monitor::{CapacityConfig, CorridorConfig, FleetMonitor, GeofenceConfig};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fs::{read_json, require_file};
use crate::{
    ARG_ACCURACY_CEILING, ARG_CAPACITY, ARG_COOLDOWN_SECS, ARG_REPLAY_CORRIDOR, ARG_REPLAY_TRACK,
    ARG_REPLAY_ZONES, ARG_VEHICLE_ID, CliError, ENV_REPLAY_TRACK,
};

/// CLI arguments for the `replay` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Replay a JSON array of location samples through the \
                 geofence engine and, when a corridor is supplied, the \
                 route corridor monitor. Emitted events are printed as \
                 JSON lines.",
    about = "Replay a recorded track through the monitors"
)]
#[ortho_config(prefix = "FLEETWATCH")]
pub(crate) struct ReplayArgs {
    /// Path to a JSON file containing location samples.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) track_path: Option<Utf8PathBuf>,
    /// Path to a JSON array of circular zones.
    #[arg(long = ARG_REPLAY_ZONES, value_name = "path")]
    #[serde(default)]
    pub(crate) zones: Option<Utf8PathBuf>,
    /// Path to a JSON route corridor for the trip being replayed.
    #[arg(long = ARG_REPLAY_CORRIDOR, value_name = "path")]
    #[serde(default)]
    pub(crate) corridor: Option<Utf8PathBuf>,
    /// Vehicle id stamped on geofence events.
    #[arg(long = ARG_VEHICLE_ID, value_name = "uuid")]
    #[serde(default)]
    pub(crate) vehicle_id: Option<Uuid>,
    /// Maximum number of simultaneously monitored zones.
    #[arg(long = ARG_CAPACITY, value_name = "count")]
    #[serde(default)]
    pub(crate) capacity: Option<usize>,
    /// Samples less accurate than this many metres are discarded.
    #[arg(long = ARG_ACCURACY_CEILING, value_name = "metres")]
    #[serde(default)]
    pub(crate) accuracy_ceiling: Option<f64>,
    /// Minimum spacing between corridor violations, in seconds.
    #[arg(long = ARG_COOLDOWN_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) cooldown_secs: Option<u64>,
}

impl ReplayArgs {
    pub(crate) fn into_config(self) -> Result<ReplayConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReplayConfig::try_from(merged)
    }
}

/// Resolved `replay` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplayConfig {
    /// Path to the samples JSON file.
    pub(crate) track_path: Utf8PathBuf,
    /// Optional zones JSON file.
    pub(crate) zones_path: Option<Utf8PathBuf>,
    /// Optional corridor JSON file.
    pub(crate) corridor_path: Option<Utf8PathBuf>,
    pub(crate) geofence: GeofenceConfig,
    pub(crate) capacity: CapacityConfig,
    pub(crate) corridor: CorridorConfig,
}

impl ReplayConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_file(&self.track_path, ARG_REPLAY_TRACK)?;
        if let Some(path) = &self.zones_path {
            require_file(path, ARG_REPLAY_ZONES)?;
        }
        if let Some(path) = &self.corridor_path {
            require_file(path, ARG_REPLAY_CORRIDOR)?;
        }
        Ok(())
    }
}

impl TryFrom<ReplayArgs> for ReplayConfig {
    type Error = CliError;

    fn try_from(args: ReplayArgs) -> Result<Self, Self::Error> {
        let track_path = args.track_path.ok_or(CliError::MissingArgument {
            field: ARG_REPLAY_TRACK,
            env: ENV_REPLAY_TRACK,
        })?;

        let mut geofence = GeofenceConfig::for_vehicle(args.vehicle_id.unwrap_or_default());
        let mut corridor = CorridorConfig::default();
        if let Some(value) = args.accuracy_ceiling {
            if !value.is_finite() || value < 0.0 {
                return Err(CliError::InvalidAccuracyCeiling { value });
            }
            geofence.accuracy_ceiling_meters = value;
            corridor.accuracy_ceiling_meters = value;
        }
        if let Some(seconds) = args.cooldown_secs {
            corridor.violation_cooldown = Duration::from_secs(seconds);
        }
        let capacity = args
            .capacity
            .map_or_else(CapacityConfig::default, |capacity| CapacityConfig { capacity });

        Ok(Self {
            track_path,
            zones_path: args.zones,
            corridor_path: args.corridor,
            geofence,
            capacity,
            corridor,
        })
    }
}

pub(super) fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_replay_with(args, &mut stdout)
}

pub(super) fn run_replay_with(args: ReplayArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let events = execute_replay(&config)?;
    write_events(writer, &events)
}

/// Replay the configured track and collect the published events in order.
pub(super) fn execute_replay(config: &ReplayConfig) -> Result<Vec<MonitorEvent>, CliError> {
    let samples: Vec<LocationSample> = read_json(&config.track_path, ARG_REPLAY_TRACK)?;
    let zones: Vec<CircularZone> = read_optional(config.zones_path.as_deref(), ARG_REPLAY_ZONES)?
        .unwrap_or_default();
    let corridor: Option<RouteCorridor> =
        read_optional(config.corridor_path.as_deref(), ARG_REPLAY_CORRIDOR)?;

    let (sink, mut receiver) = ChannelSink::new();
    let monitor = FleetMonitor::new(config.geofence, config.capacity, config.corridor, sink);
    let monitored = monitor.geofence().reconcile(&zones);
    let trip_id = corridor.map(|route| {
        let trip_id = route.trip_id();
        monitor.corridor().start(route);
        trip_id
    });
    info!(
        "replaying {} samples against {} monitored zones{}",
        samples.len(),
        monitored.len(),
        if trip_id.is_some() { " and a trip corridor" } else { "" }
    );

    for sample in &samples {
        monitor.process(sample, trip_id);
    }

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    info!("replay emitted {} events", events.len());
    Ok(events)
}

fn read_optional<T>(path: Option<&Utf8Path>, field: &'static str) -> Result<Option<T>, CliError>
where
    T: serde::de::DeserializeOwned,
{
    path.map(|path| read_json(path, field)).transpose()
}

fn write_events(writer: &mut dyn Write, events: &[MonitorEvent]) -> Result<(), CliError> {
    for event in events {
        let line = serde_json::to_string(event).map_err(CliError::SerialiseOutput)?;
        writer
            .write_all(line.as_bytes())
            .map_err(CliError::WriteOutput)?;
        writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ReplayConfig, CliError> {
    let merged = ReplayArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ReplayConfig::try_from(merged)
}
