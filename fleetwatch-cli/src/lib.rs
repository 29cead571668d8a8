//! Command-line interface for replaying fleet telemetry and scoring routes.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};

mod error;
mod fs;
mod replay;
mod score;

pub use error::CliError;

use replay::{ReplayArgs, run_replay};
use score::{ScoreArgs, run_score};

pub(crate) const ARG_SCORE_CANDIDATES: &str = "candidates";
pub(crate) const ARG_FUEL_EFFICIENCY: &str = "fuel-efficiency";
pub(crate) const ARG_REPLAY_TRACK: &str = "track";
pub(crate) const ARG_REPLAY_ZONES: &str = "zones";
pub(crate) const ARG_REPLAY_CORRIDOR: &str = "corridor";
pub(crate) const ARG_VEHICLE_ID: &str = "vehicle-id";
pub(crate) const ARG_CAPACITY: &str = "capacity";
pub(crate) const ARG_ACCURACY_CEILING: &str = "accuracy-ceiling";
pub(crate) const ARG_COOLDOWN_SECS: &str = "cooldown-secs";
pub(crate) const ENV_SCORE_CANDIDATES: &str = "FLEETWATCH_CMDS_SCORE_CANDIDATES_PATH";
pub(crate) const ENV_REPLAY_TRACK: &str = "FLEETWATCH_CMDS_REPLAY_TRACK_PATH";

/// Run the fleetwatch CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration layering, input
/// loading or output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Score(args) => run_score(args),
        Command::Replay(args) => run_replay(args),
    }
}

/// Write `err` to `writer` as a single `fleetwatch:`-prefixed line.
///
/// # Errors
/// Returns the underlying IO error when the write fails.
pub fn report_error(writer: &mut dyn Write, err: &CliError) -> std::io::Result<()> {
    writeln!(writer, "fleetwatch: {err}")
}

#[derive(Debug, Parser)]
#[command(
    name = "fleetwatch",
    about = "Offline tooling for the fleetwatch geofence, corridor and scoring engines",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank candidate routes read from a JSON file.
    Score(ScoreArgs),
    /// Replay recorded location samples through the monitors.
    Replay(ReplayArgs),
}

#[cfg(test)]
mod tests;
