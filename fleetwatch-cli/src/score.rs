//! Score command implementation for the fleetwatch CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use fleetwatch_core::{CandidateRoute, RouteScorer, ScoredRoute};
use fleetwatch_scorer::{CostModelScorer, ScoringConfig};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::fs::{read_json, require_file};
use crate::{ARG_FUEL_EFFICIENCY, ARG_SCORE_CANDIDATES, CliError, ENV_SCORE_CANDIDATES};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank candidate routes with the fuel, time and traffic cost \
                 model. The input is a JSON array of candidate routes, each \
                 with distance_meters, expected_duration_seconds and optional \
                 waypoints.",
    about = "Rank candidate routes"
)]
#[ortho_config(prefix = "FLEETWATCH")]
pub(crate) struct ScoreArgs {
    /// Path to a JSON file containing candidate routes.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) candidates_path: Option<Utf8PathBuf>,
    /// Fuel efficiency in free-flowing traffic, in km per litre.
    #[arg(long = ARG_FUEL_EFFICIENCY, value_name = "km-per-litre")]
    #[serde(default)]
    pub(crate) fuel_efficiency: Option<f64>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    /// Path to the candidates JSON file.
    pub(crate) candidates_path: Utf8PathBuf,
    /// Cost model parameters.
    pub(crate) scoring: ScoringConfig,
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let candidates_path = args.candidates_path.ok_or(CliError::MissingArgument {
            field: ARG_SCORE_CANDIDATES,
            env: ENV_SCORE_CANDIDATES,
        })?;
        let mut scoring = ScoringConfig::default();
        if let Some(efficiency) = args.fuel_efficiency {
            scoring.base_efficiency_km_per_liter = efficiency;
        }
        Ok(Self {
            candidates_path,
            scoring: scoring.validate()?,
        })
    }
}

pub(super) fn run_score(args: ScoreArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_score_with(args, &mut stdout)
}

pub(super) fn run_score_with(args: ScoreArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let ranked = execute_score(&config)?;
    write_ranked(writer, &ranked)
}

pub(super) fn execute_score(config: &ScoreConfig) -> Result<Vec<ScoredRoute>, CliError> {
    require_file(&config.candidates_path, ARG_SCORE_CANDIDATES)?;
    let candidates: Vec<CandidateRoute> =
        read_json(&config.candidates_path, ARG_SCORE_CANDIDATES)?;
    let scorer = CostModelScorer::new(config.scoring)?;
    let ranked = scorer.score(&candidates);
    info!(
        "ranked {} candidate routes from {}",
        ranked.len(),
        config.candidates_path
    );
    Ok(ranked)
}

fn write_ranked(writer: &mut dyn Write, ranked: &[ScoredRoute]) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(ranked).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
