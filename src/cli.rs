use std::path::PathBuf;

use clap::Parser;

use crate::config::ScenarioConfig;
use crate::sim::error::ConfigError;

/// Microgrid dispatch and economics simulator.
///
/// Without --scenario or --preset the baseline preset is used.
#[derive(Debug, Parser)]
#[command(name = "microgrid-sim", version, about)]
pub struct Args {
    /// Scenario TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in preset (baseline, off_grid, grid_only).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Profile CSV; overrides [profile].csv of the scenario.
    #[arg(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Write the per-step flow table to this CSV file.
    #[arg(long, value_name = "PATH")]
    pub flows_out: Option<PathBuf>,

    /// Print summary and costs as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Only log warnings and errors.
    #[arg(long, short)]
    pub quiet: bool,
}

impl Args {
    /// Loads the scenario selected on the command line.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an unreadable file or unknown preset.
    pub fn scenario_config(&self) -> Result<ScenarioConfig, ConfigError> {
        match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path),
            (None, Some(name)) => ScenarioConfig::from_preset(name),
            (None, None) => Ok(ScenarioConfig::baseline()),
        }
    }
}
