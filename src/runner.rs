//! End-to-end run of one scenario: profile, dispatch, summary and costs.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::io::profile::read_profile_csv;
use crate::sim::costs::{CostBreakdown, aggregate_costs};
use crate::sim::engine::simulate;
use crate::sim::error::{ConfigError, ProfileError, SimulationError};
use crate::sim::profile::ProfileSeries;
use crate::sim::summary::EnergySummary;
use crate::sim::types::FlowRecord;
use crate::synthetic::synthetic_profile;

const HOURS_PER_YEAR: f64 = 8760.0;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("scenario has {} invalid field(s)", .0.len())]
    Invalid(Vec<ConfigError>),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub records: Vec<FlowRecord>,
    pub summary: EnergySummary,
    pub costs: CostBreakdown,
}

/// Report part of an outcome, as written by `--json`.
#[derive(Debug, Serialize)]
pub struct OutcomeReport<'a> {
    pub summary: &'a EnergySummary,
    pub costs: &'a CostBreakdown,
}

impl ScenarioOutcome {
    pub fn report(&self) -> OutcomeReport<'_> {
        OutcomeReport {
            summary: &self.summary,
            costs: &self.costs,
        }
    }
}

/// Resolves the profile for a scenario.
///
/// `profile_override` wins over `[profile].csv`; without either a synthetic
/// profile is generated. Consumption is rescaled when
/// `annual_consumption_mwh` is set.
///
/// # Errors
///
/// Returns a [`ProfileError`] if the CSV cannot be read or the series is
/// invalid.
pub fn load_profile(
    scenario: &ScenarioConfig,
    profile_override: Option<&Path>,
) -> Result<ProfileSeries, ProfileError> {
    let csv = profile_override.or(scenario.profile.csv.as_deref());
    let profile = match csv {
        Some(path) => read_profile_csv(path)?,
        None => synthetic_profile(&scenario.profile, &scenario.simulation)?,
    };

    Ok(match scenario.profile.annual_consumption_mwh {
        Some(mwh) => profile
            .scaled_to_annual_consumption(mwh, HOURS_PER_YEAR * scenario.simulation.steps_per_hour),
        None => profile,
    })
}

/// Validates, simulates and evaluates a scenario.
///
/// # Errors
///
/// Returns [`RunError::Invalid`] with every configuration error before any
/// input is read, otherwise profile or simulation errors.
pub fn run_scenario(
    scenario: &ScenarioConfig,
    profile_override: Option<&Path>,
) -> Result<ScenarioOutcome, RunError> {
    let errors = scenario.validate();
    if !errors.is_empty() {
        return Err(RunError::Invalid(errors));
    }

    let profile = load_profile(scenario, profile_override)?;
    let assets = scenario.assets();
    let sim = &scenario.simulation;

    let records = simulate(&assets, &profile, sim)?;
    let summary = EnergySummary::from_records(&assets, &records, profile.timestamps(), sim);
    let costs = aggregate_costs(&assets, &scenario.tariffs, &records, sim);

    info!(
        steps = records.len(),
        consumption_mwh = summary.totals_mwh.consumption,
        balance = costs.balance(),
        "scenario evaluated"
    );

    Ok(ScenarioOutcome {
        records,
        summary,
        costs,
    })
}
