//! Core simulation types: time resolution and the per-step flow record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, InvariantViolation};

/// Number of generator slots the dispatcher knows about.
pub const MAX_GENERATORS: usize = 3;

/// Time resolution and run guards.
///
/// All energy↔power conversions go through [`SimConfig::steps_per_hour`].
///
/// # Examples
///
/// ```
/// use microgrid_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::default();
/// assert_eq!(cfg.steps_per_hour, 4.0);
/// assert_eq!(cfg.step_hours(), 0.25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Samples per hour; 4.0 for a 15-minute profile.
    pub steps_per_hour: f64,
    /// Largest profile accepted before the run is refused.
    pub max_steps: usize,
    /// Relative tolerance of the PV balance identity.
    pub balance_tolerance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            steps_per_hour: 4.0,
            // Ten leap years of quarter-hours.
            max_steps: 10 * 8784 * 4,
            balance_tolerance: 1e-6,
        }
    }
}

impl SimConfig {
    pub fn with_steps_per_hour(steps_per_hour: f64) -> Self {
        Self {
            steps_per_hour,
            ..Self::default()
        }
    }

    /// Duration of one sample in hours.
    pub fn step_hours(&self) -> f64 {
        1.0 / self.steps_per_hour
    }

    /// Samples in one day, at least one. `None` for an unusable resolution.
    pub fn steps_per_day(&self) -> Option<usize> {
        (self.steps_per_hour.is_finite() && self.steps_per_hour > 0.0)
            .then(|| ((24.0 * self.steps_per_hour).round() as usize).max(1))
    }

    /// Divisor that turns a summed kW series into MWh.
    pub fn mwh_divisor(&self) -> f64 {
        self.steps_per_hour * 1000.0
    }

    /// Checks the resolution and tolerance; returns all violations.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(self.steps_per_hour.is_finite() && self.steps_per_hour > 0.0) {
            errors.push(ConfigError::new(
                "simulation.steps_per_hour",
                format!("must be a finite value > 0, got {}", self.steps_per_hour),
            ));
        }
        if !(self.balance_tolerance.is_finite() && self.balance_tolerance > 0.0) {
            errors.push(ConfigError::new(
                "simulation.balance_tolerance",
                format!("must be a finite value > 0, got {}", self.balance_tolerance),
            ));
        }
        errors
    }
}

/// Complete record of one dispatch timestep.
///
/// All power quantities are in kW. Production and supply are negative,
/// consumption and demand positive. Two fields are flipped at the end of the
/// step: `grid_interface` is positive when the grid supplies the site and
/// `batt_flow` is positive when the battery discharges. The `*_inflow` /
/// `*_outflow` pairs keep the unflipped sign (`grid_inflow` is feed-in,
/// `batt_inflow` is charging).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRecord {
    pub timestep: usize,
    /// Site demand (positive).
    pub consumption: f64,
    /// PV output (negative).
    pub pv_production: f64,
    pub pv_consumption: f64,
    pub grid_consumption: f64,
    pub gen_consumption: f64,
    pub batt_consumption: f64,
    /// Generator power stored in the battery.
    pub gen_battery: f64,
    /// PV power stored in the battery.
    pub pv_battery: f64,
    /// Grid power stored in the battery.
    pub grid_battery: f64,
    pub pv_curtailment: f64,
    /// PV fed into the grid. Can go negative when other sources are
    /// attributed to the export.
    pub pv_grid: f64,
    /// Closure of the PV identity; ~0 for a healthy step.
    pub pv_balance: f64,
    /// PV-sourced battery energy delivered back, after round-trip losses.
    pub green_batt_consumption: f64,
    /// Generator-sourced battery energy delivered back.
    pub grey_batt_consumption: f64,
    /// Grid-sourced battery energy delivered back.
    pub blue_batt_consumption: f64,
    /// Combined generator output (negative).
    pub gen_production: f64,
    /// Battery power, positive when discharging.
    pub batt_flow: f64,
    /// Charging part of the battery flow (>= 0).
    pub batt_inflow: f64,
    /// Discharging part of the battery flow (<= 0).
    pub batt_outflow: f64,
    /// Stored energy after the step (kWh).
    pub battery_soc: f64,
    /// Grid power, positive when importing.
    pub grid_interface: f64,
    /// Feed-in part of the grid flow (>= 0).
    pub grid_inflow: f64,
    /// Import part of the grid flow (<= 0).
    pub grid_outflow: f64,
    pub shortage_consumption: f64,
    /// Balance the clamped grid interface could not absorb or deliver.
    pub grid_curtailment: f64,
    /// Whether this step ran the grid-charges-battery branch.
    pub grid_charging: bool,
    /// Generator slots running during this step, in priority order.
    pub generator_active: [bool; MAX_GENERATORS],
    #[serde(skip)]
    pub diagnostic: Option<InvariantViolation>,
}

impl FlowRecord {
    /// Sum of the attributed consumption components including shortage.
    pub fn attributed_consumption(&self) -> f64 {
        self.pv_consumption
            + self.grid_consumption
            + self.gen_consumption
            + self.batt_consumption
            + self.shortage_consumption
    }

    /// Number of generators running during this step.
    pub fn active_generators(&self) -> usize {
        self.generator_active.iter().filter(|on| **on).count()
    }
}

impl fmt::Display for FlowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} | load={:>8.2} pv={:>8.2} gen={:>8.2} bat={:>8.2} (SoC={:.1} kWh) \
             grid={:>8.2} | short={:.2} curt={:.2}{}",
            self.timestep,
            self.consumption,
            self.pv_production,
            self.gen_production,
            self.batt_flow,
            self.battery_soc,
            self.grid_interface,
            self.shortage_consumption,
            self.pv_curtailment,
            if self.grid_charging { " [grid->bat]" } else { "" },
        )
    }
}
