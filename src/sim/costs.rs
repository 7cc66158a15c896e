//! Annual economics derived from a complete flow table.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::assets::AssetConfig;
use super::error::ConfigError;
use super::types::{FlowRecord, MAX_GENERATORS, SimConfig};

/// Prices and lease rates, all in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tariffs {
    /// Generator fuel (per litre).
    pub fuel_price_per_l: f64,
    /// Energy bought from the grid (per MWh).
    pub grid_energy_price_per_mwh: f64,
    /// Energy sold to the grid (per MWh).
    pub grid_feedin_price_per_mwh: f64,
    /// Energy sold to the site consumers (per MWh).
    pub consumption_price_per_mwh: f64,
    /// Contracted supply capacity (per kW and month).
    pub capacity_cost_per_kw_month: f64,
    pub pv_lease_per_kwp_year: f64,
    pub battery_lease_per_kwh_year: f64,
    pub generator_lease_per_unit_year: f64,
}

impl Default for Tariffs {
    fn default() -> Self {
        Self {
            fuel_price_per_l: 1.5,
            grid_energy_price_per_mwh: 250.0,
            grid_feedin_price_per_mwh: 60.0,
            consumption_price_per_mwh: 300.0,
            capacity_cost_per_kw_month: 3.0,
            pv_lease_per_kwp_year: 100.0,
            battery_lease_per_kwh_year: 150.0,
            generator_lease_per_unit_year: 25_000.0,
        }
    }
}

impl Tariffs {
    /// Checks that every rate is finite and non-negative.
    pub fn validate(&self) -> Vec<ConfigError> {
        [
            ("tariffs.fuel_price_per_l", self.fuel_price_per_l),
            ("tariffs.grid_energy_price_per_mwh", self.grid_energy_price_per_mwh),
            ("tariffs.grid_feedin_price_per_mwh", self.grid_feedin_price_per_mwh),
            ("tariffs.consumption_price_per_mwh", self.consumption_price_per_mwh),
            ("tariffs.capacity_cost_per_kw_month", self.capacity_cost_per_kw_month),
            ("tariffs.pv_lease_per_kwp_year", self.pv_lease_per_kwp_year),
            ("tariffs.battery_lease_per_kwh_year", self.battery_lease_per_kwh_year),
            (
                "tariffs.generator_lease_per_unit_year",
                self.generator_lease_per_unit_year,
            ),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(field, v)| {
            ConfigError::new(field, format!("must be a finite value >= 0, got {v}"))
        })
        .collect()
    }
}

/// One row of the cost table. Costs are negative, revenues positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostLine {
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub variable_revenue: f64,
}

impl CostLine {
    pub fn net(&self) -> f64 {
        self.fixed_cost + self.variable_cost + self.variable_revenue
    }
}

/// Annualised cost and revenue table per asset category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub solar: CostLine,
    pub battery: CostLine,
    pub generator: CostLine,
    pub grid: CostLine,
    pub consumption: CostLine,
    /// Generator running hours, counted per active tier.
    pub generator_hours: f64,
    /// Fuel burned by the generators (L).
    pub fuel_litres: f64,
}

impl CostBreakdown {
    /// Rows in display order.
    pub fn lines(&self) -> [(&'static str, &CostLine); 5] {
        [
            ("Solar", &self.solar),
            ("Battery", &self.battery),
            ("Generator", &self.generator),
            ("Grid", &self.grid),
            ("Consumption", &self.consumption),
        ]
    }

    /// Sum of all costs (<= 0).
    pub fn total_cost(&self) -> f64 {
        self.lines()
            .iter()
            .map(|(_, l)| l.fixed_cost + l.variable_cost)
            .sum()
    }

    /// Sum of all revenues. Feed-in revenue follows `pv_grid` and can go
    /// negative.
    pub fn total_revenue(&self) -> f64 {
        self.lines().iter().map(|(_, l)| l.variable_revenue).sum()
    }

    /// Revenue plus (negative) cost.
    pub fn balance(&self) -> f64 {
        self.total_revenue() + self.total_cost()
    }
}

/// Running hours of the generator bank over the whole run.
///
/// A step with output adds one sample duration per tier reached: within the
/// first unit's capacity counts once, within the first two units twice,
/// anything beyond three times.
pub fn generator_hours(
    records: &[FlowRecord],
    capacities_kw: &[f64; MAX_GENERATORS],
    config: &SimConfig,
) -> f64 {
    let dt = config.step_hours();
    let first = capacities_kw[0];
    let first_two = capacities_kw[0] + capacities_kw[1];

    records
        .iter()
        .map(|r| r.gen_production)
        .filter(|&p| p < 0.0)
        .map(|p| {
            if p >= -first {
                dt
            } else if p >= -first_two {
                2.0 * dt
            } else {
                3.0 * dt
            }
        })
        .sum()
}

/// Sums one field over the run and converts it to MWh.
pub fn total_mwh(
    records: &[FlowRecord],
    config: &SimConfig,
    field: impl Fn(&FlowRecord) -> f64,
) -> f64 {
    records.iter().map(field).sum::<f64>() / config.mwh_divisor()
}

/// Builds the annual cost table from a finished run.
///
/// # Arguments
///
/// * `assets` - Assets the run was made with
/// * `tariffs` - Prices and lease rates
/// * `records` - Complete flow table
/// * `config` - Time resolution of the run
pub fn aggregate_costs(
    assets: &AssetConfig,
    tariffs: &Tariffs,
    records: &[FlowRecord],
    config: &SimConfig,
) -> CostBreakdown {
    let generator_hours = generator_hours(records, &assets.generator_capacities(), config);
    let fuel_litres = assets.fuel_consumption_l_per_h * generator_hours;

    let grid_energy_mwh = total_mwh(records, config, |r| r.grid_consumption + r.grid_battery);
    let pv_grid_mwh = total_mwh(records, config, |r| r.pv_grid);
    let consumption_mwh = total_mwh(records, config, |r| r.consumption);

    CostBreakdown {
        solar: CostLine {
            fixed_cost: -tariffs.pv_lease_per_kwp_year * assets.pv.capacity_kwp,
            ..CostLine::default()
        },
        battery: CostLine {
            fixed_cost: -tariffs.battery_lease_per_kwh_year * assets.battery.energy_capacity_kwh,
            ..CostLine::default()
        },
        generator: CostLine {
            fixed_cost: -tariffs.generator_lease_per_unit_year
                * assets.installed_generators() as f64,
            variable_cost: -fuel_litres * tariffs.fuel_price_per_l,
            variable_revenue: 0.0,
        },
        grid: CostLine {
            fixed_cost: -assets.grid.supply_capacity_kw * tariffs.capacity_cost_per_kw_month * 12.0,
            variable_cost: -grid_energy_mwh * tariffs.grid_energy_price_per_mwh,
            variable_revenue: pv_grid_mwh * tariffs.grid_feedin_price_per_mwh,
        },
        consumption: CostLine {
            variable_revenue: consumption_mwh * tariffs.consumption_price_per_mwh,
            ..CostLine::default()
        },
        generator_hours,
        fuel_litres,
    }
}

impl fmt::Display for CostBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Annual Economics ---")?;
        writeln!(
            f,
            "{:<12} {:>14} {:>14} {:>14}",
            "", "Fixed cost", "Variable cost", "Revenue"
        )?;
        for (name, line) in self.lines() {
            writeln!(
                f,
                "{:<12} {:>14.0} {:>14.0} {:>14.0}",
                name, line.fixed_cost, line.variable_cost, line.variable_revenue
            )?;
        }
        writeln!(
            f,
            "Generators:  {:.2} h, {:.0} L fuel",
            self.generator_hours, self.fuel_litres
        )?;
        write!(
            f,
            "Total cost {:.0} | revenue {:.0} | balance {:.0}",
            self.total_cost(),
            self.total_revenue(),
            self.balance()
        )
    }
}
