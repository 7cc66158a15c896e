//! Post-hoc energy totals computed from a complete flow table.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::assets::AssetConfig;
use super::costs::generator_hours;
use super::types::{FlowRecord, SimConfig};

/// Relative gap between demand and attributed supply still counted as met.
pub const ADEQUACY_TOLERANCE: f64 = 0.005;

/// Total energy per flow over the run (MWh, same signs as the records).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyTotals {
    pub consumption: f64,
    pub pv_production: f64,
    pub pv_consumption: f64,
    pub grid_consumption: f64,
    pub gen_consumption: f64,
    pub batt_consumption: f64,
    pub gen_battery: f64,
    pub pv_battery: f64,
    pub grid_battery: f64,
    pub pv_curtailment: f64,
    pub pv_grid: f64,
    pub green_batt_consumption: f64,
    pub grey_batt_consumption: f64,
    pub blue_batt_consumption: f64,
    pub gen_production: f64,
    pub batt_inflow: f64,
    pub batt_outflow: f64,
    pub grid_inflow: f64,
    pub grid_outflow: f64,
    pub shortage_consumption: f64,
}

impl EnergyTotals {
    fn add(&mut self, r: &FlowRecord) {
        self.consumption += r.consumption;
        self.pv_production += r.pv_production;
        self.pv_consumption += r.pv_consumption;
        self.grid_consumption += r.grid_consumption;
        self.gen_consumption += r.gen_consumption;
        self.batt_consumption += r.batt_consumption;
        self.gen_battery += r.gen_battery;
        self.pv_battery += r.pv_battery;
        self.grid_battery += r.grid_battery;
        self.pv_curtailment += r.pv_curtailment;
        self.pv_grid += r.pv_grid;
        self.green_batt_consumption += r.green_batt_consumption;
        self.grey_batt_consumption += r.grey_batt_consumption;
        self.blue_batt_consumption += r.blue_batt_consumption;
        self.gen_production += r.gen_production;
        self.batt_inflow += r.batt_inflow;
        self.batt_outflow += r.batt_outflow;
        self.grid_inflow += r.grid_inflow;
        self.grid_outflow += r.grid_outflow;
        self.shortage_consumption += r.shortage_consumption;
    }

    fn scaled(mut self, divisor: f64) -> Self {
        for v in [
            &mut self.consumption,
            &mut self.pv_production,
            &mut self.pv_consumption,
            &mut self.grid_consumption,
            &mut self.gen_consumption,
            &mut self.batt_consumption,
            &mut self.gen_battery,
            &mut self.pv_battery,
            &mut self.grid_battery,
            &mut self.pv_curtailment,
            &mut self.pv_grid,
            &mut self.green_batt_consumption,
            &mut self.grey_batt_consumption,
            &mut self.blue_batt_consumption,
            &mut self.gen_production,
            &mut self.batt_inflow,
            &mut self.batt_outflow,
            &mut self.grid_inflow,
            &mut self.grid_outflow,
            &mut self.shortage_consumption,
        ] {
            *v /= divisor;
        }
        self
    }

    /// Demand covered by PV, grid, generators and battery (MWh).
    pub fn supplied(&self) -> f64 {
        self.pv_consumption + self.grid_consumption + self.gen_consumption + self.batt_consumption
    }
}

/// Calendar month totals (MWh).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub year: i32,
    pub month: u32,
    pub consumption_mwh: f64,
    pub pv_production_mwh: f64,
    pub grid_import_mwh: f64,
    pub shortage_mwh: f64,
}

/// Aggregate energy report derived from a complete run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySummary {
    pub steps: usize,
    pub totals_mwh: EnergyTotals,
    pub generator_hours: f64,
    pub fuel_litres: f64,
    /// Whether demand is met within [`ADEQUACY_TOLERANCE`].
    pub supply_adequate: bool,
    /// Steps whose PV balance check failed.
    pub balance_violations: usize,
    /// Empty unless the profile carried timestamps.
    pub monthly: Vec<MonthlyTotals>,
}

impl EnergySummary {
    /// Computes the report from the complete record vector.
    ///
    /// # Arguments
    ///
    /// * `assets` - Assets the run was made with
    /// * `records` - Complete flow table
    /// * `timestamps` - Sample times aligned with `records`, if known
    /// * `config` - Time resolution of the run
    pub fn from_records(
        assets: &AssetConfig,
        records: &[FlowRecord],
        timestamps: Option<&[NaiveDateTime]>,
        config: &SimConfig,
    ) -> Self {
        let divisor = config.mwh_divisor();
        let mut totals = EnergyTotals::default();
        for r in records {
            totals.add(r);
        }
        let totals_mwh = totals.scaled(divisor);

        let generator_hours = generator_hours(records, &assets.generator_capacities(), config);

        // A site without demand is trivially supplied.
        let supply_adequate = totals_mwh.consumption == 0.0
            || ((totals_mwh.consumption - totals_mwh.supplied()) / totals_mwh.consumption).abs()
                < ADEQUACY_TOLERANCE;

        let monthly = timestamps
            .map(|ts| monthly_totals(records, ts, divisor))
            .unwrap_or_default();

        Self {
            steps: records.len(),
            totals_mwh,
            generator_hours,
            fuel_litres: assets.fuel_consumption_l_per_h * generator_hours,
            supply_adequate,
            balance_violations: records.iter().filter(|r| r.diagnostic.is_some()).count(),
            monthly,
        }
    }
}

fn monthly_totals(
    records: &[FlowRecord],
    timestamps: &[NaiveDateTime],
    divisor: f64,
) -> Vec<MonthlyTotals> {
    let mut months: BTreeMap<(i32, u32), [f64; 4]> = BTreeMap::new();
    for (r, ts) in records.iter().zip(timestamps) {
        let sums = months.entry((ts.year(), ts.month())).or_default();
        sums[0] += r.consumption;
        sums[1] += r.pv_production;
        sums[2] -= r.grid_outflow;
        sums[3] += r.shortage_consumption;
    }
    months
        .into_iter()
        .map(|((year, month), sums)| MonthlyTotals {
            year,
            month,
            consumption_mwh: sums[0] / divisor,
            pv_production_mwh: sums[1] / divisor,
            grid_import_mwh: sums[2] / divisor,
            shortage_mwh: sums[3] / divisor,
        })
        .collect()
}

impl fmt::Display for EnergySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.totals_mwh;
        writeln!(f, "--- Energy Summary ({} steps) ---", self.steps)?;
        if self.supply_adequate {
            writeln!(f, "Demand of {:.1} MWh is met by the assets", t.consumption)?;
        } else {
            writeln!(
                f,
                "ATTENTION: demand of {:.1} MWh is not met, assets provide {:.1} MWh",
                t.consumption,
                t.supplied()
            )?;
        }
        writeln!(
            f,
            "Consumption:  PV {:.1} | grid {:.1} | generator {:.1} | battery {:.1} | shortage {:.1} MWh",
            t.pv_consumption,
            t.grid_consumption,
            t.gen_consumption,
            t.batt_consumption,
            t.shortage_consumption
        )?;
        writeln!(
            f,
            "PV:           produced {:.1} | to battery {:.1} | to grid {:.1} | curtailed {:.1} MWh",
            -t.pv_production, t.pv_battery, t.pv_grid, t.pv_curtailment
        )?;
        writeln!(
            f,
            "Battery:      charged {:.1} (PV {:.1}, generator {:.1}, grid {:.1}) MWh",
            t.batt_inflow, t.pv_battery, t.gen_battery, t.grid_battery
        )?;
        writeln!(
            f,
            "Generators:   {:.1} MWh over {:.2} h, {:.0} L fuel",
            -t.gen_production, self.generator_hours, self.fuel_litres
        )?;
        write!(
            f,
            "Grid:         import {:.1} | feed-in {:.1} MWh",
            -t.grid_outflow, t.grid_inflow
        )?;
        if self.balance_violations > 0 {
            write!(f, "\nPV balance violations: {}", self.balance_violations)?;
        }
        for m in &self.monthly {
            write!(
                f,
                "\n{}-{:02}: load {:.1} | PV {:.1} | import {:.1} | shortage {:.1} MWh",
                m.year,
                m.month,
                m.consumption_mwh,
                -m.pv_production_mwh,
                m.grid_import_mwh,
                m.shortage_mwh
            )?;
        }
        Ok(())
    }
}
