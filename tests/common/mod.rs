//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use microgrid_sim::sim::assets::{AssetConfig, BatterySpec, GridMode, GridSpec, PvSpec};
use microgrid_sim::sim::engine::simulate;
use microgrid_sim::sim::profile::ProfileSeries;
use microgrid_sim::sim::types::{FlowRecord, SimConfig};

/// Absolute tolerance for power comparisons (kW).
pub const EPS: f64 = 1e-9;

/// Assets with every capacity at zero.
pub fn bare_assets() -> AssetConfig {
    AssetConfig {
        pv: PvSpec {
            capacity_kwp: 0.0,
            specific_yield_kwh_per_kwp: 950.0,
            overdimension_ratio: 1.0,
        },
        battery: BatterySpec {
            power_capacity_kw: 0.0,
            energy_capacity_kwh: 0.0,
            efficiency: 0.9,
            min_soc: 0.0,
        },
        generators: Vec::new(),
        grid: GridSpec {
            supply_capacity_kw: 0.0,
            feedin_capacity_kw: 0.0,
        },
        grid_charge_trigger: 0.0,
        fuel_consumption_l_per_h: 0.0,
        grid_mode: GridMode::Triggered,
    }
}

/// A lossless battery without SOC floor.
pub fn lossless_battery(power_kw: f64, energy_kwh: f64) -> BatterySpec {
    BatterySpec {
        power_capacity_kw: power_kw,
        energy_capacity_kwh: energy_kwh,
        efficiency: 1.0,
        min_soc: 0.0,
    }
}

/// `n` samples of constant consumption and PV.
pub fn flat_profile(consumption_kwh: f64, pv_kwh_per_mwp: f64, n: usize) -> ProfileSeries {
    profile(vec![consumption_kwh; n], vec![pv_kwh_per_mwp; n])
}

pub fn profile(consumption_kwh: Vec<f64>, pv_kwh_per_mwp: Vec<f64>) -> ProfileSeries {
    match ProfileSeries::new(consumption_kwh, pv_kwh_per_mwp) {
        Ok(p) => p,
        Err(e) => panic!("test profile invalid: {e}"),
    }
}

/// Runs the dispatch at quarter-hour resolution, panicking on invalid input.
pub fn run(assets: &AssetConfig, profile: &ProfileSeries) -> Vec<FlowRecord> {
    match simulate(assets, profile, &SimConfig::default()) {
        Ok(records) => records,
        Err(e) => panic!("simulation rejected test inputs: {e}"),
    }
}

/// Unique path in the system temp directory.
pub fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("microgrid-sim-{}-{name}", std::process::id()))
}
