//! Dispatch engine that walks the profile and allocates power between assets.

use tracing::{debug, warn};

use crate::devices::{Battery, Device, DeviceContext, GeneratorBank, GridConnection, PvPlant};

use super::assets::{AssetConfig, GridMode};
use super::error::{InvariantViolation, ProfileError, SimulationError};
use super::profile::ProfileSeries;
use super::types::{FlowRecord, MAX_GENERATORS, SimConfig};

/// Mutable state carried from one step to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub battery_soc_kwh: f64,
    pub generator_active: [bool; MAX_GENERATORS],
}

/// Simulation engine owning the assets and the converted input series.
///
/// Every engine starts from a full battery and with all generators off; the
/// state is never shared between engines.
pub struct Engine {
    config: SimConfig,
    grid_mode: GridMode,
    grid_charge_threshold_kwh: f64,
    consumption_kw: Vec<f64>,
    pv_kw: Vec<f64>,
    battery: Battery,
    generators: GeneratorBank,
    grid: GridConnection,
    grid_charging: bool,
}

impl Engine {
    /// Creates an engine for one run.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] of the assets or the time
    /// resolution, or [`ProfileError::TooLong`] if the profile exceeds
    /// `config.max_steps`.
    pub fn new(
        assets: &AssetConfig,
        profile: &ProfileSeries,
        config: SimConfig,
    ) -> Result<Self, SimulationError> {
        if let Some(err) = config
            .validate()
            .into_iter()
            .chain(assets.validate())
            .next()
        {
            return Err(err.into());
        }
        if profile.len() > config.max_steps {
            return Err(ProfileError::TooLong {
                len: profile.len(),
                max: config.max_steps,
            }
            .into());
        }

        let s = config.steps_per_hour;
        let consumption_kw = profile.consumption_kwh().iter().map(|e| e * s).collect();
        let pv_kw = PvPlant::new(&assets.pv).power_series(profile.pv_kwh_per_mwp(), s);

        Ok(Self {
            config,
            grid_mode: assets.grid_mode,
            grid_charge_threshold_kwh: assets.grid_charge_trigger
                * assets.battery.energy_capacity_kwh,
            consumption_kw,
            pv_kw,
            battery: Battery::new(&assets.battery, s),
            generators: GeneratorBank::new(&assets.generators),
            grid: GridConnection::new(&assets.grid),
            grid_charging: false,
        })
    }

    /// Number of steps the engine will run.
    fn len(&self) -> usize {
        self.consumption_kw.len()
    }

    pub fn state(&self) -> SimulationState {
        SimulationState {
            battery_soc_kwh: self.battery.soc_kwh,
            generator_active: self.generators.active(),
        }
    }

    fn grid_charging_active(&self) -> bool {
        match self.grid_mode {
            GridMode::AlwaysCharge => true,
            GridMode::Triggered => {
                self.grid_charge_threshold_kwh != 0.0
                    && self.battery.soc_kwh < self.grid_charge_threshold_kwh
            }
        }
    }

    /// Executes one dispatch timestep and returns its flow record.
    ///
    /// # Arguments
    ///
    /// * `t` - Sample index, `< self.len()`
    pub fn step(&mut self, t: usize) -> FlowRecord {
        let consumption = self.consumption_kw[t];
        let pv_production = self.pv_kw[t];

        // 1. Pick the branch once; the grid step reuses it.
        let grid_charging = self.grid_charging_active();
        if grid_charging != self.grid_charging {
            debug!(
                timestep = t,
                soc_kwh = self.battery.soc_kwh,
                grid_charging,
                "grid charging branch changed"
            );
            self.grid_charging = grid_charging;
        }

        // Power balance: + excess demand, - excess supply.
        let mut balance = consumption + pv_production;
        if grid_charging {
            balance -= self.grid.supply_capacity_kw();
        }

        // 2. Generators
        let gen_production = self.generators.commit(balance, &self.battery);
        balance += gen_production;

        // 3. Battery
        let requested_kw = self.battery.requested_flow_kw(balance);
        let batt_actual = self
            .battery
            .power_kw(&DeviceContext::with_setpoint(t, requested_kw));
        let batt_terminal = self.battery.terminal_kw(batt_actual);
        balance += batt_terminal;

        // 4. Grid (internal sign: + feed-in, - import)
        let dispatch = if grid_charging {
            self.grid.settle_with_reserved_supply(balance)
        } else {
            self.grid.settle(balance)
        };
        let grid_interface = dispatch.interface_kw;

        // 5. Consumption waterfall
        let mut unmet = consumption;
        let pv_consumption = draw(-pv_production, &mut unmet);
        let grid_consumption = draw(self.grid.import_kw(grid_interface), &mut unmet);
        let gen_consumption = draw(-gen_production, &mut unmet);
        let batt_consumption = draw((-batt_actual).max(0.0), &mut unmet);
        let shortage_consumption = unmet;

        // 6. Where the battery charge came from
        let charge_kw = batt_terminal.max(0.0);
        let gen_overproduction = (gen_production + gen_consumption + charge_kw).min(0.0);
        let gen_battery = deficit(gen_production + gen_consumption - gen_overproduction);
        let grid_battery = deficit(grid_interface + consumption);
        let pv_battery = (batt_terminal - gen_battery - grid_battery).max(0.0);
        let round_trip = self.battery.efficiency * self.battery.efficiency;

        // 7. PV closure
        let pv_curtailment =
            deficit(pv_consumption + pv_battery + pv_production + grid_interface.max(0.0));
        let pv_grid = -(pv_consumption + pv_battery + pv_production + pv_curtailment);
        let pv_balance = pv_production + pv_consumption + pv_battery + pv_grid + pv_curtailment;

        let tolerance_kw = self.config.balance_tolerance * pv_production.abs().max(1.0);
        let diagnostic = if pv_balance.abs() >= tolerance_kw {
            let violation = InvariantViolation {
                timestep: t,
                residual_kw: pv_balance,
                tolerance_kw,
            };
            warn!(%violation, "pv balance check failed");
            Some(violation)
        } else {
            None
        };

        FlowRecord {
            timestep: t,
            consumption,
            pv_production,
            pv_consumption,
            grid_consumption,
            gen_consumption,
            batt_consumption,
            gen_battery,
            pv_battery,
            grid_battery,
            pv_curtailment,
            pv_grid,
            pv_balance,
            green_batt_consumption: pv_battery * round_trip,
            grey_batt_consumption: gen_battery * round_trip,
            blue_batt_consumption: grid_battery * round_trip,
            gen_production,
            // Reported discharge-positive.
            batt_flow: -batt_actual,
            batt_inflow: batt_actual.max(0.0),
            batt_outflow: batt_actual.min(0.0),
            battery_soc: self.battery.soc_kwh,
            // Reported import-positive.
            grid_interface: -grid_interface,
            grid_inflow: grid_interface.max(0.0),
            grid_outflow: grid_interface.min(0.0),
            shortage_consumption,
            grid_curtailment: dispatch.curtailment_kw,
            grid_charging,
            generator_active: self.generators.active(),
            diagnostic,
        }
    }

    /// Executes all timesteps and returns the complete record vector.
    pub fn run(&mut self) -> Vec<FlowRecord> {
        debug!(
            steps = self.len(),
            storage = self.battery.device_type(),
            "dispatch run started"
        );
        let mut records = Vec::with_capacity(self.len());
        for t in 0..self.len() {
            records.push(self.step(t));
        }
        let violations = records.iter().filter(|r| r.diagnostic.is_some()).count();
        debug!(
            steps = records.len(),
            violations,
            final_soc_kwh = self.battery.soc_kwh,
            "dispatch run finished"
        );
        records
    }
}

/// Takes as much of `available` as the unmet demand allows.
fn draw(available_kw: f64, unmet_kw: &mut f64) -> f64 {
    let taken = available_kw.min(*unmet_kw).max(0.0);
    *unmet_kw -= taken;
    taken
}

/// Magnitude of the negative part of `kw`, never `-0.0`.
fn deficit(kw: f64) -> f64 {
    -kw.min(0.0) + 0.0
}

/// Validates the inputs and runs the full dispatch.
///
/// # Errors
///
/// See [`Engine::new`]. Nothing is simulated when an error is returned.
pub fn simulate(
    assets: &AssetConfig,
    profile: &ProfileSeries,
    config: &SimConfig,
) -> Result<Vec<FlowRecord>, SimulationError> {
    Ok(Engine::new(assets, profile, *config)?.run())
}
