//! Asset capacities and dispatch switches for one simulation run.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::types::MAX_GENERATORS;

/// Solar plant parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PvSpec {
    /// Installed capacity (kWp).
    pub capacity_kwp: f64,
    /// Specific yield (kWh/kWp per year).
    pub specific_yield_kwh_per_kwp: f64,
    /// DC/AC ratio.
    pub overdimension_ratio: f64,
}

impl Default for PvSpec {
    fn default() -> Self {
        Self {
            capacity_kwp: 500.0,
            specific_yield_kwh_per_kwp: 950.0,
            overdimension_ratio: 1.2,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatterySpec {
    /// Maximum charge/discharge power (kW).
    pub power_capacity_kw: f64,
    /// Usable energy capacity (kWh).
    pub energy_capacity_kwh: f64,
    /// One-way efficiency, (0, 1].
    pub efficiency: f64,
    /// Lowest allowed SOC as a fraction of energy capacity.
    pub min_soc: f64,
}

impl Default for BatterySpec {
    fn default() -> Self {
        Self {
            power_capacity_kw: 250.0,
            energy_capacity_kwh: 500.0,
            efficiency: 0.95,
            min_soc: 0.1,
        }
    }
}

/// One backup generator slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorSpec {
    /// Rated output (kW).
    pub capacity_kw: f64,
    /// SOC fraction below which this unit starts.
    pub soc_trigger: f64,
}

impl Default for GeneratorSpec {
    fn default() -> Self {
        Self {
            capacity_kw: 100.0,
            soc_trigger: 0.2,
        }
    }
}

/// Grid connection limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSpec {
    /// Maximum import (kW).
    pub supply_capacity_kw: f64,
    /// Maximum export (kW).
    pub feedin_capacity_kw: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            supply_capacity_kw: 300.0,
            feedin_capacity_kw: 200.0,
        }
    }
}

/// How a step decides whether grid headroom is steered into the battery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridMode {
    /// Grid charges the battery only while SOC is below `grid_charge_trigger`.
    #[default]
    Triggered,
    /// Grid supply capacity is netted toward the battery on every step.
    AlwaysCharge,
}

/// Immutable asset configuration for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetConfig {
    pub pv: PvSpec,
    pub battery: BatterySpec,
    /// Generators in priority order (at most [`MAX_GENERATORS`]).
    pub generators: Vec<GeneratorSpec>,
    pub grid: GridSpec,
    /// SOC fraction below which the grid must charge the battery.
    pub grid_charge_trigger: f64,
    /// Fuel burn while any generator runs (L/h).
    pub fuel_consumption_l_per_h: f64,
    pub grid_mode: GridMode,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            pv: PvSpec::default(),
            battery: BatterySpec::default(),
            generators: vec![GeneratorSpec::default()],
            grid: GridSpec::default(),
            grid_charge_trigger: 0.0,
            fuel_consumption_l_per_h: 25.0,
            grid_mode: GridMode::Triggered,
        }
    }
}

impl AssetConfig {
    /// Generator capacities padded with zeros to [`MAX_GENERATORS`] slots.
    pub fn generator_capacities(&self) -> [f64; MAX_GENERATORS] {
        let mut caps = [0.0; MAX_GENERATORS];
        for (slot, g) in caps.iter_mut().zip(&self.generators) {
            *slot = g.capacity_kw;
        }
        caps
    }

    /// Number of installed generator units (capacity > 0).
    pub fn installed_generators(&self) -> usize {
        self.generators.iter().filter(|g| g.capacity_kw > 0.0).count()
    }

    /// Checks every invariant and returns all violations.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        non_negative(&mut errors, "pv.capacity_kwp", self.pv.capacity_kwp);
        non_negative(
            &mut errors,
            "pv.specific_yield_kwh_per_kwp",
            self.pv.specific_yield_kwh_per_kwp,
        );
        non_negative(&mut errors, "pv.overdimension_ratio", self.pv.overdimension_ratio);

        let b = &self.battery;
        non_negative(&mut errors, "battery.power_capacity_kw", b.power_capacity_kw);
        non_negative(&mut errors, "battery.energy_capacity_kwh", b.energy_capacity_kwh);
        if !(b.efficiency > 0.0 && b.efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "battery.efficiency",
                format!("must be in (0, 1], got {}", b.efficiency),
            ));
        }
        fraction(&mut errors, "battery.min_soc", b.min_soc);

        if self.generators.len() > MAX_GENERATORS {
            errors.push(ConfigError::new(
                "generators",
                format!(
                    "at most {MAX_GENERATORS} generators supported, got {}",
                    self.generators.len()
                ),
            ));
        }
        for (k, g) in self.generators.iter().enumerate() {
            non_negative(&mut errors, &format!("generators[{k}].capacity_kw"), g.capacity_kw);
            fraction(&mut errors, &format!("generators[{k}].soc_trigger"), g.soc_trigger);
        }

        non_negative(&mut errors, "grid.supply_capacity_kw", self.grid.supply_capacity_kw);
        non_negative(&mut errors, "grid.feedin_capacity_kw", self.grid.feedin_capacity_kw);
        fraction(&mut errors, "grid_charge_trigger", self.grid_charge_trigger);
        non_negative(
            &mut errors,
            "fuel_consumption_l_per_h",
            self.fuel_consumption_l_per_h,
        );

        errors
    }
}

fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        errors.push(ConfigError::new(
            field,
            format!("must be a finite value >= 0, got {value}"),
        ));
    }
}

fn fraction(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ConfigError::new(
            field,
            format!("must be in [0, 1], got {value}"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_assets_are_valid() {
        let errors = AssetConfig::default().validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn negative_capacity_is_reported_with_path() {
        let mut a = AssetConfig::default();
        a.grid.supply_capacity_kw = -1.0;
        let errors = a.validate();
        assert!(errors.iter().any(|e| e.field == "grid.supply_capacity_kw"));
    }

    #[test]
    fn zero_efficiency_is_rejected() {
        let mut a = AssetConfig::default();
        a.battery.efficiency = 0.0;
        assert!(a.validate().iter().any(|e| e.field == "battery.efficiency"));
    }

    #[test]
    fn unit_efficiency_is_accepted() {
        let mut a = AssetConfig::default();
        a.battery.efficiency = 1.0;
        assert!(a.validate().is_empty());
    }

    #[test]
    fn four_generators_are_rejected() {
        let mut a = AssetConfig::default();
        a.generators = vec![GeneratorSpec::default(); 4];
        assert!(a.validate().iter().any(|e| e.field == "generators"));
    }

    #[test]
    fn generator_trigger_out_of_range_names_slot() {
        let mut a = AssetConfig::default();
        a.generators = vec![GeneratorSpec::default(), GeneratorSpec {
            capacity_kw: 50.0,
            soc_trigger: 1.5,
        }];
        assert!(a.validate().iter().any(|e| e.field == "generators[1].soc_trigger"));
    }

    #[test]
    fn nan_values_are_rejected() {
        let mut a = AssetConfig::default();
        a.pv.capacity_kwp = f64::NAN;
        a.grid_charge_trigger = f64::NAN;
        let errors = a.validate();
        assert!(errors.iter().any(|e| e.field == "pv.capacity_kwp"));
        assert!(errors.iter().any(|e| e.field == "grid_charge_trigger"));
    }

    #[test]
    fn capacities_are_padded_to_three_slots() {
        let mut a = AssetConfig::default();
        a.generators = vec![
            GeneratorSpec {
                capacity_kw: 80.0,
                soc_trigger: 0.3,
            },
            GeneratorSpec {
                capacity_kw: 0.0,
                soc_trigger: 0.3,
            },
        ];
        assert_eq!(a.generator_capacities(), [80.0, 0.0, 0.0]);
        assert_eq!(a.installed_generators(), 1);
    }
}
