//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sim::assets::{AssetConfig, BatterySpec, GeneratorSpec, GridMode, GridSpec, PvSpec};
use crate::sim::costs::Tariffs;
use crate::sim::error::ConfigError;
use crate::sim::types::SimConfig;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Fuel burn while any generator runs (L/h).
    pub fuel_consumption_l_per_h: f64,
    /// Time resolution and run guards.
    pub simulation: SimConfig,
    pub pv: PvSpec,
    pub battery: BatterySpec,
    /// Generators in priority order, at most three.
    pub generators: Vec<GeneratorSpec>,
    pub grid: GridConfig,
    pub tariffs: Tariffs,
    pub profile: ProfileConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Grid connection and grid-charging policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum import (kW).
    pub supply_capacity_kw: f64,
    /// Maximum export (kW).
    pub feedin_capacity_kw: f64,
    /// SOC fraction below which the grid charges the battery (0 = never).
    pub charge_trigger: f64,
    /// `"triggered"` or `"always_charge"`.
    pub mode: GridMode,
}

impl Default for GridConfig {
    fn default() -> Self {
        let spec = GridSpec::default();
        Self {
            supply_capacity_kw: spec.supply_capacity_kw,
            feedin_capacity_kw: spec.feedin_capacity_kw,
            charge_trigger: 0.0,
            mode: GridMode::Triggered,
        }
    }
}

/// Where the consumption / PV profile comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// CSV profile; a synthetic profile is generated when absent.
    pub csv: Option<PathBuf>,
    /// Length of the synthetic profile (days).
    pub days: usize,
    /// Rescale consumption to this many MWh per year.
    pub annual_consumption_mwh: Option<f64>,
    /// Seed for the synthetic profile.
    pub seed: u64,
    /// Synthetic base load mean (kW).
    pub base_load_kw: f64,
    /// Synthetic base load daily amplitude (kW).
    pub load_amplitude_kw: f64,
    /// Phase of the daily load sinusoid (radians).
    pub load_phase_rad: f64,
    /// Gaussian noise on the load (kW).
    pub load_noise_std: f64,
    /// Hour of day the synthetic PV starts producing.
    pub sunrise_hour: f64,
    /// Hour of day the synthetic PV stops producing.
    pub sunset_hour: f64,
    /// Relative Gaussian noise on the PV shape.
    pub pv_noise_std: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            csv: None,
            days: 7,
            annual_consumption_mwh: None,
            seed: 42,
            base_load_kw: 150.0,
            load_amplitude_kw: 60.0,
            load_phase_rad: -1.6,
            load_noise_std: 5.0,
            sunrise_hour: 6.0,
            sunset_hour: 20.0,
            pv_noise_std: 0.05,
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: grid, PV, battery and one generator.
    pub fn baseline() -> Self {
        Self {
            fuel_consumption_l_per_h: 25.0,
            simulation: SimConfig::default(),
            pv: PvSpec::default(),
            battery: BatterySpec::default(),
            generators: vec![GeneratorSpec::default()],
            grid: GridConfig::default(),
            tariffs: Tariffs::default(),
            profile: ProfileConfig::default(),
        }
    }

    /// Returns the off-grid preset: no grid connection, three generators.
    pub fn off_grid() -> Self {
        Self {
            pv: PvSpec {
                capacity_kwp: 800.0,
                ..PvSpec::default()
            },
            battery: BatterySpec {
                power_capacity_kw: 300.0,
                energy_capacity_kwh: 1200.0,
                ..BatterySpec::default()
            },
            generators: vec![
                GeneratorSpec {
                    capacity_kw: 150.0,
                    soc_trigger: 0.3,
                },
                GeneratorSpec {
                    capacity_kw: 100.0,
                    soc_trigger: 0.2,
                },
                GeneratorSpec {
                    capacity_kw: 100.0,
                    soc_trigger: 0.15,
                },
            ],
            grid: GridConfig {
                supply_capacity_kw: 0.0,
                feedin_capacity_kw: 0.0,
                ..GridConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the grid-only preset: the site draws everything from the grid.
    pub fn grid_only() -> Self {
        Self {
            pv: PvSpec {
                capacity_kwp: 0.0,
                ..PvSpec::default()
            },
            battery: BatterySpec {
                power_capacity_kw: 0.0,
                energy_capacity_kwh: 0.0,
                ..BatterySpec::default()
            },
            generators: Vec::new(),
            grid: GridConfig {
                supply_capacity_kw: 500.0,
                feedin_capacity_kw: 0.0,
                ..GridConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "off_grid", "grid_only"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "off_grid" => Ok(Self::off_grid()),
            "grid_only" => Ok(Self::grid_only()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Asset configuration for the dispatch.
    pub fn assets(&self) -> AssetConfig {
        AssetConfig {
            pv: self.pv,
            battery: self.battery,
            generators: self.generators.clone(),
            grid: GridSpec {
                supply_capacity_kw: self.grid.supply_capacity_kw,
                feedin_capacity_kw: self.grid.feedin_capacity_kw,
            },
            grid_charge_trigger: self.grid.charge_trigger,
            fuel_consumption_l_per_h: self.fuel_consumption_l_per_h,
            grid_mode: self.grid.mode,
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Asset paths are
    /// reported the way they appear in the TOML file.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.simulation.validate();

        errors.extend(self.assets().validate().into_iter().map(|mut e| {
            if e.field == "grid_charge_trigger" {
                e.field = "grid.charge_trigger".to_string();
            }
            e
        }));
        errors.extend(self.tariffs.validate());

        let p = &self.profile;
        if p.csv.is_none() {
            if p.days == 0 {
                errors.push(ConfigError::new("profile.days", "must be > 0"));
            }
            if let Some(spd) = self.simulation.steps_per_day() {
                let max = self.simulation.max_steps;
                match p.days.checked_mul(spd) {
                    Some(steps) if steps <= max => {}
                    _ => errors.push(ConfigError::new(
                        "profile.days",
                        format!(
                            "{} days of {spd} steps exceed simulation.max_steps = {max}",
                            p.days
                        ),
                    )),
                }
            }
        }
        if p.csv.as_deref().is_some_and(|c| c.as_os_str().is_empty()) {
            errors.push(ConfigError::new("profile.csv", "must not be empty"));
        }
        if let Some(mwh) = p.annual_consumption_mwh {
            if !mwh.is_finite() || mwh < 0.0 {
                errors.push(ConfigError::new(
                    "profile.annual_consumption_mwh",
                    format!("must be a finite value >= 0, got {mwh}"),
                ));
            }
        }
        for (field, v) in [
            ("profile.base_load_kw", p.base_load_kw),
            ("profile.load_amplitude_kw", p.load_amplitude_kw),
            ("profile.load_noise_std", p.load_noise_std),
            ("profile.pv_noise_std", p.pv_noise_std),
        ] {
            if !v.is_finite() || v < 0.0 {
                errors.push(ConfigError::new(
                    field,
                    format!("must be a finite value >= 0, got {v}"),
                ));
            }
        }
        if !p.load_phase_rad.is_finite() {
            errors.push(ConfigError::new("profile.load_phase_rad", "must be finite"));
        }
        if !(0.0..=24.0).contains(&p.sunset_hour) {
            errors.push(ConfigError::new(
                "profile.sunset_hour",
                format!("must be in [0, 24], got {}", p.sunset_hour),
            ));
        }
        if !(p.sunrise_hour >= 0.0 && p.sunrise_hour < p.sunset_hour) {
            errors.push(ConfigError::new(
                "profile.sunrise_hour",
                "must be >= 0 and < profile.sunset_hour",
            ));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert_eq!(e.field, "preset");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn off_grid_has_no_grid_and_three_generators() {
        let cfg = ScenarioConfig::off_grid();
        assert_eq!(cfg.grid.supply_capacity_kw, 0.0);
        assert_eq!(cfg.assets().installed_generators(), 3);
    }

    #[test]
    fn grid_only_has_no_local_assets() {
        let a = ScenarioConfig::grid_only().assets();
        assert_eq!(a.pv.capacity_kwp, 0.0);
        assert_eq!(a.battery.energy_capacity_kwh, 0.0);
        assert!(a.generators.is_empty());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
fuel_consumption_l_per_h = 30.0

[simulation]
steps_per_hour = 1.0

[pv]
capacity_kwp = 750.0
specific_yield_kwh_per_kwp = 1100.0

[battery]
power_capacity_kw = 400.0
energy_capacity_kwh = 800.0
efficiency = 0.92
min_soc = 0.05

[[generators]]
capacity_kw = 120.0
soc_trigger = 0.25

[[generators]]
capacity_kw = 80.0
soc_trigger = 0.1

[grid]
supply_capacity_kw = 250.0
feedin_capacity_kw = 0.0
charge_trigger = 0.4
mode = "always_charge"

[tariffs]
fuel_price_per_l = 1.8

[profile]
days = 3
annual_consumption_mwh = 950.0
seed = 7
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap_or_default();
        assert_eq!(cfg.simulation.steps_per_hour, 1.0);
        assert_eq!(cfg.generators.len(), 2);
        assert_eq!(cfg.generators[1].soc_trigger, 0.1);
        assert_eq!(cfg.grid.mode, GridMode::AlwaysCharge);
        assert_eq!(cfg.profile.annual_consumption_mwh, Some(950.0));
        assert_eq!(cfg.tariffs.fuel_price_per_l, 1.8);
        // Untouched tariff kept default.
        assert_eq!(cfg.tariffs.capacity_cost_per_kw_month, 3.0);

        let a = cfg.assets();
        assert_eq!(a.fuel_consumption_l_per_h, 30.0);
        assert_eq!(a.grid_charge_trigger, 0.4);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn profile_csv_path_parses() {
        let cfg = ScenarioConfig::from_toml_str("[profile]\ncsv = \"data/site.csv\"\n");
        assert_eq!(
            cfg.ok().and_then(|c| c.profile.csv),
            Some(PathBuf::from("data/site.csv"))
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[battery]
energy_capacity_kwh = 100.0
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
        assert_eq!(result.err().map(|e| e.field), Some("toml".to_string()));
    }

    #[test]
    fn unknown_grid_mode_is_rejected() {
        let result = ScenarioConfig::from_toml_str("[grid]\nmode = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = ScenarioConfig::from_toml_str("[pv]\ncapacity_kwp = 10.0\n");
        assert!(cfg.is_ok());
        let cfg = cfg.unwrap_or_default();
        assert_eq!(cfg.pv.capacity_kwp, 10.0);
        assert_eq!(cfg.pv.specific_yield_kwh_per_kwp, 950.0);
        assert_eq!(cfg.generators.len(), 1);
        assert_eq!(cfg.simulation, SimConfig::default());
    }

    #[test]
    fn validation_reports_every_error() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.efficiency = 0.0;
        cfg.grid.charge_trigger = 2.0;
        cfg.tariffs.grid_energy_price_per_mwh = f64::NAN;
        cfg.profile.days = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        for expected in [
            "battery.efficiency",
            "grid.charge_trigger",
            "tariffs.grid_energy_price_per_mwh",
            "profile.days",
        ] {
            assert!(fields.iter().any(|f| f == expected), "missing {expected}: {fields:?}");
        }
    }

    #[test]
    fn synthetic_days_are_bounded_by_max_steps() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.max_steps = 96 * 7;
        assert!(cfg.validate().is_empty());

        cfg.profile.days = 8;
        assert!(cfg.validate().iter().any(|e| e.field == "profile.days"));

        // Overflowing the step count is an error, not a wrap.
        cfg.profile.days = usize::MAX;
        assert!(cfg.validate().iter().any(|e| e.field == "profile.days"));

        // A CSV profile is bounded when it is loaded instead.
        cfg.profile.csv = Some(PathBuf::from("site.csv"));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn validation_catches_inverted_daylight() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.profile.sunrise_hour = 21.0;
        assert!(
            cfg.validate()
                .iter()
                .any(|e| e.field == "profile.sunrise_hour")
        );
    }

    #[test]
    fn validation_catches_too_many_generators() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.generators = vec![GeneratorSpec::default(); 4];
        assert!(cfg.validate().iter().any(|e| e.field == "generators"));
    }

    #[test]
    fn scenario_round_trips_through_toml() {
        let cfg = ScenarioConfig::off_grid();
        let text = toml::to_string(&cfg);
        assert!(text.is_ok(), "serialize failed: {:?}", text.err());
        let back = ScenarioConfig::from_toml_str(&text.unwrap_or_default());
        assert_eq!(back.ok(), Some(cfg));
    }
}
