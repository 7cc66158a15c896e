use crate::devices::types::{Device, DeviceContext};
use crate::sim::assets::BatterySpec;
use crate::sim::limits::clamp;

/// Stationary battery with a symmetric one-way efficiency.
///
/// `Battery` holds the state of charge in kWh. A step turns a requested
/// flow into the flow the SOC window actually allows; the SOC clamp is what
/// enforces the physical limits at full and at the minimum reserve.
///
/// # Power Flow Convention (internal)
/// - Positive power: Charging (energy into storage)
/// - Negative power: Discharging (energy out of storage)
#[derive(Debug, Clone)]
pub struct Battery {
    /// Energy capacity in kilowatt-hours.
    pub capacity_kwh: f64,

    /// Stored energy in kilowatt-hours.
    pub soc_kwh: f64,

    /// Lowest allowed stored energy in kilowatt-hours.
    pub min_soc_kwh: f64,

    /// Maximum charge / discharge power in kilowatts.
    pub max_power_kw: f64,

    /// One-way efficiency (0..1.0].
    pub efficiency: f64,

    /// Samples per hour.
    steps_per_hour: f64,
}

impl Battery {
    /// Creates a full battery from its specification.
    ///
    /// # Arguments
    ///
    /// * `spec` - Validated battery parameters
    /// * `steps_per_hour` - Time resolution of the run
    pub fn new(spec: &BatterySpec, steps_per_hour: f64) -> Self {
        Self {
            capacity_kwh: spec.energy_capacity_kwh,
            soc_kwh: spec.energy_capacity_kwh,
            min_soc_kwh: spec.min_soc * spec.energy_capacity_kwh,
            max_power_kw: spec.power_capacity_kw,
            efficiency: spec.efficiency,
            steps_per_hour,
        }
    }

    /// Returns `true` when the battery holds its full capacity.
    pub fn is_full(&self) -> bool {
        self.soc_kwh >= self.capacity_kwh
    }

    /// Flow the battery would like to take given a signed power balance.
    ///
    /// A surplus (negative balance) is charged scaled down by the efficiency;
    /// a deficit is discharged scaled up, since storage has to release more
    /// than the site receives. The result is limited to the power rating.
    pub fn requested_flow_kw(&self, power_balance_kw: f64) -> f64 {
        let wanted = -power_balance_kw;
        let flow = wanted.max(0.0) * self.efficiency + wanted.min(0.0) / self.efficiency;
        clamp(flow, -self.max_power_kw, self.max_power_kw)
    }

    /// Conversion loss associated with an achieved flow.
    ///
    /// Positive while discharging, negative while charging; adding
    /// `flow + loss` to the power balance gives the power seen by the site.
    pub fn loss_kw(&self, flow_kw: f64) -> f64 {
        if flow_kw < 0.0 {
            -flow_kw * (1.0 - self.efficiency)
        } else {
            -flow_kw * (1.0 - 1.0 / self.efficiency)
        }
    }

    /// Power drawn from the site while charging, or delivered while
    /// discharging, for an achieved flow.
    pub fn terminal_kw(&self, flow_kw: f64) -> f64 {
        flow_kw + self.loss_kw(flow_kw)
    }
}

impl Device for Battery {
    /// Applies a requested flow and returns the flow actually achieved.
    ///
    /// The SOC moves by `setpoint / steps_per_hour` and is clamped to
    /// `[min_soc_kwh, capacity_kwh]`; the achieved flow is recovered from the
    /// SOC difference.
    fn power_kw(&mut self, context: &DeviceContext) -> f64 {
        let setpoint_kw = context.setpoint_kw.unwrap_or(0.0);
        let soc_new = clamp(
            self.soc_kwh + setpoint_kw / self.steps_per_hour,
            self.min_soc_kwh,
            self.capacity_kwh,
        );
        let actual_kw = (soc_new - self.soc_kwh) * self.steps_per_hour;
        self.soc_kwh = soc_new;
        actual_kw
    }

    fn device_type(&self) -> &'static str {
        "Battery"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(power: f64, energy: f64, efficiency: f64, min_soc: f64) -> BatterySpec {
        BatterySpec {
            power_capacity_kw: power,
            energy_capacity_kwh: energy,
            efficiency,
            min_soc,
        }
    }

    fn step(battery: &mut Battery, balance_kw: f64) -> f64 {
        let requested = battery.requested_flow_kw(balance_kw);
        battery.power_kw(&DeviceContext::with_setpoint(0, requested))
    }

    #[test]
    fn test_new_battery_starts_full() {
        let battery = Battery::new(&spec(50.0, 100.0, 0.9, 0.2), 4.0);
        assert_eq!(battery.soc_kwh, 100.0);
        assert_eq!(battery.min_soc_kwh, 20.0);
        assert!(battery.is_full());
        assert_eq!(battery.device_type(), "Battery");
    }

    #[test]
    fn test_requested_flow_scales_by_efficiency() {
        let battery = Battery::new(&spec(1000.0, 100.0, 0.8, 0.0), 4.0);
        // Surplus of 10 kW charges 8 kW into storage.
        assert!((battery.requested_flow_kw(-10.0) - 8.0).abs() < 1e-12);
        // Deficit of 8 kW draws 10 kW out of storage.
        assert!((battery.requested_flow_kw(8.0) + 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_requested_flow_power_limit() {
        let battery = Battery::new(&spec(5.0, 100.0, 1.0, 0.0), 4.0);
        assert_eq!(battery.requested_flow_kw(-20.0), 5.0);
        assert_eq!(battery.requested_flow_kw(20.0), -5.0);
    }

    #[test]
    fn test_full_battery_cannot_charge() {
        let mut battery = Battery::new(&spec(50.0, 100.0, 0.9, 0.0), 4.0);
        let actual = step(&mut battery, -30.0);
        assert_eq!(actual, 0.0);
        assert_eq!(battery.soc_kwh, 100.0);
    }

    #[test]
    fn test_discharge_stops_at_min_soc() {
        // 100 kWh, floor at 90 kWh, 1 h steps: at most 10 kW can come out.
        let mut battery = Battery::new(&spec(50.0, 100.0, 1.0, 0.9), 1.0);
        let actual = step(&mut battery, 40.0);
        assert!((actual + 10.0).abs() < 1e-9);
        assert!((battery.soc_kwh - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_hour_soc_update() {
        let mut battery = Battery::new(&spec(100.0, 100.0, 1.0, 0.0), 4.0);
        let actual = step(&mut battery, 40.0);
        assert!((actual + 40.0).abs() < 1e-9);
        // 40 kW for 15 minutes = 10 kWh.
        assert!((battery.soc_kwh - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_loss_signs() {
        let battery = Battery::new(&spec(100.0, 100.0, 0.9, 0.0), 4.0);
        assert!(battery.loss_kw(-9.0) > 0.0);
        assert!(battery.loss_kw(9.0) < 0.0);
        assert_eq!(battery.loss_kw(0.0), 0.0);
    }

    #[test]
    fn test_terminal_power_closes_balance() {
        let mut battery = Battery::new(&spec(100.0, 100.0, 0.9, 0.0), 4.0);

        // Discharge: delivered power equals the deficit.
        let actual = step(&mut battery, 9.0);
        assert!((9.0 + battery.terminal_kw(actual)).abs() < 1e-9);

        // Charge: power drawn equals the surplus.
        let actual = step(&mut battery, -4.5);
        assert!((-4.5 + battery.terminal_kw(actual)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_capacity_battery_is_inert() {
        let mut battery = Battery::new(&spec(0.0, 0.0, 0.9, 0.0), 4.0);
        assert_eq!(step(&mut battery, 100.0), 0.0);
        assert_eq!(step(&mut battery, -100.0), 0.0);
        assert_eq!(battery.soc_kwh, 0.0);
    }
}
