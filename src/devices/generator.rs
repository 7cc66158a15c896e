//! Backup generator fleet with SOC-driven hysteresis.

use crate::sim::assets::GeneratorSpec;
use crate::sim::types::MAX_GENERATORS;

use super::battery::Battery;

/// Up to [`MAX_GENERATORS`] units committed in list order.
///
/// The activation vector persists between steps: a running unit stays on
/// until the battery is full again.
#[derive(Debug, Clone)]
pub struct GeneratorBank {
    capacity_kw: [f64; MAX_GENERATORS],
    soc_trigger: [f64; MAX_GENERATORS],
    active: [bool; MAX_GENERATORS],
}

impl GeneratorBank {
    /// Creates a bank with every unit off. Missing slots get zero capacity.
    pub fn new(units: &[GeneratorSpec]) -> Self {
        let mut capacity_kw = [0.0; MAX_GENERATORS];
        let mut soc_trigger = [0.0; MAX_GENERATORS];
        for (k, unit) in units.iter().take(MAX_GENERATORS).enumerate() {
            capacity_kw[k] = unit.capacity_kw;
            soc_trigger[k] = unit.soc_trigger;
        }
        Self {
            capacity_kw,
            soc_trigger,
            active: [false; MAX_GENERATORS],
        }
    }

    /// Current activation state, in priority order.
    pub fn active(&self) -> [bool; MAX_GENERATORS] {
        self.active
    }

    /// Decides which units run this step and returns their combined output
    /// in kW (negative, i.e. supply).
    ///
    /// Units are evaluated in priority order against the balance left after
    /// the capacity of units already switched on. A unit with capacity runs
    /// when any of these hold:
    /// - the residual exceeds what the battery can deliver,
    /// - the SOC is under this unit's trigger,
    /// - it was already running and the battery is not full yet.
    pub fn commit(&mut self, power_balance_kw: f64, battery: &Battery) -> f64 {
        let battery_reach_kw = battery.max_power_kw * battery.efficiency;
        let mut residual_kw = power_balance_kw;

        for k in 0..MAX_GENERATORS {
            let capacity = self.capacity_kw[k];
            let on = capacity > 0.0
                && (residual_kw >= battery_reach_kw
                    || battery.soc_kwh < self.soc_trigger[k] * battery.capacity_kwh
                    || (!battery.is_full() && self.active[k]));
            self.active[k] = on;
            if on {
                residual_kw -= capacity;
            }
        }

        -self
            .capacity_kw
            .iter()
            .zip(&self.active)
            .filter(|(_, on)| **on)
            .map(|(capacity, _)| capacity)
            .sum::<f64>()
    }
}
