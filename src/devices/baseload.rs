use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::{Device, DeviceContext, gaussian_noise};

/// Site demand for synthetic profiles: a daily sinusoid around a mean
/// with optional Gaussian noise.
///
/// # Examples
///
/// ```
/// use microgrid_sim::devices::{BaseLoad, Device, DeviceContext};
///
/// // 120 kW mean, 40 kW swing, no noise, quarter-hour steps.
/// let mut load = BaseLoad::new(120.0, 40.0, 0.0, 0.0, 96, 42);
///
/// let demand = load.power_kw(&DeviceContext::new(48));
/// assert!(demand >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLoad {
    /// Mean demand (kW).
    pub base_kw: f64,
    /// Half the daily peak-to-trough swing (kW).
    pub amp_kw: f64,
    pub phase_rad: f64,
    /// Noise standard deviation (kW).
    pub noise_std: f64,
    pub steps_per_day: usize,
    rng: StdRng,
}

impl BaseLoad {
    /// `phase_rad = 0` rises through the mean at midnight. A zero
    /// `steps_per_day` is treated as one step per day.
    pub fn new(
        base_kw: f64,
        amp_kw: f64,
        phase_rad: f64,
        noise_std: f64,
        steps_per_day: usize,
        seed: u64,
    ) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            steps_per_day: steps_per_day.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Device for BaseLoad {
    /// Mean plus sinusoid plus noise, floored at zero.
    fn power_kw(&mut self, context: &DeviceContext) -> f64 {
        let day_pos =
            (context.timestep % self.steps_per_day) as f64 / self.steps_per_day as f64; // [0,1)
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);

        let kw = self.base_kw + self.amp_kw * angle.sin() + noise;
        kw.max(0.0) // no negative demand
    }

    fn device_type(&self) -> &'static str {
        "BaseLoad"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(t: usize) -> DeviceContext {
        DeviceContext::new(t)
    }

    #[test]
    fn test_flat_load_without_amplitude() {
        let mut load = BaseLoad::new(50.0, 0.0, 0.0, 0.0, 24, 1);
        for t in 0..48 {
            assert!((load.power_kw(&ctx(t)) - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sinusoid_peaks_at_quarter_day() {
        let mut load = BaseLoad::new(10.0, 5.0, 0.0, 0.0, 24, 1);
        assert!((load.power_kw(&ctx(6)) - 15.0).abs() < 1e-9);
        assert!((load.power_kw(&ctx(18)) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_demand_never_negative() {
        let mut load = BaseLoad::new(1.0, 10.0, 0.0, 2.0, 24, 3);
        for t in 0..240 {
            assert!(load.power_kw(&ctx(t)) >= 0.0);
        }
    }

    #[test]
    fn test_pattern_repeats_daily() {
        let mut load = BaseLoad::new(10.0, 5.0, 0.3, 0.0, 96, 1);
        assert_eq!(load.power_kw(&ctx(7)), load.power_kw(&ctx(7 + 96)));
    }

    #[test]
    fn test_same_seed_same_noise() {
        let mut a = BaseLoad::new(10.0, 5.0, 0.0, 1.0, 24, 9);
        let mut b = BaseLoad::new(10.0, 5.0, 0.0, 1.0, 24, 9);
        for t in 0..24 {
            assert_eq!(a.power_kw(&ctx(t)), b.power_kw(&ctx(t)));
        }
    }
}
