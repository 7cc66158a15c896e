use rand::{SeedableRng, rngs::StdRng};

use crate::devices::types::{Device, DeviceContext, gaussian_noise};
use crate::sim::assets::PvSpec;
use crate::sim::limits::clamp_series;

/// Annual yield (kWh/kWp) the normalised per-MWp production series is
/// expressed against.
pub const PV_REFERENCE_YIELD_KWH_PER_KWP: f64 = 947.55;

/// Solar plant that scales a normalised production series to its own size.
///
/// # Power Flow Convention
/// Production is returned **negative** (supply into the site).
#[derive(Debug, Clone)]
pub struct PvPlant {
    capacity_kwp: f64,
    specific_yield: f64,
}

impl PvPlant {
    pub fn new(spec: &PvSpec) -> Self {
        Self {
            capacity_kwp: spec.capacity_kwp,
            specific_yield: spec.specific_yield_kwh_per_kwp,
        }
    }

    /// Upper bound on output magnitude: `capacity × yield`.
    pub fn output_limit_kw(&self) -> f64 {
        self.capacity_kwp * self.specific_yield
    }

    /// Converts per-sample production (kWh/MWp) to plant power in kW.
    pub fn power_series(&self, kwh_per_mwp: &[f64], steps_per_hour: f64) -> Vec<f64> {
        let raw: Vec<f64> = kwh_per_mwp
            .iter()
            .map(|e| {
                -e * self.capacity_kwp * self.specific_yield / PV_REFERENCE_YIELD_KWH_PER_KWP
                    * steps_per_hour
            })
            .collect();
        clamp_series(&raw, -self.output_limit_kw(), 0.0)
    }
}

/// Half-sine clear-sky shape between sunrise and sunset, in [0, 1].
pub fn daylight_frac(t: usize, steps_per_day: usize, sunrise_idx: usize, sunset_idx: usize) -> f64 {
    let tod = t % steps_per_day.max(1);
    if tod < sunrise_idx || tod >= sunset_idx {
        return 0.0;
    }
    let span = (sunset_idx - sunrise_idx) as f64;
    let x = (tod - sunrise_idx) as f64 + 0.5;
    (std::f64::consts::PI * x / span).sin().max(0.0)
}

/// Clear-sky PV shape with multiplicative Gaussian noise, used to build
/// synthetic profiles.
///
/// Output is **negative** between `sunrise_idx` (inclusive) and
/// `sunset_idx` (exclusive) and zero otherwise.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Output at the top of the shape (kW).
    pub kw_peak: f64,
    steps_per_day: usize,
    pub sunrise_idx: usize,
    pub sunset_idx: usize,
    /// Noise standard deviation relative to output.
    pub noise_std: f64,
    rng: StdRng,
}

impl SolarPv {
    /// Out-of-range indices are pulled into the day so the generator never
    /// panics; a window that collapses produces no output.
    pub fn new(
        kw_peak: f64,
        steps_per_day: usize,
        sunrise_idx: usize,
        sunset_idx: usize,
        noise_std: f64,
        seed: u64,
    ) -> Self {
        let steps_per_day = steps_per_day.max(1);
        let sunset_idx = sunset_idx.min(steps_per_day);
        Self {
            kw_peak: kw_peak.max(0.0),
            steps_per_day,
            sunrise_idx: sunrise_idx.min(sunset_idx),
            sunset_idx,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn daylight_frac(&self, t: usize) -> f64 {
        daylight_frac(t, self.steps_per_day, self.sunrise_idx, self.sunset_idx)
    }
}

impl Device for SolarPv {
    fn power_kw(&mut self, context: &DeviceContext) -> f64 {
        let frac = self.daylight_frac(context.timestep);
        if frac <= 0.0 {
            return 0.0;
        }

        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        let kw = self.kw_peak * frac * noise_mult;

        -(kw.max(0.0))
    }

    fn device_type(&self) -> &'static str {
        "SolarPV"
    }
}
