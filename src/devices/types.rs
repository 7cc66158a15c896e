//! Device trait shared by the microgrid assets and the synthetic profile
//! generators.

use rand::{Rng, rngs::StdRng};

/// Per-call input of [`Device::power_kw`]: the sample index and, for
/// dispatchable assets, the requested flow in kW.
pub struct DeviceContext {
    pub timestep: usize,
    pub setpoint_kw: Option<f64>,
}

impl DeviceContext {
    /// Context without a setpoint, for assets that follow their own profile.
    pub fn new(timestep: usize) -> Self {
        Self {
            timestep,
            setpoint_kw: None,
        }
    }

    pub fn with_setpoint(timestep: usize, setpoint_kw: f64) -> Self {
        Self {
            timestep,
            setpoint_kw: Some(setpoint_kw),
        }
    }
}

/// An asset that produces, consumes or stores power step by step.
///
/// Each implementation documents its own sign convention.
pub trait Device {
    /// Power at `context.timestep` in kW. Stateful assets advance their
    /// state by one sample.
    fn power_kw(&mut self, context: &DeviceContext) -> f64;

    /// Short name used in logs.
    fn device_type(&self) -> &'static str;
}

/// Zero-mean Gaussian sample with standard deviation `std_dev` (Box-Muller).
///
/// A non-positive `std_dev` returns 0 without touching the RNG.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.random::<f64>();
    std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
