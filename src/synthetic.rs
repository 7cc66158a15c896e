//! Seeded typical-day profile used when no CSV profile is configured.

use tracing::debug;

use crate::config::ProfileConfig;
use crate::devices::solar::{PV_REFERENCE_YIELD_KWH_PER_KWP, daylight_frac};
use crate::devices::{BaseLoad, Device, DeviceContext, SolarPv};
use crate::sim::error::ProfileError;
use crate::sim::profile::ProfileSeries;
use crate::sim::types::SimConfig;

/// Seed offset for the PV noise so it does not mirror the load noise.
const PV_SEED_OFFSET: u64 = 1;

const DAYS_PER_YEAR: f64 = 365.0;

fn hour_to_step(hour: f64, sim: &SimConfig) -> usize {
    (hour * sim.steps_per_hour).round().max(0.0) as usize
}

/// Peak of the normalised PV shape chosen so one kWp yields the reference
/// annual energy.
fn normalised_pv_peak(steps_per_day: usize, sunrise: usize, sunset: usize, sim: &SimConfig) -> f64 {
    let shape_kwh: f64 = (0..steps_per_day)
        .map(|t| daylight_frac(t, steps_per_day, sunrise, sunset))
        .sum::<f64>()
        / sim.steps_per_hour;
    if shape_kwh > 0.0 {
        PV_REFERENCE_YIELD_KWH_PER_KWP / DAYS_PER_YEAR / shape_kwh
    } else {
        0.0
    }
}

/// Builds a `days`-long profile from a sinusoidal base load and a
/// half-sine PV shape.
///
/// Consumption is kWh per sample. PV is normalised so that a plant with
/// the reference specific yield produces that yield over a year.
///
/// # Errors
///
/// Returns [`ProfileError::Empty`] when `days` is zero, or
/// [`ProfileError::TooLong`] when the profile would exceed `sim.max_steps`.
pub fn synthetic_profile(
    profile: &ProfileConfig,
    sim: &SimConfig,
) -> Result<ProfileSeries, ProfileError> {
    let spd = sim.steps_per_day().unwrap_or(1);
    let steps = match profile.days.checked_mul(spd) {
        Some(steps) if steps <= sim.max_steps => steps,
        _ => {
            return Err(ProfileError::TooLong {
                len: profile.days.saturating_mul(spd),
                max: sim.max_steps,
            });
        }
    };
    let sunrise = hour_to_step(profile.sunrise_hour, sim);
    let sunset = hour_to_step(profile.sunset_hour, sim);

    let mut load = BaseLoad::new(
        profile.base_load_kw,
        profile.load_amplitude_kw,
        profile.load_phase_rad,
        profile.load_noise_std,
        spd,
        profile.seed,
    );
    let mut pv = SolarPv::new(
        normalised_pv_peak(spd, sunrise, sunset, sim),
        spd,
        sunrise,
        sunset,
        profile.pv_noise_std,
        profile.seed.wrapping_add(PV_SEED_OFFSET),
    );

    let mut consumption = Vec::with_capacity(steps);
    let mut pv_energy = Vec::with_capacity(steps);
    for t in 0..steps {
        let ctx = DeviceContext::new(t);
        consumption.push(load.power_kw(&ctx) / sim.steps_per_hour);
        pv_energy.push(-pv.power_kw(&ctx) / sim.steps_per_hour);
    }

    debug!(
        days = profile.days,
        steps,
        seed = profile.seed,
        load = load.device_type(),
        pv = pv.device_type(),
        "synthetic profile generated"
    );
    ProfileSeries::new(consumption, pv_energy)
}
