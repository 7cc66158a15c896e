//! Validated consumption / PV input series.

use chrono::NaiveDateTime;

use super::error::ProfileError;

/// Two aligned fixed-interval series feeding one run.
///
/// Construct with [`ProfileSeries::new`]; NaN entries of the PV series are
/// replaced by zero, all other non-finite values are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSeries {
    consumption_kwh: Vec<f64>,
    pv_kwh_per_mwp: Vec<f64>,
    timestamps: Option<Vec<NaiveDateTime>>,
}

impl ProfileSeries {
    /// Builds a profile from consumption energy per sample (kWh) and PV
    /// production normalised per MWp (kWh/MWp).
    ///
    /// # Errors
    ///
    /// Returns a [`ProfileError`] if the series are empty, differ in length,
    /// or contain non-finite values after NaN normalisation.
    pub fn new(consumption_kwh: Vec<f64>, pv_kwh_per_mwp: Vec<f64>) -> Result<Self, ProfileError> {
        if consumption_kwh.len() != pv_kwh_per_mwp.len() {
            return Err(ProfileError::LengthMismatch {
                consumption: consumption_kwh.len(),
                pv: pv_kwh_per_mwp.len(),
            });
        }
        if consumption_kwh.is_empty() {
            return Err(ProfileError::Empty);
        }

        if let Some(index) = consumption_kwh.iter().position(|v| !v.is_finite()) {
            return Err(ProfileError::NonFinite {
                series: "consumption_kwh",
                index,
            });
        }

        let pv_kwh_per_mwp: Vec<f64> = pv_kwh_per_mwp
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect();
        if let Some(index) = pv_kwh_per_mwp.iter().position(|v| !v.is_finite()) {
            return Err(ProfileError::NonFinite {
                series: "pv_kwh_per_mwp",
                index,
            });
        }

        Ok(Self {
            consumption_kwh,
            pv_kwh_per_mwp,
            timestamps: None,
        })
    }

    /// Attaches one timestamp per sample.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::TimestampMismatch`] if the count differs from
    /// the number of samples.
    pub fn with_timestamps(mut self, timestamps: Vec<NaiveDateTime>) -> Result<Self, ProfileError> {
        if timestamps.len() != self.len() {
            return Err(ProfileError::TimestampMismatch {
                len: timestamps.len(),
                steps: self.len(),
            });
        }
        self.timestamps = Some(timestamps);
        Ok(self)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.consumption_kwh.len()
    }

    /// Always `false` for a constructed profile.
    pub fn is_empty(&self) -> bool {
        self.consumption_kwh.is_empty()
    }

    pub fn consumption_kwh(&self) -> &[f64] {
        &self.consumption_kwh
    }

    pub fn pv_kwh_per_mwp(&self) -> &[f64] {
        &self.pv_kwh_per_mwp
    }

    pub fn timestamps(&self) -> Option<&[NaiveDateTime]> {
        self.timestamps.as_deref()
    }

    /// Total consumption energy (kWh).
    pub fn total_consumption_kwh(&self) -> f64 {
        self.consumption_kwh.iter().sum()
    }

    /// Rescales consumption so that it totals `annual_mwh` per year.
    ///
    /// The profile is assumed to span `samples_per_year` samples per year;
    /// shorter profiles are scaled pro rata. A profile with zero consumption
    /// is returned unchanged.
    pub fn scaled_to_annual_consumption(mut self, annual_mwh: f64, samples_per_year: f64) -> Self {
        let years = self.len() as f64 / samples_per_year;
        let current_mwh = self.total_consumption_kwh() / 1000.0;
        if current_mwh > 0.0 && years > 0.0 {
            let factor = annual_mwh * years / current_mwh;
            for v in &mut self.consumption_kwh {
                *v *= factor;
            }
        }
        self
    }
}
