//! Time-varying emission profiles for line sources
//!
//! An emission profile maps simulation time (hours) to an instantaneous
//! source strength. Profiles must be pure: the model evaluates each one once
//! per step, possibly from several threads at once.

use crate::error::EmissionError;
use std::fmt;

/// Hours in one simulated day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Source strength as a function of simulation time
pub trait EmissionProfile: Send + Sync {
    /// Emission rate at `time` (hours since simulation start)
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot produce a rate for `time`.
    fn rate_at(&self, time: f64) -> Result<f64, EmissionError>;

    /// Short human-readable description used in logs and source listings
    fn describe(&self) -> String;
}

/// Hour of the day in `[0, 24)`, wrapping negative times forward
#[inline]
fn hour_of_day(time: f64) -> f64 {
    time.rem_euclid(HOURS_PER_DAY)
}

/// Constant emission rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantRate(pub f64);

impl EmissionProfile for ConstantRate {
    fn rate_at(&self, _time: f64) -> Result<f64, EmissionError> {
        Ok(self.0)
    }

    fn describe(&self) -> String {
        format!("constant {}", self.0)
    }
}

/// Traffic profile with morning and evening rush hours
///
/// Rates by hour of day:
/// - `[7, 9)` and `[16, 18)`: `peak`
/// - `[0, 5)`: `night`
/// - otherwise: `base`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RushHourProfile {
    pub peak: f64,
    pub night: f64,
    pub base: f64,
}

impl Default for RushHourProfile {
    fn default() -> Self {
        Self {
            peak: 5.0,
            night: 0.5,
            base: 1.0,
        }
    }
}

impl EmissionProfile for RushHourProfile {
    fn rate_at(&self, time: f64) -> Result<f64, EmissionError> {
        let hour = hour_of_day(time);
        let rate = if (7.0..9.0).contains(&hour) || (16.0..18.0).contains(&hour) {
            self.peak
        } else if hour < 5.0 {
            self.night
        } else {
            self.base
        };
        Ok(rate)
    }

    fn describe(&self) -> String {
        format!(
            "rush hour (peak {}, night {}, base {})",
            self.peak, self.night, self.base
        )
    }
}

/// One rate per hour of the day, indexed by `floor(time mod 24)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyTable(pub [f64; 24]);

impl HourlyTable {
    /// Build a table from a slice holding exactly 24 rates
    ///
    /// # Errors
    ///
    /// Returns an error if `rates` does not hold 24 values.
    pub fn from_slice(rates: &[f64]) -> Result<Self, EmissionError> {
        let table: [f64; 24] = rates.try_into().map_err(|_| {
            EmissionError::new(format!(
                "hourly table needs 24 rates, got {}",
                rates.len()
            ))
        })?;
        Ok(Self(table))
    }
}

impl EmissionProfile for HourlyTable {
    fn rate_at(&self, time: f64) -> Result<f64, EmissionError> {
        // min() guards against rem_euclid rounding up to exactly 24.0
        let slot = (hour_of_day(time).floor() as usize).min(23);
        Ok(self.0[slot])
    }

    fn describe(&self) -> String {
        "hourly table".to_string()
    }
}

/// Arbitrary user-supplied profile
pub struct FnProfile<F> {
    label: String,
    func: F,
}

impl<F> FnProfile<F>
where
    F: Fn(f64) -> Result<f64, EmissionError> + Send + Sync,
{
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnProfile<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProfile")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> EmissionProfile for FnProfile<F>
where
    F: Fn(f64) -> Result<f64, EmissionError> + Send + Sync,
{
    fn rate_at(&self, time: f64) -> Result<f64, EmissionError> {
        (self.func)(time)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
