//! Classification of raw readings into ordered, human-readable bands
//!
//! Each classifier is a table of `(upper_bound, band)` pairs with strictly
//! increasing bounds followed by a catch-all band. A value equal to a bound
//! belongs to that (lower) band.

use crate::{Result, WetterError};
use std::fmt;

/// Temperature comfort level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemperatureBand {
    Freezing,
    Cold,
    Comfortable,
    Warm,
    Hot,
}

/// Battery urgency level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BatteryBand {
    Critical,
    Low,
    Nominal,
    Full,
}

/// Greeting by time of day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GreetingBand {
    Morning,
    Day,
    Evening,
}

const TEMPERATURE_BANDS: &[(f64, TemperatureBand)] = &[
    (6.0, TemperatureBand::Freezing),
    (13.0, TemperatureBand::Cold),
    (20.0, TemperatureBand::Comfortable),
    (27.0, TemperatureBand::Warm),
];

const BATTERY_BANDS: &[(f64, BatteryBand)] = &[
    (25.0, BatteryBand::Critical),
    (50.0, BatteryBand::Low),
    (75.0, BatteryBand::Nominal),
];

const GREETING_BANDS: &[(u32, GreetingBand)] = &[(9, GreetingBand::Morning), (17, GreetingBand::Day)];

/// Pick the first band whose upper bound is >= `value`, else `rest`
fn pick<T: PartialOrd + Copy, B: Copy>(value: T, bands: &[(T, B)], rest: B) -> B {
    bands
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, band)| *band)
        .unwrap_or(rest)
}

fn require_finite(value: f64, what: &str) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(WetterError::ClassificationDomainError(format!(
            "{} must be a finite number, got {}",
            what, value
        )))
    }
}

pub fn classify_temperature(value: f64) -> Result<TemperatureBand> {
    let value = require_finite(value, "temperature")?;
    Ok(pick(value, TEMPERATURE_BANDS, TemperatureBand::Hot))
}

pub fn classify_battery(value: f64) -> Result<BatteryBand> {
    let value = require_finite(value, "battery level")?;
    if value < 0.0 {
        return Err(WetterError::ClassificationDomainError(format!(
            "battery level must not be negative, got {}",
            value
        )));
    }
    Ok(pick(value, BATTERY_BANDS, BatteryBand::Full))
}

pub fn classify_greeting(hour: u32) -> Result<GreetingBand> {
    if hour > 23 {
        return Err(WetterError::ClassificationDomainError(format!(
            "hour must be within 0..=23, got {}",
            hour
        )));
    }
    Ok(pick(hour, GREETING_BANDS, GreetingBand::Evening))
}

impl TemperatureBand {
    pub fn label(&self) -> &'static str {
        match self {
            TemperatureBand::Freezing => "freezing",
            TemperatureBand::Cold => "cold",
            TemperatureBand::Comfortable => "comfortable",
            TemperatureBand::Warm => "warm",
            TemperatureBand::Hot => "hot",
        }
    }
}

impl BatteryBand {
    pub fn label(&self) -> &'static str {
        match self {
            BatteryBand::Critical => "critical",
            BatteryBand::Low => "low",
            BatteryBand::Nominal => "nominal",
            BatteryBand::Full => "full",
        }
    }
}

impl GreetingBand {
    pub fn label(&self) -> &'static str {
        match self {
            GreetingBand::Morning => "morning",
            GreetingBand::Day => "day",
            GreetingBand::Evening => "evening",
        }
    }
}

impl fmt::Display for TemperatureBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for BatteryBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for GreetingBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
