//! Sensor metrics and per-fetch results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// One of the readings the remote device can report
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Temperature,
    Humidity,
    Pressure,
    BatteryLevel,
}

impl Metric {
    /// Every metric, in reply order
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Pressure,
        Metric::BatteryLevel,
    ];

    /// Path segment on the sensor API. Doubles as the JSON key of the
    /// response body and as the reply slot name.
    pub fn path(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Pressure => "pressure",
            Metric::BatteryLevel => "batteryLevel",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Why a single fetch failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, timeout, or non-success status
    #[error("network error: {0}")]
    Network(String),

    /// Body did not have the `{ "data": { "<metric>": number } }` shape
    #[error("decode error: {0}")]
    Decode(String),
}

/// Outcome of fetching one metric
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Ok(f64),
    Failed(FetchError),
}

impl FetchResult {
    pub fn value(&self) -> Option<f64> {
        match self {
            FetchResult::Ok(v) => Some(*v),
            FetchResult::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchResult::Failed(_))
    }
}

/// Settled results of one orchestrator call, keyed by metric
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Readings {
    results: BTreeMap<Metric, FetchResult>,
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: Metric, result: FetchResult) {
        self.results.insert(metric, result);
    }

    pub fn get(&self, metric: Metric) -> Option<&FetchResult> {
        self.results.get(&metric)
    }

    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.results.keys().copied()
    }

    /// Metrics whose fetch failed
    pub fn failed(&self) -> Vec<Metric> {
        self.results
            .iter()
            .filter(|(_, r)| r.is_failed())
            .map(|(m, _)| *m)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl FromIterator<(Metric, FetchResult)> for Readings {
    fn from_iter<I: IntoIterator<Item = (Metric, FetchResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
