//! Shared test doubles

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use wetterfrosch::sensor::{DeviceName, FetchError, FetchResult, Metric, SensorSource};

/// In-process sensor source with scripted results and an optional delay
pub struct StubSource {
    results: HashMap<Metric, FetchResult>,
    delay: Duration,
    calls: Mutex<Vec<Metric>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, metric: Metric, result: FetchResult) -> Self {
        self.results.insert(metric, result);
        self
    }

    pub fn with_value(self, metric: Metric, value: f64) -> Self {
        self.with(metric, FetchResult::Ok(value))
    }

    pub fn with_network_failure(self, metric: Metric) -> Self {
        self.with(
            metric,
            FetchResult::Failed(FetchError::Network("connection refused".to_string())),
        )
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Metric> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SensorSource for StubSource {
    async fn fetch(&self, metric: Metric, _device: &DeviceName) -> FetchResult {
        self.calls.lock().push(metric);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.results
            .get(&metric)
            .cloned()
            .unwrap_or_else(|| FetchResult::Failed(FetchError::Decode("no scripted value".to_string())))
    }
}

pub fn device() -> DeviceName {
    DeviceName::new("Arduino").unwrap()
}
