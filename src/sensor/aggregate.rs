//! Concurrent all-settle fetching of several metrics
//!
//! Every requested metric gets its own fetch future; they are polled together
//! on the calling task and the call returns only once each has settled.

use crate::sensor::client::{DeviceName, SensorSource};
use crate::sensor::metric::{FetchError, FetchResult, Metric, Readings};
use crate::{Result, WetterError};
use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Retry policy applied per metric
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Total attempts per metric, including the first (minimum 1)
    pub max_attempts: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

impl FetchPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Runs a set of [`SensorSource`] fetches concurrently
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn SensorSource>,
    policy: FetchPolicy,
}

impl Aggregator {
    pub fn new(source: Arc<dyn SensorSource>) -> Self {
        Self {
            source,
            policy: FetchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Fetch every metric in `metrics`, waiting for all of them to settle.
    ///
    /// The returned [`Readings`] contain exactly one entry per distinct
    /// requested metric, whatever mix of successes and failures occurred.
    /// If `cancel` fires first, pending requests are dropped and
    /// [`WetterError::TurnCancelled`] is returned.
    pub async fn fetch_all(
        &self,
        metrics: &[Metric],
        device: &DeviceName,
        cancel: &CancellationToken,
    ) -> Result<Readings> {
        let requested: BTreeSet<Metric> = metrics.iter().copied().collect();
        if requested.is_empty() {
            return Ok(Readings::new());
        }

        let start = Instant::now();
        let fetches = requested.iter().map(|&metric| async move {
            (metric, self.fetch_with_retry(metric, device).await)
        });

        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Conversation closed with {} fetches in flight", requested.len());
                return Err(WetterError::TurnCancelled(format!(
                    "cancelled while fetching {} metrics",
                    requested.len()
                )));
            }
            settled = join_all(fetches) => settled,
        };

        let readings: Readings = settled.into_iter().collect();
        info!(
            "Fetched {} metrics in {}ms ({} failed)",
            readings.len(),
            start.elapsed().as_millis(),
            readings.failed().len()
        );
        Ok(readings)
    }

    async fn fetch_with_retry(&self, metric: Metric, device: &DeviceName) -> FetchResult {
        let mut attempt = 1;
        loop {
            let result = self.source.fetch(metric, device).await;
            match &result {
                FetchResult::Failed(FetchError::Network(e)) if attempt < self.policy.max_attempts => {
                    debug!("Retrying {} after attempt {} failed: {}", metric, attempt, e);
                    attempt += 1;
                }
                _ => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Source that fails a metric a fixed number of times before succeeding
    struct FlakySource {
        failures_left: Mutex<HashMap<Metric, u32>>,
        calls: Mutex<u32>,
    }

    impl FlakySource {
        fn new(failures: &[(Metric, u32)]) -> Self {
            Self {
                failures_left: Mutex::new(failures.iter().copied().collect()),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SensorSource for FlakySource {
        async fn fetch(&self, metric: Metric, _device: &DeviceName) -> FetchResult {
            *self.calls.lock() += 1;
            let mut failures = self.failures_left.lock();
            match failures.get_mut(&metric) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    FetchResult::Failed(FetchError::Network("connection reset".into()))
                }
                _ => FetchResult::Ok(1.0),
            }
        }
    }

    /// Source whose every response body is malformed
    #[derive(Default)]
    struct MalformedSource {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl SensorSource for MalformedSource {
        async fn fetch(&self, _metric: Metric, _device: &DeviceName) -> FetchResult {
            *self.calls.lock() += 1;
            FetchResult::Failed(FetchError::Decode("missing numeric field".into()))
        }
    }

    fn device() -> DeviceName {
        DeviceName::new("Arduino").unwrap()
    }

    #[tokio::test]
    async fn test_empty_request_issues_no_fetches() {
        let source = Arc::new(FlakySource::new(&[]));
        let aggregator = Aggregator::new(source.clone());
        let readings = aggregator
            .fetch_all(&[], &device(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(readings.is_empty());
        assert_eq!(*source.calls.lock(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_metrics_fetched_once() {
        let source = Arc::new(FlakySource::new(&[]));
        let aggregator = Aggregator::new(source.clone());
        let readings = aggregator
            .fetch_all(
                &[Metric::Pressure, Metric::Pressure],
                &device(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(*source.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let source = Arc::new(FlakySource::new(&[(Metric::Humidity, 1)]));
        let aggregator = Aggregator::new(source.clone());
        let readings = aggregator
            .fetch_all(&[Metric::Humidity], &device(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(readings.get(Metric::Humidity).unwrap().is_failed());
        assert_eq!(*source.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_network_failure() {
        let source = Arc::new(FlakySource::new(&[(Metric::Humidity, 2)]));
        let aggregator =
            Aggregator::new(source.clone()).with_policy(FetchPolicy::default().with_max_attempts(3));
        let readings = aggregator
            .fetch_all(&[Metric::Humidity], &device(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(readings.get(Metric::Humidity), Some(&FetchResult::Ok(1.0)));
        assert_eq!(*source.calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_decode_failure_not_retried() {
        let source = Arc::new(MalformedSource::default());
        let aggregator =
            Aggregator::new(source.clone()).with_policy(FetchPolicy::default().with_max_attempts(3));
        let readings = aggregator
            .fetch_all(&[Metric::Temperature], &device(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(matches!(
            readings.get(Metric::Temperature),
            Some(FetchResult::Failed(FetchError::Decode(_)))
        ));
        assert_eq!(*source.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_turn() {
        let source = Arc::new(FlakySource::new(&[]));
        let aggregator = Aggregator::new(source);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = aggregator
            .fetch_all(&[Metric::Temperature], &device(), &cancel)
            .await;
        assert!(matches!(result, Err(WetterError::TurnCancelled(_))));
    }

    #[test]
    fn test_policy_minimum_one_attempt() {
        assert_eq!(FetchPolicy::default().with_max_attempts(0).max_attempts, 1);
    }
}
