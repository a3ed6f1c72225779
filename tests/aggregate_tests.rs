//! Tests for concurrent all-settle aggregation

mod common;

use common::{device, StubSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wetterfrosch::sensor::{Aggregator, FetchResult, Metric};
use wetterfrosch::WetterError;

/// The result always has one entry per requested metric, whatever failed
#[tokio::test]
async fn test_key_set_matches_request_despite_failures() {
    let source = Arc::new(
        StubSource::new()
            .with_network_failure(Metric::Temperature)
            .with_value(Metric::Humidity, 48.0)
            .with_network_failure(Metric::Pressure),
    );
    let aggregator = Aggregator::new(source);

    let requested = [Metric::Temperature, Metric::Humidity, Metric::Pressure, Metric::BatteryLevel];
    let readings = aggregator
        .fetch_all(&requested, &device(), &CancellationToken::new())
        .await
        .unwrap();

    let mut keys: Vec<Metric> = readings.metrics().collect();
    keys.sort();
    assert_eq!(keys, requested.to_vec());
    assert_eq!(readings.get(Metric::Humidity), Some(&FetchResult::Ok(48.0)));
    // BatteryLevel has no scripted value and settles as a decode failure
    assert_eq!(
        readings.failed(),
        vec![Metric::Temperature, Metric::Pressure, Metric::BatteryLevel]
    );
}

/// Fetches run concurrently rather than one after another
#[tokio::test]
async fn test_fetches_do_not_block_each_other() {
    let source = Arc::new(
        StubSource::new()
            .with_value(Metric::Temperature, 1.0)
            .with_value(Metric::Humidity, 2.0)
            .with_value(Metric::Pressure, 3.0)
            .with_value(Metric::BatteryLevel, 4.0)
            .with_delay(Duration::from_millis(200)),
    );
    let aggregator = Aggregator::new(source.clone());

    let start = Instant::now();
    let readings = aggregator
        .fetch_all(&Metric::ALL, &device(), &CancellationToken::new())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(readings.len(), 4);
    assert_eq!(source.calls().len(), 4);
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
}

/// Cancelling mid-flight returns promptly instead of waiting for the fetches
#[tokio::test]
async fn test_cancel_in_flight() {
    let source = Arc::new(
        StubSource::new()
            .with_value(Metric::Temperature, 1.0)
            .with_delay(Duration::from_secs(10)),
    );
    let aggregator = Aggregator::new(source);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = aggregator
        .fetch_all(&[Metric::Temperature], &device(), &cancel)
        .await;

    assert!(matches!(result, Err(WetterError::TurnCancelled(_))));
    assert!(start.elapsed() < Duration::from_secs(2));
}
