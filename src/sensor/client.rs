//! HTTP client for the sensor API
//!
//! One GET per metric against `{base}/{metric}?device={device}`. Every
//! failure is folded into [`FetchResult::Failed`]; nothing escapes as an error.

use crate::sensor::metric::{FetchError, FetchResult, Metric};
use crate::{Result, WetterError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Validated, non-empty device identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceName(String);

impl DeviceName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WetterError::ConfigError(
                "device name must not be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can produce a reading for a metric
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Fetch a single metric. Must settle with exactly one result.
    async fn fetch(&self, metric: Metric, device: &DeviceName) -> FetchResult;
}

#[derive(Deserialize)]
struct Envelope {
    data: Map<String, Value>,
}

/// Production [`SensorSource`] backed by `reqwest`
#[derive(Clone, Debug)]
pub struct SensorClient {
    client: Client,
    base_url: String,
}

impl SensorClient {
    /// Build a client with a per-request timeout.
    ///
    /// The sensor API lives on the local network, so system proxies are
    /// bypassed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WetterError::ConfigError(
                "sensor base URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| WetterError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL for a metric, without the query string
    pub fn metric_url(&self, metric: Metric) -> String {
        format!("{}/{}", self.base_url, metric.path())
    }

    async fn request(&self, metric: Metric, device: &DeviceName) -> std::result::Result<f64, FetchError> {
        let response = self
            .client
            .get(self.metric_url(metric))
            .query(&[("device", device.as_str())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        decode_reading(metric, &body)
    }
}

/// Extract `data.<metric>` as a number from a response body
pub fn decode_reading(metric: Metric, body: &[u8]) -> std::result::Result<f64, FetchError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    envelope
        .data
        .get(metric.path())
        .and_then(Value::as_f64)
        .ok_or_else(|| FetchError::Decode(format!("missing numeric field data.{}", metric.path())))
}

#[async_trait]
impl SensorSource for SensorClient {
    async fn fetch(&self, metric: Metric, device: &DeviceName) -> FetchResult {
        debug!("GET {}?device={}", self.metric_url(metric), device);
        match self.request(metric, device).await {
            Ok(value) => {
                debug!("{} = {}", metric, value);
                FetchResult::Ok(value)
            }
            Err(e) => {
                warn!("Fetching {} for {} failed: {}", metric, device, e);
                FetchResult::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_name_rejects_empty() {
        assert!(DeviceName::new("").is_err());
        assert!(DeviceName::new("   ").is_err());
        assert_eq!(DeviceName::new("Arduino").unwrap().as_str(), "Arduino");
    }

    #[test]
    fn test_metric_url_trims_trailing_slash() {
        let client = SensorClient::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.metric_url(Metric::BatteryLevel),
            "http://localhost:8000/api/batteryLevel"
        );
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        let result = SensorClient::new("", Duration::from_secs(1));
        assert!(matches!(result, Err(WetterError::ConfigError(_))));
    }

    #[test]
    fn test_decode_reading() {
        let body = br#"{"data":{"temperature":22.4}}"#;
        assert_eq!(decode_reading(Metric::Temperature, body), Ok(22.4));

        let integer = br#"{"data":{"batteryLevel":80}}"#;
        assert_eq!(decode_reading(Metric::BatteryLevel, integer), Ok(80.0));
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"temperature":22.4}"#,
            br#"{"data":{"humidity":40}}"#,
            br#"{"data":{"temperature":"warm"}}"#,
            br#"{"data":[22.4]}"#,
        ];
        for body in cases {
            assert!(
                matches!(decode_reading(Metric::Temperature, body), Err(FetchError::Decode(_))),
                "expected decode error for {:?}",
                String::from_utf8_lossy(body)
            );
        }
    }
}
