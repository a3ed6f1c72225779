//! Sensor access: metric types, the HTTP client and concurrent aggregation

pub mod aggregate;
pub mod client;
pub mod metric;

pub use aggregate::{Aggregator, FetchPolicy};
pub use client::{decode_reading, DeviceName, SensorClient, SensorSource};
pub use metric::{FetchError, FetchResult, Metric, Readings};
