//! Startup wiring: configuration and the shared application context

pub mod config;
pub mod context;

pub use config::{AppConfig, ConnectionInfo, LocaleConfig, SensorConfig, SessionStoreConfig};
pub use context::{AppContext, ContextBuilder};
