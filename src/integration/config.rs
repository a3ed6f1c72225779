//! Configuration for the integration layer
//!
//! Resolved once at startup: defaults, then an optional TOML file, then
//! environment overrides. Components only ever see the resolved values.

use crate::sensor::DeviceName;
use crate::{Result, WetterError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Sensor API settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Base URL, e.g. `http://192.168.178.47:8000/api`
    pub base_url: String,

    /// Device whose readings are requested
    pub device: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Attempts per metric, including the first
    pub max_attempts: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.178.47:8000/api".to_string(),
            device: "Arduino".to_string(),
            timeout_ms: 5000,
            max_attempts: 1,
        }
    }
}

impl SensorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Localization settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Language tag, e.g. `de`
    pub language: String,

    /// Where the platform adapter loads locale files from. Passed through untouched.
    pub catalog_path: Option<PathBuf>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: "de".to_string(),
            catalog_path: None,
        }
    }
}

/// Session store connection parameters, handed to the platform adapter
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionStoreConfig {
    pub host: String,
    pub port: u16,
    pub database: u32,
    pub password: Option<String>,
    /// Unix socket path; preferred over host/port when set
    pub socket: Option<PathBuf>,
    /// Session lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 5,
            password: None,
            socket: None,
            max_lifetime_secs: 3600,
        }
    }
}

/// How to reach the session store
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionInfo {
    Socket(PathBuf),
    Tcp { host: String, port: u16 },
}

impl SessionStoreConfig {
    pub fn connection_info(&self) -> ConnectionInfo {
        match &self.socket {
            Some(socket) => ConnectionInfo::Socket(socket.clone()),
            None => ConnectionInfo::Tcp {
                host: self.host.clone(),
                port: self.port,
            },
        }
    }
}

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sensor: SensorConfig,
    pub locale: LocaleConfig,
    pub session_store: SessionStoreConfig,
}

impl AppConfig {
    /// Default config file location (`<config dir>/wetterfrosch/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wetterfrosch").join("config.toml"))
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WetterError::ConfigError(e.to_string()))
    }

    /// Load a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| {
            WetterError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }

    /// Defaults, then the file at `path` (which must exist when given) or the
    /// default path if it exists, then the process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load(path)?
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    debug!("Loading config from {}", path.display());
                    Self::load(&path)?
                }
                _ => Self::default(),
            },
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment)
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("WETTERFROSCH_BASE_URL") {
            self.sensor.base_url = v;
        }
        if let Some(v) = lookup("WETTERFROSCH_DEVICE") {
            self.sensor.device = v;
        }
        if let Some(v) = lookup("WETTERFROSCH_LOCALE") {
            self.locale.language = v;
        }
        if let Some(v) = lookup("REDIS_HOST") {
            self.session_store.host = v;
        }
        if let Some(v) = lookup("REDIS_PORT") {
            self.session_store.port = parse_env("REDIS_PORT", &v)?;
        }
        if let Some(v) = lookup("REDIS_DATABASE") {
            self.session_store.database = parse_env("REDIS_DATABASE", &v)?;
        }
        if let Some(v) = lookup("REDIS_PASSWORD") {
            self.session_store.password = Some(v);
        }
        if let Some(v) = lookup("REDIS_SOCKET") {
            self.session_store.socket = Some(PathBuf::from(v));
        }
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.sensor.base_url = base_url.into();
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.sensor.device = device.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.locale.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.sensor.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Validated device name
    pub fn device_name(&self) -> Result<DeviceName> {
        DeviceName::new(self.sensor.device.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.sensor.base_url.starts_with("http://") || self.sensor.base_url.starts_with("https://")) {
            return Err(WetterError::ConfigError(format!(
                "sensor base URL must be http(s): {}",
                self.sensor.base_url
            )));
        }
        self.device_name()?;
        if self.sensor.timeout_ms == 0 {
            return Err(WetterError::ConfigError("sensor timeout must be positive".to_string()));
        }
        if self.sensor.max_attempts == 0 {
            return Err(WetterError::ConfigError(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.locale.language.trim().is_empty() {
            return Err(WetterError::ConfigError("locale language is required".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| WetterError::ConfigError(format!("{} has an invalid value: {}", key, value)))
}
