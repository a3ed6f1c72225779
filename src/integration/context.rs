//! Process-scoped resources
//!
//! Everything a turn needs (HTTP client, localizer, emitter, clock) is built
//! once from the resolved [`AppConfig`] and shared by handle.

use crate::dispatch::{Clock, IntentDispatcher, IntentRegistry, ReplyEmitter, SystemClock};
use crate::integration::config::AppConfig;
use crate::response::{Catalog, Localizer};
use crate::sensor::{Aggregator, FetchPolicy, SensorClient, SensorSource};
use crate::{Result, WetterError};
use std::sync::Arc;
use tracing::info;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    config: Arc<AppConfig>,
    dispatcher: Arc<IntentDispatcher>,
}

impl AppContext {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> Arc<IntentDispatcher> {
        Arc::clone(&self.dispatcher)
    }
}

/// Builder for [`AppContext`]
pub struct ContextBuilder {
    config: AppConfig,
    source: Option<Arc<dyn SensorSource>>,
    localizer: Option<Arc<dyn Localizer>>,
    emitter: Option<Arc<dyn ReplyEmitter>>,
    clock: Arc<dyn Clock>,
    registry: IntentRegistry,
}

impl ContextBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            source: None,
            localizer: None,
            emitter: None,
            clock: Arc::new(SystemClock),
            registry: IntentRegistry::builtin(),
        }
    }

    /// Set the complete configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom sensor source instead of the HTTP client
    pub fn with_source(mut self, source: Arc<dyn SensorSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Use a custom localizer instead of the built-in catalog
    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ReplyEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_registry(mut self, registry: IntentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the context
    pub fn build(self) -> Result<AppContext> {
        self.config.validate()?;

        let emitter = self
            .emitter
            .ok_or_else(|| WetterError::ConfigError("a reply emitter is required".to_string()))?;

        let source: Arc<dyn SensorSource> = match self.source {
            Some(source) => source,
            None => Arc::new(SensorClient::new(
                self.config.sensor.base_url.clone(),
                self.config.sensor.timeout(),
            )?),
        };

        let localizer: Arc<dyn Localizer> = match self.localizer {
            Some(localizer) => localizer,
            None => Arc::new(Catalog::for_language(&self.config.locale.language)),
        };

        let aggregator = Aggregator::new(source).with_policy(
            FetchPolicy::default().with_max_attempts(self.config.sensor.max_attempts),
        );

        let dispatcher = IntentDispatcher::new(
            aggregator,
            self.config.device_name()?,
            localizer,
            emitter,
        )
        .with_registry(self.registry)
        .with_clock(self.clock);

        info!(
            "Context ready: {} device '{}', locale '{}'",
            self.config.sensor.base_url, self.config.sensor.device, self.config.locale.language
        );

        Ok(AppContext {
            config: Arc::new(self.config),
            dispatcher: Arc::new(dispatcher),
        })
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
