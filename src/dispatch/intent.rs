//! Per-intent schema table
//!
//! Each supported intent is described by data: which metrics it fetches,
//! which reply slots it fills and whether the session stays open.

use crate::sensor::Metric;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Launch intent of the skill
pub const INVOKE: &str = "invoke";
pub const GET_COMPLETE_WEATHER_INFORMATIONS: &str = "getCompleteWeatherInformations";
pub const GET_TEMPERATURE: &str = "getTemperature";
pub const GET_HUMIDITY: &str = "getHumidity";
pub const GET_PRESSURE: &str = "getPressure";
pub const GET_BATTERY_STATUS_LEVEL: &str = "getBatteryStatusLevel";

/// Intent name used for the generic apology reply of aborted turns
pub const APOLOGY: &str = "apology";

/// What goes into one reply slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Formatted raw value, slot named after the metric
    Value(Metric),
    /// Temperature comfort band, slot `intervall`
    TemperatureBand,
    /// Battery urgency band, slot `batteryStatus`
    BatteryBand,
    /// Greeting for the current hour, slot `greeting`
    Greeting,
}

impl Field {
    pub fn slot(&self) -> &'static str {
        match self {
            Field::Value(metric) => metric.path(),
            Field::TemperatureBand => "intervall",
            Field::BatteryBand => "batteryStatus",
            Field::Greeting => "greeting",
        }
    }

    /// Metric the slot is derived from, if any
    pub fn source_metric(&self) -> Option<Metric> {
        match self {
            Field::Value(metric) => Some(*metric),
            Field::TemperatureBand => Some(Metric::Temperature),
            Field::BatteryBand => Some(Metric::BatteryLevel),
            Field::Greeting => None,
        }
    }
}

/// Static description of one intent
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentSchema {
    pub name: String,
    pub metrics: Vec<Metric>,
    pub fields: Vec<Field>,
    pub end_session: bool,
}

impl IntentSchema {
    /// Schema whose metric set is derived from its fields
    pub fn new(name: impl Into<String>, fields: Vec<Field>, end_session: bool) -> Self {
        let mut metrics: Vec<Metric> = fields.iter().filter_map(Field::source_metric).collect();
        metrics.sort();
        metrics.dedup();
        Self {
            name: name.into(),
            metrics,
            fields,
            end_session,
        }
    }

    pub fn needs_fetch(&self) -> bool {
        !self.metrics.is_empty()
    }
}

/// Lookup table from intent name to schema
#[derive(Clone, Debug, Default)]
pub struct IntentRegistry {
    schemas: HashMap<String, IntentSchema>,
}

impl IntentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The intents the skill ships with
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(IntentSchema::new(INVOKE, vec![Field::Greeting], false));
        registry.register(IntentSchema::new(
            GET_COMPLETE_WEATHER_INFORMATIONS,
            Metric::ALL.iter().copied().map(Field::Value).collect(),
            true,
        ));
        registry.register(IntentSchema::new(
            GET_TEMPERATURE,
            vec![Field::Value(Metric::Temperature), Field::TemperatureBand],
            true,
        ));
        registry.register(IntentSchema::new(
            GET_HUMIDITY,
            vec![Field::Value(Metric::Humidity)],
            true,
        ));
        registry.register(IntentSchema::new(
            GET_PRESSURE,
            vec![Field::Value(Metric::Pressure)],
            true,
        ));
        registry.register(IntentSchema::new(
            GET_BATTERY_STATUS_LEVEL,
            vec![Field::Value(Metric::BatteryLevel), Field::BatteryBand],
            true,
        ));
        registry
    }

    pub fn register(&mut self, schema: IntentSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> Option<&IntentSchema> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Opaque per-conversation handle supplied by the platform adapter
#[derive(Clone, Debug)]
pub struct ConversationHandle {
    pub session_id: Uuid,
    cancel: CancellationToken,
}

impl ConversationHandle {
    pub fn new() -> Self {
        Self::with_session(Uuid::new_v4())
    }

    pub fn with_session(session_id: Uuid) -> Self {
        Self {
            session_id,
            cancel: CancellationToken::new(),
        }
    }

    /// Mark the conversation as gone; in-flight fetches for it are dropped
    pub fn invalidate(&self) {
        self.cancel.cancel();
    }

    pub fn is_invalidated(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for ConversationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One recognized intent for one conversation turn
#[derive(Clone, Debug)]
pub struct IntentRequest {
    pub intent_name: String,
    pub conversation: ConversationHandle,
}

impl IntentRequest {
    pub fn new(intent_name: impl Into<String>, conversation: ConversationHandle) -> Self {
        Self {
            intent_name: intent_name.into(),
            conversation,
        }
    }
}
