//! Localization seam and the built-in in-memory catalog
//!
//! Templates are Handlebars templates over the reply slots (`{{temperature}}`).
//! Slot values that are band labels (`comfortable`, `morning`, ...) are
//! translated before rendering.

use crate::dispatch::intent::{
    APOLOGY, GET_BATTERY_STATUS_LEVEL, GET_COMPLETE_WEATHER_INFORMATIONS, GET_HUMIDITY,
    GET_PRESSURE, GET_TEMPERATURE, INVOKE,
};
use crate::response::format::NumberFormat;
use crate::response::payload::ReplyPayload;
use crate::sensor::Metric;
use crate::{Result, WetterError};
use handlebars::Handlebars;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::{error, warn};

/// Localization function supplied to the dispatcher
pub trait Localizer: Send + Sync {
    fn number_format(&self) -> NumberFormat;

    /// Text used in place of a metric whose fetch failed
    fn fallback(&self, metric: Metric) -> String;

    /// Text used for a slot with no metric behind it
    fn fallback_text(&self) -> String;

    /// Render the reply text for an intent
    fn render(&self, intent: &str, payload: &ReplyPayload) -> String;

    /// Generic reply for aborted turns
    fn apology(&self) -> String {
        self.render(APOLOGY, &ReplyPayload::new())
    }
}

/// Templates and label translations for one language
pub struct Catalog {
    language: String,
    format: NumberFormat,
    templates: RwLock<Handlebars<'static>>,
    labels: HashMap<String, String>,
    unavailable: String,
}

const GERMAN_TEMPLATES: &[(&str, &str)] = &[
    (INVOKE, "{{greeting}}! Hier ist dein Wetterfrosch. Was möchtest du wissen?"),
    (
        GET_COMPLETE_WEATHER_INFORMATIONS,
        "Die Temperatur beträgt {{temperature}} Grad, die Luftfeuchtigkeit {{humidity}} Prozent \
         und der Luftdruck {{pressure}} Hektopascal. Der Akku ist zu {{batteryLevel}} Prozent geladen.",
    ),
    (GET_TEMPERATURE, "Die Temperatur beträgt {{temperature}} Grad, das ist {{intervall}}."),
    (GET_HUMIDITY, "Die Luftfeuchtigkeit beträgt {{humidity}} Prozent."),
    (GET_PRESSURE, "Der Luftdruck beträgt {{pressure}} Hektopascal."),
    (
        GET_BATTERY_STATUS_LEVEL,
        "Der Akku ist zu {{batteryLevel}} Prozent geladen. Ladezustand: {{batteryStatus}}.",
    ),
    (APOLOGY, "Entschuldigung, das kann ich gerade leider nicht beantworten."),
];

const GERMAN_LABELS: &[(&str, &str)] = &[
    ("freezing", "eiskalt"),
    ("cold", "kalt"),
    ("comfortable", "angenehm"),
    ("warm", "warm"),
    ("hot", "heiß"),
    ("critical", "kritisch"),
    ("low", "niedrig"),
    ("nominal", "normal"),
    ("full", "voll"),
    ("morning", "Guten Morgen"),
    ("day", "Guten Tag"),
    ("evening", "Guten Abend"),
];

const ENGLISH_TEMPLATES: &[(&str, &str)] = &[
    (INVOKE, "{{greeting}}! This is your weather frog. What would you like to know?"),
    (
        GET_COMPLETE_WEATHER_INFORMATIONS,
        "The temperature is {{temperature}} degrees, humidity is {{humidity}} percent \
         and pressure is {{pressure}} hectopascals. The battery is at {{batteryLevel}} percent.",
    ),
    (GET_TEMPERATURE, "The temperature is {{temperature}} degrees, which is {{intervall}}."),
    (GET_HUMIDITY, "Humidity is {{humidity}} percent."),
    (GET_PRESSURE, "Pressure is {{pressure}} hectopascals."),
    (
        GET_BATTERY_STATUS_LEVEL,
        "The battery is at {{batteryLevel}} percent. Status: {{batteryStatus}}.",
    ),
    (APOLOGY, "Sorry, I can't answer that right now."),
];

const ENGLISH_LABELS: &[(&str, &str)] = &[
    ("morning", "Good morning"),
    ("day", "Good day"),
    ("evening", "Good evening"),
];

fn owned(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    // A slot missing from the payload is an error, never an empty string
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars
}

impl Catalog {
    /// Empty catalog; unknown intents render as the apology or an empty string
    pub fn new(language: impl Into<String>, unavailable: impl Into<String>) -> Self {
        let language = language.into();
        Self {
            format: NumberFormat::for_language(&language),
            language,
            templates: RwLock::new(registry()),
            labels: HashMap::new(),
            unavailable: unavailable.into(),
        }
    }

    pub fn german() -> Self {
        Self::new("de", "nicht verfügbar")
            .with_builtin(GERMAN_TEMPLATES)
            .with_labels(GERMAN_LABELS)
    }

    pub fn english() -> Self {
        Self::new("en", "unavailable")
            .with_builtin(ENGLISH_TEMPLATES)
            .with_labels(ENGLISH_LABELS)
    }

    /// Built-in catalog for a language tag, German when unknown
    pub fn for_language(language: &str) -> Self {
        if language.to_ascii_lowercase().starts_with("en") {
            Self::english()
        } else {
            if !language.to_ascii_lowercase().starts_with("de") {
                warn!("No built-in catalog for '{}', using German", language);
            }
            Self::german()
        }
    }

    fn with_builtin(self, templates: &[(&str, &str)]) -> Self {
        for (intent, template) in templates {
            if let Err(e) = self.insert_template(*intent, *template) {
                error!("Built-in template for '{}' rejected: {}", intent, e);
            }
        }
        self
    }

    fn with_labels(mut self, labels: &[(&str, &str)]) -> Self {
        self.labels.extend(owned(labels));
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn has_template(&self, intent: &str) -> bool {
        self.templates.read().has_template(intent)
    }

    /// Add or replace a template at runtime
    pub fn insert_template(&self, intent: impl Into<String>, template: impl AsRef<str>) -> Result<()> {
        let intent = intent.into();
        self.templates
            .write()
            .register_template_string(&intent, template)
            .map_err(|e| WetterError::ConfigError(format!("template '{}': {}", intent, e)))
    }

    pub fn with_label(mut self, label: impl Into<String>, text: impl Into<String>) -> Self {
        self.labels.insert(label.into(), text.into());
        self
    }

    /// Payload slots with band labels translated
    fn render_data<'a>(&'a self, payload: &'a ReplyPayload) -> BTreeMap<&'a str, &'a str> {
        payload
            .slots
            .iter()
            .map(|(slot, value)| {
                let text = self.labels.get(value).unwrap_or(value);
                (slot.as_str(), text.as_str())
            })
            .collect()
    }
}

impl Localizer for Catalog {
    fn number_format(&self) -> NumberFormat {
        self.format
    }

    fn fallback(&self, _metric: Metric) -> String {
        self.unavailable.clone()
    }

    fn fallback_text(&self) -> String {
        self.unavailable.clone()
    }

    fn render(&self, intent: &str, payload: &ReplyPayload) -> String {
        let rendered = {
            let templates = self.templates.read();
            if !templates.has_template(intent) {
                None
            } else {
                Some(templates.render(intent, &self.render_data(payload)))
            }
        };

        match rendered {
            Some(Ok(text)) => text,
            Some(Err(e)) if intent != APOLOGY => {
                warn!("Rendering '{}' in '{}' failed: {}", intent, self.language, e);
                self.apology()
            }
            None if intent != APOLOGY => {
                warn!("No template for intent '{}' in '{}'", intent, self.language);
                self.apology()
            }
            Some(Err(e)) => {
                error!("Apology template in '{}' failed: {}", self.language, e);
                String::new()
            }
            None => String::new(),
        }
    }
}
