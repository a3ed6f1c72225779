//! Builds the reply payload for an intent from its settled readings

use crate::classify::{
    classify_battery, classify_greeting, classify_temperature, BatteryBand, GreetingBand,
    TemperatureBand,
};
use crate::dispatch::intent::{Field, IntentSchema};
use crate::response::locale::Localizer;
use crate::response::payload::ReplyPayload;
use crate::sensor::{Metric, Readings};
use crate::Result;

/// Bands computed for a turn. `None` when the schema does not need the band
/// or the underlying fetch failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Classifications {
    pub temperature: Option<TemperatureBand>,
    pub battery: Option<BatteryBand>,
    pub greeting: Option<GreetingBand>,
}

impl Classifications {
    /// Classify exactly what `schema` asks for
    pub fn compute(schema: &IntentSchema, readings: &Readings, hour: u32) -> Result<Self> {
        let value_of = |metric: Metric| readings.get(metric).and_then(|r| r.value());
        let mut classifications = Self::default();

        for field in &schema.fields {
            match field {
                Field::TemperatureBand => {
                    if let Some(value) = value_of(Metric::Temperature) {
                        classifications.temperature = Some(classify_temperature(value)?);
                    }
                }
                Field::BatteryBand => {
                    if let Some(value) = value_of(Metric::BatteryLevel) {
                        classifications.battery = Some(classify_battery(value)?);
                    }
                }
                Field::Greeting => {
                    classifications.greeting = Some(classify_greeting(hour)?);
                }
                Field::Value(_) => {}
            }
        }

        Ok(classifications)
    }
}

/// Compose the payload for `schema`.
///
/// Every slot of the schema is filled. A slot whose source metric failed (or
/// is missing from `readings`) gets the localizer's fallback text for that
/// metric, and the metric is listed in [`ReplyPayload::degraded`].
pub fn compose(
    schema: &IntentSchema,
    readings: &Readings,
    classifications: &Classifications,
    localizer: &dyn Localizer,
) -> ReplyPayload {
    let format = localizer.number_format();
    let mut payload = ReplyPayload::new();

    for field in &schema.fields {
        let value = match field {
            Field::Value(metric) => readings
                .get(*metric)
                .and_then(|r| r.value())
                .map(|v| format.format(v)),
            Field::TemperatureBand => classifications.temperature.map(|b| b.label().to_string()),
            Field::BatteryBand => classifications.battery.map(|b| b.label().to_string()),
            Field::Greeting => classifications.greeting.map(|b| b.label().to_string()),
        };

        match (value, field.source_metric()) {
            (Some(value), _) => payload.set(field.slot(), value),
            (None, Some(metric)) => {
                payload.set(field.slot(), localizer.fallback(metric));
                if !payload.degraded.contains(&metric) {
                    payload.degraded.push(metric);
                }
            }
            (None, None) => payload.set(field.slot(), localizer.fallback_text()),
        }
    }

    payload.degraded.sort();
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::intent::{IntentRegistry, GET_BATTERY_STATUS_LEVEL, GET_TEMPERATURE, INVOKE};
    use crate::response::locale::Catalog;
    use crate::sensor::{FetchError, FetchResult};
    use crate::WetterError;

    fn readings(entries: &[(Metric, FetchResult)]) -> Readings {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_temperature_payload() {
        let registry = IntentRegistry::builtin();
        let schema = registry.get(GET_TEMPERATURE).unwrap();
        let readings = readings(&[(Metric::Temperature, FetchResult::Ok(22.4))]);
        let classifications = Classifications::compute(schema, &readings, 12).unwrap();
        let payload = compose(schema, &readings, &classifications, &Catalog::german());

        assert_eq!(payload.get("temperature"), Some("22,4"));
        assert_eq!(payload.get("intervall"), Some("warm"));
        assert!(!payload.is_degraded());
        assert_eq!(payload.slots.len(), 2);
    }

    #[test]
    fn test_failed_temperature_degrades_both_slots() {
        let registry = IntentRegistry::builtin();
        let schema = registry.get(GET_TEMPERATURE).unwrap();
        let readings = readings(&[(
            Metric::Temperature,
            FetchResult::Failed(FetchError::Network("timeout".into())),
        )]);
        let catalog = Catalog::german();
        let classifications = Classifications::compute(schema, &readings, 12).unwrap();
        assert_eq!(classifications.temperature, None);

        let payload = compose(schema, &readings, &classifications, &catalog);
        let fallback = catalog.fallback(Metric::Temperature);
        assert_eq!(payload.get("temperature"), Some(fallback.as_str()));
        assert_eq!(payload.get("intervall"), Some(fallback.as_str()));
        assert_eq!(payload.degraded, vec![Metric::Temperature]);
    }

    #[test]
    fn test_negative_battery_is_domain_error() {
        let registry = IntentRegistry::builtin();
        let schema = registry.get(GET_BATTERY_STATUS_LEVEL).unwrap();
        let readings = readings(&[(Metric::BatteryLevel, FetchResult::Ok(-4.0))]);
        let result = Classifications::compute(schema, &readings, 12);
        assert!(matches!(result, Err(WetterError::ClassificationDomainError(_))));
    }

    #[test]
    fn test_greeting_ignores_readings() {
        let registry = IntentRegistry::builtin();
        let schema = registry.get(INVOKE).unwrap();
        let classifications = Classifications::compute(schema, &Readings::new(), 20).unwrap();
        let payload = compose(schema, &Readings::new(), &classifications, &Catalog::english());
        assert_eq!(payload.get("greeting"), Some("evening"));
        assert!(!payload.is_degraded());
    }

    #[test]
    fn test_compose_is_idempotent() {
        let registry = IntentRegistry::builtin();
        let schema = registry.get(GET_BATTERY_STATUS_LEVEL).unwrap();
        let readings = readings(&[(Metric::BatteryLevel, FetchResult::Ok(42.0))]);
        let catalog = Catalog::german();
        let classifications = Classifications::compute(schema, &readings, 12).unwrap();

        let first = compose(schema, &readings, &classifications, &catalog);
        let second = compose(schema, &readings, &classifications, &catalog);
        assert_eq!(first, second);
        assert_eq!(first.get("batteryStatus"), Some("low"));
    }
}
