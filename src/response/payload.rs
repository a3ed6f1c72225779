use crate::sensor::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Named slots handed to localization, plus the metrics that had to fall back
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub slots: BTreeMap<String, String>,
    pub degraded: Vec<Metric>,
}

impl ReplyPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(slot.into(), value.into());
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(String::as_str)
    }

    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// A finished reply, ready for the platform adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Conversation this reply belongs to
    pub session_id: Uuid,
    /// Intent that produced it (`apology` for aborted turns)
    pub intent: String,
    pub payload: ReplyPayload,
    /// Localized text to speak
    pub text: String,
    /// Whether the dialogue ends after this reply
    pub end_session: bool,
}
