//! Intent dispatcher
//!
//! Drives one conversation turn through
//! Idle -> Dispatching -> [AwaitingFetches] -> Composing -> Emitted,
//! or into Failed. Each turn owns its state machine; the dispatcher keeps no
//! per-turn state, so between turns everything is Idle.

use crate::dispatch::clock::{Clock, SystemClock};
use crate::dispatch::emitter::ReplyEmitter;
use crate::dispatch::intent::{IntentRegistry, IntentRequest, IntentSchema, APOLOGY};
use crate::response::{compose, Classifications, Localizer, Reply, ReplyPayload};
use crate::sensor::{Aggregator, DeviceName, Readings};
use crate::{Result, WetterError};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// State of a single turn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchState {
    #[default]
    Idle,
    Dispatching,
    AwaitingFetches,
    Composing,
    Emitted,
    Failed,
}

impl DispatchState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Idle, Dispatching)
                | (Dispatching, AwaitingFetches)
                | (Dispatching, Composing)
                | (AwaitingFetches, Composing)
                | (Composing, Emitted)
                | (Dispatching, Failed)
                | (AwaitingFetches, Failed)
                | (Composing, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Emitted | DispatchState::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::Idle => write!(f, "Idle"),
            DispatchState::Dispatching => write!(f, "Dispatching"),
            DispatchState::AwaitingFetches => write!(f, "AwaitingFetches"),
            DispatchState::Composing => write!(f, "Composing"),
            DispatchState::Emitted => write!(f, "Emitted"),
            DispatchState::Failed => write!(f, "Failed"),
        }
    }
}

/// State machine of one turn
struct Turn {
    session_id: Uuid,
    intent: String,
    states: Vec<DispatchState>,
}

impl Turn {
    fn start(request: &IntentRequest) -> Self {
        Self {
            session_id: request.conversation.session_id,
            intent: request.intent_name.clone(),
            states: vec![DispatchState::Idle],
        }
    }

    fn current(&self) -> DispatchState {
        self.states.last().copied().unwrap_or_default()
    }

    fn transition(&mut self, next: DispatchState) {
        let current = self.current();
        if !current.can_transition_to(next) {
            error!(
                "Illegal transition {} -> {} for '{}' ({})",
                current, next, self.intent, self.session_id
            );
        }
        debug!("[{}] {} -> {}", self.session_id, current, next);
        self.states.push(next);
    }
}

/// Everything that happened in a completed turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// States visited, starting at Idle
    pub states: Vec<DispatchState>,
    /// Settled fetch results (empty when the intent needs none)
    pub readings: Readings,
    /// The reply handed to the emitter
    pub reply: Reply,
}

/// Routes intents to fetch, classify, compose and emit
pub struct IntentDispatcher {
    registry: IntentRegistry,
    aggregator: Aggregator,
    device: DeviceName,
    localizer: Arc<dyn Localizer>,
    emitter: Arc<dyn ReplyEmitter>,
    clock: Arc<dyn Clock>,
}

impl IntentDispatcher {
    pub fn new(
        aggregator: Aggregator,
        device: DeviceName,
        localizer: Arc<dyn Localizer>,
        emitter: Arc<dyn ReplyEmitter>,
    ) -> Self {
        Self {
            registry: IntentRegistry::builtin(),
            aggregator,
            device,
            localizer,
            emitter,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_registry(mut self, registry: IntentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &IntentRegistry {
        &self.registry
    }

    pub fn device(&self) -> &DeviceName {
        &self.device
    }

    /// Handle one intent invocation.
    ///
    /// On success the reply has been emitted. Unknown intents and
    /// classification domain errors emit a generic apology and return the
    /// error. A conversation invalidated while fetching emits nothing.
    pub async fn handle_intent(&self, request: IntentRequest) -> Result<TurnReport> {
        let start = Instant::now();
        let mut turn = Turn::start(&request);
        turn.transition(DispatchState::Dispatching);

        let schema = match self.registry.get(&request.intent_name) {
            Some(schema) => schema.clone(),
            None => {
                turn.transition(DispatchState::Failed);
                let err = WetterError::UnknownIntent(request.intent_name.clone());
                warn!("{}", err);
                self.apologize(&turn);
                return Err(err);
            }
        };

        let readings = if schema.needs_fetch() {
            turn.transition(DispatchState::AwaitingFetches);
            let fetched = self
                .aggregator
                .fetch_all(
                    &schema.metrics,
                    &self.device,
                    request.conversation.cancellation_token(),
                )
                .await;
            match fetched {
                Ok(readings) => readings,
                Err(e) => {
                    turn.transition(DispatchState::Failed);
                    warn!("Turn for '{}' aborted: {}", schema.name, e);
                    return Err(e);
                }
            }
        } else {
            Readings::new()
        };

        turn.transition(DispatchState::Composing);
        let reply = match self.compose_reply(&turn, &schema, &readings) {
            Ok(reply) => reply,
            Err(e) => {
                turn.transition(DispatchState::Failed);
                error!("Composing '{}' failed: {}", schema.name, e);
                self.apologize(&turn);
                return Err(e);
            }
        };

        if let Err(e) = self.emitter.emit_reply(reply.clone()) {
            turn.transition(DispatchState::Failed);
            error!("Emitting reply for '{}' failed: {}", schema.name, e);
            return Err(e);
        }
        turn.transition(DispatchState::Emitted);

        info!(
            "Handled '{}' in {}ms (degraded: {:?}, end_session: {})",
            schema.name,
            start.elapsed().as_millis(),
            reply.payload.degraded,
            reply.end_session
        );

        Ok(TurnReport {
            states: turn.states,
            readings,
            reply,
        })
    }

    fn compose_reply(&self, turn: &Turn, schema: &IntentSchema, readings: &Readings) -> Result<Reply> {
        let classifications = Classifications::compute(schema, readings, self.clock.hour())?;
        let payload = compose(schema, readings, &classifications, self.localizer.as_ref());
        let text = self.localizer.render(&schema.name, &payload);

        Ok(Reply {
            session_id: turn.session_id,
            intent: schema.name.clone(),
            payload,
            text,
            end_session: schema.end_session,
        })
    }

    fn apologize(&self, turn: &Turn) {
        let reply = Reply {
            session_id: turn.session_id,
            intent: APOLOGY.to_string(),
            payload: ReplyPayload::new(),
            text: self.localizer.apology(),
            end_session: true,
        };
        if let Err(e) = self.emitter.emit_reply(reply) {
            error!("Could not emit apology for '{}': {}", turn.intent, e);
        }
    }
}
