//! Intent dispatch: schema table, per-turn state machine and reply emission

pub mod clock;
pub mod dispatcher;
pub mod emitter;
pub mod intent;

pub use clock::{Clock, FixedClock, SystemClock};
pub use dispatcher::{DispatchState, IntentDispatcher, TurnReport};
pub use emitter::{ChannelEmitter, ReplyEmitter};
pub use intent::{ConversationHandle, Field, IntentRegistry, IntentRequest, IntentSchema};
