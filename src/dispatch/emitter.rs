//! Reply emission towards the platform adapter

use crate::response::Reply;
use crate::{Result, WetterError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Accepts finished replies. Implemented by the platform adapter.
pub trait ReplyEmitter: Send + Sync {
    fn emit_reply(&self, reply: Reply) -> Result<()>;
}

/// Emitter that hands replies to a bounded channel
#[derive(Clone, Debug)]
pub struct ChannelEmitter {
    reply_tx: Sender<Reply>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver the adapter reads replies from
    pub fn new(capacity: usize) -> (Self, Receiver<Reply>) {
        let (reply_tx, reply_rx) = bounded(capacity);
        (Self { reply_tx }, reply_rx)
    }
}

impl ReplyEmitter for ChannelEmitter {
    fn emit_reply(&self, reply: Reply) -> Result<()> {
        self.reply_tx.try_send(reply).map_err(|e| match e {
            TrySendError::Full(_) => WetterError::EmitError("reply channel is full".to_string()),
            TrySendError::Disconnected(_) => {
                WetterError::EmitError("reply receiver disconnected".to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ReplyPayload;
    use uuid::Uuid;

    fn reply() -> Reply {
        Reply {
            session_id: Uuid::new_v4(),
            intent: "invoke".to_string(),
            payload: ReplyPayload::new(),
            text: "Hallo".to_string(),
            end_session: false,
        }
    }

    #[test]
    fn test_channel_delivery() {
        let (emitter, rx) = ChannelEmitter::new(4);
        emitter.emit_reply(reply()).unwrap();
        assert_eq!(rx.try_recv().unwrap().text, "Hallo");
    }

    #[test]
    fn test_full_and_disconnected() {
        let (emitter, rx) = ChannelEmitter::new(1);
        emitter.emit_reply(reply()).unwrap();
        assert!(matches!(emitter.emit_reply(reply()), Err(WetterError::EmitError(_))));

        drop(rx);
        assert!(matches!(emitter.emit_reply(reply()), Err(WetterError::EmitError(_))));
    }
}
