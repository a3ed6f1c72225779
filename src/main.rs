use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wetterfrosch::dispatch::{ChannelEmitter, ConversationHandle, IntentRequest};
use wetterfrosch::integration::{AppConfig, ContextBuilder};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wetterfrosch=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Wetterfrosch");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::resolve(config_path.as_deref()).context("Failed to load configuration")?;
    info!(
        "Session store: {:?} (db {}, lifetime {}s)",
        config.session_store.connection_info(),
        config.session_store.database,
        config.session_store.max_lifetime_secs
    );

    let (emitter, reply_rx) = ChannelEmitter::new(16);
    let context = ContextBuilder::new()
        .with_config(config)
        .with_emitter(Arc::new(emitter))
        .build()
        .context("Failed to build application context")?;
    let dispatcher = context.dispatcher();

    // Stand-in for the voice platform: one intent name per line on stdin
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = ConversationHandle::new();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                conversation.invalidate();
                info!("Interrupted");
                break;
            }
        };
        let Some(line) = line else { break };
        let intent = line.trim();
        if intent.is_empty() {
            continue;
        }

        // Ctrl-C during a turn cancels that turn; at the prompt it exits
        let turn = dispatcher.handle_intent(IntentRequest::new(intent, conversation.clone()));
        tokio::pin!(turn);
        let result = tokio::select! {
            result = &mut turn => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, cancelling current turn");
                conversation.invalidate();
                turn.await
            }
        };
        if let Err(e) = result {
            warn!("{}", e);
        }
        if conversation.is_invalidated() {
            conversation = ConversationHandle::new();
        }

        while let Ok(reply) = reply_rx.try_recv() {
            println!("{}", reply.text);
            if reply.end_session {
                conversation = ConversationHandle::new();
            }
        }
    }

    info!("Wetterfrosch stopped");
    Ok(())
}
