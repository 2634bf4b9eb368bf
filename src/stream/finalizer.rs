use super::messages::ServerMessage;
use super::transport::Transport;
use crate::recognizer::Decoder;
use crate::session::{count_words, FinalizeTrigger, SessionRegistry, SessionState, SessionSummary};
use crate::store::{NewSessionRecord, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Terminal sequence of a session: drain the decoder, persist, notify, release.
#[derive(Clone)]
pub struct Finalizer {
    store: Arc<dyn SessionStore>,
    registry: SessionRegistry,
    empty_placeholder: String,
}

impl Finalizer {
    pub fn new(
        store: Arc<dyn SessionStore>,
        registry: SessionRegistry,
        empty_placeholder: impl Into<String>,
    ) -> Self {
        Self {
            store,
            registry,
            empty_placeholder: empty_placeholder.into(),
        }
    }

    /// Finalize `session` once.
    ///
    /// Returns `None` without side effects if the session's latch was
    /// already taken. The decoder is consumed and the registry entry removed
    /// whether or not persistence succeeds.
    pub async fn finalize<T: Transport + ?Sized>(
        &self,
        session: &mut SessionState,
        decoder: &mut Option<Box<dyn Decoder>>,
        transport: &mut T,
        trigger: FinalizeTrigger,
    ) -> Option<SessionSummary> {
        if !session.begin_finalizing() {
            debug!(session_id = %session.id(), %trigger, "Session already finalized, ignoring trigger");
            return None;
        }

        info!(session_id = %session.id(), %trigger, "Finalizing session");

        let trailing = match decoder.as_mut() {
            Some(decoder) => match decoder.flush().await {
                Ok(text) => text.trim().to_string(),
                Err(e) => {
                    warn!(session_id = %session.id(), "Decoder flush failed: {:#}", e);
                    String::new()
                }
            },
            None => String::new(),
        };
        if !trailing.is_empty() {
            session.append_trailing(&trailing);
        }

        let aggregate = session.aggregate_transcript();
        let word_count = count_words(&aggregate);
        let duration_secs = session.elapsed(Instant::now()).as_secs_f64();

        let record = NewSessionRecord {
            id: session.id().to_string(),
            transcript: if aggregate.is_empty() {
                self.empty_placeholder.clone()
            } else {
                aggregate.clone()
            },
            word_count,
            duration_secs,
            session_metadata: Some(
                json!({
                    "audio_chunks_received": session.audio_chunks_received(),
                    "end_trigger": trigger.as_str(),
                })
                .to_string(),
            ),
        };

        let persisted = match self.store.create_session(record).await {
            Ok(_) => true,
            Err(e) => {
                error!(
                    session_id = %session.id(),
                    store = self.store.name(),
                    "Failed to persist session: {:#}", e
                );
                false
            }
        };

        if trigger.peer_reachable() {
            let terminal = ServerMessage::session_complete(&trailing, &aggregate, word_count);
            if let Err(e) = transport.send(&terminal).await {
                warn!(session_id = %session.id(), "Failed to send terminal message: {:#}", e);
            }
        }

        // Releases the decoder context
        drop(decoder.take());
        self.registry.remove(session.id()).await;
        session.mark_closed();

        info!(
            session_id = %session.id(),
            word_count,
            duration_secs,
            persisted,
            "Session closed"
        );

        Some(SessionSummary {
            session_id: session.id().to_string(),
            transcript: aggregate,
            word_count,
            duration_secs,
            segments_count: session.segments().len(),
            audio_chunks_received: session.audio_chunks_received(),
            trigger,
            persisted,
        })
    }
}
