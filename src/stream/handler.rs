use super::finalizer::Finalizer;
use super::messages::{Inbound, ServerMessage};
use super::throttle::PartialThrottle;
use super::transport::Transport;
use crate::recognizer::{Decoder, Hypothesis};
use crate::session::{FinalizeTrigger, SessionState, SessionSummary};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of handling one inbound message while `Listening`
enum Step {
    Continue,
    Finish(FinalizeTrigger),
}

/// Per-connection control loop.
///
/// Owns the session state, the decoder and the transport for the whole
/// life of the connection; nothing else touches them.
pub struct StreamHandler<T: Transport> {
    session: SessionState,
    decoder: Option<Box<dyn Decoder>>,
    transport: T,
    throttle: PartialThrottle,
    finalizer: Finalizer,
    idle_timeout: Duration,
    shutdown: CancellationToken,
}

impl<T: Transport> StreamHandler<T> {
    pub fn new(
        session: SessionState,
        decoder: Box<dyn Decoder>,
        transport: T,
        throttle: PartialThrottle,
        finalizer: Finalizer,
        idle_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session,
            decoder: Some(decoder),
            transport,
            throttle,
            finalizer,
            idle_timeout,
            shutdown,
        }
    }

    /// Announce the session id, listen until a finalize trigger fires, then finalize.
    pub async fn run(mut self) -> Option<SessionSummary> {
        let announce = ServerMessage::SessionId {
            id: self.session.id().to_string(),
        };

        let trigger = match self.transport.send(&announce).await {
            Ok(()) => {
                info!(session_id = %self.session.id(), "Session ID sent to client");
                self.listen().await
            }
            Err(e) => {
                warn!(session_id = %self.session.id(), "Failed to send session ID: {:#}", e);
                FinalizeTrigger::Disconnect
            }
        };

        self.finalizer
            .finalize(&mut self.session, &mut self.decoder, &mut self.transport, trigger)
            .await
    }

    async fn listen(&mut self) -> FinalizeTrigger {
        loop {
            let inbound = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(session_id = %self.session.id(), "Server shutting down, ending session");
                    return FinalizeTrigger::Shutdown;
                }
                received = tokio::time::timeout(self.idle_timeout, self.transport.recv()) => {
                    match received {
                        Ok(inbound) => inbound,
                        Err(_) => {
                            info!(
                                session_id = %self.session.id(),
                                "No data for {:?}, ending session", self.idle_timeout
                            );
                            return FinalizeTrigger::IdleTimeout;
                        }
                    }
                }
            };

            match self.dispatch(inbound).await {
                Step::Continue => continue,
                Step::Finish(trigger) => return trigger,
            }
        }
    }

    async fn dispatch(&mut self, inbound: Inbound) -> Step {
        match inbound {
            Inbound::AudioChunk(chunk) => self.process_audio(&chunk).await,
            Inbound::EndSentinel => Step::Finish(FinalizeTrigger::EndSentinel),
            Inbound::EndControl => Step::Finish(FinalizeTrigger::EndControl),
            Inbound::Disconnect => Step::Finish(FinalizeTrigger::Disconnect),
            Inbound::Malformed(reason) => {
                warn!(session_id = %self.session.id(), "Ignoring message: {}", reason);
                Step::Continue
            }
        }
    }

    async fn process_audio(&mut self, chunk: &[u8]) -> Step {
        let sequence = self.session.record_audio_chunk();

        let Some(decoder) = self.decoder.as_mut() else {
            return Step::Continue;
        };

        let result = decoder.feed(chunk).await;
        match result {
            Ok(hypothesis) => self.route_hypothesis(hypothesis).await,
            Err(e) => {
                warn!(
                    session_id = %self.session.id(),
                    sequence,
                    "Decoder failed on audio chunk: {:#}", e
                );
                self.send_or_disconnect(ServerMessage::Error {
                    text: format!("Failed to process audio chunk: {}", e),
                })
                .await
            }
        }
    }

    async fn route_hypothesis(&mut self, hypothesis: Hypothesis) -> Step {
        let now = Instant::now();

        match hypothesis {
            Hypothesis::Partial(text) => {
                let text = text.trim();
                if !self.throttle.offer(&mut self.session, text, now) {
                    return Step::Continue;
                }
                self.send_or_disconnect(ServerMessage::Partial {
                    text: text.to_string(),
                })
                .await
            }
            Hypothesis::Final(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Step::Continue;
                }
                self.session.append_final(text, now);
                debug!(session_id = %self.session.id(), "Final segment: {}", text);
                self.send_or_disconnect(ServerMessage::segment(text)).await
            }
        }
    }

    /// A failed send means the peer is gone
    async fn send_or_disconnect(&mut self, message: ServerMessage) -> Step {
        match self.transport.send(&message).await {
            Ok(()) => Step::Continue,
            Err(e) => {
                debug!(session_id = %self.session.id(), "Send failed, treating as disconnect: {:#}", e);
                Step::Finish(FinalizeTrigger::Disconnect)
            }
        }
    }
}
