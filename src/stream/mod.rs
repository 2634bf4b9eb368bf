//! Per-connection streaming transcription
//!
//! A connection runs one `StreamHandler` task:
//! - audio frames are fed to the session's decoder in receipt order
//! - partial hypotheses go through `PartialThrottle`, finals are sent as-is
//! - end sentinel, end control message, idle timeout or disconnect finalize
//!   the session exactly once through `Finalizer`
//! - server shutdown cancels every live handler, which then finalizes normally

mod finalizer;
mod handler;
mod messages;
mod throttle;
mod transport;

use crate::recognizer::Decoder;
use crate::session::{ActiveSession, SessionConfig, SessionRegistry, SessionState, SessionSummary};
use crate::store::SessionStore;
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use tracing::info;

pub use finalizer::Finalizer;
pub use handler::StreamHandler;
pub use messages::{Inbound, ServerMessage, SessionCompletion, END_SENTINEL};
pub use throttle::PartialThrottle;
pub use transport::{ChannelClient, ChannelTransport, ClientFrame, Transport};

/// Shared collaborators handed to every connection
#[derive(Clone)]
pub struct StreamServices {
    pub registry: SessionRegistry,
    pub store: Arc<dyn SessionStore>,
    pub config: SessionConfig,
    shutdown: CancellationToken,
    sessions: TaskTracker,
}

impl StreamServices {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            store,
            config,
            shutdown: CancellationToken::new(),
            sessions: TaskTracker::new(),
        }
    }

    /// Hold one of these for as long as a connection may still finalize
    pub fn track_session(&self) -> TaskTrackerToken {
        self.sessions.token()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Tell every live handler to finalize, and stop admitting new sessions
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.sessions.close();
    }

    /// Resolves once `shutdown` was called and every tracked session finished
    pub async fn wait_for_sessions(&self) {
        self.sessions.wait().await;
    }

    pub fn finalizer(&self) -> Finalizer {
        Finalizer::new(
            Arc::clone(&self.store),
            self.registry.clone(),
            self.config.empty_transcript_placeholder.clone(),
        )
    }
}

/// Run one streaming session to completion over `transport`.
///
/// `decoder` must already be allocated for `session_id`. Fails without
/// sending anything if the id is already live.
pub async fn serve_connection<T: Transport>(
    services: &StreamServices,
    session_id: String,
    decoder: Box<dyn Decoder>,
    transport: T,
) -> Result<SessionSummary> {
    let _tracked = services.track_session();
    if services.is_shutting_down() {
        bail!("Refusing session {}: server is shutting down", session_id);
    }

    let session = SessionState::new(session_id);

    let registered = services
        .registry
        .register(ActiveSession {
            session_id: session.id().to_string(),
            started_at: session.started_at(),
        })
        .await;
    if !registered {
        bail!("Session {} is already live", session.id());
    }

    info!(session_id = %session.id(), "New streaming connection");

    let session_id = session.id().to_string();
    let handler = StreamHandler::new(
        session,
        decoder,
        transport,
        PartialThrottle::from_config(&services.config),
        services.finalizer(),
        services.config.idle_timeout,
        services.shutdown.clone(),
    );

    handler
        .run()
        .await
        .ok_or_else(|| anyhow!("Session {} was finalized elsewhere", session_id))
}
