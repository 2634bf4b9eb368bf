use super::handlers::ErrorResponse;
use super::state::AppState;
use crate::stream::{self, Inbound, ServerMessage, Transport};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info};

/// GET /ws/transcribe
/// Stream PCM audio in, receive partial and final transcripts out
pub async fn transcribe_socket(
    State(state): State<AppState>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    if state.services.is_shutting_down() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Server is shutting down".to_string(),
            }),
        )
            .into_response();
    }

    let session_id = uuid::Uuid::new_v4().to_string();

    // Without a decoder the session cannot exist; reject before upgrading
    let decoder = match state.engine.create_decoder(&session_id).await {
        Ok(decoder) => decoder,
        Err(e) => {
            error!(
                engine = state.engine.name(),
                "Failed to allocate decoder for {}: {:#}", session_id, e
            );
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: format!("Speech recognizer unavailable: {}", e),
                }),
            )
                .into_response();
        }
    };

    info!("Accepting streaming connection: {}", session_id);

    let services = state.services.clone();
    // Covers the gap between the upgrade response and the session task starting
    let tracked = services.track_session();
    upgrade
        .on_upgrade(move |socket| async move {
            let _tracked = tracked;
            let transport = WsTransport::new(socket);
            match stream::serve_connection(&services, session_id, decoder, transport).await {
                Ok(summary) => debug!(
                    "Session {} finished ({}, {} words)",
                    summary.session_id, summary.trigger, summary.word_count
                ),
                Err(e) => error!("Streaming session failed: {:#}", e),
            }
        })
        .into_response()
}

/// `Transport` over an axum websocket
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
    stream: SplitStream<WebSocket>,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        Self { sink, stream }
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Inbound {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(bytes))) => return Inbound::from_binary(bytes),
                Some(Ok(Message::Text(text))) => return Inbound::from_text(&text),
                // axum answers pings itself
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return Inbound::Disconnect,
                Some(Err(e)) => {
                    debug!("Websocket receive failed: {}", e);
                    return Inbound::Disconnect;
                }
            }
        }
    }

    async fn send(&mut self, message: &ServerMessage) -> Result<()> {
        let payload = serde_json::to_string(message)?;
        self.sink
            .send(Message::Text(payload))
            .await
            .context("Failed to send websocket message")
    }
}
