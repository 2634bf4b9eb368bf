//! HTTP API server
//!
//! This module provides the websocket streaming endpoint plus read access to
//! finished sessions:
//! - GET /ws/transcribe - Stream audio, receive transcripts
//! - GET /streams - Sessions currently streaming
//! - GET /sessions - Stored sessions, newest first
//! - GET /sessions/:id - One stored session
//! - DELETE /sessions/:id - Delete a stored session
//! - GET /health - Health check

mod handlers;
mod routes;
mod server;
mod state;
mod ws;

pub use handlers::ErrorResponse;
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
pub use ws::WsTransport;
