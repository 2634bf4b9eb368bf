pub mod config;
pub mod http;
pub mod recognizer;
pub mod session;
pub mod store;
pub mod stream;

pub use config::Config;
pub use http::{create_router, AppState};
pub use recognizer::{Decoder, Hypothesis, NatsRecognizer, RecognizerEngine};
pub use session::{
    ActiveSession, FinalizeTrigger, LifecycleState, SessionConfig, SessionRegistry, SessionState,
    SessionSummary,
};
pub use store::{MemoryStore, NewSessionRecord, SessionStore, SqliteStore, StoredSession};
pub use stream::{serve_connection, ServerMessage, StreamServices, Transport};
