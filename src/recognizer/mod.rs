//! Incremental speech recognizer adapter
//!
//! The decoder itself is an external collaborator. The core only needs:
//! - `RecognizerEngine::create_decoder` to allocate one context per session
//! - `Decoder::feed` for each audio chunk, in receipt order
//! - `Decoder::flush` once at end of stream

pub mod messages;
pub mod nats;

use anyhow::Result;

pub use messages::{DecodeReply, DecodeRequest};
pub use nats::{NatsDecoder, NatsRecognizer};

/// Result of feeding one chunk to a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hypothesis {
    /// Tentative text for audio not yet confirmed complete
    Partial(String),
    /// Text the decoder will not revise further
    Final(String),
}

/// One incremental recognition context. Never shared between sessions;
/// `&mut self` keeps calls ordered and exclusive.
#[async_trait::async_trait]
pub trait Decoder: Send {
    /// Feed raw 16 kHz mono s16le PCM
    async fn feed(&mut self, chunk: &[u8]) -> Result<Hypothesis>;

    /// Drain trailing finalized text. Later calls may return an empty string.
    async fn flush(&mut self) -> Result<String>;
}

/// Factory for decoders
#[async_trait::async_trait]
pub trait RecognizerEngine: Send + Sync {
    /// Allocate a fresh decoder for `session_id`. Failure is fatal to the session.
    async fn create_decoder(&self, session_id: &str) -> Result<Box<dyn Decoder>>;

    /// Engine name for logging
    fn name(&self) -> &str;
}
