use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Lifecycle of a streaming session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Listening,
    Finalizing,
    Closed,
}

/// What ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeTrigger {
    /// Binary `__END__` frame
    EndSentinel,
    /// `{"action": "end_audio"}` text frame
    EndControl,
    /// Nothing received within the idle window
    IdleTimeout,
    /// Peer went away
    Disconnect,
    /// Server is shutting down
    Shutdown,
}

impl FinalizeTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalizeTrigger::EndSentinel => "end_sentinel",
            FinalizeTrigger::EndControl => "end_control",
            FinalizeTrigger::IdleTimeout => "idle_timeout",
            FinalizeTrigger::Disconnect => "disconnect",
            FinalizeTrigger::Shutdown => "shutdown",
        }
    }

    /// Whether the client can still receive the terminal message
    pub fn peer_reachable(&self) -> bool {
        !matches!(self, FinalizeTrigger::Disconnect)
    }
}

impl fmt::Display for FinalizeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-entry latch: the first caller of `try_acquire` wins, everyone after loses.
#[derive(Debug, Default)]
pub struct FinalizeLatch {
    fired: AtomicBool,
}

impl FinalizeLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> bool {
        self.fired
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_acquired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Mutable per-connection record, owned by exactly one stream handler
#[derive(Debug)]
pub struct SessionState {
    id: String,

    /// Wall-clock acceptance time, reported to clients and the store
    started_at: DateTime<Utc>,

    /// Monotonic acceptance time, used for durations
    start_time: Instant,

    /// Finalized text chunks in the order the decoder produced them
    transcript_segments: Vec<String>,

    last_partial_text: String,
    last_emit_time: Instant,

    /// Diagnostic only
    audio_chunks_received: u64,

    lifecycle: LifecycleState,
    latch: FinalizeLatch,
}

impl SessionState {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            started_at: Utc::now(),
            start_time: now,
            transcript_segments: Vec::new(),
            last_partial_text: String::new(),
            last_emit_time: now,
            audio_chunks_received: 0,
            lifecycle: LifecycleState::Listening,
            latch: FinalizeLatch::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn segments(&self) -> &[String] {
        &self.transcript_segments
    }

    pub fn last_partial_text(&self) -> &str {
        &self.last_partial_text
    }

    pub fn last_emit_time(&self) -> Instant {
        self.last_emit_time
    }

    pub fn audio_chunks_received(&self) -> u64 {
        self.audio_chunks_received
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    pub fn record_audio_chunk(&mut self) -> u64 {
        self.audio_chunks_received += 1;
        self.audio_chunks_received
    }

    /// Remember a partial that was actually sent to the client
    pub fn record_partial_emit(&mut self, text: &str, now: Instant) {
        self.last_partial_text.clear();
        self.last_partial_text.push_str(text);
        self.last_emit_time = now;
    }

    /// Append a segment the decoder finalized mid-stream.
    /// The pending partial is superseded by it.
    pub fn append_final(&mut self, text: &str, now: Instant) {
        self.transcript_segments.push(text.to_string());
        self.last_partial_text.clear();
        self.last_emit_time = now;
    }

    /// Append text drained from the decoder at end of stream
    pub fn append_trailing(&mut self, text: &str) {
        self.transcript_segments.push(text.to_string());
    }

    /// The aggregate transcript: segments joined by single spaces
    pub fn aggregate_transcript(&self) -> String {
        self.transcript_segments.join(" ")
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    /// Try to move `Listening -> Finalizing`.
    /// Returns false if finalization already started, in which case nothing changes.
    pub fn begin_finalizing(&mut self) -> bool {
        if !self.latch.try_acquire() {
            return false;
        }
        self.lifecycle = LifecycleState::Finalizing;
        true
    }

    pub fn mark_closed(&mut self) {
        self.lifecycle = LifecycleState::Closed;
    }

    pub fn is_finalized(&self) -> bool {
        self.latch.is_acquired()
    }
}

/// Whitespace-delimited word count
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_admits_only_the_first_caller() {
        let latch = FinalizeLatch::new();
        assert!(latch.try_acquire());
        assert!(!latch.try_acquire());
        assert!(latch.is_acquired());
    }

    #[test]
    fn latch_is_exclusive_across_threads() {
        let latch = std::sync::Arc::new(FinalizeLatch::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let latch = std::sync::Arc::clone(&latch);
                std::thread::spawn(move || latch.try_acquire())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn lifecycle_moves_forward_once() {
        let mut session = SessionState::new("abc");
        assert_eq!(session.lifecycle(), LifecycleState::Listening);

        assert!(!session.is_finalized());
        assert!(session.begin_finalizing());
        assert!(session.is_finalized());
        assert_eq!(session.lifecycle(), LifecycleState::Finalizing);

        session.mark_closed();
        assert!(!session.begin_finalizing());
        assert_eq!(session.lifecycle(), LifecycleState::Closed);
    }

    #[tokio::test]
    async fn final_segment_resets_pending_partial() {
        let mut session = SessionState::new("abc");
        let now = Instant::now();

        session.record_partial_emit("hello wor", now);
        session.append_final("hello world", now);

        assert_eq!(session.last_partial_text(), "");
        assert_eq!(session.segments(), ["hello world".to_string()]);
    }

    #[tokio::test]
    async fn aggregate_joins_segments_in_order() {
        let mut session = SessionState::new("abc");
        let now = Instant::now();
        session.append_final("hello", now);
        session.append_final("big world", now);
        session.append_trailing("again");

        let aggregate = session.aggregate_transcript();
        assert_eq!(aggregate, "hello big world again");
        assert_eq!(count_words(&aggregate), 4);
    }

    #[test]
    fn count_words_ignores_extra_whitespace() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words(" hi  there\tfriend "), 3);
    }
}
