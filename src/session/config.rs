use std::time::Duration;

/// Per-session streaming settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long the handler waits for the next inbound message before finalizing
    /// Default: 30 seconds
    pub idle_timeout: Duration,

    /// Minimum growth in words that forces a partial through the throttle
    pub partial_min_word_delta: usize,

    /// Maximum age of the last emitted partial before a changed one is sent anyway
    pub partial_max_interval: Duration,

    /// Stored in place of the transcript when a session produced no text
    pub empty_transcript_placeholder: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(30),
            partial_min_word_delta: 2,
            partial_max_interval: Duration::from_secs(1),
            empty_transcript_placeholder: "no transcript produced".to_string(),
        }
    }
}
