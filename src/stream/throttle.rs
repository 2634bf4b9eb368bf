use crate::session::{count_words, SessionConfig, SessionState};
use std::time::Duration;
use tokio::time::Instant;

/// Rate limit for partial hypotheses.
///
/// A changed, non-empty partial goes out when it grew by at least
/// `min_word_delta` words over the last emitted one, or when the last
/// emission is at least `max_interval` old.
#[derive(Debug, Clone, Copy)]
pub struct PartialThrottle {
    pub min_word_delta: usize,
    pub max_interval: Duration,
}

impl Default for PartialThrottle {
    fn default() -> Self {
        Self {
            min_word_delta: 2,
            max_interval: Duration::from_secs(1),
        }
    }
}

impl PartialThrottle {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            min_word_delta: config.partial_min_word_delta,
            max_interval: config.partial_max_interval,
        }
    }

    pub fn should_emit(
        &self,
        current: &str,
        last_emitted: &str,
        last_emit_time: Instant,
        now: Instant,
    ) -> bool {
        if current.is_empty() || current == last_emitted {
            return false;
        }

        // Signed: a revised partial may be shorter than the last one
        let word_delta = count_words(current) as i64 - count_words(last_emitted) as i64;
        let elapsed = now.saturating_duration_since(last_emit_time);

        word_delta >= self.min_word_delta as i64 || elapsed >= self.max_interval
    }

    /// Decide for `current` against the session's bookkeeping, updating it on emit
    pub fn offer(&self, session: &mut SessionState, current: &str, now: Instant) -> bool {
        let emit = self.should_emit(
            current,
            session.last_partial_text(),
            session.last_emit_time(),
            now,
        );
        if emit {
            session.record_partial_emit(current, now);
        }
        emit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn empty_or_unchanged_is_suppressed() {
        let throttle = PartialThrottle::default();
        let t0 = Instant::now();

        assert!(!throttle.should_emit("", "", t0, t0 + ms(5000)));
        assert!(!throttle.should_emit("hi there", "hi there", t0, t0 + ms(5000)));
    }

    #[tokio::test]
    async fn two_new_words_emit_immediately() {
        let throttle = PartialThrottle::default();
        let t0 = Instant::now();

        assert!(throttle.should_emit("hi there friend", "hi", t0, t0 + ms(10)));
        assert!(!throttle.should_emit("hi there", "hi", t0, t0 + ms(10)));
    }

    #[tokio::test]
    async fn stale_partial_ages_out() {
        let throttle = PartialThrottle::default();
        let t0 = Instant::now();

        assert!(!throttle.should_emit("hi there", "hi", t0, t0 + ms(999)));
        assert!(throttle.should_emit("hi there", "hi", t0, t0 + ms(1000)));
        // Shrinking revision still goes out once stale
        assert!(throttle.should_emit("hi", "hi there", t0, t0 + ms(1000)));
        assert!(!throttle.should_emit("hi", "hi there", t0, t0 + ms(200)));
    }

    #[tokio::test]
    async fn scripted_partials_follow_last_emitted() {
        let throttle = PartialThrottle::default();
        let mut session = SessionState::new("throttle");
        let t0 = session.start_time();

        // (text, offset from session start, expected)
        let script = [
            ("hi", 1000, true),
            ("hi there", 1200, false),
            ("hi there friend now", 1300, true),
            ("hi there friend now ok", 1500, false),
            ("hi there friend now", 2500, false),
            ("hi there friend now ok", 2500, true),
        ];

        let emitted: Vec<bool> = script
            .iter()
            .map(|(text, offset, _)| throttle.offer(&mut session, text, t0 + ms(*offset)))
            .collect();
        let expected: Vec<bool> = script.iter().map(|(_, _, e)| *e).collect();

        assert_eq!(emitted, expected);
        assert_eq!(session.last_partial_text(), "hi there friend now ok");
        assert_eq!(session.last_emit_time(), t0 + ms(2500));
    }

    #[tokio::test]
    async fn configured_thresholds_are_used() {
        let config = SessionConfig {
            partial_min_word_delta: 1,
            partial_max_interval: ms(250),
            ..SessionConfig::default()
        };
        let throttle = PartialThrottle::from_config(&config);
        let t0 = Instant::now();

        assert!(throttle.should_emit("hi there", "hi", t0, t0 + ms(10)));
        assert!(throttle.should_emit("hi", "hey", t0, t0 + ms(250)));
    }
}
