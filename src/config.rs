use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::session::SessionConfig;

/// Prefix for environment overrides, e.g. `STREAMSCRIBE__SERVICE__HTTP__PORT=9000`
const ENV_PREFIX: &str = "STREAMSCRIBE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recognizer: RecognizerConfig,
    pub storage: StorageConfig,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecognizerConfig {
    pub nats_url: String,
    pub subject_prefix: String,
    pub sample_rate: u32,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// SQLite file, or `:memory:` for a throwaway database
    pub database_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub idle_timeout_secs: u64,
    pub partial_min_word_delta: usize,
    pub partial_max_interval_ms: u64,
    pub empty_transcript_placeholder: String,
}

impl Config {
    /// Load configuration from defaults, an optional file at `path`, then the environment.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "streamscribe")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8000)?
            .set_default("service.http.cors_origins", vec!["http://localhost:3000"])?
            .set_default("recognizer.nats_url", "nats://localhost:4222")?
            .set_default("recognizer.subject_prefix", "stt.decode")?
            .set_default("recognizer.sample_rate", 16000)?
            .set_default("recognizer.request_timeout_ms", 5000)?
            .set_default("storage.database_path", "transcriptions.db")?
            .set_default("stream.idle_timeout_secs", 30)?
            .set_default("stream.partial_min_word_delta", 2)?
            .set_default("stream.partial_max_interval_ms", 1000)?
            .set_default(
                "stream.empty_transcript_placeholder",
                "no transcript produced",
            )?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to build configuration from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Per-session settings derived from the `[stream]` section
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            idle_timeout: Duration::from_secs(self.stream.idle_timeout_secs),
            partial_min_word_delta: self.stream.partial_min_word_delta,
            partial_max_interval: Duration::from_millis(self.stream.partial_max_interval_ms),
            empty_transcript_placeholder: self.stream.empty_transcript_placeholder.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.recognizer.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_file() {
        let cfg = Config::load("does/not/exist/streamscribe").unwrap();
        assert_eq!(cfg.service.name, "streamscribe");
        assert_eq!(cfg.service.http.port, 8000);
        assert_eq!(cfg.stream.idle_timeout_secs, 30);
        assert_eq!(cfg.stream.partial_min_word_delta, 2);
        assert_eq!(cfg.recognizer.subject_prefix, "stt.decode");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join("streamscribe.toml")).unwrap();
        writeln!(
            file,
            "[service.http]\nport = 9100\n\n[stream]\nidle_timeout_secs = 5\n"
        )
        .unwrap();

        // config::File::with_name resolves the extension itself
        let path = dir.path().join("streamscribe");
        let cfg = Config::load(path.to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.http.port, 9100);
        assert_eq!(cfg.service.http.bind, "0.0.0.0");

        let session = cfg.session_config();
        assert_eq!(session.idle_timeout, Duration::from_secs(5));
        assert_eq!(session.partial_max_interval, Duration::from_millis(1000));
    }
}
