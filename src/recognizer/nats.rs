use super::messages::{DecodeReply, DecodeRequest};
use super::{Decoder, Hypothesis, RecognizerEngine};
use anyhow::{bail, Context, Result};
use async_nats::Client;
use base64::Engine;
use std::time::Duration;
use tracing::{debug, info};

/// Recognizer backed by a decoder service reachable over NATS request/reply.
///
/// Each session talks to `<subject_prefix>.<session_id>`; the service keeps one
/// recognition context per subject.
pub struct NatsRecognizer {
    client: Client,
    subject_prefix: String,
    sample_rate: u32,
    request_timeout: Duration,
}

impl NatsRecognizer {
    /// Connect to NATS server
    pub async fn connect(
        url: &str,
        subject_prefix: impl Into<String>,
        sample_rate: u32,
        request_timeout: Duration,
    ) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            subject_prefix: subject_prefix.into(),
            sample_rate,
            request_timeout,
        })
    }
}

#[async_trait::async_trait]
impl RecognizerEngine for NatsRecognizer {
    async fn create_decoder(&self, session_id: &str) -> Result<Box<dyn Decoder>> {
        if !matches!(
            self.client.connection_state(),
            async_nats::connection::State::Connected
        ) {
            bail!("NATS connection is not available, cannot allocate decoder");
        }

        Ok(Box::new(NatsDecoder {
            client: self.client.clone(),
            subject: format!("{}.{}", self.subject_prefix, session_id),
            session_id: session_id.to_string(),
            sample_rate: self.sample_rate,
            request_timeout: self.request_timeout,
            sequence: 0,
        }))
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Per-session decoder handle
pub struct NatsDecoder {
    client: Client,
    subject: String,
    session_id: String,
    sample_rate: u32,
    request_timeout: Duration,
    sequence: u64,
}

impl NatsDecoder {
    fn next_request(&mut self, pcm_bytes: &[u8], is_final: bool) -> DecodeRequest {
        let sequence = self.sequence;
        self.sequence += 1;

        DecodeRequest {
            session_id: self.session_id.clone(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate: self.sample_rate,
            final_frame: is_final,
        }
    }

    async fn request(&self, request: &DecodeRequest) -> Result<DecodeReply> {
        let payload = serde_json::to_vec(request)?;

        let reply = tokio::time::timeout(
            self.request_timeout,
            self.client.request(self.subject.clone(), payload.into()),
        )
        .await
        .with_context(|| format!("Decoder request timed out on {}", self.subject))?
        .context("Decoder request failed")?;

        debug!(
            "Decoder reply on {} (seq={}, final={})",
            self.subject, request.sequence, request.final_frame
        );

        serde_json::from_slice(&reply.payload).context("Failed to parse decoder reply")
    }
}

#[async_trait::async_trait]
impl Decoder for NatsDecoder {
    async fn feed(&mut self, chunk: &[u8]) -> Result<Hypothesis> {
        let request = self.next_request(chunk, false);
        let reply = self.request(&request).await?;
        Ok(hypothesis_from_reply(reply))
    }

    async fn flush(&mut self) -> Result<String> {
        let request = self.next_request(&[], true);
        let reply = self.request(&request).await?;
        Ok(reply.text.trim().to_string())
    }
}

fn hypothesis_from_reply(reply: DecodeReply) -> Hypothesis {
    let text = reply.text.trim().to_string();
    if reply.partial {
        Hypothesis::Partial(text)
    } else {
        Hypothesis::Final(text)
    }
}
