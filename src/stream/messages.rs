use serde::{Deserialize, Serialize};

/// Reserved binary payload meaning "end of stream"
pub const END_SENTINEL: &[u8] = b"__END__";

/// The only control action clients may send
const END_AUDIO_ACTION: &str = "end_audio";

/// Inbound traffic, classified once at the transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Raw 16 kHz mono s16le PCM
    AudioChunk(Vec<u8>),
    /// Binary `__END__`
    EndSentinel,
    /// `{"action": "end_audio"}`
    EndControl,
    /// Transport closed or failed while waiting for the next message
    Disconnect,
    /// Anything else; carries a description for the log
    Malformed(String),
}

#[derive(Debug, Deserialize)]
struct ControlMessage {
    action: String,
}

impl Inbound {
    pub fn from_binary(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Inbound::Malformed("empty binary frame".to_string())
        } else if bytes == END_SENTINEL {
            Inbound::EndSentinel
        } else {
            Inbound::AudioChunk(bytes)
        }
    }

    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<ControlMessage>(text) {
            Ok(control) if control.action == END_AUDIO_ACTION => Inbound::EndControl,
            Ok(control) => Inbound::Malformed(format!("unknown action '{}'", control.action)),
            Err(e) => Inbound::Malformed(format!("invalid control message: {}", e)),
        }
    }
}

/// Extra fields carried only by the terminal `final` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCompletion {
    pub session_complete: bool,
    pub complete_transcript: String,
    pub word_count: usize,
}

/// Server → client protocol messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    SessionId {
        id: String,
    },
    Partial {
        text: String,
    },
    Final {
        text: String,
        #[serde(flatten)]
        completion: Option<SessionCompletion>,
    },
    Error {
        text: String,
    },
}

impl ServerMessage {
    /// Mid-stream finalized segment
    pub fn segment(text: impl Into<String>) -> Self {
        ServerMessage::Final {
            text: text.into(),
            completion: None,
        }
    }

    /// Terminal message of a session
    pub fn session_complete(
        trailing_text: impl Into<String>,
        complete_transcript: impl Into<String>,
        word_count: usize,
    ) -> Self {
        ServerMessage::Final {
            text: trailing_text.into(),
            completion: Some(SessionCompletion {
                session_complete: true,
                complete_transcript: complete_transcript.into(),
                word_count,
            }),
        }
    }

    pub fn is_session_complete(&self) -> bool {
        matches!(
            self,
            ServerMessage::Final {
                completion: Some(SessionCompletion {
                    session_complete: true,
                    ..
                }),
                ..
            }
        )
    }
}
