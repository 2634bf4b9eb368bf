use serde::{Deserialize, Serialize};

/// Audio chunk sent to the decoder service
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeRequest {
    pub session_id: String,
    pub sequence: u64,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    /// Set on the flush request, which carries no audio
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Decoder service reply to a `DecodeRequest`
#[derive(Debug, Serialize, Deserialize)]
pub struct DecodeReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub partial: bool,
}
