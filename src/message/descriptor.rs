use base64::prelude::BASE64_STANDARD;
use base64::Engine as _;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::audio::envelope::Envelope;

/// Message flag marking an upload as a voice message.
pub const VOICE_MESSAGE_FLAG: u32 = 1 << 13;

/// Snowflake epoch: 2015-01-01T00:00:00Z in Unix milliseconds.
const SNOWFLAKE_EPOCH_MS: u64 = 1_420_070_400_000;

/// One attachment entry of an outbound voice message. `waveform` and
/// `duration_secs` carry the envelope; `uploaded_filename` is filled in by
/// the transport once the blob is stored.
#[derive(Clone, Debug, Serialize)]
pub struct VoiceAttachment {
    pub id: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_filename: Option<String>,
    pub waveform: String,
    pub duration_secs: f64,
}

impl VoiceAttachment {
    pub fn from_envelope(envelope: &Envelope, filename: &str) -> Self {
        Self {
            id: "0".to_string(),
            filename: filename.to_string(),
            uploaded_filename: None,
            waveform: BASE64_STANDARD.encode(&envelope.bins),
            duration_secs: envelope.duration_seconds,
        }
    }
}

/// Outbound voice-message body. Routing fields (channel, reply reference)
/// belong to the transport and are merged in by it.
#[derive(Clone, Debug, Serialize)]
pub struct VoiceMessagePayload {
    pub flags: u32,
    pub content: String,
    pub nonce: String,
    #[serde(rename = "type")]
    pub message_type: u8,
    pub attachments: Vec<VoiceAttachment>,
}

impl VoiceMessagePayload {
    pub fn new(attachment: VoiceAttachment) -> Self {
        Self {
            flags: VOICE_MESSAGE_FLAG,
            content: String::new(),
            nonce: current_nonce(),
            message_type: 0,
            attachments: vec![attachment],
        }
    }
}

/// Snowflake built from a millisecond Unix timestamp.
pub fn nonce_from_timestamp(unix_ms: u64) -> String {
    (unix_ms.saturating_sub(SNOWFLAKE_EPOCH_MS) << 22).to_string()
}

fn current_nonce() -> String {
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    nonce_from_timestamp(unix_ms)
}
