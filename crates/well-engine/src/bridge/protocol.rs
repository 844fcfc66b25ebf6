use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::well::word::Word;

/// Every message crossing the host⇄surface boundary. One transport
/// multiplexes the word-well session and the audio sink, so a single tagged
/// enum covers both; dispatch on the host side routes by message family.
///
/// Tags match the wire names (`type` field, SCREAMING_SNAKE_CASE). Unknown
/// tags decode to [`WireMessage::Unknown`] so protocol evolution never turns
/// into a hard failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    // surface → host (word well)
    #[serde(rename = "READY")]
    Ready,
    #[serde(rename = "ADD_WORD")]
    AddWord { text: String, color: String },
    #[serde(rename = "VOTE_WORD")]
    VoteWord { id: String },
    #[serde(rename = "CLOSE")]
    Close,

    // host → surface (word well)
    #[serde(rename = "UPDATE_WORDS")]
    UpdateWords { words: Vec<Word> },

    // host → audio sink
    #[serde(rename = "PLAY_BEEP")]
    PlayBeep {
        frequency: f32,
        duration: f32,
        volume: f32,
    },
    #[serde(rename = "LOAD_AUDIO")]
    LoadAudio { url: String, name: String },
    #[serde(rename = "PLAY_AUDIO")]
    PlayAudio { name: String, volume: f32 },
    #[serde(rename = "PLAY_SYNTH_NOTE")]
    PlaySynthNote {
        frequency: f32,
        duration: f32,
        volume: f32,
        waveform: String,
    },

    // audio sink → host
    #[serde(rename = "AUDIO_READY")]
    AudioReady,
    #[serde(rename = "AUDIO_LOADED")]
    AudioLoaded { name: String, success: bool },
    #[serde(rename = "AUDIO_INITIALIZED")]
    AudioInitialized { state: String },

    /// Any tag this build doesn't know. Ignored, never fatal.
    #[serde(other)]
    Unknown,
}

impl WireMessage {
    /// Word-well requests a host-side session handler consumes.
    pub fn is_well_request(&self) -> bool {
        matches!(
            self,
            Self::Ready | Self::AddWord { .. } | Self::VoteWord { .. } | Self::Close
        )
    }

    /// Status signals the audio channel consumes.
    pub fn is_audio_status(&self) -> bool {
        matches!(
            self,
            Self::AudioReady | Self::AudioLoaded { .. } | Self::AudioInitialized { .. }
        )
    }

    /// Playback commands sent to the audio sink.
    pub fn is_audio_command(&self) -> bool {
        matches!(
            self,
            Self::PlayBeep { .. }
                | Self::LoadAudio { .. }
                | Self::PlayAudio { .. }
                | Self::PlaySynthNote { .. }
        )
    }

    /// Encode for the wire.
    pub fn to_wire(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode from the wire. Malformed payloads degrade to `Unknown` with a
    /// debug log rather than an error, per the protocol-evolution policy.
    pub fn from_wire(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(msg) => msg,
            Err(err) => {
                log::debug!("ignoring malformed wire message: {err}");
                Self::Unknown
            }
        }
    }
}
