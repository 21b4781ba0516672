//! Push-message contract for the server connection.
//!
//! The server sends tagged JSON payloads of the form
//! `{"type": "...", "data": {...}}`. Malformed frames are a normal
//! occurrence (taxonomy-wise they are logged and dropped by the caller),
//! so parsing returns an error instead of panicking.

use crate::error::Result;
use crate::track::Cue;
use serde::Deserialize;

/// A cue as it appears on the wire: fractional seconds plus text.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCue {
    pub time: f64,
    pub text: String,
}

impl From<WireCue> for Cue {
    fn from(wire: WireCue) -> Self {
        Cue::new(wire.time, wire.text)
    }
}

/// Every push message the server can send, exhaustively matched downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Direct override of the displayed window, bypassing the local clock.
    /// Used for manual/live triggering.
    LyricUpdate {
        current_lyric: Option<String>,
        #[serde(default)]
        next_lyrics: Vec<String>,
    },
    /// A song is starting: full reset of track, cursor, and clock.
    SongStart {
        song_id: String,
        title: String,
        timecodes: Vec<WireCue>,
    },
}

impl ServerMessage {
    /// Parse a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedMessage`](crate::CoreError::MalformedMessage)
    /// when the frame is not valid JSON or does not match the contract.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
