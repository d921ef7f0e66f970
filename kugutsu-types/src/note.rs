use serde::{Deserialize, Serialize};

/// A note-on or note-off observed on the activity source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
    pub is_on: bool,
}

impl NoteEvent {
    pub fn on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self { channel, pitch, velocity, is_on: true }
    }

    pub fn off(channel: u8, pitch: u8) -> Self {
        Self { channel, pitch, velocity: 0, is_on: false }
    }

    /// Parse a raw MIDI message. Only note messages are kept; a note-on with
    /// velocity 0 is a note-off. Short messages and every other status
    /// byte yield `None`.
    pub fn from_midi(data: &[u8]) -> Option<Self> {
        if data.len() < 3 {
            return None;
        }

        let status = data[0];
        let channel = status & 0x0F;
        let pitch = data[1] & 0x7F;
        let velocity = data[2] & 0x7F;

        match status & 0xF0 {
            0x90 if velocity > 0 => Some(Self::on(channel, pitch, velocity)),
            0x90 | 0x80 => Some(Self::off(channel, pitch)),
            _ => None,
        }
    }

    /// Whether this event leaves its pitch sounding.
    pub fn sounds(&self) -> bool {
        self.is_on && self.velocity > 0
    }
}
