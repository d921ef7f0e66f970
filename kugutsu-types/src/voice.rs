//! Voices the engine triggers and how they map onto output pitches.

use serde::{Deserialize, Serialize};

/// A drum voice, independent of the note number it is sent as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Kick,
    Snare,
    Hihat,
    OpenHat,
    Clap,
    Perc,
}

impl Voice {
    pub fn all() -> &'static [Voice] {
        &[
            Voice::Kick,
            Voice::Snare,
            Voice::Hihat,
            Voice::OpenHat,
            Voice::Clap,
            Voice::Perc,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Kick => "kick",
            Voice::Snare => "snare",
            Voice::Hihat => "hihat",
            Voice::OpenHat => "open_hat",
            Voice::Clap => "clap",
            Voice::Perc => "perc",
        }
    }
}

/// Note numbers for each drum voice on the output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrumMap {
    pub kick: u8,
    pub snare: u8,
    pub hihat: u8,
    pub open_hat: u8,
    pub clap: u8,
    pub perc: u8,
}

impl Default for DrumMap {
    fn default() -> Self {
        Self {
            kick: 36,
            snare: 37,
            hihat: 38,
            open_hat: 39,
            clap: 43,
            perc: 44,
        }
    }
}

impl DrumMap {
    pub fn note(&self, voice: Voice) -> u8 {
        match voice {
            Voice::Kick => self.kick,
            Voice::Snare => self.snare,
            Voice::Hihat => self.hihat,
            Voice::OpenHat => self.open_hat,
            Voice::Clap => self.clap,
            Voice::Perc => self.perc,
        }
    }
}

/// How hits become pitches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voicing {
    /// Fixed note per drum voice.
    Drums(DrumMap),
    /// Melodic: each hit picks a scale degree the activity source is not
    /// currently sounding.
    Scale(Vec<u8>),
}

impl Default for Voicing {
    fn default() -> Self {
        Voicing::Drums(DrumMap::default())
    }
}
