//! # kugutsu-types
//!
//! Shared type definitions for the kugutsu rhythm engine.
//! Plain data only: the engine in kugutsu-core and the daemon both build on
//! these, and nothing here touches a clock, a MIDI port or a random source.

mod bar;
mod groove;
mod humanize;
mod note;
mod pattern;
mod playback;
mod voice;

pub use bar::{BarState, MINIMAL_ENERGY, QUIET_ENERGY};
pub use groove::GrooveSettings;
pub use humanize::VelocitySpec;
pub use note::NoteEvent;
pub use pattern::{PatternSet, StepMask, STEPS_PER_BAR};
pub use playback::PlaybackState;
pub use voice::{DrumMap, Voice, Voicing};

/// Number of MIDI channels addressed by the panic broadcast.
pub const MIDI_CHANNELS: u8 = 16;

/// Controller number for "All Notes Off".
pub const CC_ALL_NOTES_OFF: u8 = 123;
