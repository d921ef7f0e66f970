//! Output sink trait: the three MIDI commands the engine sends.
//!
//! `MidirSink` in [`crate::midi`] talks to a real port; `TestSink` records
//! everything for assertions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use kugutsu_types::{CC_ALL_NOTES_OFF, MIDI_CHANNELS};

pub type SinkResult<T = ()> = Result<T, SinkError>;

/// The sink could not deliver a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError(pub String);

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SinkError {}

impl From<String> for SinkError {
    fn from(s: String) -> Self {
        SinkError(s)
    }
}

/// Immediate MIDI output. Shared between the step loop, the note-off
/// timer and the playback controller, hence `Send + Sync`.
pub trait OutputSink: Send + Sync {
    fn note_on(&self, channel: u8, pitch: u8, velocity: u8) -> SinkResult;

    fn note_off(&self, channel: u8, pitch: u8) -> SinkResult;

    fn control_change(&self, channel: u8, controller: u8, value: u8) -> SinkResult;
}

/// Send "All Notes Off" on every channel. Every channel is attempted even
/// if some fail; the first failure is returned.
pub fn all_notes_off(sink: &dyn OutputSink) -> SinkResult {
    let mut first_err = None;
    for ch in 0..MIDI_CHANNELS {
        if let Err(e) = sink.control_change(ch, CC_ALL_NOTES_OFF, 0) {
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// ─── Test Sink ──────────────────────────────────────────────────────

/// A command recorded by `TestSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkOp {
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl SinkOp {
    pub fn is_note_on(&self) -> bool {
        matches!(self, SinkOp::NoteOn { .. })
    }

    pub fn is_all_notes_off(&self) -> bool {
        matches!(self, SinkOp::ControlChange { controller: CC_ALL_NOTES_OFF, .. })
    }
}

/// Records every command. Set `fail` to make every call return an error
/// (the call is still recorded).
pub struct TestSink {
    ops: Mutex<Vec<SinkOp>>,
    fail: AtomicBool,
}

impl TestSink {
    pub fn new() -> Self {
        Self {
            ops: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn failing() -> Self {
        let sink = Self::new();
        sink.set_failing(true);
        sink
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All recorded commands, in order.
    pub fn operations(&self) -> Vec<SinkOp> {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn count<F: Fn(&SinkOp) -> bool>(&self, f: F) -> usize {
        self.ops
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|op| f(op))
            .count()
    }

    /// Note-ons only, in order.
    pub fn note_ons(&self) -> Vec<SinkOp> {
        self.operations().into_iter().filter(SinkOp::is_note_on).collect()
    }

    fn record(&self, op: SinkOp) -> SinkResult {
        self.ops.lock().unwrap_or_else(|e| e.into_inner()).push(op);
        if self.fail.load(Ordering::SeqCst) {
            Err(SinkError("test sink unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for TestSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for TestSink {
    fn note_on(&self, channel: u8, pitch: u8, velocity: u8) -> SinkResult {
        self.record(SinkOp::NoteOn { channel, pitch, velocity })
    }

    fn note_off(&self, channel: u8, pitch: u8) -> SinkResult {
        self.record(SinkOp::NoteOff { channel, pitch })
    }

    fn control_change(&self, channel: u8, controller: u8, value: u8) -> SinkResult {
        self.record(SinkOp::ControlChange { channel, controller, value })
    }
}
