//! Active-note bookkeeping for the activity source.
//!
//! The MIDI input callback writes from its own thread while the scheduler
//! reads once per bar, so the set lives behind a mutex. Lock hold times are
//! a single insert/remove or a copy of at most 128 pitches.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use kugutsu_types::NoteEvent;

/// Tracks which pitches the activity source is currently sounding.
pub struct DensityTracker {
    channel: Option<u8>,
    active: Mutex<BTreeSet<u8>>,
}

impl DensityTracker {
    /// `channel` filters incoming events; `None` accepts every channel.
    pub fn new(channel: Option<u8>) -> Self {
        Self {
            channel,
            active: Mutex::new(BTreeSet::new()),
        }
    }

    /// Apply one event. Events from other channels are dropped.
    pub fn on_event(&self, event: NoteEvent) {
        if let Some(ch) = self.channel {
            if event.channel != ch {
                return;
            }
        }
        let mut active = self.lock();
        if event.sounds() {
            active.insert(event.pitch);
        } else {
            active.remove(&event.pitch);
        }
    }

    /// Apply a raw MIDI message; anything that is not a complete note
    /// message is discarded.
    pub fn on_midi(&self, data: &[u8]) {
        if let Some(event) = NoteEvent::from_midi(data) {
            self.on_event(event);
        }
    }

    /// Number of pitches sounding right now.
    pub fn snapshot_density(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the sounding pitches, ascending.
    pub fn snapshot_pitches(&self) -> Vec<u8> {
        self.lock().iter().copied().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<u8>> {
        // A panic while holding the lock cannot leave the set half-written.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
