//! Stopped/Playing transport, driven from outside the step loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use kugutsu_types::PlaybackState;

use crate::sink::{all_notes_off, OutputSink};

/// Transport for one performance session at a time.
///
/// `start` and `stop` may be called from any thread. The step loop polls
/// [`PlaybackController::is_playing`] once per step and
/// [`PlaybackController::session`] once per bar; a new session number means
/// `start` happened and bar/energy state must be reset.
pub struct PlaybackController {
    state: Mutex<PlaybackState>,
    playing: AtomicBool,
    session: AtomicU64,
    sink: Arc<dyn OutputSink>,
}

impl PlaybackController {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self {
            state: Mutex::new(PlaybackState::Stopped),
            playing: AtomicBool::new(false),
            session: AtomicU64::new(0),
            sink,
        }
    }

    /// Stopped -> Playing. Returns `false` (and does nothing) if already playing.
    pub fn start(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.is_playing() {
            return false;
        }
        let session = self.session.fetch_add(1, Ordering::SeqCst) + 1;
        *state = PlaybackState::Playing;
        self.playing.store(true, Ordering::SeqCst);
        log::info!(target: "engine", "playback started (session {})", session);
        true
    }

    /// Playing -> Stopped, then silence every channel. Returns `false` (and
    /// sends nothing) if already stopped.
    pub fn stop(&self) -> bool {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if !state.is_playing() {
                return false;
            }
            *state = PlaybackState::Stopped;
            self.playing.store(false, Ordering::SeqCst);
        }
        if let Err(e) = all_notes_off(&*self.sink) {
            log::warn!(target: "engine", "all-notes-off incomplete: {}", e);
        }
        log::info!(target: "engine", "playback stopped");
        true
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of `start` transitions so far.
    pub fn session(&self) -> u64 {
        self.session.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{SinkOp, TestSink};

    fn controller() -> (Arc<TestSink>, PlaybackController) {
        let sink = Arc::new(TestSink::new());
        let controller = PlaybackController::new(sink.clone());
        (sink, controller)
    }

    #[test]
    fn starts_stopped() {
        let (_, c) = controller();
        assert_eq!(c.state(), PlaybackState::Stopped);
        assert!(!c.is_playing());
        assert_eq!(c.session(), 0);
    }

    #[test]
    fn start_opens_a_session() {
        let (_, c) = controller();
        assert!(c.start());
        assert!(c.is_playing());
        assert_eq!(c.session(), 1);
    }

    #[test]
    fn start_while_playing_is_a_noop() {
        let (_, c) = controller();
        c.start();
        assert!(!c.start());
        assert_eq!(c.session(), 1);
    }

    #[test]
    fn stop_silences_every_channel_once() {
        let (sink, c) = controller();
        c.start();
        assert!(c.stop());
        assert!(!c.is_playing());
        let ops = sink.operations();
        assert_eq!(ops.len(), 16);
        for ch in 0..16u8 {
            assert!(ops.contains(&SinkOp::ControlChange { channel: ch, controller: 123, value: 0 }));
        }
    }

    #[test]
    fn stop_while_stopped_sends_nothing() {
        let (sink, c) = controller();
        assert!(!c.stop());
        c.start();
        c.stop();
        assert!(!c.stop());
        assert_eq!(sink.operations().len(), 16);
    }

    #[test]
    fn restart_opens_a_new_session() {
        let (_, c) = controller();
        c.start();
        c.stop();
        c.start();
        assert_eq!(c.session(), 2);
    }

    #[test]
    fn stop_survives_a_dead_sink() {
        let sink = Arc::new(TestSink::failing());
        let c = PlaybackController::new(sink.clone());
        c.start();
        assert!(c.stop());
        assert_eq!(sink.count(SinkOp::is_all_notes_off), 16);
    }
}
