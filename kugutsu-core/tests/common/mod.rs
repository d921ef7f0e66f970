#![allow(dead_code)]
//! Test harness utilities for kugutsu-core integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kugutsu_core::clock::{Clock, ManualClock};
use kugutsu_core::config::EngineConfig;
use kugutsu_core::engine::Engine;
use kugutsu_core::playback::PlaybackController;
use kugutsu_core::sink::{SinkOp, TestSink};
use kugutsu_types::NoteEvent;

/// Engine on a virtual clock with a recording sink and a fixed seed.
pub fn make_engine(config: EngineConfig, seed: u64, clock: Arc<dyn Clock>) -> (Engine, Arc<TestSink>) {
    let sink = Arc::new(TestSink::new());
    let config = EngineConfig {
        seed: Some(seed),
        ..config
    };
    let engine = Engine::new(config, sink.clone(), clock).expect("valid test config");
    (engine, sink)
}

pub fn manual_engine(seed: u64) -> (Engine, Arc<TestSink>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let (engine, sink) = make_engine(EngineConfig::default(), seed, clock.clone());
    (engine, sink, clock)
}

/// Replace the held notes with `density` distinct pitches on channel 0.
pub fn hold_notes(engine: &Engine, density: usize) {
    let tracker = engine.tracker();
    tracker.clear();
    for i in 0..density {
        tracker.on_event(NoteEvent::on(0, 40 + i as u8, 100));
    }
}

/// (pitch, velocity) of every note-on, in order.
pub fn note_on_pairs(sink: &TestSink) -> Vec<(u8, u8)> {
    sink.note_ons()
        .into_iter()
        .filter_map(|op| match op {
            SinkOp::NoteOn { pitch, velocity, .. } => Some((pitch, velocity)),
            _ => None,
        })
        .collect()
}

/// Virtual clock that calls `stop` on a controller during its Nth sleep.
pub struct StoppingClock {
    inner: ManualClock,
    sleeps: AtomicUsize,
    stop_at: usize,
    controller: Mutex<Option<Arc<PlaybackController>>>,
}

impl StoppingClock {
    pub fn new(stop_at: usize) -> Self {
        Self {
            inner: ManualClock::new(),
            sleeps: AtomicUsize::new(0),
            stop_at,
            controller: Mutex::new(None),
        }
    }

    pub fn arm(&self, controller: Arc<PlaybackController>) {
        *self.controller.lock().unwrap() = Some(controller);
    }
}

impl Clock for StoppingClock {
    fn now(&self) -> Duration {
        self.inner.now()
    }

    fn sleep_until(&self, deadline: Duration) {
        self.inner.sleep_until(deadline);
        let n = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.stop_at {
            if let Some(controller) = self.controller.lock().unwrap().as_ref() {
                controller.stop();
            }
        }
    }
}
