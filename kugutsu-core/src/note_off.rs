//! Deferred note-offs on a background timer thread.
//!
//! The step loop hands each note-off to the timer over a channel and moves
//! on; the timer thread keeps a min-heap of deadlines and fires them against
//! the shared sink. Failures are logged and dropped.
//!
//! Deadlines are read from the engine's [`Clock`], so on a virtual clock a
//! note-off fires once virtual time passes its deadline.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::clock::Clock;
use crate::sink::OutputSink;

/// Longest the timer thread waits before re-reading the clock.
const MAX_WAIT: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PendingOff {
    due: Duration,
    seq: u64,
    channel: u8,
    pitch: u8,
}

pub struct NoteOffTimer {
    clock: Arc<dyn Clock>,
    tx: Option<Sender<PendingOff>>,
    seq: u64,
    join_handle: Option<JoinHandle<()>>,
}

impl NoteOffTimer {
    pub fn new(sink: Arc<dyn OutputSink>, clock: Arc<dyn Clock>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let timer_clock = Arc::clone(&clock);
        let join_handle = thread::Builder::new()
            .name("kugutsu-note-off".to_string())
            .spawn(move || run_timer(rx, sink, timer_clock))
            .map_err(|e| log::error!(target: "engine", "note-off timer unavailable: {}", e))
            .ok();
        Self {
            clock,
            tx: Some(tx),
            seq: 0,
            join_handle,
        }
    }

    /// Queue a note-off `after` from now. Never blocks.
    pub fn schedule(&mut self, channel: u8, pitch: u8, after: Duration) {
        self.seq = self.seq.wrapping_add(1);
        let pending = PendingOff {
            due: self.clock.now() + after,
            seq: self.seq,
            channel,
            pitch,
        };
        if let Some(tx) = &self.tx {
            if tx.send(pending).is_err() {
                log::debug!(target: "engine", "note-off timer gone, dropping note-off for {}", pitch);
            }
        }
    }
}

impl Drop for NoteOffTimer {
    fn drop(&mut self) {
        // Closing the channel lets the timer flush what is queued and exit.
        self.tx.take();
        if let Some(handle) = self.join_handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_timer(rx: Receiver<PendingOff>, sink: Arc<dyn OutputSink>, clock: Arc<dyn Clock>) {
    let mut heap: BinaryHeap<Reverse<PendingOff>> = BinaryHeap::new();

    loop {
        let received = match heap.peek() {
            Some(Reverse(next)) => {
                let wait = next.due.saturating_sub(clock.now());
                rx.recv_timeout(wait.min(MAX_WAIT))
            }
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(pending) => heap.push(Reverse(pending)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                for Reverse(pending) in heap.drain() {
                    fire(&*sink, pending);
                }
                return;
            }
        }

        let now = clock.now();
        while let Some(Reverse(next)) = heap.peek() {
            if next.due > now {
                break;
            }
            if let Some(Reverse(pending)) = heap.pop() {
                fire(&*sink, pending);
            }
        }
    }
}

fn fire(sink: &dyn OutputSink, pending: PendingOff) {
    if let Err(e) = sink.note_off(pending.channel, pending.pitch) {
        log::debug!(target: "engine", "note-off {} failed: {}", pending.pitch, e);
    }
}
