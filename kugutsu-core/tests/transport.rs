mod common;

use std::sync::Arc;

use kugutsu_core::config::EngineConfig;
use kugutsu_core::sink::SinkOp;
use kugutsu_types::PlaybackState;

use common::{hold_notes, make_engine, manual_engine, StoppingClock};

#[test]
fn stop_mid_bar_silences_every_channel_once() {
    let clock = Arc::new(StoppingClock::new(6));
    let (mut engine, sink) = make_engine(EngineConfig::default(), 21, clock.clone());
    clock.arm(engine.controller());
    hold_notes(&engine, 3);
    engine.controller().start();

    let report = engine.play_bar();
    assert!(!report.completed);
    assert!(report.step_offsets.len() < 16);
    assert_eq!(engine.scheduler().bar_index(), 0);
    assert_eq!(engine.controller().state(), PlaybackState::Stopped);

    let ops = sink.operations();
    let panic: Vec<u8> = ops
        .iter()
        .filter_map(|op| match op {
            SinkOp::ControlChange { channel, controller: 123, value: 0 } => Some(*channel),
            _ => None,
        })
        .collect();
    assert_eq!(panic, (0..16).collect::<Vec<u8>>());

    let first_panic = ops.iter().position(SinkOp::is_all_notes_off).unwrap();
    assert!(ops[first_panic..].iter().all(|op| !op.is_note_on()));
}

#[test]
fn no_hits_while_stopped() {
    let (mut engine, sink, _clock) = manual_engine(2);
    hold_notes(&engine, 5);
    for _ in 0..4 {
        let report = engine.play_bar();
        assert!(!report.completed);
    }
    assert!(sink.operations().is_empty());
}

#[test]
fn repeated_start_and_stop_are_no_ops() {
    let (engine, sink, _clock) = manual_engine(2);
    let controller = engine.controller();

    assert!(!controller.stop());
    assert!(sink.operations().is_empty());

    assert!(controller.start());
    assert!(!controller.start());
    assert_eq!(controller.session(), 1);

    assert!(controller.stop());
    assert!(!controller.stop());
    assert_eq!(sink.count(SinkOp::is_all_notes_off), 16);
}

#[test]
fn restart_begins_at_bar_zero_with_fresh_energy() {
    let (mut engine, _sink, _clock) = manual_engine(8);
    hold_notes(&engine, 6);
    engine.controller().start();
    for _ in 0..5 {
        engine.play_bar();
    }
    assert_eq!(engine.scheduler().bar_index(), 5);
    assert!(engine.scheduler().energy() > 0.8);

    engine.controller().stop();
    engine.controller().start();
    hold_notes(&engine, 0);
    let report = engine.play_bar();
    assert_eq!(report.bar_index, 0);
    assert!(report.rotated);
    assert!((report.energy - 0.35).abs() < 1e-6);
}
