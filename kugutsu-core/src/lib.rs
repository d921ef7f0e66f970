//! # kugutsu-core
//!
//! Density-driven rhythm engine. Held notes on a MIDI input set the density,
//! density moves a smoothed energy value, and energy shapes each 16-step bar
//! (swing, humanized velocity, pattern rotation and fills) sent to a MIDI
//! output while the transport is playing.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use kugutsu_core::config::Config;
//! use kugutsu_core::clock::MonotonicClock;
//! use kugutsu_core::engine::Engine;
//! use kugutsu_core::midi::{MidiActivitySource, MidirSink};
//!
//! let config = Config::load()?;
//! let ports = config.ports();
//! let sink = Arc::new(MidirSink::connect(&ports.output, &ports.virtual_output)?);
//! let engine = Engine::new(config.engine()?, sink, Arc::new(MonotonicClock::new()))?;
//! let _input = MidiActivitySource::connect(&ports.input, &ports.virtual_input, engine.tracker())?;
//!
//! let handle = engine.spawn()?;
//! handle.controller().start();
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: TOML configuration: embedded defaults plus a user override
//! - [`density`]: set of held pitches fed by note events
//! - [`energy`]: per-bar smoothing of density into energy
//! - [`pattern`]: pattern tables and rotation
//! - [`voicing`]: which voices sound on a step, and at what pitch
//! - [`humanize`]: velocity jitter and swing offsets
//! - [`scheduler`]: the bar/step loop
//! - [`engine`]: shared context, engine thread and its handle
//! - [`playback`]: Stopped/Playing transport
//! - [`sink`], [`note_off`], [`midi`]: MIDI output and input plumbing
//! - [`clock`]: real and virtual time sources

pub mod clock;
pub mod config;
pub mod density;
pub mod energy;
pub mod engine;
pub mod humanize;
pub mod midi;
pub mod note_off;
pub mod pattern;
pub mod playback;
pub mod scheduler;
pub mod sink;
pub mod voicing;

pub use kugutsu_types as types;

pub use engine::{Engine, EngineContext, EngineHandle};
pub use scheduler::BarReport;
