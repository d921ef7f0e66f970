//! The step loop: one bar of sixteen swung, humanized steps per call.
//!
//! Per bar: read density, advance energy, recompute the bar flags, maybe
//! rotate patterns, then fire each step at `t0 + i * step + swing(i)` on the
//! context clock. A late step fires immediately. After the last step the
//! loop sleeps out the rest of the nominal bar so per-step overhead does not
//! accumulate.

use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use kugutsu_types::{BarState, PatternSet, Voicing, QUIET_ENERGY, STEPS_PER_BAR};

use crate::energy::EnergyModel;
use crate::engine::EngineContext;
use crate::humanize::{humanize, swing_offset};
use crate::note_off::NoteOffTimer;
use crate::pattern::{PatternLibrary, PatternSelector};
use crate::sink::SinkResult;
use crate::voicing::{resolve_pitch, voice_step, Hit};

/// Shortfall below which the end-of-bar correction does not bother sleeping.
const DRIFT_EPSILON: Duration = Duration::from_millis(1);

/// Chance that a low-energy bar becomes a quiet bar.
const QUIET_PROBABILITY: f32 = 0.5;

/// What happened during one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarReport {
    pub bar_index: u64,
    pub density: usize,
    pub energy: f32,
    /// Patterns were redrawn at the start of this bar.
    pub rotated: bool,
    pub state: BarState,
    pub patterns: PatternSet,
    /// Fire time of each step that ran, relative to the bar start.
    pub step_offsets: Vec<Duration>,
    /// Steps whose target time had already passed.
    pub late_steps: usize,
    /// Hits the sink refused.
    pub failed_hits: usize,
    /// False when playback stopped before step 15.
    pub completed: bool,
    /// Time from bar start to the end of the drift correction.
    pub duration: Duration,
}

pub struct StepScheduler {
    energy: EnergyModel,
    selector: PatternSelector,
    patterns: PatternSet,
    bar_index: u64,
    prev_density: usize,
    session: u64,
    rng: SmallRng,
    note_offs: NoteOffTimer,
}

impl StepScheduler {
    pub fn new(ctx: &EngineContext) -> Self {
        let seed = ctx.config.seed.unwrap_or_else(rand::random);
        log::info!(target: "scheduler", "rng seed {}", seed);

        let selector = PatternSelector::new(PatternLibrary::default(), ctx.config.density_jump_threshold);
        Self {
            energy: EnergyModel::new(ctx.config.energy_smoothing, ctx.config.saturation_density),
            patterns: selector.initial(),
            selector,
            bar_index: 0,
            prev_density: 0,
            session: ctx.controller.session(),
            rng: SmallRng::seed_from_u64(seed),
            note_offs: NoteOffTimer::new(ctx.sink.clone(), ctx.clock.clone()),
        }
    }

    pub fn bar_index(&self) -> u64 {
        self.bar_index
    }

    pub fn energy(&self) -> f32 {
        self.energy.energy()
    }

    /// Reset per-session state if `start` happened since the last bar.
    fn sync_session(&mut self, ctx: &EngineContext) {
        let session = ctx.controller.session();
        if session != self.session {
            self.session = session;
            self.bar_index = 0;
            self.energy.reset();
            self.patterns = self.selector.initial();
            log::debug!(target: "scheduler", "session {}: bar and energy reset", session);
        }
    }

    /// Play one bar. Returns early, with `completed == false`, if playback
    /// stops; that check runs once per step, right before the step fires.
    pub fn play_bar(&mut self, ctx: &EngineContext) -> BarReport {
        self.sync_session(ctx);

        let clock = &*ctx.clock;
        let step_duration = ctx.config.step_duration();
        let bar_duration = ctx.config.bar_duration();
        let t0 = clock.now();

        let density = ctx.tracker.snapshot_density();
        let energy = self.energy.update_bar(density);
        let quiet_roll = energy < QUIET_ENERGY && self.rng.gen::<f32>() < QUIET_PROBABILITY;
        let state = BarState::compute(self.bar_index, energy, quiet_roll);

        let rotation = self
            .selector
            .maybe_rotate(self.bar_index, self.prev_density, density, &mut self.rng);
        let rotated = rotation.is_some();
        if let Some(set) = rotation {
            self.patterns = set;
        }
        self.prev_density = density;

        let fill = if state.is_fill_bar {
            self.selector.draw_fill(&mut self.rng)
        } else {
            None
        };
        self.patterns = self.patterns.with_fill(fill);

        log::debug!(
            target: "scheduler",
            "bar {} density {} energy {:.3} rotated {} fill {} minimal {} quiet {}",
            self.bar_index, density, energy, rotated, state.is_fill_bar, state.is_minimal, state.is_quiet
        );

        let mut report = BarReport {
            bar_index: self.bar_index,
            density,
            energy,
            rotated,
            state,
            patterns: self.patterns,
            step_offsets: Vec::with_capacity(STEPS_PER_BAR),
            late_steps: 0,
            failed_hits: 0,
            completed: true,
            duration: Duration::ZERO,
        };

        for step in 0..STEPS_PER_BAR {
            let swing = swing_offset(step, step_duration, &ctx.config.groove, &mut self.rng);
            let target = t0 + step_duration * step as u32 + swing;

            let now = clock.now();
            if now > target {
                report.late_steps += 1;
                log::debug!(target: "scheduler", "step {} late by {:?}", step, now - target);
            } else {
                clock.sleep_until(target);
            }

            if !ctx.controller.is_playing() {
                report.completed = false;
                break;
            }

            report.step_offsets.push(clock.now() - t0);

            let held = match ctx.config.voicing {
                Voicing::Scale(_) => ctx.tracker.snapshot_pitches(),
                Voicing::Drums(_) => Vec::new(),
            };
            for hit in voice_step(step, &self.patterns, &state, energy, &mut self.rng) {
                if let Err(e) = self.trigger(ctx, hit, &held) {
                    report.failed_hits += 1;
                    log::warn!(target: "scheduler", "{} hit on step {} dropped: {}", hit.voice.name(), step, e);
                }
            }
        }

        if report.completed {
            let elapsed = clock.now() - t0;
            if let Some(drift) = bar_duration.checked_sub(elapsed) {
                if drift > DRIFT_EPSILON {
                    clock.sleep_until(t0 + bar_duration);
                }
            }
            self.bar_index += 1;
        }

        report.duration = clock.now() - t0;
        report
    }

    /// Send one humanized hit and queue its note-off.
    fn trigger(&mut self, ctx: &EngineContext, hit: Hit, held: &[u8]) -> SinkResult {
        let Some(pitch) = resolve_pitch(&ctx.config.voicing, hit.voice, held, &mut self.rng) else {
            return Ok(());
        };
        let velocity = humanize(hit.velocity, &mut self.rng);
        let channel = ctx.config.channel_out;
        ctx.sink.note_on(channel, pitch, velocity)?;
        self.note_offs.schedule(channel, pitch, ctx.config.step_hit_duration);
        Ok(())
    }
}
