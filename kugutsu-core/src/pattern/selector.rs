//! Per-bar pattern rotation.

use rand::seq::SliceRandom;
use rand::Rng;

use kugutsu_types::{PatternSet, StepMask};

use super::library::PatternLibrary;

/// Bars between scheduled rotations.
pub const ROTATION_PERIOD: u64 = 4;

pub struct PatternSelector {
    library: PatternLibrary,
    jump_threshold: u32,
}

impl PatternSelector {
    pub fn new(library: PatternLibrary, jump_threshold: u32) -> Self {
        Self { library, jump_threshold }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// The set used before the first rotation: the first entry of each table.
    pub fn initial(&self) -> PatternSet {
        PatternSet {
            kick: self.library.kick.first().copied().unwrap_or_default(),
            snare: self.library.snare.first().copied().unwrap_or_default(),
            hihat: self.library.hihat.first().copied().unwrap_or_default(),
            fill: None,
        }
    }

    /// Whether a rotation is due: every fourth bar, or when density moved by
    /// more than the jump threshold since the previous bar.
    pub fn should_rotate(&self, bar_index: u64, prev_density: usize, density: usize) -> bool {
        bar_index % ROTATION_PERIOD == 0 || prev_density.abs_diff(density) > self.jump_threshold as usize
    }

    /// Draw a fresh kick/snare/hihat set when a rotation is due.
    ///
    /// Each voice is drawn independently and uniformly from its table; the
    /// fill slot is left empty for [`PatternSelector::draw_fill`].
    pub fn maybe_rotate<R: Rng + ?Sized>(
        &self,
        bar_index: u64,
        prev_density: usize,
        density: usize,
        rng: &mut R,
    ) -> Option<PatternSet> {
        if !self.should_rotate(bar_index, prev_density, density) {
            return None;
        }
        let fallback = self.initial();
        Some(PatternSet {
            kick: pick(&self.library.kick, rng).unwrap_or(fallback.kick),
            snare: pick(&self.library.snare, rng).unwrap_or(fallback.snare),
            hihat: pick(&self.library.hihat, rng).unwrap_or(fallback.hihat),
            fill: None,
        })
    }

    /// Draw a fill pattern for a fill bar.
    pub fn draw_fill<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<StepMask> {
        pick(&self.library.fill, rng)
    }
}

fn pick<R: Rng + ?Sized>(table: &[StepMask], rng: &mut R) -> Option<StepMask> {
    table.choose(rng).copied()
}
