//! Step masks and the per-bar pattern set.

use serde::{Deserialize, Serialize};

/// Steps in one bar (sixteenth notes in 4/4).
pub const STEPS_PER_BAR: usize = 16;

/// One voice's on/off mask across a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepMask([bool; STEPS_PER_BAR]);

impl StepMask {
    /// Build a mask from 0/1 digits, the notation the pattern tables use.
    pub const fn from_bits(bits: [u8; STEPS_PER_BAR]) -> Self {
        let mut steps = [false; STEPS_PER_BAR];
        let mut i = 0;
        while i < STEPS_PER_BAR {
            steps[i] = bits[i] != 0;
            i += 1;
        }
        Self(steps)
    }

    pub const fn empty() -> Self {
        Self([false; STEPS_PER_BAR])
    }

    /// Whether step `i` is set. Out-of-range steps are never set.
    pub fn hit(&self, step: usize) -> bool {
        self.0.get(step).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|s| **s).count()
    }
}

impl Default for StepMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// The masks in effect for the current bar.
///
/// Replaced wholesale at rotation boundaries; `fill` is only drawn when a
/// fill bar is entered and is `None` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PatternSet {
    pub kick: StepMask,
    pub snare: StepMask,
    pub hihat: StepMask,
    pub fill: Option<StepMask>,
}

impl PatternSet {
    /// Same kick/snare/hihat, with a different fill.
    pub fn with_fill(self, fill: Option<StepMask>) -> Self {
        Self { fill, ..self }
    }
}
