//! Swing settings for off-beat steps.

use serde::{Deserialize, Serialize};

/// How far off-beat (odd) sixteenths are pushed late.
///
/// Both values are fractions of one step duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrooveSettings {
    /// Fixed delay applied to every odd step (0.0-0.5).
    pub swing_amount: f32,
    /// Random spread added on top of `swing_amount`, drawn uniformly from
    /// `-swing_jitter..=swing_jitter` per odd step. 0.0 disables it.
    pub swing_jitter: f32,
}

impl Default for GrooveSettings {
    fn default() -> Self {
        Self {
            swing_amount: 0.18,
            swing_jitter: 0.0,
        }
    }
}

impl GrooveSettings {
    /// Whether step `i` receives swing.
    pub fn swings(step: usize) -> bool {
        step % 2 == 1
    }

    pub fn has_jitter(&self) -> bool {
        self.swing_jitter > 0.0
    }

    /// Largest fraction of a step an odd step can be delayed.
    pub fn max_fraction(&self) -> f32 {
        self.swing_amount + self.swing_jitter
    }
}
