use serde::{Deserialize, Serialize};

/// Energy above which the arrangement thins out.
pub const MINIMAL_ENERGY: f32 = 0.7;

/// Energy below which a bar may become a quiet bar with clap accents.
pub const QUIET_ENERGY: f32 = 0.2;

/// Per-bar arrangement flags, recomputed at every bar start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BarState {
    pub bar_index: u64,
    pub is_fill_bar: bool,
    pub is_minimal: bool,
    /// Low-energy bar that gets clap accents on the backbeat.
    pub is_quiet: bool,
}

impl BarState {
    /// Derive the flags for `bar_index` at `energy`.
    ///
    /// `quiet_roll` is the caller's coin flip for quiet bars; it only matters
    /// when energy is below [`QUIET_ENERGY`].
    pub fn compute(bar_index: u64, energy: f32, quiet_roll: bool) -> Self {
        let is_minimal = energy > MINIMAL_ENERGY;
        Self {
            bar_index,
            is_fill_bar: bar_index % 4 == 3 && !is_minimal,
            is_minimal,
            is_quiet: energy < QUIET_ENERGY && quiet_roll,
        }
    }
}
