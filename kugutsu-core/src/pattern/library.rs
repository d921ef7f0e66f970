//! Built-in step tables.

use kugutsu_types::StepMask;

const fn m(bits: [u8; 16]) -> StepMask {
    StepMask::from_bits(bits)
}

pub const KICK_PATTERNS: &[StepMask] = &[
    m([1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]), // one and three
    m([1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0]), // pickup after three
    m([1, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0]), // anticipates three
    m([1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]), // pickup after one
    m([1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0]), // three displaced
    m([1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0]), // anticipates next bar
];

pub const SNARE_PATTERNS: &[StepMask] = &[
    m([0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]), // backbeat
    m([0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 0]),
    m([0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0]),
    m([0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0]), // late two
    m([0, 0, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
];

pub const HIHAT_PATTERNS: &[StepMask] = &[
    m([1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]), // straight sixteenths
    m([1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 0, 1, 1, 0, 1, 1]),
    m([1, 0, 1, 1, 1, 1, 1, 0, 1, 0, 1, 1, 1, 1, 0, 1]),
    m([1, 0, 1, 0, 1, 1, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1]),
    m([1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1]), // heavy shuffle
];

pub const FILL_PATTERNS: &[StepMask] = &[
    m([0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]), // second-half roll
    m([0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 1, 0, 1, 1, 1, 1]), // building
    m([0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 0, 1, 1]),
];

/// Per-voice pattern tables the selector draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternLibrary {
    pub kick: Vec<StepMask>,
    pub snare: Vec<StepMask>,
    pub hihat: Vec<StepMask>,
    pub fill: Vec<StepMask>,
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self {
            kick: KICK_PATTERNS.to_vec(),
            snare: SNARE_PATTERNS.to_vec(),
            hihat: HIHAT_PATTERNS.to_vec(),
            fill: FILL_PATTERNS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kick_lands_on_the_downbeat() {
        assert!(KICK_PATTERNS.iter().all(|p| p.hit(0)));
    }

    #[test]
    fn every_snare_pattern_has_the_four_backbeat() {
        assert!(SNARE_PATTERNS.iter().all(|p| p.hit(12)));
    }

    #[test]
    fn fills_leave_the_first_quarter_empty() {
        assert!(FILL_PATTERNS.iter().all(|p| (0..4).all(|i| !p.hit(i))));
    }
}
