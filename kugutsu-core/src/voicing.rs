//! What plays on each step, and at which pitch.

use rand::seq::SliceRandom;
use rand::Rng;

use kugutsu_types::{BarState, PatternSet, VelocitySpec, Voice, Voicing};

/// Ghost-note probability at zero energy; scales down linearly to zero at full energy.
pub const GHOST_PROBABILITY: f32 = 0.15;
/// Chance of an open hat on step 14 outside minimal bars.
pub const OPEN_HAT_PROBABILITY: f32 = 0.2;

const BACKBEAT_STEPS: [usize; 2] = [4, 12];
const GHOST_FREE_STEPS: [usize; 2] = [0, 8];
const OPEN_HAT_STEP: usize = 14;

/// One voice to trigger on the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub voice: Voice,
    pub velocity: VelocitySpec,
}

impl Hit {
    fn new(voice: Voice, velocity: VelocitySpec) -> Self {
        Self { voice, velocity }
    }
}

/// Voice logic for step `step`.
///
/// RNG draws happen in a fixed order (ghost roll, then the open-hat roll on
/// step 14 outside minimal bars) so a seeded run is reproducible.
pub fn voice_step<R: Rng + ?Sized>(
    step: usize,
    patterns: &PatternSet,
    bar: &BarState,
    energy: f32,
    rng: &mut R,
) -> Vec<Hit> {
    let mut hits = Vec::with_capacity(4);
    let ghost = rng.gen::<f32>() < GHOST_PROBABILITY * (1.0 - energy);

    let fill_hit = bar.is_fill_bar && patterns.fill.is_some_and(|f| f.hit(step));
    if fill_hit {
        hits.push(Hit::new(Voice::Snare, VelocitySpec::with_range(100, 8)));
        if step % 2 == 0 {
            hits.push(Hit::new(Voice::Perc, VelocitySpec::new(75)));
        }
    } else {
        if patterns.kick.hit(step) {
            hits.push(Hit::new(Voice::Kick, VelocitySpec::new(105)));
        }
        if patterns.snare.hit(step) {
            let base = if BACKBEAT_STEPS.contains(&step) { 92 } else { 88 };
            hits.push(Hit::new(Voice::Snare, VelocitySpec::new(base)));
        } else if ghost && !GHOST_FREE_STEPS.contains(&step) {
            hits.push(Hit::new(Voice::Snare, VelocitySpec::with_range(28, 5)));
        }
    }

    if bar.is_minimal {
        if step % 2 == 0 {
            hits.push(Hit::new(Voice::Hihat, VelocitySpec::with_range(58, 8)));
        }
    } else if patterns.hihat.hit(step) {
        let base = if step % 4 == 0 {
            72
        } else if step % 2 == 0 {
            58
        } else {
            44
        };
        hits.push(Hit::new(Voice::Hihat, VelocitySpec::with_range(base, 8)));
    }

    if step == OPEN_HAT_STEP && !bar.is_minimal && rng.gen::<f32>() < OPEN_HAT_PROBABILITY {
        hits.push(Hit::new(Voice::OpenHat, VelocitySpec::new(70)));
    }

    if bar.is_quiet && BACKBEAT_STEPS.contains(&step) {
        hits.push(Hit::new(Voice::Clap, VelocitySpec::new(75)));
    }

    hits
}

/// Pitch for `voice`, or `None` when the hit should be skipped.
///
/// Drum voicing is a fixed lookup. Scale voicing picks a degree that is not
/// in `held` (pitches the activity source is sounding): kicks from the lower
/// half of the free degrees, hats from the upper half, everything else from
/// all of them.
pub fn resolve_pitch<R: Rng + ?Sized>(
    voicing: &Voicing,
    voice: Voice,
    held: &[u8],
    rng: &mut R,
) -> Option<u8> {
    match voicing {
        Voicing::Drums(map) => Some(map.note(voice)),
        Voicing::Scale(scale) => {
            let mut free: Vec<u8> = scale.iter().copied().filter(|n| !held.contains(n)).collect();
            if free.is_empty() {
                return None;
            }
            free.sort_unstable();
            let half = free.len().div_ceil(2);
            let pool = match voice {
                Voice::Kick => &free[..half],
                Voice::Hihat | Voice::OpenHat => &free[free.len() - half..],
                _ => &free[..],
            };
            pool.choose(rng).copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kugutsu_types::{DrumMap, StepMask};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn basic_set() -> PatternSet {
        PatternSet {
            kick: StepMask::from_bits([1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]),
            snare: StepMask::from_bits([0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            hihat: StepMask::from_bits([1; 16]),
            fill: None,
        }
    }

    fn voices(hits: &[Hit]) -> Vec<Voice> {
        hits.iter().map(|h| h.voice).collect()
    }

    #[test]
    fn downbeat_plays_kick_and_accented_hat() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bar = BarState::compute(0, 0.5, false);
        let hits = voice_step(0, &basic_set(), &bar, 0.5, &mut rng);
        assert_eq!(hits[0], Hit::new(Voice::Kick, VelocitySpec::new(105)));
        assert!(hits.contains(&Hit::new(Voice::Hihat, VelocitySpec::with_range(72, 8))));
    }

    #[test]
    fn backbeat_snare_is_accented() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bar = BarState::compute(0, 0.5, false);
        let hits = voice_step(4, &basic_set(), &bar, 0.5, &mut rng);
        assert!(hits.contains(&Hit::new(Voice::Snare, VelocitySpec::new(92))));
    }

    #[test]
    fn minimal_bars_thin_the_hats() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bar = BarState::compute(1, 0.9, false);
        for step in 0..16 {
            let hits = voice_step(step, &basic_set(), &bar, 0.9, &mut rng);
            let hats = voices(&hits).iter().filter(|v| **v == Voice::Hihat).count();
            assert_eq!(hats, usize::from(step % 2 == 0));
            assert!(!voices(&hits).contains(&Voice::OpenHat));
        }
    }

    #[test]
    fn fill_bar_replaces_kick_with_fill_hits() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bar = BarState::compute(3, 0.5, false);
        let fill = StepMask::from_bits([0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1]);
        let set = basic_set().with_fill(Some(fill));

        let hits = voice_step(8, &set, &bar, 0.5, &mut rng);
        let v = voices(&hits);
        assert!(!v.contains(&Voice::Kick));
        assert!(v.contains(&Voice::Snare));
        assert!(v.contains(&Voice::Perc));

        let hits = voice_step(9, &set, &bar, 0.5, &mut rng);
        assert!(!voices(&hits).contains(&Voice::Perc));

        // steps outside the fill play the normal pattern
        let hits = voice_step(0, &set, &bar, 0.5, &mut rng);
        assert!(voices(&hits).contains(&Voice::Kick));
    }

    #[test]
    fn ghosts_are_quiet_and_avoid_the_downbeats() {
        let mut rng = SmallRng::seed_from_u64(11);
        let bar = BarState::compute(1, 0.0, false);
        let mut ghosts = 0;
        for _ in 0..200 {
            for step in 0..16 {
                for hit in voice_step(step, &basic_set(), &bar, 0.0, &mut rng) {
                    if hit.voice == Voice::Snare && hit.velocity.base == 28 {
                        ghosts += 1;
                        assert!(step != 0 && step != 8);
                        assert_eq!(hit.velocity.range, 5);
                    }
                }
            }
        }
        assert!(ghosts > 0);
    }

    #[test]
    fn no_ghosts_at_full_energy() {
        let mut rng = SmallRng::seed_from_u64(11);
        let bar = BarState::compute(1, 0.6, false);
        let set = PatternSet { snare: StepMask::empty(), ..basic_set() };
        for _ in 0..200 {
            for step in 0..16 {
                let hits = voice_step(step, &set, &bar, 1.0, &mut rng);
                assert!(!voices(&hits).contains(&Voice::Snare));
            }
        }
    }

    #[test]
    fn quiet_bars_clap_on_the_backbeat() {
        let mut rng = SmallRng::seed_from_u64(1);
        let bar = BarState::compute(1, 0.1, true);
        let claps: Vec<usize> = (0..16)
            .filter(|s| voices(&voice_step(*s, &basic_set(), &bar, 0.1, &mut rng)).contains(&Voice::Clap))
            .collect();
        assert_eq!(claps, vec![4, 12]);
    }

    #[test]
    fn open_hat_only_on_step_fourteen() {
        let mut rng = SmallRng::seed_from_u64(2);
        let bar = BarState::compute(1, 0.5, false);
        let mut seen = 0;
        for _ in 0..200 {
            for step in 0..16 {
                if voices(&voice_step(step, &basic_set(), &bar, 0.5, &mut rng)).contains(&Voice::OpenHat) {
                    assert_eq!(step, 14);
                    seen += 1;
                }
            }
        }
        assert!(seen > 0 && seen < 200);
    }

    #[test]
    fn drum_voicing_is_fixed() {
        let mut rng = SmallRng::seed_from_u64(1);
        let voicing = Voicing::Drums(DrumMap::default());
        assert_eq!(resolve_pitch(&voicing, Voice::Snare, &[37], &mut rng), Some(37));
    }

    #[test]
    fn scale_voicing_avoids_held_notes() {
        let mut rng = SmallRng::seed_from_u64(1);
        let voicing = Voicing::Scale(vec![60, 65, 70, 76]);
        for _ in 0..100 {
            let p = resolve_pitch(&voicing, Voice::Snare, &[60, 70], &mut rng).unwrap();
            assert!(p == 65 || p == 76);
        }
    }

    #[test]
    fn scale_voicing_splits_registers() {
        let mut rng = SmallRng::seed_from_u64(1);
        let voicing = Voicing::Scale(vec![60, 65, 70, 76]);
        for _ in 0..100 {
            assert!(resolve_pitch(&voicing, Voice::Kick, &[], &mut rng).unwrap() <= 65);
            assert!(resolve_pitch(&voicing, Voice::Hihat, &[], &mut rng).unwrap() >= 70);
        }
    }

    #[test]
    fn scale_voicing_skips_when_everything_is_held() {
        let mut rng = SmallRng::seed_from_u64(1);
        let voicing = Voicing::Scale(vec![60, 65]);
        assert_eq!(resolve_pitch(&voicing, Voice::Clap, &[60, 65], &mut rng), None);
    }
}
