//! Velocity and swing jitter.

use std::time::Duration;

use rand::Rng;

use kugutsu_types::{GrooveSettings, VelocitySpec};

/// `clamp(base + uniform(-range, range), floor, 127)`.
pub fn humanize<R: Rng + ?Sized>(spec: VelocitySpec, rng: &mut R) -> u8 {
    let range = spec.range as i32;
    let jitter = if range > 0 { rng.gen_range(-range..=range) } else { 0 };
    let floor = spec.floor.clamp(1, 127) as i32;
    (spec.base as i32 + jitter).clamp(floor, 127) as u8
}

/// Delay of step `step` past its straight grid position.
///
/// Even steps are never delayed. Odd steps get `swing_amount` of a step,
/// plus a uniform draw from `±swing_jitter` when jitter is enabled; the
/// RNG is only consumed in that case.
pub fn swing_offset<R: Rng + ?Sized>(
    step: usize,
    step_duration: Duration,
    groove: &GrooveSettings,
    rng: &mut R,
) -> Duration {
    if !GrooveSettings::swings(step) {
        return Duration::ZERO;
    }
    let mut fraction = groove.swing_amount;
    if groove.has_jitter() {
        fraction += rng.gen_range(-groove.swing_jitter..=groove.swing_jitter);
    }
    step_duration.mul_f64(fraction.max(0.0) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn stays_within_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        let spec = VelocitySpec::with_range(88, 10);
        for _ in 0..1000 {
            let v = humanize(spec, &mut rng);
            assert!((78..=98).contains(&v));
        }
    }

    #[test]
    fn clamps_to_midi_ceiling() {
        let mut rng = SmallRng::seed_from_u64(5);
        let spec = VelocitySpec::with_range(125, 10);
        for _ in 0..1000 {
            assert!(humanize(spec, &mut rng) <= 127);
        }
    }

    #[test]
    fn clamps_to_floor() {
        let mut rng = SmallRng::seed_from_u64(5);
        let spec = VelocitySpec { base: 3, range: 10, floor: 1 };
        let seen: Vec<u8> = (0..1000).map(|_| humanize(spec, &mut rng)).collect();
        assert!(seen.iter().all(|v| *v >= 1));
        assert!(seen.contains(&1));
    }

    #[test]
    fn zero_range_is_exact() {
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(humanize(VelocitySpec::with_range(64, 0), &mut rng), 64);
    }

    #[test]
    fn even_steps_are_straight() {
        let mut rng = SmallRng::seed_from_u64(5);
        let groove = GrooveSettings::default();
        let step = Duration::from_millis(200);
        assert_eq!(swing_offset(0, step, &groove, &mut rng), Duration::ZERO);
        assert_eq!(swing_offset(14, step, &groove, &mut rng), Duration::ZERO);
    }

    #[test]
    fn odd_steps_get_fixed_swing() {
        let mut rng = SmallRng::seed_from_u64(5);
        let groove = GrooveSettings { swing_amount: 0.25, swing_jitter: 0.0 };
        let offset = swing_offset(3, Duration::from_millis(200), &groove, &mut rng);
        assert!((offset.as_secs_f64() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn jittered_swing_is_bounded() {
        let mut rng = SmallRng::seed_from_u64(5);
        let groove = GrooveSettings { swing_amount: 0.18, swing_jitter: 0.1 };
        let step = Duration::from_millis(200);
        for _ in 0..1000 {
            let offset = swing_offset(1, step, &groove, &mut rng).as_secs_f64();
            assert!(offset >= 0.08 * 0.2 - 1e-6);
            assert!(offset <= 0.28 * 0.2 + 1e-6);
        }
    }
}
