//! One-pole low-pass from density to a [0, 1] energy level.

/// Energy at the start of every session.
pub const INITIAL_ENERGY: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    energy: f32,
    smoothing: f32,
    saturation: f32,
}

impl EnergyModel {
    /// `smoothing` is the weight of the new target (0.3 by default);
    /// `saturation_density` is the density that maps to 1.0.
    pub fn new(smoothing: f32, saturation_density: u32) -> Self {
        Self {
            energy: INITIAL_ENERGY,
            smoothing: smoothing.clamp(0.0, 1.0),
            saturation: saturation_density.max(1) as f32,
        }
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn reset(&mut self) {
        self.energy = INITIAL_ENERGY;
    }

    /// Where energy heads for a given density.
    pub fn target(&self, density: usize) -> f32 {
        (density as f32 / self.saturation).min(1.0)
    }

    /// Advance by one bar.
    pub fn update_bar(&mut self, density: usize) -> f32 {
        let target = self.target(density);
        let next = self.energy * (1.0 - self.smoothing) + target * self.smoothing;
        self.energy = next.clamp(0.0, 1.0);
        self.energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converge(start: f32, density: usize) -> Vec<f32> {
        let mut model = EnergyModel::new(0.3, 6);
        model.energy = start;
        (0..60).map(|_| model.update_bar(density)).collect()
    }

    #[test]
    fn first_update_matches_formula() {
        let mut model = EnergyModel::new(0.3, 6);
        let e = model.update_bar(3);
        assert!((e - (0.5 * 0.7 + 0.5 * 0.3)).abs() < 1e-6);
    }

    #[test]
    fn converges_monotonically_from_below() {
        for d in [3usize, 6, 12] {
            let trace = converge(0.0, d);
            let target = (d as f32 / 6.0).min(1.0);
            assert!(trace.windows(2).all(|w| w[1] >= w[0]));
            assert!((trace.last().unwrap() - target).abs() < 1e-3);
            assert!(trace.iter().all(|e| (0.0..=1.0).contains(e)));
        }
    }

    #[test]
    fn converges_monotonically_from_above() {
        for d in [0usize, 2, 5] {
            let trace = converge(1.0, d);
            let target = d as f32 / 6.0;
            assert!(trace.windows(2).all(|w| w[1] <= w[0]));
            assert!((trace.last().unwrap() - target).abs() < 1e-3);
            assert!(trace.iter().all(|e| *e >= target - 1e-6));
        }
    }

    #[test]
    fn target_saturates() {
        let model = EnergyModel::new(0.3, 6);
        assert_eq!(model.target(6), 1.0);
        assert_eq!(model.target(40), 1.0);
        assert_eq!(model.target(0), 0.0);
    }

    #[test]
    fn reset_restores_initial_energy() {
        let mut model = EnergyModel::new(0.3, 6);
        model.update_bar(0);
        model.reset();
        assert_eq!(model.energy(), INITIAL_ENERGY);
    }
}
