//! Probabilistic sign flip that keeps scores from running away
//!
//! The flip probability grows with the user's share of all respec in
//! circulation, so a score is statistically pulled back before it can dominate
//! or cross zero cheaply. The magnitude of a delta is never changed: every
//! event moves the score by exactly `|proposed|`, in one direction or the other.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Absolute score above which corrections toward zero are rarely flipped
pub const SATURATION_THRESHOLD: u64 = 166;

/// Weight of the score-share term in the flip probability
pub const DAMPING_FACTOR: f64 = 0.65;

pub const MIN_FLIP_PROBABILITY: f64 = 0.01;
pub const MAX_FLIP_PROBABILITY: f64 = 0.15;

/// Flip probability for a correction of a saturated score
pub const SATURATED_FLIP_PROBABILITY: f64 = 0.01;

/// Tuning for the dampening function
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampeningParams {
    pub saturation_threshold: u64,
    pub damping_factor: f64,
    pub min_flip_probability: f64,
    pub max_flip_probability: f64,
    pub saturated_flip_probability: f64,
}

impl Default for DampeningParams {
    fn default() -> Self {
        Self {
            saturation_threshold: SATURATION_THRESHOLD,
            damping_factor: DAMPING_FACTOR,
            min_flip_probability: MIN_FLIP_PROBABILITY,
            max_flip_probability: MAX_FLIP_PROBABILITY,
            saturated_flip_probability: SATURATED_FLIP_PROBABILITY,
        }
    }
}

impl DampeningParams {
    /// Probability that `proposed` gets negated
    ///
    /// Returns `None` when there is no baseline to dampen against (the user's
    /// score or the global total is zero); the delta then always applies as-is.
    pub fn flip_probability(&self, current: i64, global_total: i64, proposed: i64) -> Option<f64> {
        if current == 0 || global_total == 0 {
            return None;
        }

        let magnitude = current.unsigned_abs() as f64;
        let share = magnitude * (1.0 + magnitude).ln() / global_total.unsigned_abs() as f64;
        let p = share * self.damping_factor;

        let opposes = current.signum() * proposed.signum() < 0;
        if current.unsigned_abs() > self.saturation_threshold && opposes {
            return Some(self.saturated_flip_probability);
        }

        Some(p.clamp(self.min_flip_probability, self.max_flip_probability))
    }

    /// Decide the delta actually applied for a proposed change
    ///
    /// Consumes exactly one uniform draw from `rng` when a baseline exists,
    /// none otherwise.
    pub fn compute_delta<R: Rng + ?Sized>(
        &self,
        current: i64,
        global_total: i64,
        proposed: i64,
        rng: &mut R,
    ) -> i64 {
        match self.flip_probability(current, global_total, proposed) {
            Some(p) if rng.gen::<f64>() < p => -proposed,
            _ => proposed,
        }
    }
}

/// [`DampeningParams::compute_delta`] with the default tuning
pub fn compute_delta<R: Rng + ?Sized>(
    current: i64,
    global_total: i64,
    proposed: i64,
    rng: &mut R,
) -> i64 {
    DampeningParams::default().compute_delta(current, global_total, proposed, rng)
}

/// Direction of a score transition relative to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crossing {
    /// Was `>= 0`, now `< 0`
    Negative,
    /// Was `< 0`, now `>= 0`
    Positive,
    /// Stayed on the same side of zero
    Stable,
}

impl Crossing {
    pub fn classify(previous: i64, new: i64) -> Self {
        if previous >= 0 && new < 0 {
            Crossing::Negative
        } else if previous < 0 && new >= 0 {
            Crossing::Positive
        } else {
            Crossing::Stable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Every `gen::<f64>()` yields 0.0, so any positive probability flips.
    fn always_flip() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Every `gen::<f64>()` yields just under 1.0, so nothing flips.
    fn never_flip() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_zero_baseline_passes_through() {
        let params = DampeningParams::default();
        assert_eq!(params.flip_probability(0, 500, 3), None);
        assert_eq!(params.flip_probability(40, 0, 3), None);

        let mut rng = always_flip();
        assert_eq!(compute_delta(0, 0, 2, &mut rng), 2);
        assert_eq!(compute_delta(0, 100, -3, &mut rng), -3);
        assert_eq!(compute_delta(12, 0, 3, &mut rng), 3);
    }

    #[test]
    fn test_small_share_clamped_to_floor() {
        // 1 * ln(2) / 1000 * 0.65 is far below 0.01
        let p = DampeningParams::default().flip_probability(1, 1000, 2).unwrap();
        assert_eq!(p, MIN_FLIP_PROBABILITY);
    }

    #[test]
    fn test_large_share_clamped_to_ceiling() {
        // 100 * ln(101) / 120 * 0.65 is about 2.5
        let p = DampeningParams::default().flip_probability(100, 120, 2).unwrap();
        assert_eq!(p, MAX_FLIP_PROBABILITY);
    }

    #[test]
    fn test_unclamped_middle_value() {
        // 20 * ln(21) / 1000 * 0.65 ~= 0.0396
        let p = DampeningParams::default().flip_probability(20, 1000, 2).unwrap();
        let expected = 20.0 * 21f64.ln() / 1000.0 * 0.65;
        assert!((p - expected).abs() < 1e-12);
        assert!(p > MIN_FLIP_PROBABILITY && p < MAX_FLIP_PROBABILITY);
    }

    #[test]
    fn test_saturated_correction_forced_to_floor() {
        let params = DampeningParams::default();
        assert_eq!(params.flip_probability(200, 1000, -3), Some(0.01));
        assert_eq!(params.flip_probability(-200, 1000, 3), Some(0.01));
    }

    #[test]
    fn test_saturated_growth_still_clamped() {
        // 200 * ln(201) / 1000 * 0.65 ~= 0.69, pushing away from zero
        let p = DampeningParams::default().flip_probability(200, 1000, 3).unwrap();
        assert_eq!(p, MAX_FLIP_PROBABILITY);
    }

    #[test]
    fn test_threshold_itself_is_not_saturated() {
        // |score| == 166 is not "above" the threshold, so the clamp applies
        let p = DampeningParams::default().flip_probability(166, 200, -2).unwrap();
        assert_eq!(p, MAX_FLIP_PROBABILITY);
    }

    #[test]
    fn test_negative_global_total_uses_magnitude() {
        let params = DampeningParams::default();
        assert_eq!(
            params.flip_probability(20, -1000, 2),
            params.flip_probability(20, 1000, 2)
        );
    }

    #[test]
    fn test_flip_negates_delta() {
        assert_eq!(compute_delta(-1, 100, 3, &mut always_flip()), -3);
        assert_eq!(compute_delta(-1, 100, 3, &mut never_flip()), 3);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..200)
                .map(|i| compute_delta(50 + i, 400, 2, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_flip_rate_tracks_probability() {
        // 100 * ln(101) / 120 * 0.65 clamps to 0.15
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let trials = 20_000;
        let flips = (0..trials)
            .filter(|_| compute_delta(100, 120, 2, &mut rng) == -2)
            .count();
        let rate = flips as f64 / trials as f64;
        assert!(rate > 0.13 && rate < 0.17, "flip rate {}", rate);
    }

    #[test]
    fn test_crossing_classification() {
        assert_eq!(Crossing::classify(0, -1), Crossing::Negative);
        assert_eq!(Crossing::classify(5, -2), Crossing::Negative);
        assert_eq!(Crossing::classify(-1, 0), Crossing::Positive);
        assert_eq!(Crossing::classify(-1, 2), Crossing::Positive);
        assert_eq!(Crossing::classify(0, 2), Crossing::Stable);
        assert_eq!(Crossing::classify(-4, -1), Crossing::Stable);
        assert_eq!(Crossing::classify(3, 1), Crossing::Stable);
    }
}
