//! Synthetic bootstrap data
//!
//! Used only when no historical yield records are supplied. Features are drawn
//! uniformly from `SAMPLING_RANGES`; the target is a saturating sum of
//! per-feature effects plus bounded uniform noise, clipped to 1-15 t/ha.

use super::training::TrainingSet;
use super::tree::FeatureRow;
use crate::soil::{SoilParameter, PARAMETER_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Realistic sampling range per feature, in `SoilParameter::ALL` order.
/// Also the "plausible" ranges behind prediction confidence.
pub const SAMPLING_RANGES: [(f64, f64); PARAMETER_COUNT] = [
    (5.5, 8.0),     // ph
    (10.0, 50.0),   // nitrogen
    (10.0, 40.0),   // phosphorus
    (100.0, 300.0), // potassium
    (1.0, 8.0),     // organic_matter
    (5.0, 25.0),    // cec
    (15.0, 35.0),   // moisture
];

pub const MIN_YIELD: f64 = 1.0;
pub const MAX_YIELD: f64 = 15.0;

pub fn sampling_range(parameter: SoilParameter) -> (f64, f64) {
    SAMPLING_RANGES[parameter.index()]
}

/// Noise-free yield response (t/ha) for one feature row
pub fn yield_response(row: &FeatureRow) -> f64 {
    let [ph, nitrogen, phosphorus, potassium, organic_matter, cec, moisture] = *row;

    let ph_effect = 2.0 - 0.5 * (ph - 6.5).abs();

    let n = nitrogen.min(50.0);
    let nitrogen_effect = 0.05 * n - 0.0005 * n * n;

    let phosphorus_effect = 0.02 * phosphorus.min(40.0);
    let potassium_effect = 0.005 * potassium.min(250.0);
    let organic_effect = 0.3 * organic_matter.min(6.0);
    let cec_effect = 0.05 * cec.min(20.0);

    let moisture_gap = if moisture < 20.0 {
        20.0 - moisture
    } else if moisture > 30.0 {
        moisture - 30.0
    } else {
        0.0
    };
    let moisture_effect = 1.0 - 0.05 * moisture_gap;

    ph_effect + nitrogen_effect + phosphorus_effect + potassium_effect + organic_effect + cec_effect + moisture_effect
}

/// Seeded synthetic training set
pub fn generate(n_samples: usize, seed: u64, noise_amplitude: f64) -> TrainingSet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let mut row = [0.0; PARAMETER_COUNT];
        for (value, (lo, hi)) in row.iter_mut().zip(SAMPLING_RANGES.iter()) {
            *value = rng.gen_range(*lo..*hi);
        }
        let noise = if noise_amplitude > 0.0 {
            rng.gen_range(-noise_amplitude..noise_amplitude)
        } else {
            0.0
        };
        targets.push((yield_response(&row) + noise).clamp(MIN_YIELD, MAX_YIELD));
        rows.push(row);
    }

    TrainingSet::new(rows, targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ph_optimum() {
        let mut optimal = [6.5, 30.0, 25.0, 200.0, 4.0, 15.0, 25.0];
        let best = yield_response(&optimal);
        optimal[0] = 5.0;
        assert!(yield_response(&optimal) < best);
        optimal[0] = 8.0;
        assert!(yield_response(&optimal) < best);
    }

    #[test]
    fn test_saturating_effects() {
        let base = [6.5, 30.0, 25.0, 250.0, 6.0, 15.0, 25.0];
        let mut more = base;
        more[3] = 400.0; // potassium beyond cap
        more[4] = 10.0; // organic matter beyond cap
        assert_eq!(yield_response(&base), yield_response(&more));
    }

    #[test]
    fn test_generated_within_bounds() {
        let data = generate(200, 42, 0.5);
        assert_eq!(data.len(), 200);
        for (row, target) in data.rows().iter().zip(data.targets()) {
            assert!((MIN_YIELD..=MAX_YIELD).contains(target));
            for (value, (lo, hi)) in row.iter().zip(SAMPLING_RANGES.iter()) {
                assert!(*value >= *lo && *value < *hi);
            }
        }
    }

    #[test]
    fn test_seed_reproducible() {
        assert_eq!(generate(50, 7, 0.5), generate(50, 7, 0.5));
        assert_ne!(generate(50, 7, 0.5), generate(50, 8, 0.5));
    }
}
