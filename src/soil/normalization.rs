//! Normalization Utilities
//!
//! Converts a raw soil measurement into a 0-1 suitability score against its
//! ideal range. Inside the range the score is exactly 1.0. Outside it the
//! score decays with the relative deviation from the violated bound:
//!
//! - `Sigmoid` (default): `(1 + e^-c) / (1 + e^(k*d - c))`, which is 1.0 at
//!   the boundary and decreases smoothly towards 0.
//! - `LinearClamp`: `max(0, 1 - d)`.
//!
//! Excess organic matter always decays as `e^(-2d)`.

use crate::error::{ScoringError, ScoringResult};
use crate::soil::parameters::{IdealRange, SoilParameter};
use serde::{Deserialize, Serialize};

/// Logistic steepness `k`
pub const SIGMOID_STEEPNESS: f64 = 6.0;
/// Logistic offset `c`
pub const SIGMOID_OFFSET: f64 = 1.5;
/// Decay rate for organic matter above its ideal maximum
pub const ORGANIC_EXCESS_DECAY: f64 = 2.0;

/// Shape of the out-of-range penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyCurve {
    #[default]
    Sigmoid,
    LinearClamp,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterNormalizer {
    curve: PenaltyCurve,
}

impl ParameterNormalizer {
    pub fn new(curve: PenaltyCurve) -> Self {
        Self { curve }
    }

    pub fn curve(&self) -> PenaltyCurve {
        self.curve
    }

    /// Score `value` against `[min_ideal, max_ideal]`.
    ///
    /// # Arguments
    /// * `value` - Raw measurement, must be finite and non-negative
    /// * `min_ideal`, `max_ideal` - Ideal band (already region/season adjusted)
    /// * `kind` - Parameter being scored; organic matter has a softer excess penalty
    ///
    /// # Returns
    /// Score in [0, 1]
    pub fn score(
        &self,
        value: f64,
        min_ideal: f64,
        max_ideal: f64,
        kind: SoilParameter,
    ) -> ScoringResult<f64> {
        if !value.is_finite() || value < 0.0 {
            return Err(ScoringError::out_of_domain(
                kind.as_str(),
                value,
                "value must be finite and non-negative",
            ));
        }
        if !min_ideal.is_finite() || !max_ideal.is_finite() || min_ideal > max_ideal {
            return Err(ScoringError::InvalidIdealRange {
                parameter: kind.as_str().to_string(),
                min: min_ideal,
                max: max_ideal,
            });
        }

        let score = if value < min_ideal {
            let deviation = (min_ideal - value) / bound_scale(min_ideal);
            self.decay(deviation)
        } else if value > max_ideal {
            let deviation = (value - max_ideal) / bound_scale(max_ideal);
            if kind == SoilParameter::OrganicMatter {
                (-ORGANIC_EXCESS_DECAY * deviation).exp()
            } else {
                self.decay(deviation)
            }
        } else {
            1.0
        };

        Ok(score.clamp(0.0, 1.0))
    }

    pub fn score_range(&self, value: f64, range: &IdealRange, kind: SoilParameter) -> ScoringResult<f64> {
        self.score(value, range.min, range.max, kind)
    }

    fn decay(&self, deviation: f64) -> f64 {
        match self.curve {
            PenaltyCurve::Sigmoid => {
                let at_boundary = 1.0 + (-SIGMOID_OFFSET).exp();
                at_boundary / (1.0 + (SIGMOID_STEEPNESS * deviation - SIGMOID_OFFSET).exp())
            }
            PenaltyCurve::LinearClamp => (1.0 - deviation).max(0.0),
        }
    }
}

/// Relative deviation denominator; a zero bound falls back to absolute units.
fn bound_scale(bound: f64) -> f64 {
    if bound > 0.0 {
        bound
    } else {
        1.0
    }
}
