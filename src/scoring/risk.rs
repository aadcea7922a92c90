//! Risk bands and premium pricing
//!
//! `RiskBand` is the single risk type used across the crate. Its canonical
//! string form is snake_case; `FromStr` accepts the other spellings found at
//! the system boundary ("Medium-Low", "MEDIUM_LOW", "Low Risk", ...).

use crate::error::{ScoringError, ScoringResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Premium exponent applied to the normalized risk fraction
pub const PREMIUM_EXPONENT: f64 = 1.8;
/// Premium floor as a multiple of the base premium
pub const PREMIUM_FLOOR: f64 = 0.7;
/// Premium cap as a multiple of the base premium
pub const PREMIUM_CAP: f64 = 3.0;

/// Ordered by severity: `Low < MediumLow < Medium < MediumHigh < High`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    MediumLow,
    Medium,
    MediumHigh,
    High,
}

impl RiskBand {
    pub const ALL: [RiskBand; 5] = [
        RiskBand::Low,
        RiskBand::MediumLow,
        RiskBand::Medium,
        RiskBand::MediumHigh,
        RiskBand::High,
    ];

    /// Band for a 0-100 score. Thresholds are inclusive lower bounds.
    pub fn from_score(score: f64) -> Self {
        if score.is_nan() {
            return RiskBand::High;
        }
        let score = score.clamp(0.0, 100.0);
        if score >= 80.0 {
            RiskBand::Low
        } else if score >= 60.0 {
            RiskBand::MediumLow
        } else if score >= 40.0 {
            RiskBand::Medium
        } else if score >= 20.0 {
            RiskBand::MediumHigh
        } else {
            RiskBand::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::MediumLow => "medium_low",
            RiskBand::Medium => "medium",
            RiskBand::MediumHigh => "medium_high",
            RiskBand::High => "high",
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            RiskBand::Low => "Low Risk",
            RiskBand::MediumLow => "Medium-Low Risk",
            RiskBand::Medium => "Medium Risk",
            RiskBand::MediumHigh => "Medium-High Risk",
            RiskBand::High => "High Risk",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskBand::Low => "Soil and farm conditions support standard terms",
            RiskBand::MediumLow => "Minor weaknesses, monitor at renewal",
            RiskBand::Medium => "Material weaknesses, conditions recommended",
            RiskBand::MediumHigh => "Significant weaknesses, remediation required before expansion",
            RiskBand::High => "Severe weaknesses, not insurable at standard terms",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskBand {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .trim_end_matches("risk")
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();

        match key.as_str() {
            "low" => Ok(RiskBand::Low),
            "mediumlow" => Ok(RiskBand::MediumLow),
            "medium" | "moderate" => Ok(RiskBand::Medium),
            "mediumhigh" => Ok(RiskBand::MediumHigh),
            "high" => Ok(RiskBand::High),
            _ => Err(ScoringError::InvalidRiskBand(s.to_string())),
        }
    }
}

/// Classifier and premium calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        RiskClassifier
    }

    pub fn classify(&self, score: f64) -> RiskBand {
        RiskBand::from_score(score)
    }

    /// `base × (1 + ((100 - score)/100)^1.8)`, clamped to `[0.7, 3.0] × base`.
    ///
    /// Non-increasing in `score`. Scores outside 0-100 are clamped first.
    pub fn premium(&self, score: f64, base_premium: f64) -> ScoringResult<f64> {
        if !base_premium.is_finite() || base_premium < 0.0 {
            return Err(ScoringError::out_of_domain(
                "base_premium",
                base_premium,
                "base premium must be finite and non-negative",
            ));
        }
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) };
        let risk_fraction = (100.0 - score) / 100.0;
        let premium = base_premium * (1.0 + risk_fraction.powf(PREMIUM_EXPONENT));

        Ok(premium.clamp(PREMIUM_FLOOR * base_premium, PREMIUM_CAP * base_premium))
    }
}
