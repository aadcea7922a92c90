use serde::{Deserialize, Serialize};

/// Single actionable improvement suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub parameter: String, // "ph", "nitrogen", "general", "crop:maize"
    pub issue: String,
    pub action: String,
    pub benefit: String,
    pub cost_estimate: CostTier,
    pub timeframe: String,
    pub local_context: Option<String>,
    /// Structured application rate when the action has one
    pub rate: Option<ApplicationRate>,
    /// Normalized parameter score that triggered this item
    pub normalized_score: Option<f64>,
}

impl Recommendation {
    /// Create a recommendation without rate, context or score
    pub fn new(
        parameter: impl Into<String>,
        issue: impl Into<String>,
        action: impl Into<String>,
        benefit: impl Into<String>,
        cost_estimate: CostTier,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            issue: issue.into(),
            action: action.into(),
            benefit: benefit.into(),
            cost_estimate,
            timeframe: timeframe.into(),
            local_context: None,
            rate: None,
            normalized_score: None,
        }
    }

    pub fn with_rate(mut self, rate: ApplicationRate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_local_context(mut self, context: impl Into<String>) -> Self {
        self.local_context = Some(context.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.normalized_score = Some(score);
        self
    }

    /// One-line form used in viability recommendations and loan conditions
    pub fn summary(&self) -> String {
        format!("{}: {}", self.issue, self.action)
    }
}

/// Coarse cost bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    LowMedium,
    Medium,
    MediumHigh,
    High,
}

impl CostTier {
    pub fn display_text(&self) -> &'static str {
        match self {
            CostTier::Low => "Low",
            CostTier::LowMedium => "Low-Medium",
            CostTier::Medium => "Medium",
            CostTier::MediumHigh => "Medium-High",
            CostTier::High => "High",
        }
    }
}

/// Recommended application rate range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRate {
    pub low: f64,
    pub high: f64,
    pub unit: RateUnit,
}

impl ApplicationRate {
    /// Negative inputs are floored at zero and `high` is kept >= `low`.
    pub fn new(low: f64, high: f64, unit: RateUnit) -> Self {
        let low = low.max(0.0);
        Self {
            low,
            high: high.max(low),
            unit,
        }
    }

    pub fn format(&self) -> String {
        match self.unit {
            RateUnit::TonsPerHectare => format!("{:.1}-{:.1} {}", self.low, self.high, self.unit.display_text()),
            RateUnit::KgPerHectare => format!("{:.0}-{:.0} {}", self.low, self.high, self.unit.display_text()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateUnit {
    TonsPerHectare,
    KgPerHectare,
}

impl RateUnit {
    pub fn display_text(&self) -> &'static str {
        match self {
            RateUnit::TonsPerHectare => "tons per hectare",
            RateUnit::KgPerHectare => "kg per hectare",
        }
    }
}
