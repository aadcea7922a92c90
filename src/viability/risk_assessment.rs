//! Lending risk assessment
//!
//! Five risk factors (weather, soil, market, credit history, experience), each
//! 0-100 where higher is riskier, combined into one weighted risk score. The
//! score maps onto the shared `RiskBand` scale at 25/50/75.

use super::components::normalize;
use super::context::{CreditRecord, FarmContext, PaymentStatus};
use crate::config::ScoringConfig;
use crate::error::ScoringResult;
use crate::scoring::{RiskBand, SoilHealthScorer};
use crate::soil::{Region, SeasonSelection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const DEFAULT_WEATHER_RISK: f64 = 40.0;
const PROVINCE_WEATHER_RISK: &[(&str, f64)] = &[
    ("mashonaland central", 25.0),
    ("mashonaland east", 30.0),
    ("mashonaland west", 35.0),
    ("manicaland", 20.0),
    ("midlands", 45.0),
    ("masvingo", 50.0),
    ("matabeleland north", 60.0),
    ("matabeleland south", 65.0),
    ("bulawayo", 55.0),
    ("harare", 30.0),
];

const DEFAULT_MARKET_RISK: f64 = 45.0;
const CROP_MARKET_RISK: &[(&str, f64)] = &[
    ("maize", 35.0),
    ("tobacco", 45.0),
    ("cotton", 50.0),
    ("wheat", 40.0),
    ("barley", 45.0),
    ("soybeans", 30.0),
    ("groundnuts", 35.0),
    ("sunflower", 40.0),
];

/// Soil risk when neither a sample nor a score is available
const UNKNOWN_SOIL_RISK: f64 = 60.0;
/// Credit risk for a borrower with no history
const NO_HISTORY_RISK: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    Weather,
    SoilHealth,
    Market,
    CreditHistory,
    FarmingExperience,
}

impl RiskFactor {
    /// Canonical order, matching `RiskFactorWeights::values`
    pub const ALL: [RiskFactor; 5] = [
        RiskFactor::Weather,
        RiskFactor::SoilHealth,
        RiskFactor::Market,
        RiskFactor::CreditHistory,
        RiskFactor::FarmingExperience,
    ];

    /// Factor risk above this produces advice
    fn advice_threshold(&self) -> f64 {
        match self {
            RiskFactor::SoilHealth | RiskFactor::CreditHistory => 60.0,
            _ => 50.0,
        }
    }

    fn advice(&self) -> &'static str {
        match self {
            RiskFactor::SoilHealth => "Consider soil improvement programs and organic fertilizers",
            RiskFactor::Weather => "Invest in drought-resistant crop varieties and irrigation systems",
            RiskFactor::Market => "Diversify crop portfolio and explore contract farming opportunities",
            RiskFactor::CreditHistory => "Focus on building credit history through smaller, manageable loans",
            RiskFactor::FarmingExperience => "Participate in agricultural training and extension programs",
        }
    }
}

const ADVICE_ORDER: [RiskFactor; 5] = [
    RiskFactor::SoilHealth,
    RiskFactor::Weather,
    RiskFactor::Market,
    RiskFactor::CreditHistory,
    RiskFactor::FarmingExperience,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, higher is riskier
    pub overall_risk_score: f64,
    pub risk_level: RiskBand,
    pub factor_risks: BTreeMap<RiskFactor, f64>,
    pub recommendations: Vec<String>,
}

/// Band for a 0-100 risk score (higher is riskier)
pub fn risk_level(risk_score: f64) -> RiskBand {
    if risk_score.is_nan() {
        return RiskBand::High;
    }
    if risk_score <= 25.0 {
        RiskBand::Low
    } else if risk_score <= 50.0 {
        RiskBand::Medium
    } else if risk_score <= 75.0 {
        RiskBand::MediumHigh
    } else {
        RiskBand::High
    }
}

pub fn weather_risk(province: Option<&str>, farm_size_hectares: Option<f64>) -> f64 {
    let mut risk = province
        .map(normalize)
        .and_then(|p| {
            PROVINCE_WEATHER_RISK
                .iter()
                .find(|(name, _)| *name == p)
                .map(|(_, risk)| *risk)
        })
        .unwrap_or(DEFAULT_WEATHER_RISK);

    match farm_size_hectares {
        Some(size) if size > 10.0 => risk -= 5.0,
        Some(size) if size > 5.0 => risk -= 2.0,
        _ => {}
    }
    risk.clamp(0.0, 100.0)
}

pub fn soil_risk(soil_score: Option<f64>) -> f64 {
    match soil_score {
        Some(score) => (100.0 - score).clamp(0.0, 100.0),
        None => UNKNOWN_SOIL_RISK,
    }
}

pub fn market_risk(crop: Option<&str>) -> f64 {
    crop.map(normalize)
        .and_then(|c| CROP_MARKET_RISK.iter().find(|(name, _)| *name == c).map(|(_, risk)| *risk))
        .unwrap_or(DEFAULT_MARKET_RISK)
}

/// Default share scaled into 20-100
pub fn credit_risk(records: &[CreditRecord]) -> f64 {
    if records.is_empty() {
        return NO_HISTORY_RISK;
    }
    let defaults = records
        .iter()
        .filter(|r| r.payment_status == PaymentStatus::Defaulted)
        .count();
    let default_rate = defaults as f64 / records.len() as f64;
    (default_rate * 80.0 + 20.0).min(100.0)
}

/// Missing experience counts as none
pub fn experience_risk(years: Option<f64>) -> f64 {
    let years = years.unwrap_or(0.0);
    if years >= 10.0 {
        20.0
    } else if years >= 5.0 {
        35.0
    } else if years >= 2.0 {
        50.0
    } else {
        70.0
    }
}

#[derive(Debug, Clone)]
pub struct RiskAssessor {
    config: Arc<ScoringConfig>,
    soil_scorer: SoilHealthScorer,
}

impl RiskAssessor {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        let soil_scorer = SoilHealthScorer::new(config.clone());
        Self::from_parts(config, soil_scorer)
    }

    pub fn from_parts(config: Arc<ScoringConfig>, soil_scorer: SoilHealthScorer) -> Self {
        Self { config, soil_scorer }
    }

    /// Weighted lending risk for a farm.
    ///
    /// Soil risk comes from the attached sample when there is one, otherwise
    /// from `soil_health_score`.
    pub fn assess(&self, context: &FarmContext) -> ScoringResult<RiskAssessment> {
        context.validate()?;

        let soil_score = if !context.soil.is_empty() {
            let region = context.region_name().and_then(Region::parse);
            let season = SeasonSelection::parse(context.season.as_deref()).resolve();
            Some(self.soil_scorer.score_with_context(&context.soil, region, season)?.overall_score)
        } else {
            context.soil_health_score
        };

        let risks = [
            weather_risk(context.province.as_deref(), context.farm_size_hectares),
            soil_risk(soil_score),
            market_risk(context.primary_crop.as_deref()),
            credit_risk(&context.credit_history),
            experience_risk(context.farming_experience_years),
        ];

        let overall_risk_score = self
            .config
            .risk_assessment
            .weights
            .values()
            .iter()
            .zip(risks.iter())
            .map(|(weight, risk)| weight * risk)
            .sum::<f64>()
            .clamp(0.0, 100.0);
        let risk_level = risk_level(overall_risk_score);

        let factor_risks: BTreeMap<RiskFactor, f64> = RiskFactor::ALL.into_iter().zip(risks).collect();

        let mut recommendations: Vec<String> = ADVICE_ORDER
            .into_iter()
            .filter(|factor| factor_risks[factor] > factor.advice_threshold())
            .map(|factor| factor.advice().to_string())
            .collect();

        if risk_level >= RiskBand::MediumHigh {
            recommendations.push("Consider agricultural insurance products".to_string());
            recommendations.push("Start with smaller loan amounts to build track record".to_string());
        }

        tracing::debug!(
            overall_risk_score,
            risk_level = risk_level.as_str(),
            "lending risk assessed"
        );

        Ok(RiskAssessment {
            overall_risk_score,
            risk_level,
            factor_risks,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParameterSet;
    use approx::assert_relative_eq;

    fn assessor() -> RiskAssessor {
        RiskAssessor::new(Arc::new(ScoringConfig::default()))
    }

    #[test]
    fn test_factor_tables() {
        assert_relative_eq!(weather_risk(Some("Manicaland"), None), 20.0);
        assert_relative_eq!(weather_risk(Some("matabeleland_south"), Some(12.0)), 60.0);
        assert_relative_eq!(weather_risk(Some("Midlands"), Some(6.0)), 43.0);
        assert_relative_eq!(weather_risk(None, Some(3.0)), 40.0);

        assert_relative_eq!(market_risk(Some("Soybeans")), 30.0);
        assert_relative_eq!(market_risk(Some("cassava")), 45.0);
        assert_relative_eq!(market_risk(None), 45.0);

        assert_relative_eq!(soil_risk(Some(72.0)), 28.0);
        assert_relative_eq!(soil_risk(None), 60.0);

        assert_relative_eq!(experience_risk(Some(12.0)), 20.0);
        assert_relative_eq!(experience_risk(Some(5.0)), 35.0);
        assert_relative_eq!(experience_risk(Some(2.0)), 50.0);
        assert_relative_eq!(experience_risk(None), 70.0);
    }

    #[test]
    fn test_credit_risk_from_default_rate() {
        assert_relative_eq!(credit_risk(&[]), 50.0);
        let history = vec![
            CreditRecord::new(100.0, 100.0, PaymentStatus::OnTime),
            CreditRecord::new(100.0, 0.0, PaymentStatus::Defaulted),
            CreditRecord::new(100.0, 90.0, PaymentStatus::Late),
            CreditRecord::new(100.0, 100.0, PaymentStatus::Restructured),
        ];
        assert_relative_eq!(credit_risk(&history), 40.0);
        assert_relative_eq!(credit_risk(&history[1..2]), 100.0);
    }

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(risk_level(0.0), RiskBand::Low);
        assert_eq!(risk_level(25.0), RiskBand::Low);
        assert_eq!(risk_level(25.1), RiskBand::Medium);
        assert_eq!(risk_level(50.0), RiskBand::Medium);
        assert_eq!(risk_level(75.0), RiskBand::MediumHigh);
        assert_eq!(risk_level(75.1), RiskBand::High);
        assert_eq!(risk_level(f64::NAN), RiskBand::High);
    }

    #[test]
    fn test_established_farm_is_low_risk() {
        let context = FarmContext {
            province: Some("Manicaland".to_string()),
            farm_size_hectares: Some(15.0),
            soil_health_score: Some(85.0),
            primary_crop: Some("soybeans".to_string()),
            farming_experience_years: Some(15.0),
            credit_history: vec![CreditRecord::new(500.0, 500.0, PaymentStatus::OnTime)],
            ..FarmContext::default()
        };
        let result = assessor().assess(&context).unwrap();

        // .25*15 + .30*15 + .20*30 + .15*20 + .10*20
        assert_relative_eq!(result.overall_risk_score, 19.25, epsilon = 1e-9);
        assert_eq!(result.risk_level, RiskBand::Low);
        assert_eq!(result.factor_risks.len(), 5);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_risky_farm_gets_factor_and_band_advice() {
        let context = FarmContext {
            province: Some("Matabeleland South".to_string()),
            soil: SoilParameterSet::from_pairs([("ph", 4.0), ("nitrogen", 5.0), ("organic_matter", 0.5)]).unwrap(),
            season: Some("dry".to_string()),
            primary_crop: Some("cotton".to_string()),
            farming_experience_years: Some(3.0),
            credit_history: vec![CreditRecord::new(500.0, 0.0, PaymentStatus::Defaulted)],
            ..FarmContext::default()
        };
        let result = assessor().assess(&context).unwrap();

        assert!(result.factor_risks[&RiskFactor::SoilHealth] > 60.0);
        assert_eq!(result.risk_level, RiskBand::MediumHigh);
        // soil, weather, credit, then the two band items
        assert_eq!(result.recommendations.len(), 5);
        assert!(result.recommendations[0].contains("soil improvement"));
        assert!(result.recommendations[1].contains("drought-resistant"));
        assert_eq!(
            result.recommendations.last().map(String::as_str),
            Some("Start with smaller loan amounts to build track record")
        );
        assert!(!result.recommendations.iter().any(|r| r.contains("contract farming")));
        assert!(!result.recommendations.iter().any(|r| r.contains("training")));
    }

    #[test]
    fn test_sparse_context_uses_defaults() {
        let result = assessor().assess(&FarmContext::default()).unwrap();
        // .25*40 + .30*60 + .20*45 + .15*50 + .10*70
        assert_relative_eq!(result.overall_risk_score, 51.5, epsilon = 1e-9);
        assert_eq!(result.risk_level, RiskBand::MediumHigh);
    }
}
