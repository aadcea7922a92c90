//! Farm viability scorer
//!
//! Combines the soil health score with five non-soil components into one
//! weighted 0-100 viability score, a risk band, ordered improvement advice and
//! tiered loan terms.

use super::components;
use super::context::FarmContext;
use crate::config::ScoringConfig;
use crate::error::ScoringResult;
use crate::recommendation::RecommendationEngine;
use crate::scoring::{RiskBand, SoilHealthScorer};
use crate::soil::{Region, Season, SeasonSelection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Soil advice items carried into the viability recommendations
const SOIL_ADVICE_ITEMS: usize = 3;
const CROP_SUGGESTIONS: usize = 3;
/// Loan conditions are the first few recommendations
const LOAN_CONDITIONS: usize = 3;
const GENERAL_ADVICE_BELOW: f64 = 50.0;

const QUICK_DEFAULT_SOIL: f64 = 50.0;
const QUICK_DEFAULT_FARM_SIZE: f64 = 2.0;
const QUICK_DEFAULT_EXPERIENCE: f64 = 5.0;

/// 2-10 ha is the best band for a smallholder loan
fn farm_size_score(hectares: f64) -> f64 {
    if (2.0..=10.0).contains(&hectares) {
        100.0
    } else if (1.0..2.0).contains(&hectares) || (hectares > 10.0 && hectares <= 20.0) {
        80.0
    } else if (0.5..1.0).contains(&hectares) || (hectares > 20.0 && hectares <= 50.0) {
        60.0
    } else {
        40.0
    }
}

fn experience_score(years: f64) -> f64 {
    if years >= 10.0 {
        100.0
    } else if years >= 5.0 {
        80.0
    } else if years >= 2.0 {
        60.0
    } else {
        40.0
    }
}

fn location_score(location_risk: Option<&str>) -> f64 {
    match location_risk.map(components::normalize).as_deref() {
        Some("low") => 100.0,
        Some("high") => 40.0,
        Some("very high") => 20.0,
        _ => 70.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViabilityComponent {
    SoilHealth,
    WaterAccess,
    ClimateResilience,
    CropSuitability,
    HistoricalPerformance,
    MarketAccess,
}

impl ViabilityComponent {
    /// Canonical order, matching `ComponentWeights::values`
    pub const ALL: [ViabilityComponent; 6] = [
        ViabilityComponent::SoilHealth,
        ViabilityComponent::WaterAccess,
        ViabilityComponent::ClimateResilience,
        ViabilityComponent::CropSuitability,
        ViabilityComponent::HistoricalPerformance,
        ViabilityComponent::MarketAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViabilityComponent::SoilHealth => "soil_health",
            ViabilityComponent::WaterAccess => "water_access",
            ViabilityComponent::ClimateResilience => "climate_resilience",
            ViabilityComponent::CropSuitability => "crop_suitability",
            ViabilityComponent::HistoricalPerformance => "historical_performance",
            ViabilityComponent::MarketAccess => "market_access",
        }
    }

    /// Scores below this produce advice
    pub fn advice_threshold(&self) -> f64 {
        match self {
            ViabilityComponent::SoilHealth => 60.0,
            _ => 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViabilityResult {
    pub overall_score: f64,
    pub risk_level: RiskBand,
    pub component_scores: BTreeMap<ViabilityComponent, f64>,
    /// Weakest component's advice first
    pub recommendations: Vec<String>,
    /// Components that had no input data and used their neutral value
    pub defaulted_components: Vec<ViabilityComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub eligible: bool,
    pub viability_score: f64,
    pub risk_level: RiskBand,
    pub max_amount: f64,
    /// Annual percentage rate
    pub interest_rate: Option<f64>,
    pub term_months: Option<u32>,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FarmViabilityScorer {
    config: Arc<ScoringConfig>,
    soil_scorer: SoilHealthScorer,
    recommender: RecommendationEngine,
}

impl FarmViabilityScorer {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        let soil_scorer = SoilHealthScorer::new(config.clone());
        let recommender = RecommendationEngine::new(config.clone());
        Self::from_parts(config, soil_scorer, recommender)
    }

    /// Build around shared components (e.g. a recommender with a cache)
    pub fn from_parts(
        config: Arc<ScoringConfig>,
        soil_scorer: SoilHealthScorer,
        recommender: RecommendationEngine,
    ) -> Self {
        Self {
            config,
            soil_scorer,
            recommender,
        }
    }

    pub fn calculate_comprehensive_score(&self, context: &FarmContext) -> ScoringResult<ViabilityResult> {
        context.validate()?;

        let viability = &self.config.viability;
        let neutral = &viability.neutral;
        let region = context.region_name().and_then(Region::parse);
        let season = SeasonSelection::parse(context.season.as_deref()).resolve();

        let soil = if !context.soil.is_empty() {
            Some(self.soil_scorer.score_with_context(&context.soil, region, season)?.overall_score)
        } else {
            context.soil_health_score
        };
        let as_of = context.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

        let raw: [(ViabilityComponent, Option<f64>, f64); 6] = [
            (ViabilityComponent::SoilHealth, soil, neutral.soil_health),
            (ViabilityComponent::WaterAccess, components::water_access(context), neutral.water_access),
            (
                ViabilityComponent::ClimateResilience,
                Some(components::climate_resilience(context)),
                0.0,
            ),
            (
                ViabilityComponent::CropSuitability,
                components::crop_suitability(context),
                neutral.crop_suitability,
            ),
            (
                ViabilityComponent::HistoricalPerformance,
                components::historical_performance(&context.credit_history, as_of, viability.recent_window_days),
                neutral.historical_performance,
            ),
            (ViabilityComponent::MarketAccess, Some(components::market_access(context)), 0.0),
        ];

        let mut component_scores = BTreeMap::new();
        let mut defaulted_components = Vec::new();
        let mut ordered = Vec::with_capacity(raw.len());
        for (component, score, fallback) in raw {
            let score = score.unwrap_or_else(|| {
                defaulted_components.push(component);
                fallback
            });
            component_scores.insert(component, score);
            ordered.push((component, score));
        }

        let overall_score = viability
            .weights
            .values()
            .iter()
            .zip(ordered.iter())
            .map(|(weight, (_, score))| weight * score)
            .sum::<f64>()
            .clamp(0.0, 100.0);
        let risk_level = RiskBand::from_score(overall_score);

        // Weakest first; stable sort keeps canonical order on ties
        ordered.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut recommendations = Vec::new();
        for (component, score) in &ordered {
            if *score < component.advice_threshold() {
                recommendations.extend(self.component_advice(*component, context, region, season)?);
            }
        }
        if overall_score < GENERAL_ADVICE_BELOW {
            recommendations.push(
                "Focus on improving soil health as the foundation for farm productivity".to_string(),
            );
            recommendations.push("Seek agricultural extension services for technical support".to_string());
        }

        tracing::debug!(
            overall_score,
            risk_level = risk_level.as_str(),
            defaulted = defaulted_components.len(),
            "farm viability scored"
        );

        Ok(ViabilityResult {
            overall_score,
            risk_level,
            component_scores,
            recommendations,
            defaulted_components,
        })
    }

    fn component_advice(
        &self,
        component: ViabilityComponent,
        context: &FarmContext,
        region: Option<Region>,
        season: Option<Season>,
    ) -> ScoringResult<Vec<String>> {
        let advice = match component {
            ViabilityComponent::SoilHealth => {
                if context.soil.is_empty() {
                    vec!["Commission a laboratory soil test to guide lime and fertilizer decisions".to_string()]
                } else {
                    let ranges = self.soil_scorer.adjusted_ranges(region, season);
                    self.recommender
                        .recommend(&context.soil, &ranges, region, context.primary_crop.as_deref(), season)?
                        .iter()
                        .take(SOIL_ADVICE_ITEMS)
                        .map(|r| r.summary())
                        .collect()
                }
            }
            ViabilityComponent::WaterAccess => vec![
                "Consider investing in water storage or irrigation infrastructure".to_string(),
                "Implement water conservation techniques like mulching".to_string(),
            ],
            ViabilityComponent::ClimateResilience => vec![
                "Adopt drought-resistant crop varieties".to_string(),
                "Implement conservation agriculture practices".to_string(),
                "Diversify cropping systems to spread climate risk".to_string(),
            ],
            ViabilityComponent::CropSuitability => {
                let ranked = if context.soil.is_empty() {
                    Vec::new()
                } else {
                    self.recommender.rank_crops(&context.soil, region, season)
                };
                if ranked.is_empty() {
                    vec!["Select crops matched to local soil and rainfall with extension support".to_string()]
                } else {
                    let names: Vec<&str> = ranked
                        .iter()
                        .take(CROP_SUGGESTIONS)
                        .map(|m| m.display_name.as_str())
                        .collect();
                    vec![format!("Consider better-suited crops: {}", names.join(", "))]
                }
            }
            ViabilityComponent::HistoricalPerformance => vec![
                "Keep repayments current on existing loans to rebuild the credit record".to_string(),
            ],
            ViabilityComponent::MarketAccess => vec![
                "Form farmer cooperatives to improve market access".to_string(),
                "Invest in post-harvest storage facilities".to_string(),
            ],
        };
        Ok(advice)
    }

    /// Five-factor screening score from farm profile fields alone.
    ///
    /// Defaults: soil 50, 2 ha, 5 years, one crop, medium location risk.
    pub fn quick_viability_score(&self, context: &FarmContext) -> ScoringResult<f64> {
        context.validate()?;

        let soil = if !context.soil.is_empty() {
            let region = context.region_name().and_then(Region::parse);
            let season = SeasonSelection::parse(context.season.as_deref()).resolve();
            self.soil_scorer.score_with_context(&context.soil, region, season)?.overall_score
        } else {
            context.soil_health_score.unwrap_or(QUICK_DEFAULT_SOIL)
        };

        let scores = [
            soil.min(100.0),
            farm_size_score(context.farm_size_hectares.unwrap_or(QUICK_DEFAULT_FARM_SIZE)),
            experience_score(context.farming_experience_years.unwrap_or(QUICK_DEFAULT_EXPERIENCE)),
            (context.crop_diversity.unwrap_or(1) as f64 * 25.0).min(100.0),
            location_score(context.location_risk.as_deref()),
        ];

        Ok(self
            .config
            .viability
            .quick_weights
            .values()
            .iter()
            .zip(scores.iter())
            .map(|(weight, score)| weight * score)
            .sum::<f64>()
            .clamp(0.0, 100.0))
    }

    pub fn calculate_loan_eligibility(&self, context: &FarmContext) -> ScoringResult<LoanTerms> {
        let result = self.calculate_comprehensive_score(context)?;
        Ok(self.loan_terms(&result))
    }

    /// Loan terms for an already computed viability result
    pub fn loan_terms(&self, result: &ViabilityResult) -> LoanTerms {
        let score = result.overall_score;
        let tier = self
            .config
            .viability
            .loan_tiers
            .iter()
            .find(|tier| score >= tier.min_score);

        let conditions = result.recommendations.iter().take(LOAN_CONDITIONS).cloned().collect();

        match tier {
            Some(tier) => LoanTerms {
                eligible: true,
                viability_score: score,
                risk_level: result.risk_level,
                max_amount: score * tier.amount_per_point,
                interest_rate: Some(tier.interest_rate),
                term_months: Some(tier.term_months),
                conditions,
            },
            None => LoanTerms {
                eligible: false,
                viability_score: score,
                risk_level: result.risk_level,
                max_amount: 0.0,
                interest_rate: None,
                term_months: None,
                conditions,
            },
        }
    }
}
