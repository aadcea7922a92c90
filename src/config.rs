//! Scoring configuration
//!
//! One immutable `ScoringConfig` is built at start-up (defaults or JSON),
//! validated, wrapped in an `Arc` and handed to every component. Every section
//! uses `#[serde(default)]` so a JSON file only needs the values it overrides.

use crate::error::{ScoringError, ScoringResult};
use crate::soil::{IdealRange, IdealRanges, PenaltyCurve, RangeOffset, Region, Season, SoilParameter};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub soil: SoilConfig,
    pub recommendation: RecommendationConfig,
    pub yield_model: YieldConfig,
    pub viability: ViabilityConfig,
    pub risk_assessment: RiskAssessmentConfig,
}

impl ScoringConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring config: {:?}", path))?;

        let config = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid scoring config: {:?}", path))?;

        Ok(config)
    }

    pub fn from_json_str(json: &str) -> ScoringResult<Self> {
        let config: ScoringConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScoringResult<()> {
        self.soil.validate()?;
        self.recommendation.validate()?;
        self.yield_model.validate()?;
        self.viability.validate()?;
        self.risk_assessment.validate()
    }
}

fn check_weights(section: &str, weights: &[f64]) -> ScoringResult<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(invalid(format!("{} weights must be non-negative", section)));
    }
    let total: f64 = weights.iter().sum();
    if (total - 1.0).abs() > 1e-6 {
        return Err(invalid(format!("{} weights must sum to 1.0 (got {:.4})", section, total)));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ScoringError {
    ScoringError::InvalidConfiguration(message.into())
}

// ============================================================================
// Soil health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilConfig {
    pub ideal_ranges: IdealRanges,
    pub weights: BTreeMap<SoilParameter, f64>,
    pub region_offsets: BTreeMap<Region, BTreeMap<SoilParameter, RangeOffset>>,
    pub season_offsets: BTreeMap<Season, BTreeMap<SoilParameter, RangeOffset>>,
    pub penalty_curve: PenaltyCurve,
}

impl Default for SoilConfig {
    fn default() -> Self {
        use SoilParameter::*;

        let ideal_ranges = BTreeMap::from([
            (Ph, IdealRange::new(6.0, 7.0)),
            (Nitrogen, IdealRange::new(20.0, 40.0)),
            (Phosphorus, IdealRange::new(15.0, 30.0)),
            (Potassium, IdealRange::new(150.0, 250.0)),
            (OrganicMatter, IdealRange::new(3.0, 5.0)),
            (CationExchangeCapacity, IdealRange::new(10.0, 20.0)),
            (Moisture, IdealRange::new(20.0, 30.0)),
        ]);

        let weights = BTreeMap::from([
            (Ph, 0.20),
            (Nitrogen, 0.15),
            (Phosphorus, 0.15),
            (Potassium, 0.15),
            (OrganicMatter, 0.15),
            (CationExchangeCapacity, 0.10),
            (Moisture, 0.10),
        ]);

        let region_offsets = BTreeMap::from([
            (
                Region::Mashonaland,
                BTreeMap::from([
                    (Nitrogen, RangeOffset::new(5.0, 5.0)),
                    (OrganicMatter, RangeOffset::new(0.5, 0.5)),
                ]),
            ),
            (
                Region::Manicaland,
                BTreeMap::from([
                    (Ph, RangeOffset::new(-0.5, -0.5)),
                    (Phosphorus, RangeOffset::new(0.0, 5.0)),
                    (Moisture, RangeOffset::new(5.0, 0.0)),
                ]),
            ),
            (
                Region::Matabeleland,
                BTreeMap::from([
                    (Ph, RangeOffset::new(0.0, 0.5)),
                    (Nitrogen, RangeOffset::new(-5.0, 0.0)),
                    (OrganicMatter, RangeOffset::new(-0.5, 0.0)),
                    (Moisture, RangeOffset::new(-5.0, 0.0)),
                ]),
            ),
        ]);

        let season_offsets = BTreeMap::from([
            (Season::Rainy, BTreeMap::from([(Moisture, RangeOffset::new(5.0, 10.0))])),
            (Season::Dry, BTreeMap::from([(Moisture, RangeOffset::new(-5.0, -5.0))])),
            (Season::Transition, BTreeMap::from([(Moisture, RangeOffset::new(0.0, -5.0))])),
        ]);

        Self {
            ideal_ranges,
            weights,
            region_offsets,
            season_offsets,
            penalty_curve: PenaltyCurve::Sigmoid,
        }
    }
}

impl SoilConfig {
    /// Ideal ranges with region then season offsets applied
    pub fn adjusted_ranges(&self, region: Option<Region>, season: Option<Season>) -> IdealRanges {
        let mut ranges = self.ideal_ranges.clone();

        let offset_tables = [
            region.and_then(|r| self.region_offsets.get(&r)),
            season.and_then(|s| self.season_offsets.get(&s)),
        ];
        for table in offset_tables.into_iter().flatten() {
            for (parameter, offset) in table {
                if let Some(range) = ranges.get_mut(parameter) {
                    *range = range.shifted(offset);
                }
            }
        }
        ranges
    }

    fn validate(&self) -> ScoringResult<()> {
        for (parameter, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(invalid(format!("weight for '{}' must be non-negative", parameter)));
            }
        }

        let regions = std::iter::once(None).chain(self.region_offsets.keys().copied().map(Some));
        for region in regions {
            let seasons = std::iter::once(None).chain(self.season_offsets.keys().copied().map(Some));
            for season in seasons {
                for (parameter, range) in self.adjusted_ranges(region, season) {
                    if !range.is_valid() {
                        return Err(ScoringError::InvalidIdealRange {
                            parameter: parameter.as_str().to_string(),
                            min: range.min,
                            max: range.max,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Recommendations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    /// Parameters scoring below this get a recommendation
    pub score_threshold: f64,
    /// Crops must score strictly above this to be suggested
    pub crop_cutoff: f64,
    /// Crop-specific advice is only appended below this many items
    pub crop_advice_limit: usize,
    pub cache_ttl_secs: u64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.7,
            crop_cutoff: 0.65,
            crop_advice_limit: 5,
            cache_ttl_secs: 3600,
        }
    }
}

impl RecommendationConfig {
    fn validate(&self) -> ScoringResult<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(invalid("recommendation.score_threshold must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.crop_cutoff) {
            return Err(invalid("recommendation.crop_cutoff must be within [0, 1]"));
        }
        Ok(())
    }
}

// ============================================================================
// Yield model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
    pub synthetic_samples: usize,
    /// Half-width of the uniform noise added to synthetic targets
    pub noise_amplitude: f64,
    pub holdout_fraction: f64,
    /// Importance at or above this marks a limiting factor as high impact
    pub importance_cutoff: f64,
    pub max_limiting_factors: usize,
    pub range_confidence_weight: f64,
    pub model_confidence_weight: f64,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
            synthetic_samples: 500,
            noise_amplitude: 0.5,
            holdout_fraction: 0.2,
            importance_cutoff: 0.15,
            max_limiting_factors: 3,
            range_confidence_weight: 0.7,
            model_confidence_weight: 0.3,
        }
    }
}

impl YieldConfig {
    fn validate(&self) -> ScoringResult<()> {
        if self.n_trees == 0 || self.max_depth == 0 {
            return Err(invalid("yield_model needs at least one tree of depth >= 1"));
        }
        if self.min_samples_leaf == 0 || self.min_samples_split < 2 {
            return Err(invalid("yield_model.min_samples_leaf >= 1 and min_samples_split >= 2"));
        }
        if !(0.0..0.5).contains(&self.holdout_fraction) {
            return Err(invalid("yield_model.holdout_fraction must be within [0, 0.5)"));
        }
        if !self.noise_amplitude.is_finite() || self.noise_amplitude < 0.0 {
            return Err(invalid("yield_model.noise_amplitude must be non-negative"));
        }
        let total = self.range_confidence_weight + self.model_confidence_weight;
        if self.range_confidence_weight < 0.0
            || self.model_confidence_weight < 0.0
            || (total - 1.0).abs() > 1e-6
        {
            return Err(invalid("yield_model confidence weights must be non-negative and sum to 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Farm viability
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentWeights {
    pub soil_health: f64,
    pub water_access: f64,
    pub climate_resilience: f64,
    pub crop_suitability: f64,
    pub historical_performance: f64,
    pub market_access: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            soil_health: 0.35,
            water_access: 0.20,
            climate_resilience: 0.15,
            crop_suitability: 0.10,
            historical_performance: 0.10,
            market_access: 0.10,
        }
    }
}

impl ComponentWeights {
    pub fn values(&self) -> [f64; 6] {
        [
            self.soil_health,
            self.water_access,
            self.climate_resilience,
            self.crop_suitability,
            self.historical_performance,
            self.market_access,
        ]
    }
}

/// Weights of the quick five-factor viability score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickViabilityWeights {
    pub soil_health: f64,
    pub farm_size: f64,
    pub experience: f64,
    pub crop_diversity: f64,
    pub location: f64,
}

impl Default for QuickViabilityWeights {
    fn default() -> Self {
        Self {
            soil_health: 0.30,
            farm_size: 0.20,
            experience: 0.20,
            crop_diversity: 0.15,
            location: 0.15,
        }
    }
}

impl QuickViabilityWeights {
    pub fn values(&self) -> [f64; 5] {
        [
            self.soil_health,
            self.farm_size,
            self.experience,
            self.crop_diversity,
            self.location,
        ]
    }
}

/// Neutral scores used when a component has no input data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeutralDefaults {
    pub soil_health: f64,
    pub water_access: f64,
    pub crop_suitability: f64,
    pub historical_performance: f64,
}

impl Default for NeutralDefaults {
    fn default() -> Self {
        Self {
            soil_health: 50.0,
            water_access: 50.0,
            crop_suitability: 50.0,
            historical_performance: 60.0,
        }
    }
}

/// One rung of the loan ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTier {
    pub min_score: f64,
    /// Maximum amount = viability score × this
    pub amount_per_point: f64,
    /// Annual percentage rate
    pub interest_rate: f64,
    pub term_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViabilityConfig {
    pub weights: ComponentWeights,
    pub quick_weights: QuickViabilityWeights,
    pub neutral: NeutralDefaults,
    /// Credit records younger than this count as recent
    pub recent_window_days: i64,
    /// Ordered from the highest threshold down
    pub loan_tiers: Vec<LoanTier>,
}

impl Default for ViabilityConfig {
    fn default() -> Self {
        Self {
            weights: ComponentWeights::default(),
            quick_weights: QuickViabilityWeights::default(),
            neutral: NeutralDefaults::default(),
            recent_window_days: 365,
            loan_tiers: vec![
                LoanTier { min_score: 80.0, amount_per_point: 150.0, interest_rate: 8.0, term_months: 24 },
                LoanTier { min_score: 65.0, amount_per_point: 100.0, interest_rate: 12.0, term_months: 18 },
                LoanTier { min_score: 50.0, amount_per_point: 75.0, interest_rate: 15.0, term_months: 12 },
            ],
        }
    }
}

impl ViabilityConfig {
    fn validate(&self) -> ScoringResult<()> {
        check_weights("viability", &self.weights.values())?;
        check_weights("viability.quick", &self.quick_weights.values())?;

        // Higher tiers must be at least as generous on every axis
        for pair in self.loan_tiers.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.min_score <= lower.min_score
                || upper.amount_per_point < lower.amount_per_point
                || upper.interest_rate > lower.interest_rate
                || upper.term_months < lower.term_months
            {
                return Err(invalid("loan tiers must be ordered from most to least generous"));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Lending risk assessment
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFactorWeights {
    pub weather: f64,
    pub soil_health: f64,
    pub market: f64,
    pub credit_history: f64,
    pub farming_experience: f64,
}

impl Default for RiskFactorWeights {
    fn default() -> Self {
        Self {
            weather: 0.25,
            soil_health: 0.30,
            market: 0.20,
            credit_history: 0.15,
            farming_experience: 0.10,
        }
    }
}

impl RiskFactorWeights {
    pub fn values(&self) -> [f64; 5] {
        [
            self.weather,
            self.soil_health,
            self.market,
            self.credit_history,
            self.farming_experience,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessmentConfig {
    pub weights: RiskFactorWeights,
}

impl RiskAssessmentConfig {
    fn validate(&self) -> ScoringResult<()> {
        check_weights("risk_assessment", &self.weights.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        ScoringConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_override() {
        let config = ScoringConfig::from_json_str(
            r#"{
                "soil": { "weights": { "ph": 0.5, "nitrogen": 0.5 } },
                "yield_model": { "n_trees": 10 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.soil.weights.len(), 2);
        assert_eq!(config.yield_model.n_trees, 10);
        assert_eq!(config.yield_model.max_depth, 10);
        // Untouched sections keep defaults
        assert_eq!(config.soil.ideal_ranges.len(), 7);
        assert_eq!(config.viability.loan_tiers.len(), 3);
    }

    #[test]
    fn test_adjusted_ranges() {
        let soil = SoilConfig::default();
        let ranges = soil.adjusted_ranges(Some(Region::Manicaland), Some(Season::Rainy));

        let ph = ranges[&SoilParameter::Ph];
        assert_eq!((ph.min, ph.max), (5.5, 6.5));
        let moisture = ranges[&SoilParameter::Moisture];
        assert_eq!((moisture.min, moisture.max), (30.0, 40.0));

        let plain = soil.adjusted_ranges(None, None);
        assert_eq!(plain, soil.ideal_ranges);
    }

    #[test]
    fn test_rejects_bad_weights() {
        let err = ScoringConfig::from_json_str(r#"{ "viability": { "weights": { "soil_health": 0.9 } } }"#);
        assert!(err.is_err());

        let err = ScoringConfig::from_json_str(r#"{ "soil": { "weights": { "ph": -1.0 } } }"#);
        assert!(err.is_err());

        let err = ScoringConfig::from_json_str(r#"{ "risk_assessment": { "weights": { "weather": 0.5 } } }"#);
        assert!(matches!(err, Err(ScoringError::InvalidConfiguration(_))));

        let err = ScoringConfig::from_json_str(r#"{ "viability": { "quick_weights": { "location": 0.4 } } }"#);
        assert!(err.is_err());

        let ok = ScoringConfig::from_json_str(
            r#"{ "risk_assessment": { "weights": { "weather": 0.35, "farming_experience": 0.0 } } }"#,
        )
        .unwrap();
        assert_eq!(ok.risk_assessment.weights.weather, 0.35);
    }

    #[test]
    fn test_rejects_inverted_adjusted_range() {
        let err = ScoringConfig::from_json_str(
            r#"{ "soil": { "season_offsets": { "dry": { "moisture": { "min": 15.0, "max": -15.0 } } } } }"#,
        );
        assert!(matches!(err, Err(ScoringError::InvalidIdealRange { .. })));
    }

    #[test]
    fn test_rejects_unordered_loan_tiers() {
        let err = ScoringConfig::from_json_str(
            r#"{ "viability": { "loan_tiers": [
                { "min_score": 50.0, "amount_per_point": 75.0, "interest_rate": 15.0, "term_months": 12 },
                { "min_score": 80.0, "amount_per_point": 150.0, "interest_rate": 8.0, "term_months": 24 }
            ] } }"#,
        );
        assert!(err.is_err());
    }
}
