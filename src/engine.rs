//! Scoring engine
//!
//! In-process entry point over flat maps and primitive types. Owns one of each
//! component, all sharing the same `Arc<ScoringConfig>`; a recommendation
//! cache or a pre-trained yield predictor can be injected with the builder
//! methods.

use crate::config::ScoringConfig;
use crate::error::ScoringResult;
use crate::recommendation::{CropMatch, Recommendation, RecommendationCache, RecommendationEngine};
use crate::scoring::{RiskBand, RiskClassifier, ScoreResult, SoilHealthScorer};
use crate::soil::{Region, SeasonSelection, SoilParameterSet};
use crate::viability::{FarmContext, FarmViabilityScorer, LoanTerms, RiskAssessment, RiskAssessor, ViabilityResult};
use crate::yield_model::{YieldPrediction, YieldPredictor};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One soil sample plus the context needed for a full report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilAssessmentRequest {
    pub soil: HashMap<String, f64>,
    pub region: Option<String>,
    pub season: Option<String>,
    pub crop: Option<String>,
    /// Premium is only estimated when a base premium is given
    pub base_premium: Option<f64>,
    pub include_yield: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReport {
    pub score: ScoreResult,
    pub risk_band: RiskBand,
    pub premium: Option<f64>,
    pub recommendations: Vec<Recommendation>,
    pub suitable_crops: Vec<CropMatch>,
    pub yield_prediction: Option<YieldPrediction>,
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: Arc<ScoringConfig>,
    soil_scorer: SoilHealthScorer,
    classifier: RiskClassifier,
    recommender: RecommendationEngine,
    predictor: Arc<YieldPredictor>,
    viability: FarmViabilityScorer,
    risk_assessor: RiskAssessor,
}

impl ScoringEngine {
    /// Validate `config` and build every component around it
    pub fn new(config: ScoringConfig) -> ScoringResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let soil_scorer = SoilHealthScorer::new(config.clone());
        let recommender = RecommendationEngine::new(config.clone());
        let viability = FarmViabilityScorer::from_parts(config.clone(), soil_scorer.clone(), recommender.clone());
        let risk_assessor = RiskAssessor::from_parts(config.clone(), soil_scorer.clone());

        tracing::info!(
            penalty_curve = ?config.soil.penalty_curve,
            yield_trees = config.yield_model.n_trees,
            "scoring engine ready"
        );

        Ok(Self {
            predictor: Arc::new(YieldPredictor::new(config.clone())),
            config,
            soil_scorer,
            classifier: RiskClassifier::new(),
            recommender,
            viability,
            risk_assessor,
        })
    }

    /// Route recommendation lookups through `cache`
    pub fn with_recommendation_cache(mut self, cache: Arc<dyn RecommendationCache>) -> Self {
        self.recommender = self.recommender.with_cache(cache);
        self.viability = FarmViabilityScorer::from_parts(
            self.config.clone(),
            self.soil_scorer.clone(),
            self.recommender.clone(),
        );
        self
    }

    /// Share an existing (possibly pre-trained) predictor
    pub fn with_yield_predictor(mut self, predictor: Arc<YieldPredictor>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn yield_predictor(&self) -> &Arc<YieldPredictor> {
        &self.predictor
    }

    pub fn score_soil(
        &self,
        parameters: &HashMap<String, f64>,
        region: Option<&str>,
        season: Option<&str>,
    ) -> ScoringResult<ScoreResult> {
        let set = SoilParameterSet::from_map(parameters)?;
        self.soil_scorer.calculate_score(&set, region, season)
    }

    /// Score many samples in parallel. Results keep the input order and
    /// every sample sees the same resolved season.
    pub fn score_soil_batch(
        &self,
        samples: &[HashMap<String, f64>],
        region: Option<&str>,
        season: Option<&str>,
    ) -> Vec<ScoringResult<ScoreResult>> {
        let region = region.and_then(Region::parse);
        let season = SeasonSelection::parse(season).resolve();

        samples
            .par_iter()
            .map(|sample| {
                let set = SoilParameterSet::from_map(sample)?;
                self.soil_scorer.score_with_context(&set, region, season)
            })
            .collect()
    }

    pub fn classify_risk(&self, score: f64) -> RiskBand {
        self.classifier.classify(score)
    }

    pub fn estimate_premium(&self, score: f64, base_premium: f64) -> ScoringResult<f64> {
        self.classifier.premium(score, base_premium)
    }

    /// Advice judged against region- and season-adjusted ranges.
    /// A missing season means the current calendar season.
    pub fn recommend(
        &self,
        parameters: &HashMap<String, f64>,
        region: Option<&str>,
        season: Option<&str>,
        crop: Option<&str>,
    ) -> ScoringResult<Vec<Recommendation>> {
        let set = SoilParameterSet::from_map(parameters)?;
        let region = region.and_then(Region::parse);
        let season = SeasonSelection::parse(season).resolve();
        let ranges = self.soil_scorer.adjusted_ranges(region, season);
        self.recommender.recommend(&set, &ranges, region, crop, season)
    }

    pub fn rank_crops(
        &self,
        parameters: &HashMap<String, f64>,
        region: Option<&str>,
        season: Option<&str>,
    ) -> ScoringResult<Vec<CropMatch>> {
        let set = SoilParameterSet::from_map(parameters)?;
        let region = region.and_then(Region::parse);
        let season = SeasonSelection::parse(season).resolve();
        Ok(self.recommender.rank_crops(&set, region, season))
    }

    pub fn predict_yield(&self, parameters: &HashMap<String, f64>) -> ScoringResult<YieldPrediction> {
        let set = SoilParameterSet::from_map(parameters)?;
        self.predictor.predict(&set)
    }

    pub fn score_farm_viability(&self, context: &FarmContext) -> ScoringResult<ViabilityResult> {
        self.viability.calculate_comprehensive_score(context)
    }

    pub fn loan_eligibility(&self, context: &FarmContext) -> ScoringResult<LoanTerms> {
        self.viability.calculate_loan_eligibility(context)
    }

    pub fn quick_viability(&self, context: &FarmContext) -> ScoringResult<f64> {
        self.viability.quick_viability_score(context)
    }

    /// Five-factor lending risk (higher is riskier)
    pub fn assess_risk(&self, context: &FarmContext) -> ScoringResult<RiskAssessment> {
        self.risk_assessor.assess(context)
    }

    /// Full soil report: score, band, premium, advice, crops and yield
    pub fn assess(&self, request: &SoilAssessmentRequest) -> ScoringResult<SoilReport> {
        let set = SoilParameterSet::from_map(&request.soil)?;
        let region = request.region.as_deref().and_then(Region::parse);
        let season = SeasonSelection::parse(request.season.as_deref()).resolve();

        let score = self.soil_scorer.score_with_context(&set, region, season)?;
        let risk_band = self.classifier.classify(score.overall_score);
        let premium = request
            .base_premium
            .map(|base| self.classifier.premium(score.overall_score, base))
            .transpose()?;

        let ranges = self.soil_scorer.adjusted_ranges(region, season);
        let recommendations = self
            .recommender
            .recommend(&set, &ranges, region, request.crop.as_deref(), season)?;
        let suitable_crops = self.recommender.rank_crops(&set, region, season);

        let yield_prediction = if request.include_yield {
            Some(self.predictor.predict(&set)?)
        } else {
            None
        };

        Ok(SoilReport {
            score,
            risk_band,
            premium,
            recommendations,
            suitable_crops,
            yield_prediction,
        })
    }
}
