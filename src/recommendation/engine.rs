use super::advice::{crop_advice, general_maintenance, parameter_advice};
use super::cache::{cache_key, RecommendationCache};
use super::crop_suitability::{rank_crops, CropMatch};
use super::types::Recommendation;
use crate::config::ScoringConfig;
use crate::error::ScoringResult;
use crate::soil::{IdealRanges, ParameterNormalizer, Region, Season, SoilParameter, SoilParameterSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Produces ordered soil improvement advice and crop rankings
#[derive(Clone)]
pub struct RecommendationEngine {
    config: Arc<ScoringConfig>,
    normalizer: ParameterNormalizer,
    cache: Option<Arc<dyn RecommendationCache>>,
}

impl fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("normalizer", &self.normalizer)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl RecommendationEngine {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        let normalizer = ParameterNormalizer::new(config.soil.penalty_curve);
        Self {
            config,
            normalizer,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn RecommendationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Ordered recommendations for a sample.
    ///
    /// # Arguments
    /// * `params` - Validated soil sample
    /// * `ranges` - Ideal ranges to judge against (normally region/season adjusted)
    /// * `region`, `season` - Context for local notes and seasonal suppression
    /// * `crop` - Optional crop for a crop-specific programme
    ///
    /// # Returns
    /// Lowest-scoring parameter first, at most one item per parameter. A single
    /// maintenance item when nothing falls below the threshold.
    pub fn recommend(
        &self,
        params: &SoilParameterSet,
        ranges: &IdealRanges,
        region: Option<Region>,
        crop: Option<&str>,
        season: Option<Season>,
    ) -> ScoringResult<Vec<Recommendation>> {
        let key = self
            .cache
            .as_ref()
            .map(|_| cache_key(params, ranges, region, crop, season));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                tracing::debug!(key = key.as_str(), "recommendation cache hit");
                return Ok(hit);
            }
        }

        let recommendations = self.build(params, ranges, region, crop, season)?;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            let ttl = Duration::from_secs(self.config.recommendation.cache_ttl_secs);
            cache.put(key, recommendations.clone(), ttl);
        }
        Ok(recommendations)
    }

    fn build(
        &self,
        params: &SoilParameterSet,
        ranges: &IdealRanges,
        region: Option<Region>,
        crop: Option<&str>,
        season: Option<Season>,
    ) -> ScoringResult<Vec<Recommendation>> {
        let threshold = self.config.recommendation.score_threshold;

        let mut flagged: Vec<(SoilParameter, f64, f64)> = Vec::new();
        for (parameter, value) in params.iter() {
            let Some(range) = ranges.get(&parameter) else {
                continue;
            };
            let score = self.normalizer.score_range(value, range, parameter)?;
            if score < threshold {
                flagged.push((parameter, value, score));
            }
        }
        flagged.sort_by(|a, b| a.2.total_cmp(&b.2));

        let mut recommendations: Vec<Recommendation> = flagged
            .into_iter()
            .filter_map(|(parameter, value, score)| {
                let range = ranges.get(&parameter)?;
                parameter_advice(parameter, value, range, region, season).map(|r| r.with_score(score))
            })
            .collect();

        if recommendations.is_empty() {
            recommendations.push(general_maintenance());
        }

        if let Some(crop) = crop {
            if recommendations.len() < self.config.recommendation.crop_advice_limit {
                recommendations.extend(crop_advice(crop, params));
            }
        }

        Ok(recommendations)
    }

    /// Crops above the configured cutoff, most suitable first
    pub fn rank_crops(
        &self,
        params: &SoilParameterSet,
        region: Option<Region>,
        season: Option<Season>,
    ) -> Vec<CropMatch> {
        rank_crops(params, region, season, self.config.recommendation.crop_cutoff)
    }
}
