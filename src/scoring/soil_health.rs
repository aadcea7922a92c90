//! Soil health scorer
//!
//! Weighted aggregate of per-parameter normalized scores, renormalized over
//! the weights actually used so a partial sample still lands on 0-100.

use crate::config::ScoringConfig;
use crate::error::ScoringResult;
use crate::soil::{
    IdealRanges, ParameterNormalizer, Region, Season, SeasonSelection, SoilParameter, SoilParameterSet,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Result of one soil health calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Overall score (0-100)
    pub overall_score: f64,
    /// Normalized score per scored parameter (0-1)
    pub parameter_scores: BTreeMap<SoilParameter, f64>,
    pub region: Option<Region>,
    pub season: Option<Season>,
}

impl ScoreResult {
    fn empty(region: Option<Region>, season: Option<Season>) -> Self {
        Self {
            overall_score: 0.0,
            parameter_scores: BTreeMap::new(),
            region,
            season,
        }
    }

    /// Parameters ordered from worst to best score; ties keep canonical order.
    pub fn weakest_first(&self) -> Vec<(SoilParameter, f64)> {
        let mut ranked: Vec<(SoilParameter, f64)> =
            self.parameter_scores.iter().map(|(p, s)| (*p, *s)).collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

#[derive(Debug, Clone)]
pub struct SoilHealthScorer {
    config: Arc<ScoringConfig>,
    normalizer: ParameterNormalizer,
}

impl SoilHealthScorer {
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        let normalizer = ParameterNormalizer::new(config.soil.penalty_curve);
        Self { config, normalizer }
    }

    pub fn normalizer(&self) -> &ParameterNormalizer {
        &self.normalizer
    }

    /// Ideal ranges after region and season offsets
    pub fn adjusted_ranges(&self, region: Option<Region>, season: Option<Season>) -> IdealRanges {
        self.config.soil.adjusted_ranges(region, season)
    }

    /// Score a parameter set with string region/season as supplied by callers.
    ///
    /// Unknown region or season strings apply no adjustment. A missing season
    /// falls back to the current calendar month.
    pub fn calculate_score(
        &self,
        parameters: &SoilParameterSet,
        region: Option<&str>,
        season: Option<&str>,
    ) -> ScoringResult<ScoreResult> {
        let region = region.and_then(Region::parse);
        let season = SeasonSelection::parse(season).resolve();
        self.score_with_context(parameters, region, season)
    }

    /// Score with an already-resolved context
    pub fn score_with_context(
        &self,
        parameters: &SoilParameterSet,
        region: Option<Region>,
        season: Option<Season>,
    ) -> ScoringResult<ScoreResult> {
        let ranges = self.adjusted_ranges(region, season);
        let mut parameter_scores = BTreeMap::new();
        let mut weighted_sum = 0.0;
        let mut weight_used = 0.0;

        for (parameter, value) in parameters.iter() {
            let (Some(weight), Some(range)) =
                (self.config.soil.weights.get(&parameter), ranges.get(&parameter))
            else {
                continue;
            };

            let score = self.normalizer.score_range(value, range, parameter)?;
            parameter_scores.insert(parameter, score);
            weighted_sum += score * weight;
            weight_used += weight;
        }

        if parameter_scores.is_empty() || weight_used <= 0.0 {
            return Ok(ScoreResult::empty(region, season));
        }

        let overall_score = (weighted_sum / weight_used * 100.0).clamp(0.0, 100.0);

        Ok(ScoreResult {
            overall_score,
            parameter_scores,
            region,
            season,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn scorer() -> SoilHealthScorer {
        SoilHealthScorer::new(Arc::new(ScoringConfig::default()))
    }

    fn set(pairs: &[(&str, f64)]) -> SoilParameterSet {
        let map: HashMap<String, f64> = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        SoilParameterSet::from_map(&map).unwrap()
    }

    #[test]
    fn test_mid_range_sample_is_perfect() {
        let params = set(&[
            ("ph", 6.5),
            ("nitrogen", 30.0),
            ("phosphorus", 25.0),
            ("potassium", 200.0),
            ("organic_matter", 4.0),
            ("cec", 15.0),
            ("moisture", 25.0),
        ]);
        for season in [Season::Rainy, Season::Dry, Season::Transition] {
            let result = scorer().score_with_context(&params, None, Some(season)).unwrap();
            assert_relative_eq!(result.overall_score, 100.0, epsilon = 1e-9);
            assert_eq!(result.parameter_scores.len(), 7);
        }
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let result = scorer().calculate_score(&SoilParameterSet::new(), None, None).unwrap();
        assert_eq!(result.overall_score, 0.0);
        assert!(result.parameter_scores.is_empty());
    }

    #[test]
    fn test_renormalizes_over_present_weights() {
        // One perfect, one poor parameter: weights 0.20 (ph) and 0.15 (nitrogen)
        let params = set(&[("ph", 6.5), ("nitrogen", 10.0)]);
        let result = scorer().score_with_context(&params, None, None).unwrap();
        let n = result.parameter_scores[&SoilParameter::Nitrogen];
        let expected = (0.20 * 1.0 + 0.15 * n) / 0.35 * 100.0;
        assert_relative_eq!(result.overall_score, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_region_and_season_ignored() {
        let params = set(&[("ph", 5.8), ("moisture", 22.0)]);
        let s = scorer();
        let plain = s.score_with_context(&params, None, None).unwrap();
        let unknown = s.calculate_score(&params, Some("Atlantis"), Some("monsoon")).unwrap();
        assert_eq!(plain.overall_score, unknown.overall_score);
        assert_eq!(unknown.region, None);
        assert_eq!(unknown.season, None);
    }

    #[test]
    fn test_region_shifts_ranges() {
        // pH 5.7 is low for the default band but inside Manicaland's 5.5-6.5
        let params = set(&[("ph", 5.7)]);
        let s = scorer();
        let plain = s.score_with_context(&params, None, None).unwrap();
        let manicaland = s.calculate_score(&params, Some("Manicaland"), Some("dry")).unwrap();
        assert!(plain.overall_score < 100.0);
        assert_relative_eq!(manicaland.overall_score, 100.0);
    }

    #[test]
    fn test_weakest_first() {
        let params = set(&[("ph", 6.5), ("nitrogen", 5.0), ("potassium", 100.0)]);
        let result = scorer().score_with_context(&params, None, None).unwrap();
        let order: Vec<SoilParameter> = result.weakest_first().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order[0], SoilParameter::Nitrogen);
        assert_eq!(order[2], SoilParameter::Ph);
    }

    #[test]
    fn test_deterministic() {
        let params = set(&[("ph", 4.9), ("nitrogen", 12.0), ("moisture", 40.0)]);
        let s = scorer();
        let a = s.calculate_score(&params, Some("matabeleland"), Some("rainy")).unwrap();
        let b = s.calculate_score(&params, Some("matabeleland"), Some("rainy")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.overall_score.to_bits(), b.overall_score.to_bits());
    }
}
