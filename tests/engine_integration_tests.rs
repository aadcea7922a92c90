// Engine Integration Tests
//
// End-to-end checks through the public ScoringEngine surface with default
// configuration: reference samples, input handling, premiums, yield bounds,
// farm viability and loan terms.

use approx::assert_relative_eq;
use soil_scorer_rust::config::YieldConfig;
use soil_scorer_rust::viability::{CreditRecord, PaymentStatus};
use soil_scorer_rust::{FarmContext, RiskBand, ScoringConfig, ScoringEngine, ScoringError};
use std::collections::HashMap;
use std::sync::Arc;

fn engine() -> ScoringEngine {
    ScoringEngine::new(ScoringConfig {
        yield_model: YieldConfig {
            n_trees: 20,
            synthetic_samples: 300,
            ..YieldConfig::default()
        },
        ..ScoringConfig::default()
    })
    .unwrap()
}

fn sample(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn healthy_sample() -> HashMap<String, f64> {
    sample(&[
        ("ph", 6.5),
        ("nitrogen", 30.0),
        ("phosphorus", 25.0),
        ("potassium", 200.0),
        ("organic_matter", 4.0),
        ("cec", 15.0),
        ("moisture", 25.0),
    ])
}

fn depleted_sample() -> HashMap<String, f64> {
    sample(&[
        ("ph", 4.0),
        ("nitrogen", 5.0),
        ("phosphorus", 2.0),
        ("potassium", 20.0),
        ("organic_matter", 0.5),
        ("cec", 3.0),
        ("moisture", 5.0),
    ])
}

// ============================================================================
// Reference samples
// ============================================================================

#[test]
fn test_healthy_sample_scores_high_in_every_season() {
    let engine = engine();
    for season in [None, Some("rainy"), Some("dry"), Some("transition")] {
        let result = engine.score_soil(&healthy_sample(), None, season).unwrap();
        assert!(result.overall_score >= 95.0, "{:?}: {}", season, result.overall_score);
    }
}

#[test]
fn test_depleted_sample_is_high_risk() {
    let engine = engine();
    let result = engine.score_soil(&depleted_sample(), None, None).unwrap();
    assert!(result.overall_score <= 25.0, "score {}", result.overall_score);
    assert_eq!(engine.classify_risk(result.overall_score), RiskBand::High);
}

#[test]
fn test_premium_higher_for_riskier_score() {
    let engine = engine();
    let good = engine.estimate_premium(80.0, 1000.0).unwrap();
    let poor = engine.estimate_premium(20.0, 1000.0).unwrap();
    assert!(good < poor);

    let mut previous = f64::INFINITY;
    for score in (0..=100).step_by(5) {
        let premium = engine.estimate_premium(score as f64, 1000.0).unwrap();
        assert!(premium <= previous);
        assert!((700.0..=3000.0).contains(&premium));
        previous = premium;
    }

    assert!(matches!(
        engine.estimate_premium(50.0, -1.0),
        Err(ScoringError::OutOfDomain { .. })
    ));
}

#[test]
fn test_sparse_farm_context_still_scores() {
    let engine = engine();
    let context = FarmContext {
        province: Some("Masvingo".to_string()),
        primary_crop: Some("maize".to_string()),
        ..FarmContext::default()
    };
    let result = engine.score_farm_viability(&context).unwrap();
    assert!((0.0..=100.0).contains(&result.overall_score));
    assert_eq!(result.component_scores.len(), 6);
}

// ============================================================================
// Input handling
// ============================================================================

#[test]
fn test_key_order_and_unknown_keys_do_not_matter() {
    let engine = engine();
    let forward = engine.score_soil(&healthy_sample(), Some("Manicaland"), Some("dry")).unwrap();

    let mut reordered: Vec<(String, f64)> = healthy_sample().into_iter().collect();
    reordered.sort_by(|a, b| b.0.cmp(&a.0));
    let mut reordered: HashMap<String, f64> = reordered.into_iter().collect();
    reordered.insert("farm_id".to_string(), 42.0);
    reordered.insert("sample_depth_cm".to_string(), 15.0);

    let backward = engine.score_soil(&reordered, Some("Manicaland"), Some("dry")).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_aliases_resolve_to_same_score() {
    let engine = engine();
    let canonical = engine.score_soil(&sample(&[("ph", 5.8), ("cec", 12.0)]), None, Some("rainy")).unwrap();
    let aliased = engine
        .score_soil(&sample(&[("pH", 5.8), ("cation_exchange_capacity", 12.0)]), None, Some("rainy"))
        .unwrap();
    assert_relative_eq!(canonical.overall_score, aliased.overall_score);
}

#[test]
fn test_out_of_domain_rejected() {
    let engine = engine();
    for bad in [sample(&[("ph", 15.0)]), sample(&[("nitrogen", -3.0)]), sample(&[("moisture", f64::NAN)])] {
        assert!(matches!(
            engine.score_soil(&bad, None, None),
            Err(ScoringError::OutOfDomain { .. })
        ));
    }
}

#[test]
fn test_empty_sample_scores_zero() {
    let engine = engine();
    let result = engine.score_soil(&HashMap::new(), None, None).unwrap();
    assert_eq!(result.overall_score, 0.0);
    assert!(result.parameter_scores.is_empty());
}

#[test]
fn test_scoring_is_idempotent() {
    let engine = engine();
    let a = engine.score_soil(&depleted_sample(), Some("Matabeleland"), Some("dry")).unwrap();
    let b = engine.score_soil(&depleted_sample(), Some("Matabeleland"), Some("dry")).unwrap();
    assert_eq!(a, b);

    let ra = engine.recommend(&depleted_sample(), Some("Matabeleland"), Some("dry"), Some("maize")).unwrap();
    let rb = engine.recommend(&depleted_sample(), Some("Matabeleland"), Some("dry"), Some("maize")).unwrap();
    assert_eq!(ra, rb);
}

// ============================================================================
// Recommendations
// ============================================================================

#[test]
fn test_recommendations_worst_first() {
    let engine = engine();
    let recommendations = engine.recommend(&depleted_sample(), None, None, None).unwrap();
    assert!(recommendations.len() >= 2);

    let scores: Vec<f64> = recommendations.iter().filter_map(|r| r.normalized_score).collect();
    for pair in scores.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_healthy_sample_gets_maintenance_advice() {
    let engine = engine();
    let recommendations = engine.recommend(&healthy_sample(), None, Some("rainy"), None).unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].parameter, "general");
}

#[test]
fn test_recommend_uses_requested_season() {
    let engine = engine();
    let mut params = healthy_sample();
    params.insert("moisture".to_string(), 18.0);

    let dry = engine.recommend(&params, None, Some("dry"), None).unwrap();
    assert_eq!(dry.len(), 1);
    assert_eq!(dry[0].parameter, "general");

    let rainy = engine.recommend(&params, None, Some("rainy"), None).unwrap();
    assert_eq!(rainy[0].parameter, "moisture");
}

#[cfg(feature = "cache")]
#[test]
fn test_cache_separates_values_near_threshold() {
    use soil_scorer_rust::recommendation::MokaRecommendationCache;

    let plain = engine();
    let cached = engine().with_recommendation_cache(Arc::new(MokaRecommendationCache::new(100)));

    let mut below = healthy_sample();
    below.insert("phosphorus".to_string(), 11.97);
    let mut above = healthy_sample();
    above.insert("phosphorus".to_string(), 11.98);

    let expected_below = plain.recommend(&below, None, Some("rainy"), None).unwrap();
    let expected_above = plain.recommend(&above, None, Some("rainy"), None).unwrap();
    assert_ne!(expected_below, expected_above);

    assert_eq!(cached.recommend(&below, None, Some("rainy"), None).unwrap(), expected_below);
    assert_eq!(cached.recommend(&above, None, Some("rainy"), None).unwrap(), expected_above);
    assert_eq!(cached.recommend(&below, None, Some("rainy"), None).unwrap(), expected_below);
}

#[cfg(feature = "cache")]
#[test]
fn test_cached_engine_returns_same_advice() {
    use soil_scorer_rust::recommendation::MokaRecommendationCache;

    let plain = engine();
    let cached = engine().with_recommendation_cache(Arc::new(MokaRecommendationCache::new(100)));

    let expected = plain.recommend(&depleted_sample(), Some("Manicaland"), Some("rainy"), None).unwrap();
    for _ in 0..3 {
        let got = cached.recommend(&depleted_sample(), Some("Manicaland"), Some("rainy"), None).unwrap();
        assert_eq!(got, expected);
    }
}

// ============================================================================
// Yield prediction
// ============================================================================

#[test]
fn test_yield_bounds_and_shared_training() {
    let engine = engine();
    for params in [healthy_sample(), depleted_sample(), sample(&[("ph", 6.0)])] {
        let prediction = engine.predict_yield(&params).unwrap();
        assert!(prediction.predicted_yield > 0.0);
        assert!(prediction.lower_bound <= prediction.predicted_yield);
        assert!(prediction.predicted_yield <= prediction.upper_bound);
        assert!((0.0..=100.0).contains(&prediction.confidence));
    }
    assert_eq!(engine.yield_predictor().training_runs(), 1);
}

#[test]
fn test_healthy_soil_outyields_depleted_soil() {
    let engine = engine();
    let healthy = engine.predict_yield(&healthy_sample()).unwrap();
    let depleted = engine.predict_yield(&depleted_sample()).unwrap();
    assert!(healthy.predicted_yield > depleted.predicted_yield);
    assert!(healthy.confidence > depleted.confidence);
    assert!(!depleted.limiting_factors.is_empty());
}

#[test]
fn test_concurrent_engines_share_one_model() {
    let engine = Arc::new(engine());
    let handles: Vec<_> = (0..6)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                let params = sample(&[("ph", 5.5 + i as f64 * 0.3), ("nitrogen", 25.0)]);
                engine.predict_yield(&params).unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(engine.yield_predictor().training_runs(), 1);
}

// ============================================================================
// Farm viability and loans
// ============================================================================

#[test]
fn test_loan_terms_follow_viability() {
    let engine = engine();

    let strong = FarmContext {
        soil: soil_scorer_rust::SoilParameterSet::from_map(&healthy_sample()).unwrap(),
        season: Some("rainy".to_string()),
        district: Some("Bulawayo".to_string()),
        primary_crop: Some("sorghum".to_string()),
        has_irrigation: Some(true),
        water_sources: vec!["borehole".to_string()],
        rainfall_reliability: Some(0.7),
        climate_adaptations: vec!["conservation_agriculture".to_string()],
        transport_access: vec!["good_roads".to_string()],
        credit_history: vec![CreditRecord::new(800.0, 800.0, PaymentStatus::OnTime)],
        ..FarmContext::default()
    };
    let weak = FarmContext {
        soil: soil_scorer_rust::SoilParameterSet::from_map(&depleted_sample()).unwrap(),
        province: Some("Matabeleland North".to_string()),
        has_irrigation: Some(false),
        rainfall_reliability: Some(0.1),
        credit_history: vec![CreditRecord::new(800.0, 100.0, PaymentStatus::Defaulted).late_by(120)],
        ..FarmContext::default()
    };

    let strong_terms = engine.loan_eligibility(&strong).unwrap();
    let weak_terms = engine.loan_eligibility(&weak).unwrap();

    assert!(strong_terms.eligible);
    assert!(strong_terms.viability_score > weak_terms.viability_score);
    assert!(strong_terms.max_amount > weak_terms.max_amount);
    assert!(!weak_terms.eligible);
    assert!(weak_terms.conditions.len() <= 3);
    assert!(!weak_terms.conditions.is_empty());
}

#[test]
fn test_farm_context_from_json() {
    let engine = engine();
    let json = r#"{
        "soil": {"ph_level": 6.1, "nitrogen": 28, "moisture_content": 24},
        "region": "Mashonaland Central",
        "primary_crop": "soybeans",
        "water_sources": ["well"],
        "credit_history": [
            {"loan_amount": 300, "amount_paid": 300, "payment_status": "late", "days_late": 12}
        ]
    }"#;
    let context: FarmContext = serde_json::from_str(json).unwrap();
    let result = engine.score_farm_viability(&context).unwrap();
    assert!((0.0..=100.0).contains(&result.overall_score));
    assert!(result.defaulted_components.is_empty());
}

#[test]
fn test_lending_risk_tracks_farm_profile() {
    let engine = engine();
    let established = FarmContext {
        soil: soil_scorer_rust::SoilParameterSet::from_map(&healthy_sample()).unwrap(),
        season: Some("rainy".to_string()),
        province: Some("Mashonaland Central".to_string()),
        farm_size_hectares: Some(8.0),
        farming_experience_years: Some(11.0),
        primary_crop: Some("maize".to_string()),
        credit_history: vec![CreditRecord::new(800.0, 800.0, PaymentStatus::OnTime)],
        ..FarmContext::default()
    };
    let novice = FarmContext {
        soil: soil_scorer_rust::SoilParameterSet::from_map(&depleted_sample()).unwrap(),
        province: Some("Matabeleland North".to_string()),
        farming_experience_years: Some(0.5),
        credit_history: vec![CreditRecord::new(800.0, 100.0, PaymentStatus::Defaulted).late_by(120)],
        ..FarmContext::default()
    };

    let low = engine.assess_risk(&established).unwrap();
    let high = engine.assess_risk(&novice).unwrap();
    assert!(low.overall_risk_score < high.overall_risk_score);
    assert_eq!(low.risk_level, RiskBand::Low);
    assert!(high.risk_level >= RiskBand::MediumHigh);
    assert!(high
        .recommendations
        .iter()
        .any(|r| r == "Consider agricultural insurance products"));

    assert!(engine.quick_viability(&established).unwrap() > engine.quick_viability(&novice).unwrap());
    assert!(novice.credit_history.iter().all(|r| !r.is_good_standing()));
}
