//! Yield predictor
//!
//! Owns the shared, lazily trained model. The first caller to need a model
//! takes `init_lock`, re-checks, and trains; every later read goes straight
//! through the `OnceLock` without locking.

use super::model::{TrainingSource, YieldModel};
use super::synthetic::{self, SAMPLING_RANGES};
use super::training::{default_feature_value, TrainingSet};
use super::tree::FeatureRow;
use crate::config::ScoringConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::soil::{IdealRange, RangeFit, SoilParameter, SoilParameterSet, PARAMETER_COUNT};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Base relative half-width of the prediction interval
const BASE_INTERVAL_FRACTION: f64 = 0.05;
/// Extra half-width per unit of importance sitting outside its ideal range
const OUT_OF_RANGE_INTERVAL_FRACTION: f64 = 0.1;
/// z-score for the tree-spread part of the interval
const SPREAD_Z: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
}

/// A feature whose out-of-range value constrains yield
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitingFactor {
    pub parameter: SoilParameter,
    pub direction: RangeFit,
    pub impact: Impact,
    /// Relative deviation from the violated bound
    pub magnitude: f64,
    pub importance: f64,
    pub current_value: f64,
    pub ideal_range: IdealRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    /// Tons per hectare
    pub predicted_yield: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// 0-100
    pub confidence: f64,
    pub limiting_factors: Vec<LimitingFactor>,
    /// Features filled with defaults because the caller did not supply them
    pub imputed_parameters: Vec<SoilParameter>,
}

pub struct YieldPredictor {
    config: Arc<ScoringConfig>,
    model: OnceLock<Arc<YieldModel>>,
    init_lock: Mutex<()>,
    training_runs: AtomicUsize,
}

impl std::fmt::Debug for YieldPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldPredictor")
            .field("trained", &self.is_trained())
            .field("training_runs", &self.training_runs())
            .finish()
    }
}

impl YieldPredictor {
    /// Untrained predictor; the model is built on first use
    pub fn new(config: Arc<ScoringConfig>) -> Self {
        Self {
            config,
            model: OnceLock::new(),
            init_lock: Mutex::new(()),
            training_runs: AtomicUsize::new(0),
        }
    }

    /// Predictor around an already fitted model (tests, persisted artifacts)
    pub fn with_model(config: Arc<ScoringConfig>, model: Arc<YieldModel>) -> Self {
        let predictor = Self::new(config);
        let _ = predictor.model.set(model);
        predictor
    }

    pub fn is_trained(&self) -> bool {
        self.model.get().is_some()
    }

    /// Number of fits this predictor has performed
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    /// Train if no model exists yet, otherwise return the existing one.
    ///
    /// `data` is only consulted on the first successful call; without it a
    /// seeded synthetic set is generated.
    pub fn train(&self, data: Option<&TrainingSet>) -> ScoringResult<Arc<YieldModel>> {
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        let _guard = self.init_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(model.clone());
        }

        let yield_config = &self.config.yield_model;
        let fitted = match data {
            Some(records) => YieldModel::fit(records, yield_config, TrainingSource::Historical)?,
            None => {
                let generated = synthetic::generate(
                    yield_config.synthetic_samples,
                    yield_config.seed,
                    yield_config.noise_amplitude,
                );
                YieldModel::fit(&generated, yield_config, TrainingSource::Synthetic)?
            }
        };
        self.training_runs.fetch_add(1, Ordering::SeqCst);

        let model = Arc::new(fitted);
        let _ = self.model.set(model.clone());
        Ok(model)
    }

    /// Current model, training on demand
    pub fn model(&self) -> ScoringResult<Arc<YieldModel>> {
        match self.model.get() {
            Some(model) => Ok(model.clone()),
            None => {
                tracing::info!("yield model not trained yet, training on demand");
                self.train(None)
            }
        }
    }

    /// Predict yield for a sample; missing features take their defaults.
    pub fn predict(&self, params: &SoilParameterSet) -> ScoringResult<YieldPrediction> {
        let model = self.model()?;
        let yield_config = &self.config.yield_model;

        let mut row: FeatureRow = [0.0; PARAMETER_COUNT];
        let mut imputed = Vec::new();
        for parameter in SoilParameter::ALL {
            row[parameter.index()] = match params.get(parameter) {
                Some(value) => value,
                None => {
                    imputed.push(parameter);
                    default_feature_value(parameter)
                }
            };
        }

        let (predicted, spread) = model.predict_with_spread(&row);
        if !predicted.is_finite() || predicted <= 0.0 {
            return Err(ScoringError::Training(format!(
                "model produced a non-positive yield ({})",
                predicted
            )));
        }

        let importances = model.feature_importances();
        let ideal = &self.config.soil.ideal_ranges;

        let out_of_range_importance: f64 = SoilParameter::ALL
            .into_iter()
            .filter(|p| ideal.get(p).is_some_and(|r| !r.contains(row[p.index()])))
            .map(|p| importances[p.index()])
            .sum();

        let margin = SPREAD_Z * spread
            + predicted * (BASE_INTERVAL_FRACTION + OUT_OF_RANGE_INTERVAL_FRACTION * out_of_range_importance);
        let lower_bound = (predicted - margin).max(0.0);
        let upper_bound = predicted + margin;

        let plausible = row
            .iter()
            .zip(SAMPLING_RANGES.iter())
            .filter(|(value, (lo, hi))| **value >= *lo && **value <= *hi)
            .count() as f64
            / PARAMETER_COUNT as f64;
        let model_certainty = 1.0 - (spread / predicted).min(1.0);
        let confidence = (100.0
            * (yield_config.range_confidence_weight * plausible
                + yield_config.model_confidence_weight * model_certainty))
            .clamp(0.0, 100.0);

        let limiting_factors = self.limiting_factors(&row, importances);

        Ok(YieldPrediction {
            predicted_yield: predicted,
            lower_bound,
            upper_bound,
            confidence,
            limiting_factors,
            imputed_parameters: imputed,
        })
    }

    /// Most important features that sit outside their ideal range
    fn limiting_factors(&self, row: &FeatureRow, importances: &FeatureRow) -> Vec<LimitingFactor> {
        let yield_config = &self.config.yield_model;
        let ideal = &self.config.soil.ideal_ranges;

        let mut ranked: Vec<SoilParameter> = SoilParameter::ALL.to_vec();
        ranked.sort_by(|a, b| importances[b.index()].total_cmp(&importances[a.index()]));

        ranked
            .into_iter()
            .filter_map(|parameter| {
                let range = *ideal.get(&parameter)?;
                let value = row[parameter.index()];
                let direction = range.fit(value);
                if direction == RangeFit::Within {
                    return None;
                }
                let importance = importances[parameter.index()];
                Some(LimitingFactor {
                    parameter,
                    direction,
                    impact: if importance >= yield_config.importance_cutoff {
                        Impact::High
                    } else {
                        Impact::Medium
                    },
                    magnitude: range.relative_distance(value),
                    importance,
                    current_value: value,
                    ideal_range: range,
                })
            })
            .take(yield_config.max_limiting_factors)
            .collect()
    }
}
