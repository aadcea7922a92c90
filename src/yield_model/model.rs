use super::forest::{ForestParams, RandomForest};
use super::training::TrainingSet;
use super::tree::{FeatureRow, TreeParams};
use crate::config::YieldConfig;
use crate::error::ScoringResult;
use crate::soil::SoilParameter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingSource {
    Synthetic,
    Historical,
}

/// Holdout evaluation of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub n_train: usize,
    pub n_test: usize,
    /// `None` when there was no holdout
    pub mse: Option<f64>,
    pub r2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub features: Vec<SoilParameter>,
    pub source: TrainingSource,
    pub metrics: TrainingMetrics,
    pub trained_at: DateTime<Utc>,
}

/// Fitted yield regressor plus its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldModel {
    forest: RandomForest,
    metadata: ModelMetadata,
}

impl YieldModel {
    /// Fit on `data` with a seeded holdout split for evaluation
    pub fn fit(data: &TrainingSet, config: &YieldConfig, source: TrainingSource) -> ScoringResult<Self> {
        let started = Instant::now();
        let (train, test) = data.split(config.holdout_fraction, config.seed);

        let params = ForestParams {
            n_trees: config.n_trees,
            tree: TreeParams {
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                min_samples_leaf: config.min_samples_leaf,
            },
            seed: config.seed,
        };
        let forest = RandomForest::fit(train.rows(), train.targets(), params)?;
        let metrics = evaluate(&forest, &train, &test);

        tracing::info!(
            source = ?source,
            n_train = metrics.n_train,
            n_test = metrics.n_test,
            mse = ?metrics.mse,
            r2 = ?metrics.r2,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "yield model trained"
        );

        Ok(Self {
            forest,
            metadata: ModelMetadata {
                model_type: "bagged_regression_trees".to_string(),
                features: SoilParameter::ALL.to_vec(),
                source,
                metrics,
                trained_at: Utc::now(),
            },
        })
    }

    pub fn predict_with_spread(&self, row: &FeatureRow) -> (f64, f64) {
        self.forest.predict_with_spread(row)
    }

    pub fn feature_importances(&self) -> &FeatureRow {
        self.forest.feature_importances()
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn to_json(&self) -> ScoringResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> ScoringResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn evaluate(forest: &RandomForest, train: &TrainingSet, test: &TrainingSet) -> TrainingMetrics {
    let mut metrics = TrainingMetrics {
        n_train: train.len(),
        n_test: test.len(),
        mse: None,
        r2: None,
    };
    if test.is_empty() {
        return metrics;
    }

    let n = test.len() as f64;
    let mean = test.targets().iter().sum::<f64>() / n;
    let mut sse = 0.0;
    let mut sst = 0.0;
    for (row, target) in test.rows().iter().zip(test.targets()) {
        sse += (forest.predict(row) - target).powi(2);
        sst += (target - mean).powi(2);
    }

    metrics.mse = Some(sse / n);
    metrics.r2 = (sst > 0.0).then(|| 1.0 - sse / sst);
    metrics
}
