//! Yield prediction
//!
//! A seeded ensemble of bagged regression trees maps the seven soil features to
//! tons per hectare:
//! - `tree`: single CART regressor with impurity-based importances
//! - `forest`: bootstrap ensemble, trees fitted in parallel with rayon
//! - `training`: historical records from polars DataFrames / CSV
//! - `synthetic`: seeded fallback data when no history is supplied
//! - `model`: fitted model, holdout metrics, JSON persistence
//! - `predictor`: lazily trained shared model and prediction bounds

pub mod forest;
pub mod model;
pub mod predictor;
pub mod synthetic;
pub mod training;
pub mod tree;

pub use model::{ModelMetadata, TrainingMetrics, TrainingSource, YieldModel};
pub use predictor::{Impact, LimitingFactor, YieldPrediction, YieldPredictor};
pub use training::TrainingSet;
