//! Soil Scorer Rust Implementation
//!
//! Soil health, insurance risk, improvement advice, yield prediction and farm
//! viability scoring for smallholder credit and insurance decisions.
//!
//! - `soil/`: parameter catalogue, validated samples, region/season context, normalization
//! - `scoring/`: weighted soil health score, risk bands and premiums
//! - `recommendation/`: ordered soil advice, crop ranking, optional cache
//! - `yield_model/`: bagged regression trees with a lazily trained shared model
//! - `viability/`: six-component farm viability score, quick screening score,
//!   five-factor lending risk and loan terms
//! - `engine`: in-process façade over flat maps
//!
//! All components share one validated, immutable `ScoringConfig`.

pub mod config;
pub mod engine;
pub mod error;
pub mod recommendation;
pub mod scoring;
pub mod soil;
pub mod viability;
pub mod yield_model;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use engine::{ScoringEngine, SoilAssessmentRequest, SoilReport};
pub use error::{ScoringError, ScoringResult};
pub use recommendation::{CropMatch, Recommendation, RecommendationCache, RecommendationEngine};
pub use scoring::{RiskBand, RiskClassifier, ScoreResult, SoilHealthScorer};
pub use soil::{IdealRange, ParameterNormalizer, Region, Season, SoilParameter, SoilParameterSet};
pub use viability::{FarmContext, FarmViabilityScorer, LoanTerms, RiskAssessment, RiskAssessor, ViabilityResult};
pub use yield_model::{YieldPrediction, YieldPredictor};
