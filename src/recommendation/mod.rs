//! Soil improvement recommendations
//!
//! - `types`: recommendation record, cost tiers, application rates
//! - `advice`: per-parameter and per-crop advice text and rates
//! - `crop_suitability`: crop requirement table and ranking
//! - `cache`: optional injected cache interface
//! - `engine`: ordering, thresholds and cache orchestration

pub mod advice;
pub mod cache;
pub mod crop_suitability;
pub mod engine;
pub mod types;

pub use cache::{cache_key, NoopCache, RecommendationCache};
#[cfg(feature = "cache")]
pub use cache::MokaRecommendationCache;
pub use crop_suitability::{find_crop, rank_crops, CropMatch, CropProfile, Level, CROP_PROFILES};
pub use engine::RecommendationEngine;
pub use types::{ApplicationRate, CostTier, RateUnit, Recommendation};
