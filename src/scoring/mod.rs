//! Soil health scoring and risk classification

pub mod risk;
pub mod soil_health;

pub use risk::{RiskBand, RiskClassifier};
pub use soil_health::{ScoreResult, SoilHealthScorer};
