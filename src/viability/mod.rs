//! Farm viability, lending risk and loan eligibility

pub mod components;
pub mod context;
pub mod risk_assessment;
pub mod scorer;

pub use context::{CreditRecord, FarmContext, LoanPerformance, PaymentStatus};
pub use risk_assessment::{RiskAssessment, RiskAssessor, RiskFactor};
pub use scorer::{FarmViabilityScorer, LoanTerms, ViabilityComponent, ViabilityResult};
