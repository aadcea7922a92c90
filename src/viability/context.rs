//! Farm context
//!
//! Everything the viability scorer knows about a farm beyond its soil sample.
//! Deserializes from a flat JSON record; every field is optional.

use crate::error::{ScoringError, ScoringResult};
use crate::soil::SoilParameterSet;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    OnTime,
    Late,
    Defaulted,
    Restructured,
}

impl PaymentStatus {
    /// Points deducted from a record's 100 starting score
    pub fn penalty(&self) -> f64 {
        match self {
            PaymentStatus::OnTime => 0.0,
            PaymentStatus::Late => 20.0,
            PaymentStatus::Defaulted => 50.0,
            PaymentStatus::Restructured => 30.0,
        }
    }
}

/// Repayment quality bucket of a single loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPerformance {
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl LoanPerformance {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            LoanPerformance::Excellent
        } else if score >= 70.0 {
            LoanPerformance::Good
        } else if score >= 50.0 {
            LoanPerformance::Fair
        } else if score >= 30.0 {
            LoanPerformance::Poor
        } else {
            LoanPerformance::VeryPoor
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            LoanPerformance::Excellent => "Excellent",
            LoanPerformance::Good => "Good",
            LoanPerformance::Fair => "Fair",
            LoanPerformance::Poor => "Poor",
            LoanPerformance::VeryPoor => "Very Poor",
        }
    }
}

/// One past loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRecord {
    pub loan_amount: f64,
    #[serde(default)]
    pub amount_paid: f64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub days_late: u32,
    #[serde(default)]
    pub loan_date: Option<NaiveDate>,
}

impl CreditRecord {
    pub fn new(loan_amount: f64, amount_paid: f64, payment_status: PaymentStatus) -> Self {
        Self {
            loan_amount,
            amount_paid,
            payment_status,
            days_late: 0,
            loan_date: None,
        }
    }

    pub fn late_by(mut self, days: u32) -> Self {
        self.days_late = days;
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.loan_date = Some(date);
        self
    }

    /// Share of the loan repaid. A zero-amount loan counts as fully repaid.
    pub fn payment_ratio(&self) -> f64 {
        if self.loan_amount > 0.0 {
            self.amount_paid / self.loan_amount
        } else {
            1.0
        }
    }

    /// 0-100 repayment score: status penalty, lateness penalty, repayment
    /// ratio adjustment.
    pub fn score(&self) -> f64 {
        let mut score = 100.0 - self.payment_status.penalty();

        score -= match self.days_late {
            0 => 0.0,
            1..=30 => 10.0,
            31..=90 => 25.0,
            _ => 40.0,
        };

        let ratio = self.payment_ratio();
        score += if ratio >= 1.0 {
            10.0
        } else if ratio >= 0.8 {
            -5.0
        } else if ratio >= 0.5 {
            -15.0
        } else {
            -30.0
        };

        score.clamp(0.0, 100.0)
    }

    pub fn performance_category(&self) -> LoanPerformance {
        LoanPerformance::from_score(self.score())
    }

    /// Paid on time or restructured, at most 30 days late, at least 80% repaid
    pub fn is_good_standing(&self) -> bool {
        matches!(self.payment_status, PaymentStatus::OnTime | PaymentStatus::Restructured)
            && self.days_late <= 30
            && self.payment_ratio() >= 0.8
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmContext {
    pub soil: SoilParameterSet,
    /// Pre-computed soil score used when no sample is attached
    pub soil_health_score: Option<f64>,
    pub region: Option<String>,
    pub season: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub primary_crop: Option<String>,
    pub farm_size_hectares: Option<f64>,
    pub farming_experience_years: Option<f64>,
    /// Number of crops grown
    pub crop_diversity: Option<u32>,
    /// "low", "medium", "high" or "very_high"
    pub location_risk: Option<String>,

    pub has_irrigation: Option<bool>,
    pub water_sources: Vec<String>,
    /// 0-1
    pub rainfall_reliability: Option<f64>,

    pub climate_adaptations: Vec<String>,
    pub transport_access: Vec<String>,
    pub has_storage_facilities: Option<bool>,
    pub has_processing_access: Option<bool>,

    pub credit_history: Vec<CreditRecord>,
    /// Reference date for credit recency; today when absent
    pub as_of: Option<NaiveDate>,
}

impl FarmContext {
    pub fn validate(&self) -> ScoringResult<()> {
        if let Some(score) = self.soil_health_score {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return Err(ScoringError::out_of_domain(
                    "soil_health_score",
                    score,
                    "must be within 0-100",
                ));
            }
        }

        if let Some(reliability) = self.rainfall_reliability {
            if !reliability.is_finite() || !(0.0..=1.0).contains(&reliability) {
                return Err(ScoringError::out_of_domain(
                    "rainfall_reliability",
                    reliability,
                    "must be within 0-1",
                ));
            }
        }

        for (name, value) in [
            ("farm_size_hectares", self.farm_size_hectares),
            ("farming_experience_years", self.farming_experience_years),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(ScoringError::out_of_domain(name, value, "must be non-negative"));
                }
            }
        }

        for record in &self.credit_history {
            for (name, value) in [("loan_amount", record.loan_amount), ("amount_paid", record.amount_paid)] {
                if !value.is_finite() || value < 0.0 {
                    return Err(ScoringError::out_of_domain(name, value, "must be a non-negative amount"));
                }
            }
        }
        Ok(())
    }

    /// Region string used for soil range adjustment; falls back to the province
    pub fn region_name(&self) -> Option<&str> {
        self.region.as_deref().or(self.province.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soil::SoilParameter;
    use approx::assert_relative_eq;

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{
            "soil": {"pH": 6.2, "nitrogen": 35},
            "province": "Mashonaland East",
            "water_sources": ["borehole"],
            "credit_history": [
                {"loan_amount": 500, "amount_paid": 500, "payment_status": "on_time", "loan_date": "2025-03-01"}
            ]
        }"#;
        let context: FarmContext = serde_json::from_str(json).unwrap();

        assert_eq!(context.soil.get(SoilParameter::Ph), Some(6.2));
        assert_eq!(context.region_name(), Some("Mashonaland East"));
        assert_eq!(context.credit_history.len(), 1);
        assert_eq!(context.credit_history[0].days_late, 0);
        assert!(context.has_irrigation.is_none());
        context.validate().unwrap();
    }

    #[test]
    fn test_invalid_soil_value_fails_deserialization() {
        let json = r#"{"soil": {"ph": 19.0}}"#;
        assert!(serde_json::from_str::<FarmContext>(json).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_domain() {
        let context = FarmContext {
            rainfall_reliability: Some(1.4),
            ..FarmContext::default()
        };
        assert!(matches!(context.validate(), Err(ScoringError::OutOfDomain { .. })));

        let context = FarmContext {
            credit_history: vec![CreditRecord::new(-10.0, 0.0, PaymentStatus::OnTime)],
            ..FarmContext::default()
        };
        assert!(context.validate().is_err());

        let context = FarmContext {
            soil_health_score: Some(120.0),
            ..FarmContext::default()
        };
        assert!(context.validate().is_err());

        let context = FarmContext {
            farm_size_hectares: Some(-2.0),
            ..FarmContext::default()
        };
        assert!(context.validate().is_err());
    }

    #[test]
    fn test_payment_ratio() {
        assert_eq!(CreditRecord::new(200.0, 100.0, PaymentStatus::Late).payment_ratio(), 0.5);
        assert_eq!(CreditRecord::new(0.0, 0.0, PaymentStatus::OnTime).payment_ratio(), 1.0);
    }

    #[test]
    fn test_record_score() {
        assert_relative_eq!(CreditRecord::new(100.0, 100.0, PaymentStatus::OnTime).score(), 100.0);
        // 100 - 20 - 25 - 15
        assert_relative_eq!(
            CreditRecord::new(100.0, 60.0, PaymentStatus::Late).late_by(45).score(),
            40.0
        );
        assert_relative_eq!(
            CreditRecord::new(100.0, 0.0, PaymentStatus::Defaulted).late_by(200).score(),
            0.0
        );
    }

    #[test]
    fn test_performance_category() {
        assert_eq!(
            CreditRecord::new(100.0, 100.0, PaymentStatus::OnTime).performance_category(),
            LoanPerformance::Excellent
        );
        // 100 - 30 + 10 = 80
        assert_eq!(
            CreditRecord::new(100.0, 100.0, PaymentStatus::Restructured).performance_category(),
            LoanPerformance::Good
        );
        // 100 - 20 - 10 - 5 = 65
        assert_eq!(
            CreditRecord::new(100.0, 90.0, PaymentStatus::Late).late_by(10).performance_category(),
            LoanPerformance::Fair
        );
        assert_eq!(
            CreditRecord::new(100.0, 60.0, PaymentStatus::Late).late_by(45).performance_category(),
            LoanPerformance::Poor
        );
        assert_eq!(
            CreditRecord::new(100.0, 0.0, PaymentStatus::Defaulted).performance_category(),
            LoanPerformance::VeryPoor
        );
        assert_eq!(LoanPerformance::VeryPoor.display_text(), "Very Poor");
        assert_eq!(LoanPerformance::from_score(85.0), LoanPerformance::Excellent);
        assert_eq!(LoanPerformance::from_score(29.9), LoanPerformance::VeryPoor);
    }

    #[test]
    fn test_good_standing() {
        assert!(CreditRecord::new(100.0, 100.0, PaymentStatus::OnTime).is_good_standing());
        assert!(CreditRecord::new(100.0, 80.0, PaymentStatus::Restructured).late_by(30).is_good_standing());
        assert!(!CreditRecord::new(100.0, 100.0, PaymentStatus::Late).is_good_standing());
        assert!(!CreditRecord::new(100.0, 100.0, PaymentStatus::OnTime).late_by(31).is_good_standing());
        assert!(!CreditRecord::new(100.0, 79.0, PaymentStatus::OnTime).is_good_standing());
    }
}
