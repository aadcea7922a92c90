//! Non-soil viability components
//!
//! Each scorer returns `None` when the context carries no data for it; the
//! caller substitutes the configured neutral value. Scores are 0-100.

use super::context::{CreditRecord, FarmContext};
use crate::recommendation::{find_crop, Level};
use crate::soil::SoilParameter;
use chrono::NaiveDate;

const WATER_BASE: f64 = 50.0;
const IRRIGATION_BONUS: f64 = 30.0;
const DEFAULT_RAINFALL_RELIABILITY: f64 = 0.5;
const RAINFALL_WEIGHT: f64 = 20.0;

const CLIMATE_BASE: f64 = 60.0;
const HIGH_RISK_PROVINCE_PENALTY: f64 = 15.0;
const HIGH_RISK_PROVINCES: &[&str] = &["matabeleland north", "matabeleland south"];

const MARKET_BASE: f64 = 50.0;
const URBAN_CENTRE_BONUS: f64 = 25.0;
const URBAN_CENTRES: &[&str] = &["harare", "bulawayo", "chitungwiza", "mutare", "gweru"];

const RECENT_HISTORY_WEIGHT: f64 = 0.7;

pub(crate) fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['_', '-'], " ")
}

fn has_entry(entries: &[String], wanted: &str) -> bool {
    entries.iter().any(|e| normalize(e) == wanted)
}

/// Best water source bonus; only the single best source counts
fn water_source_bonus(sources: &[String]) -> f64 {
    sources
        .iter()
        .map(|s| match normalize(s).as_str() {
            "borehole" => 20.0,
            "well" => 15.0,
            "river" | "dam" => 10.0,
            _ => 0.0,
        })
        .fold(0.0, f64::max)
}

pub fn water_access(context: &FarmContext) -> Option<f64> {
    if context.has_irrigation.is_none()
        && context.water_sources.is_empty()
        && context.rainfall_reliability.is_none()
    {
        return None;
    }

    let mut score = WATER_BASE;
    if context.has_irrigation == Some(true) {
        score += IRRIGATION_BONUS;
    }
    score += water_source_bonus(&context.water_sources);
    score += context.rainfall_reliability.unwrap_or(DEFAULT_RAINFALL_RELIABILITY) * RAINFALL_WEIGHT;

    Some(score.min(100.0))
}

pub fn climate_resilience(context: &FarmContext) -> f64 {
    let mut score = CLIMATE_BASE;

    for adaptation in &context.climate_adaptations {
        score += match normalize(adaptation).as_str() {
            "drought resistant crops" => 15.0,
            "conservation agriculture" => 10.0,
            "weather monitoring" => 10.0,
            "diversified cropping" => 5.0,
            _ => 0.0,
        };
    }

    if let Some(province) = &context.province {
        if HIGH_RISK_PROVINCES.contains(&normalize(province).as_str()) {
            score -= HIGH_RISK_PROVINCE_PENALTY;
        }
    }

    score.clamp(0.0, 100.0)
}

/// Fit of the farm's primary crop. Needs a known crop plus pH and nitrogen.
pub fn crop_suitability(context: &FarmContext) -> Option<f64> {
    let crop = find_crop(context.primary_crop.as_deref()?)?;
    let ph = context.soil.get(SoilParameter::Ph)?;
    let nitrogen = context.soil.get(SoilParameter::Nitrogen)?;

    let mut score: f64 = 0.0;

    let (ph_low, ph_high) = crop.ideal_ph;
    if (ph_low..=ph_high).contains(&ph) {
        score += 40.0;
    } else if (ph - crop.ph_midpoint()).abs() <= 0.5 {
        score += 20.0;
    }

    let nitrogen_met = match crop.nitrogen {
        Level::High => nitrogen >= 40.0,
        Level::Medium => nitrogen >= 25.0,
        Level::Low => true,
    };
    score += if nitrogen_met { 30.0 } else { 15.0 };

    score += match crop.market_demand {
        Level::High => 30.0,
        Level::Medium => 20.0,
        Level::Low => 10.0,
    };

    Some(score.min(100.0))
}

/// Credit history score, weighting loans inside the recency window.
///
/// Undated records only count toward the all-time mean.
pub fn historical_performance(records: &[CreditRecord], as_of: NaiveDate, window_days: i64) -> Option<f64> {
    if records.is_empty() {
        return None;
    }

    let mut all = Vec::with_capacity(records.len());
    let mut recent = Vec::new();
    for record in records {
        let score = record.score();
        all.push(score);
        let is_recent = record.loan_date.is_some_and(|date| {
            let age = (as_of - date).num_days();
            (0..=window_days).contains(&age)
        });
        if is_recent {
            recent.push(score);
        }
    }

    let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;
    let overall = mean(&all);
    if recent.is_empty() {
        return Some(overall);
    }
    Some(RECENT_HISTORY_WEIGHT * mean(&recent) + (1.0 - RECENT_HISTORY_WEIGHT) * overall)
}

pub fn market_access(context: &FarmContext) -> f64 {
    let mut score = MARKET_BASE;

    if let Some(district) = &context.district {
        let district = normalize(district);
        if URBAN_CENTRES.iter().any(|centre| district.contains(centre)) {
            score += URBAN_CENTRE_BONUS;
        }
    }
    if has_entry(&context.transport_access, "good roads") {
        score += 15.0;
    }
    if has_entry(&context.transport_access, "public transport") {
        score += 10.0;
    }
    if context.has_storage_facilities == Some(true) {
        score += 10.0;
    }
    if context.has_processing_access == Some(true) {
        score += 10.0;
    }

    score.min(100.0)
}
