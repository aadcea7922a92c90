//! Per-parameter and per-crop advice
//!
//! Application rates grow linearly with the absolute deviation from the
//! violated bound and are floored at zero by [`ApplicationRate::new`].

use super::crop_suitability::find_crop;
use super::types::{ApplicationRate, CostTier, RateUnit, Recommendation};
use crate::soil::{IdealRange, RangeFit, Region, Season, SoilParameter, SoilParameterSet};

/// Rate for a deficiency or excess of `deviation` units, if the remedy is dosed.
pub fn application_rate(parameter: SoilParameter, fit: RangeFit, deviation: f64) -> Option<ApplicationRate> {
    let d = deviation.max(0.0);
    let rate = match (parameter, fit) {
        (SoilParameter::Ph, RangeFit::Below) => {
            ApplicationRate::new(2.0 + d * 2.0, 4.0 + d * 3.0, RateUnit::TonsPerHectare)
        }
        (SoilParameter::Ph, RangeFit::Above) => {
            ApplicationRate::new(0.3 + d * 0.5, 0.6 + d * 0.8, RateUnit::TonsPerHectare)
        }
        (SoilParameter::Nitrogen, RangeFit::Below) => {
            ApplicationRate::new(100.0 + d * 5.0, 150.0 + d * 10.0, RateUnit::KgPerHectare)
        }
        (SoilParameter::Phosphorus, RangeFit::Below) => {
            ApplicationRate::new(60.0 + d * 3.0, 100.0 + d * 5.0, RateUnit::KgPerHectare)
        }
        (SoilParameter::Potassium, RangeFit::Below) => {
            ApplicationRate::new(50.0 + d * 0.2, 100.0 + d * 0.3, RateUnit::KgPerHectare)
        }
        (SoilParameter::OrganicMatter, RangeFit::Below) => {
            ApplicationRate::new(5.0 + d * 2.0, 10.0 + d * 3.0, RateUnit::TonsPerHectare)
        }
        _ => return None,
    };
    Some(rate)
}

/// Advice for one out-of-range parameter.
///
/// Returns `None` for values inside the range and for deviations with no
/// agronomic remedy (e.g. excess moisture during the rains).
pub fn parameter_advice(
    parameter: SoilParameter,
    value: f64,
    range: &IdealRange,
    region: Option<Region>,
    season: Option<Season>,
) -> Option<Recommendation> {
    let fit = range.fit(value);
    let deviation = range.distance(value);
    let rate = application_rate(parameter, fit, deviation);
    let rate_text = rate.map(|r| r.format()).unwrap_or_default();
    let key = parameter.as_str();

    let rec = match (parameter, fit) {
        (_, RangeFit::Within) => return None,

        (SoilParameter::Ph, RangeFit::Below) => {
            let rec = Recommendation::new(
                key,
                format!("Soil is too acidic (pH {:.1}, ideal {:.1}-{:.1})", value, range.min, range.max),
                format!("Apply agricultural lime at {}", rate_text),
                "Raises pH, improves nutrient availability and reduces aluminium toxicity",
                CostTier::Medium,
                "Apply 2-3 months before planting",
            );
            match region {
                Some(Region::Matabeleland) => rec.with_local_context(
                    "Dolomitic lime is locally available in Matabeleland and also supplies magnesium",
                ),
                _ => rec,
            }
        }
        (SoilParameter::Ph, RangeFit::Above) => Recommendation::new(
            key,
            format!("Soil is too alkaline (pH {:.1}, ideal {:.1}-{:.1})", value, range.min, range.max),
            format!("Apply elemental sulfur at {} or incorporate acidifying organic matter", rate_text),
            "Lowers pH and unlocks iron, manganese and phosphorus",
            CostTier::Medium,
            "Apply 3-6 months before planting",
        ),

        (SoilParameter::Nitrogen, RangeFit::Below) => Recommendation::new(
            key,
            format!("Nitrogen deficiency ({:.1} mg/kg, ideal {:.0}-{:.0})", value, range.min, range.max),
            format!(
                "Apply nitrogen fertilizer at {} (Compound D basal, ammonium nitrate or urea top dressing)",
                rate_text
            ),
            "Improves leaf growth, photosynthesis and grain fill",
            CostTier::MediumHigh,
            "Split between planting and 4-6 weeks after emergence",
        ),
        (SoilParameter::Nitrogen, RangeFit::Above) => Recommendation::new(
            key,
            format!("Excess nitrogen ({:.1} mg/kg)", value),
            "Skip nitrogen top dressing and rotate with a legume or heavy-feeding cover crop",
            "Reduces leaching losses and lodging risk",
            CostTier::Low,
            "Next growing season",
        ),

        (SoilParameter::Phosphorus, RangeFit::Below) => Recommendation::new(
            key,
            format!("Phosphorus deficiency ({:.1} mg/kg, ideal {:.0}-{:.0})", value, range.min, range.max),
            format!("Apply phosphate fertilizer at {} (single superphosphate or Compound D)", rate_text),
            "Strengthens root development and early crop establishment",
            CostTier::Medium,
            "Apply at planting, banded near the seed",
        ),
        (SoilParameter::Phosphorus, RangeFit::Above) => Recommendation::new(
            key,
            format!("Excess phosphorus ({:.1} mg/kg)", value),
            "Suspend phosphate applications until levels fall back into range",
            "Avoids zinc lock-up and run-off into water sources",
            CostTier::Low,
            "Review after next soil test",
        ),

        (SoilParameter::Potassium, RangeFit::Below) => Recommendation::new(
            key,
            format!("Potassium deficiency ({:.0} mg/kg, ideal {:.0}-{:.0})", value, range.min, range.max),
            format!("Apply muriate of potash at {}", rate_text),
            "Improves drought tolerance, disease resistance and grain quality",
            CostTier::Medium,
            "Apply at planting",
        ),
        (SoilParameter::Potassium, RangeFit::Above) => Recommendation::new(
            key,
            format!("Excess potassium ({:.0} mg/kg)", value),
            "Suspend potash applications and monitor magnesium levels",
            "Prevents magnesium and calcium uptake problems",
            CostTier::Low,
            "Review after next soil test",
        ),

        (SoilParameter::OrganicMatter, RangeFit::Below) => Recommendation::new(
            key,
            format!("Low organic matter ({:.1}%, ideal {:.1}-{:.1}%)", value, range.min, range.max),
            format!("Incorporate compost or well-rotted manure at {}", rate_text),
            "Improves structure, water holding capacity and nutrient retention",
            CostTier::LowMedium,
            "Apply before the rains and repeat annually",
        ),

        (SoilParameter::CationExchangeCapacity, RangeFit::Below) => Recommendation::new(
            key,
            format!("Low cation exchange capacity ({:.1} cmol/kg)", value),
            "Build organic matter and consider clay mineral amendments such as bentonite",
            "Increases the soil's ability to hold nutrients",
            CostTier::Medium,
            "Long-term, 2-3 seasons",
        ),

        (SoilParameter::Moisture, RangeFit::Below) => Recommendation::new(
            key,
            format!("Low soil moisture ({:.1}%, ideal {:.0}-{:.0}%)", value, range.min, range.max),
            "Mulch crop residues and adopt conservation tillage; plan supplementary irrigation",
            "Conserves moisture and reduces crop water stress",
            CostTier::LowMedium,
            "Immediate",
        ),
        (SoilParameter::Moisture, RangeFit::Above) if season != Some(Season::Rainy) => Recommendation::new(
            key,
            format!("Excess soil moisture ({:.1}%)", value),
            "Install contour drains or raised beds to improve drainage",
            "Prevents waterlogging, root rot and nitrogen loss",
            CostTier::MediumHigh,
            "Before the next rainy season",
        ),

        _ => return None,
    };

    Some(match rate {
        Some(r) => rec.with_rate(r),
        None => rec,
    })
}

/// Maintenance advice used when nothing needs correcting
pub fn general_maintenance() -> Recommendation {
    Recommendation::new(
        "general",
        "General soil health",
        "Maintain current practices: rotate crops, retain residues and re-test soil annually",
        "Sustains current soil fertility and yields",
        CostTier::Low,
        "Ongoing",
    )
}

/// Crop-specific fertility advice, when the crop has a known programme
pub fn crop_advice(crop: &str, params: &SoilParameterSet) -> Option<Recommendation> {
    let profile = find_crop(crop)?;
    let key = format!("crop:{}", profile.name);

    let rec = match profile.name {
        "maize" => {
            let nitrogen_note = match params.get(SoilParameter::Nitrogen) {
                Some(n) if n < 30.0 => " Current nitrogen is low, so do not skip the top dressing.",
                _ => "",
            };
            Recommendation::new(
                key,
                "Maize nutrient programme",
                format!(
                    "Apply Compound D basal at 300-400 kg/ha and ammonium nitrate top dressing at 150-250 kg/ha.{}",
                    nitrogen_note
                ),
                "Maize is a heavy nitrogen feeder; split application matches crop uptake",
                CostTier::MediumHigh,
                "Basal at planting, top dressing at 4-6 weeks",
            )
        }
        "groundnuts" => Recommendation::new(
            key,
            "Groundnut calcium and inoculation",
            "Apply gypsum at 200-300 kg/ha at flowering and use rhizobium-inoculated seed",
            "Calcium improves pod fill; inoculation supplies nitrogen biologically",
            CostTier::LowMedium,
            "Gypsum at early flowering",
        ),
        "cotton" => Recommendation::new(
            key,
            "Cotton potassium requirement",
            "Use a potassium-rich compound (e.g. Compound L) at 200-300 kg/ha at planting",
            "Potassium improves boll retention and fibre quality",
            CostTier::Medium,
            "At planting",
        ),
        "sorghum" => Recommendation::new(
            key,
            "Sorghum moisture management",
            "Plant in tied ridges and apply 100-150 kg/ha of Compound D at planting",
            "Sorghum tolerates drought but tied ridges capture scarce rainfall",
            CostTier::Low,
            "Land preparation and planting",
        ),
        _ => return None,
    };
    Some(rec)
}
