//! Crop suitability
//!
//! Static crop requirement table and the weighted soil-to-crop match used to
//! rank candidate crops. Table order is the tie-break order for ranking.

use crate::soil::{Region, Season, SoilParameter, SoilParameterSet};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Three-level scale used for nutrient need, drought tolerance and market demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowingSeason {
    Summer,
    Winter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropProfile {
    pub name: &'static str,
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
    pub ideal_ph: (f64, f64),
    pub nitrogen: Level,
    pub phosphorus: Level,
    pub potassium: Level,
    pub drought_tolerance: Level,
    pub growing_season: GrowingSeason,
    pub market_demand: Level,
}

impl CropProfile {
    pub fn ph_midpoint(&self) -> f64 {
        (self.ideal_ph.0 + self.ideal_ph.1) / 2.0
    }
}

pub static CROP_PROFILES: &[CropProfile] = &[
    CropProfile {
        name: "maize",
        display_name: "Maize",
        aliases: &["corn"],
        ideal_ph: (5.8, 7.0),
        nitrogen: Level::High,
        phosphorus: Level::Medium,
        potassium: Level::Medium,
        drought_tolerance: Level::Medium,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::High,
    },
    CropProfile {
        name: "sorghum",
        display_name: "Sorghum",
        aliases: &[],
        ideal_ph: (5.5, 7.5),
        nitrogen: Level::Medium,
        phosphorus: Level::Medium,
        potassium: Level::Medium,
        drought_tolerance: Level::High,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::Medium,
    },
    CropProfile {
        name: "groundnuts",
        display_name: "Groundnuts",
        aliases: &["groundnut", "peanuts", "peanut"],
        ideal_ph: (5.5, 7.0),
        nitrogen: Level::Low,
        phosphorus: Level::Medium,
        potassium: Level::Medium,
        drought_tolerance: Level::Medium,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::High,
    },
    CropProfile {
        name: "soybeans",
        display_name: "Soybeans",
        aliases: &["soybean", "soya", "soya_beans"],
        ideal_ph: (6.0, 7.0),
        nitrogen: Level::Low,
        phosphorus: Level::Medium,
        potassium: Level::Medium,
        drought_tolerance: Level::Low,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::High,
    },
    CropProfile {
        name: "cotton",
        display_name: "Cotton",
        aliases: &[],
        ideal_ph: (5.8, 8.0),
        nitrogen: Level::Medium,
        phosphorus: Level::Medium,
        potassium: Level::High,
        drought_tolerance: Level::High,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::Medium,
    },
    CropProfile {
        name: "wheat",
        display_name: "Wheat",
        aliases: &[],
        ideal_ph: (6.0, 7.5),
        nitrogen: Level::High,
        phosphorus: Level::Medium,
        potassium: Level::Medium,
        drought_tolerance: Level::Low,
        growing_season: GrowingSeason::Winter,
        market_demand: Level::Medium,
    },
    CropProfile {
        name: "sweet_potato",
        display_name: "Sweet potato",
        aliases: &["sweet_potatoes"],
        ideal_ph: (5.5, 6.5),
        nitrogen: Level::Low,
        phosphorus: Level::Medium,
        potassium: Level::High,
        drought_tolerance: Level::Medium,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::Low,
    },
    CropProfile {
        name: "tobacco",
        display_name: "Tobacco",
        aliases: &[],
        ideal_ph: (5.5, 6.5),
        nitrogen: Level::Medium,
        phosphorus: Level::Medium,
        potassium: Level::High,
        drought_tolerance: Level::Medium,
        growing_season: GrowingSeason::Summer,
        market_demand: Level::Medium,
    },
];

fn crop_index() -> &'static FxHashMap<&'static str, usize> {
    static INDEX: OnceLock<FxHashMap<&'static str, usize>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut index = FxHashMap::default();
        for (i, crop) in CROP_PROFILES.iter().enumerate() {
            index.insert(crop.name, i);
            for alias in crop.aliases {
                index.insert(*alias, i);
            }
        }
        index
    })
}

/// Look up a crop by name or alias; case-insensitive, spaces fold to `_`.
pub fn find_crop(name: &str) -> Option<&'static CropProfile> {
    let key = name.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let found = crop_index().get(key.as_str()).map(|i| &CROP_PROFILES[*i]);
    if found.is_none() {
        tracing::debug!(crop = name, "crop not in requirement table");
    }
    found
}

// ============================================================================
// Suitability scoring
// ============================================================================

/// Fit used for a component whose soil parameter is missing
const NEUTRAL_FIT: f64 = 0.5;

/// Bucket thresholds for one nutrient: below `low_max` suits low-need crops,
/// `medium` is the comfortable band, above `high_min` suits high-need crops.
struct NutrientBuckets {
    low_max: f64,
    medium: (f64, f64),
    high_min: f64,
}

const NITROGEN_BUCKETS: NutrientBuckets = NutrientBuckets { low_max: 30.0, medium: (20.0, 40.0), high_min: 30.0 };
const PHOSPHORUS_BUCKETS: NutrientBuckets = NutrientBuckets { low_max: 20.0, medium: (15.0, 30.0), high_min: 20.0 };
const POTASSIUM_BUCKETS: NutrientBuckets = NutrientBuckets { low_max: 150.0, medium: (150.0, 250.0), high_min: 200.0 };

fn bucket_fit(value: f64, need: Level, buckets: &NutrientBuckets) -> f64 {
    let fit = match need {
        Level::Low => {
            if value < buckets.low_max {
                1.0
            } else {
                1.0 - (value - buckets.low_max) / buckets.low_max
            }
        }
        Level::Medium => {
            let (lo, hi) = buckets.medium;
            if value >= lo && value <= hi {
                1.0
            } else {
                1.0 - (value - lo).abs().min((value - hi).abs()) / lo
            }
        }
        Level::High => {
            if value > buckets.high_min {
                1.0
            } else {
                1.0 - (buckets.high_min - value) / buckets.high_min
            }
        }
    };
    fit.clamp(0.0, 1.0)
}

fn ph_fit(ph: f64, crop: &CropProfile) -> f64 {
    let (lo, hi) = crop.ideal_ph;
    if ph >= lo && ph <= hi {
        1.0
    } else {
        let distance = (ph - lo).abs().min((ph - hi).abs());
        (1.0 - distance / 2.0).max(0.0)
    }
}

fn moisture_fit(moisture: f64, tolerance: Level) -> f64 {
    match tolerance {
        Level::High => {
            if moisture < 25.0 {
                1.0
            } else {
                (1.0 - (moisture - 25.0) / 25.0).max(0.7)
            }
        }
        Level::Medium => {
            if (15.0..=30.0).contains(&moisture) {
                1.0
            } else {
                let distance = (moisture - 15.0).abs().min((moisture - 30.0).abs());
                (1.0 - distance / 15.0).max(0.6)
            }
        }
        Level::Low => {
            if moisture > 20.0 {
                1.0
            } else {
                (moisture / 20.0).max(0.5)
            }
        }
    }
}

/// Component breakdown for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropMatch {
    pub crop: String,
    pub display_name: String,
    pub suitability: f64,
    pub ph_fit: f64,
    pub nutrient_fit: f64,
    pub moisture_fit: f64,
}

/// Suitability of one crop for a soil sample (0-1)
pub fn assess_crop(crop: &CropProfile, params: &SoilParameterSet, region: Option<Region>) -> CropMatch {
    let ph = params
        .get(SoilParameter::Ph)
        .map_or(NEUTRAL_FIT, |v| ph_fit(v, crop));

    let nitrogen = params
        .get(SoilParameter::Nitrogen)
        .map_or(NEUTRAL_FIT, |v| bucket_fit(v, crop.nitrogen, &NITROGEN_BUCKETS));
    let phosphorus = params
        .get(SoilParameter::Phosphorus)
        .map_or(NEUTRAL_FIT, |v| bucket_fit(v, crop.phosphorus, &PHOSPHORUS_BUCKETS));
    let potassium = params
        .get(SoilParameter::Potassium)
        .map_or(NEUTRAL_FIT, |v| bucket_fit(v, crop.potassium, &POTASSIUM_BUCKETS));
    let nutrient = 0.5 * nitrogen + 0.25 * phosphorus + 0.25 * potassium;

    let moisture = params
        .get(SoilParameter::Moisture)
        .map_or(NEUTRAL_FIT, |v| moisture_fit(v, crop.drought_tolerance));

    let mut suitability = ph * 0.3 + nutrient * 0.2 + moisture * 0.3 + 0.2;

    match region {
        Some(Region::Matabeleland) if crop.drought_tolerance == Level::High => suitability += 0.1,
        Some(Region::Mashonaland) if crop.nitrogen == Level::High => suitability += 0.05,
        _ => {}
    }

    CropMatch {
        crop: crop.name.to_string(),
        display_name: crop.display_name.to_string(),
        suitability: suitability.min(1.0),
        ph_fit: ph,
        nutrient_fit: nutrient,
        moisture_fit: moisture,
    }
}

/// Crops scoring strictly above `cutoff`, best first.
///
/// Outside the rainy season only winter crops are considered.
pub fn rank_crops(
    params: &SoilParameterSet,
    region: Option<Region>,
    season: Option<Season>,
    cutoff: f64,
) -> Vec<CropMatch> {
    let winter_only = matches!(season, Some(Season::Dry) | Some(Season::Transition));

    let mut matches: Vec<CropMatch> = CROP_PROFILES
        .iter()
        .filter(|crop| !winter_only || crop.growing_season == GrowingSeason::Winter)
        .map(|crop| assess_crop(crop, params, region))
        .filter(|m| m.suitability > cutoff)
        .collect();

    // Stable sort keeps table order on ties
    matches.sort_by(|a, b| b.suitability.total_cmp(&a.suitability));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ideal_sample() -> SoilParameterSet {
        SoilParameterSet::from_pairs([
            ("ph", 6.5),
            ("nitrogen", 30.0),
            ("phosphorus", 25.0),
            ("potassium", 200.0),
            ("organic_matter", 4.0),
            ("cec", 15.0),
            ("moisture", 25.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_crop_aliases() {
        assert_eq!(find_crop("Peanuts").map(|c| c.name), Some("groundnuts"));
        assert_eq!(find_crop("sweet potato").map(|c| c.name), Some("sweet_potato"));
        assert_eq!(find_crop("soybean").map(|c| c.name), Some("soybeans"));
        assert!(find_crop("quinoa").is_none());
    }

    #[test]
    fn test_maize_on_ideal_soil() {
        let maize = find_crop("maize").unwrap();
        let m = assess_crop(maize, &ideal_sample(), None);
        assert_relative_eq!(m.suitability, 1.0);
    }

    #[test]
    fn test_ranking_sorted_and_above_cutoff() {
        let ranked = rank_crops(&ideal_sample(), None, Some(Season::Rainy), 0.65);
        assert!(!ranked.is_empty());
        for pair in ranked.windows(2) {
            assert!(pair[0].suitability >= pair[1].suitability);
        }
        assert!(ranked.iter().all(|m| m.suitability > 0.65));
    }

    #[test]
    fn test_ties_keep_table_order() {
        let ranked = rank_crops(&ideal_sample(), None, Some(Season::Rainy), 0.0);
        let perfect: Vec<&str> = ranked
            .iter()
            .filter(|m| (m.suitability - 1.0).abs() < 1e-12)
            .map(|m| m.crop.as_str())
            .collect();
        let table_order: Vec<&str> = CROP_PROFILES
            .iter()
            .map(|c| c.name)
            .filter(|name| perfect.contains(name))
            .collect();
        assert_eq!(perfect, table_order);
        assert_eq!(perfect[0], "maize");
    }

    #[test]
    fn test_dry_season_only_winter_crops() {
        let ranked = rank_crops(&ideal_sample(), None, Some(Season::Dry), 0.0);
        assert!(ranked.iter().all(|m| m.crop == "wheat"));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_matabeleland_drought_bonus() {
        let dry_soil = SoilParameterSet::from_pairs([("ph", 6.5), ("moisture", 12.0)]).unwrap();
        let sorghum = find_crop("sorghum").unwrap();
        let plain = assess_crop(sorghum, &dry_soil, None);
        let bonus = assess_crop(sorghum, &dry_soil, Some(Region::Matabeleland));
        assert!(bonus.suitability > plain.suitability);
    }

    #[test]
    fn test_acidic_soil_penalised() {
        let acidic = SoilParameterSet::from_pairs([("ph", 4.0), ("nitrogen", 5.0), ("moisture", 5.0)]).unwrap();
        let ranked = rank_crops(&acidic, None, Some(Season::Rainy), 0.65);
        assert!(ranked.iter().all(|m| m.crop != "soybeans"));
    }
}
