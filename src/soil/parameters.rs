//! Soil parameters and the validated parameter set
//!
//! Callers hand over a flat `name -> value` map. It is validated exactly once
//! here: names are resolved through a small alias table, unknown keys are
//! dropped, and every value must be finite and inside its instrument range.

use crate::error::{ScoringError, ScoringResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The seven soil measurements the engine understands.
///
/// Declaration order is the canonical evaluation order used everywhere a
/// deterministic iteration is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoilParameter {
    Ph,
    Nitrogen,
    Phosphorus,
    Potassium,
    OrganicMatter,
    #[serde(rename = "cec")]
    CationExchangeCapacity,
    Moisture,
}

pub const PARAMETER_COUNT: usize = 7;

impl SoilParameter {
    pub const ALL: [SoilParameter; PARAMETER_COUNT] = [
        SoilParameter::Ph,
        SoilParameter::Nitrogen,
        SoilParameter::Phosphorus,
        SoilParameter::Potassium,
        SoilParameter::OrganicMatter,
        SoilParameter::CationExchangeCapacity,
        SoilParameter::Moisture,
    ];

    /// Position in [`SoilParameter::ALL`]; also the feature column in the yield model.
    pub fn index(self) -> usize {
        match self {
            SoilParameter::Ph => 0,
            SoilParameter::Nitrogen => 1,
            SoilParameter::Phosphorus => 2,
            SoilParameter::Potassium => 3,
            SoilParameter::OrganicMatter => 4,
            SoilParameter::CationExchangeCapacity => 5,
            SoilParameter::Moisture => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SoilParameter::Ph => "ph",
            SoilParameter::Nitrogen => "nitrogen",
            SoilParameter::Phosphorus => "phosphorus",
            SoilParameter::Potassium => "potassium",
            SoilParameter::OrganicMatter => "organic_matter",
            SoilParameter::CationExchangeCapacity => "cec",
            SoilParameter::Moisture => "moisture",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SoilParameter::Ph => "pH level",
            SoilParameter::Nitrogen => "Nitrogen",
            SoilParameter::Phosphorus => "Phosphorus",
            SoilParameter::Potassium => "Potassium",
            SoilParameter::OrganicMatter => "Organic matter",
            SoilParameter::CationExchangeCapacity => "Cation exchange capacity",
            SoilParameter::Moisture => "Moisture",
        }
    }

    /// Accepted spellings at the boundary, canonical name first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            SoilParameter::Ph => &["ph", "ph_level"],
            SoilParameter::Nitrogen => &["nitrogen", "nitrogen_level", "n"],
            SoilParameter::Phosphorus => &["phosphorus", "phosphorus_level", "p"],
            SoilParameter::Potassium => &["potassium", "potassium_level", "k"],
            SoilParameter::OrganicMatter => &["organic_matter", "om", "organic_matter_level"],
            SoilParameter::CationExchangeCapacity => &["cec", "cation_exchange_capacity"],
            SoilParameter::Moisture => &["moisture", "moisture_content", "moisture_level"],
        }
    }

    /// Resolve a caller-supplied key. Case-insensitive, `-` and spaces fold to `_`.
    pub fn from_name(name: &str) -> Option<SoilParameter> {
        let key: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        SoilParameter::ALL
            .into_iter()
            .find(|p| p.aliases().contains(&key.as_str()))
    }

    /// Physically plausible measurement range for validation.
    pub fn instrument_range(self) -> (f64, f64) {
        match self {
            SoilParameter::Ph => (0.0, 14.0),
            SoilParameter::Nitrogen => (0.0, 200.0),
            SoilParameter::Phosphorus => (0.0, 150.0),
            SoilParameter::Potassium => (0.0, 1000.0),
            SoilParameter::OrganicMatter => (0.0, 15.0),
            SoilParameter::CationExchangeCapacity => (0.0, 100.0),
            SoilParameter::Moisture => (0.0, 100.0),
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SoilParameter::Ph => "",
            SoilParameter::Nitrogen | SoilParameter::Phosphorus | SoilParameter::Potassium => "mg/kg",
            SoilParameter::OrganicMatter | SoilParameter::Moisture => "%",
            SoilParameter::CationExchangeCapacity => "cmol/kg",
        }
    }
}

impl fmt::Display for SoilParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ideal ranges
// ============================================================================

/// The (min, max) band that scores a perfect 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealRange {
    pub min: f64,
    pub max: f64,
}

impl IdealRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn shifted(&self, offset: &RangeOffset) -> Self {
        Self {
            min: self.min + offset.min,
            max: self.max + offset.max,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    pub fn fit(&self, value: f64) -> RangeFit {
        if value < self.min {
            RangeFit::Below
        } else if value > self.max {
            RangeFit::Above
        } else {
            RangeFit::Within
        }
    }

    /// Absolute distance to the nearest bound (0 inside the range)
    pub fn distance(&self, value: f64) -> f64 {
        match self.fit(value) {
            RangeFit::Below => self.min - value,
            RangeFit::Above => value - self.max,
            RangeFit::Within => 0.0,
        }
    }

    /// Distance relative to the violated bound
    pub fn relative_distance(&self, value: f64) -> f64 {
        let bound = match self.fit(value) {
            RangeFit::Below => self.min,
            RangeFit::Above => self.max,
            RangeFit::Within => return 0.0,
        };
        if bound > 0.0 {
            self.distance(value) / bound
        } else {
            self.distance(value)
        }
    }
}

/// Where a value sits relative to an ideal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeFit {
    Below,
    Within,
    Above,
}

impl RangeFit {
    pub fn display_text(&self) -> &'static str {
        match self {
            RangeFit::Below => "below",
            RangeFit::Within => "within",
            RangeFit::Above => "above",
        }
    }
}

/// Additive shift applied to an [`IdealRange`] by region or season
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeOffset {
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
}

impl RangeOffset {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

pub type IdealRanges = BTreeMap<SoilParameter, IdealRange>;

// ============================================================================
// Validated parameter set
// ============================================================================

/// Validated soil measurements, indexed by [`SoilParameter::index`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct SoilParameterSet {
    values: [Option<f64>; PARAMETER_COUNT],
}

impl SoilParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a caller map. Unknown keys are ignored.
    pub fn from_map<S: AsRef<str>>(map: &HashMap<S, f64>) -> ScoringResult<Self> {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_ref(), *v)))
    }

    pub fn from_pairs<'a, I>(pairs: I) -> ScoringResult<Self>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut set = Self::default();
        for (name, value) in pairs {
            let Some(parameter) = SoilParameter::from_name(name) else {
                tracing::trace!(key = name, "ignoring unknown soil parameter key");
                continue;
            };
            validate_value(parameter, value)?;

            match set.values[parameter.index()] {
                Some(existing) if existing != value => {
                    return Err(ScoringError::ConflictingInput {
                        parameter: parameter.as_str().to_string(),
                        first: existing.min(value),
                        second: existing.max(value),
                    });
                }
                _ => set.values[parameter.index()] = Some(value),
            }
        }
        Ok(set)
    }

    /// Builder-style insert with the same validation as [`from_map`](Self::from_map).
    pub fn with(mut self, parameter: SoilParameter, value: f64) -> ScoringResult<Self> {
        validate_value(parameter, value)?;
        self.values[parameter.index()] = Some(value);
        Ok(self)
    }

    pub fn get(&self, parameter: SoilParameter) -> Option<f64> {
        self.values[parameter.index()]
    }

    /// Present parameters in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (SoilParameter, f64)> + '_ {
        SoilParameter::ALL
            .into_iter()
            .filter_map(|p| self.get(p).map(|v| (p, v)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn missing(&self) -> Vec<SoilParameter> {
        SoilParameter::ALL
            .into_iter()
            .filter(|p| self.get(*p).is_none())
            .collect()
    }
}

fn validate_value(parameter: SoilParameter, value: f64) -> ScoringResult<()> {
    if !value.is_finite() {
        return Err(ScoringError::out_of_domain(
            parameter.as_str(),
            value,
            "value must be a finite number",
        ));
    }
    let (lo, hi) = parameter.instrument_range();
    if value < lo || value > hi {
        return Err(ScoringError::out_of_domain(
            parameter.as_str(),
            value,
            format!("outside instrument range [{}, {}]", lo, hi),
        ));
    }
    Ok(())
}

impl TryFrom<HashMap<String, f64>> for SoilParameterSet {
    type Error = ScoringError;

    fn try_from(map: HashMap<String, f64>) -> ScoringResult<Self> {
        Self::from_map(&map)
    }
}

impl From<SoilParameterSet> for BTreeMap<String, f64> {
    fn from(set: SoilParameterSet) -> Self {
        set.iter().map(|(p, v)| (p.as_str().to_string(), v)).collect()
    }
}
