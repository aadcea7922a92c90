//! Soil inputs
//!
//! - `parameters`: parameter enum, ideal ranges, validated parameter set
//! - `normalization`: single-value suitability curve
//! - `context`: region and season resolution

pub mod context;
pub mod normalization;
pub mod parameters;

pub use context::{Region, Season, SeasonSelection};
pub use normalization::{ParameterNormalizer, PenaltyCurve};
pub use parameters::{
    IdealRange, IdealRanges, RangeFit, RangeOffset, SoilParameter, SoilParameterSet, PARAMETER_COUNT,
};
