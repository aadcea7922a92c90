//! Training data
//!
//! Historical yield records arrive as a polars `DataFrame` (or a CSV read
//! through polars). Feature columns are resolved through the soil parameter
//! aliases and projected lazily, so extra columns never get materialized.

use super::tree::FeatureRow;
use crate::error::{ScoringError, ScoringResult};
use crate::soil::{SoilParameter, PARAMETER_COUNT};
use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;

/// Accepted names for the yield column
pub const TARGET_COLUMNS: &[&str] = &["yield_tons_per_hectare", "yield", "yield_tons"];
const TARGET_ALIAS: &str = "__yield";

/// Value used for a feature the caller did not measure
pub fn default_feature_value(parameter: SoilParameter) -> f64 {
    match parameter {
        SoilParameter::Ph => 6.5,
        SoilParameter::Nitrogen => 30.0,
        SoilParameter::Phosphorus => 25.0,
        SoilParameter::Potassium => 200.0,
        SoilParameter::OrganicMatter => 4.0,
        SoilParameter::CationExchangeCapacity => 15.0,
        SoilParameter::Moisture => 25.0,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingSet {
    rows: Vec<FeatureRow>,
    targets: Vec<f64>,
}

impl TrainingSet {
    pub fn new(rows: Vec<FeatureRow>, targets: Vec<f64>) -> Self {
        Self { rows, targets }
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Extract a training set from historical records.
    ///
    /// Missing feature columns are filled with their defaults; rows with a
    /// null or non-finite value are skipped. Non-positive yields are rejected.
    pub fn from_dataframe(df: &DataFrame) -> ScoringResult<Self> {
        let target_source = TARGET_COLUMNS
            .iter()
            .find(|name| df.get_column_index(name).is_some())
            .ok_or_else(|| {
                ScoringError::Training(format!("no yield column (expected one of {:?})", TARGET_COLUMNS))
            })?;

        let mut exprs = Vec::with_capacity(PARAMETER_COUNT + 1);
        for parameter in SoilParameter::ALL {
            let source = parameter
                .aliases()
                .iter()
                .find(|alias| df.get_column_index(alias).is_some());
            let expr = match source {
                Some(name) => col(*name).cast(DataType::Float64),
                None => {
                    tracing::warn!(
                        parameter = parameter.as_str(),
                        default = default_feature_value(parameter),
                        "training data has no column for feature, filling with default"
                    );
                    lit(default_feature_value(parameter))
                }
            };
            exprs.push(expr.alias(parameter.as_str()));
        }
        exprs.push(col(*target_source).cast(DataType::Float64).alias(TARGET_ALIAS));

        let projected = df.clone().lazy().select(exprs).collect()?;

        let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(PARAMETER_COUNT);
        for parameter in SoilParameter::ALL {
            columns.push(projected.column(parameter.as_str())?.f64()?.into_iter().collect());
        }
        let targets: Vec<Option<f64>> = projected.column(TARGET_ALIAS)?.f64()?.into_iter().collect();

        let mut set = TrainingSet::default();
        let mut skipped = 0usize;
        for (i, target) in targets.iter().enumerate() {
            let mut row = [0.0; PARAMETER_COUNT];
            let mut complete = true;
            for (f, column) in columns.iter().enumerate() {
                match column.get(i).copied().flatten() {
                    Some(v) if v.is_finite() => row[f] = v,
                    _ => complete = false,
                }
            }
            let target = match target {
                Some(t) if t.is_finite() && complete => *t,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            if target <= 0.0 {
                return Err(ScoringError::out_of_domain(
                    *target_source,
                    target,
                    "training yields must be positive",
                ));
            }
            set.rows.push(row);
            set.targets.push(target);
        }

        if skipped > 0 {
            tracing::warn!(skipped, kept = set.len(), "skipped incomplete training rows");
        }
        if set.is_empty() {
            return Err(ScoringError::Training("training data has no complete rows".to_string()));
        }
        Ok(set)
    }

    /// Read historical records from a CSV file with a header row
    pub fn from_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open training CSV: {:?}", path))?
            .finish()
            .with_context(|| format!("Failed to parse training CSV: {:?}", path))?;

        let set = Self::from_dataframe(&df)
            .with_context(|| format!("Invalid training data in {:?}", path))?;
        Ok(set)
    }

    /// Canonical-column DataFrame view (features + `yield_tons_per_hectare`)
    pub fn to_dataframe(&self) -> ScoringResult<DataFrame> {
        let mut columns: Vec<Column> = SoilParameter::ALL
            .iter()
            .map(|p| {
                let values: Vec<f64> = self.rows.iter().map(|r| r[p.index()]).collect();
                Column::new(p.as_str().into(), values)
            })
            .collect();
        columns.push(Column::new(TARGET_COLUMNS[0].into(), self.targets.clone()));
        Ok(DataFrame::new(columns)?)
    }

    /// Seeded shuffle split into (train, holdout)
    pub fn split(&self, holdout_fraction: f64, seed: u64) -> (TrainingSet, TrainingSet) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));

        let holdout = ((self.len() as f64) * holdout_fraction).round() as usize;
        let holdout = holdout.min(self.len().saturating_sub(1));
        let (test_idx, train_idx) = order.split_at(holdout);

        let pick = |idx: &[usize]| TrainingSet {
            rows: idx.iter().map(|&i| self.rows[i]).collect(),
            targets: idx.iter().map(|&i| self.targets[i]).collect(),
        };
        (pick(train_idx), pick(test_idx))
    }
}
