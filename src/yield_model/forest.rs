//! Bagged regression-tree ensemble
//!
//! Every tree is fit on a bootstrap resample drawn from its own
//! `StdRng::seed_from_u64(seed + tree_index)`, so parallel training with rayon
//! produces the same forest as a sequential fit.

use super::tree::{FeatureRow, RegressionTree, TreeParams};
use crate::error::{ScoringError, ScoringResult};
use crate::soil::PARAMETER_COUNT;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    /// Normalized to sum to 1 (all zero if no tree ever split)
    feature_importances: FeatureRow,
    params: ForestParams,
}

impl RandomForest {
    pub fn fit(rows: &[FeatureRow], targets: &[f64], params: ForestParams) -> ScoringResult<Self> {
        if rows.is_empty() {
            return Err(ScoringError::Training("no training rows".to_string()));
        }
        if rows.len() != targets.len() {
            return Err(ScoringError::Training(format!(
                "{} feature rows but {} targets",
                rows.len(),
                targets.len()
            )));
        }
        if params.n_trees == 0 {
            return Err(ScoringError::Training("forest needs at least one tree".to_string()));
        }

        let n = rows.len();
        let trees: Vec<RegressionTree> = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(rows, targets, sample, &params.tree)
            })
            .collect();

        let feature_importances = average_importances(&trees);

        Ok(Self {
            trees,
            feature_importances,
            params,
        })
    }

    /// Mean prediction across trees
    pub fn predict(&self, row: &FeatureRow) -> f64 {
        self.predict_with_spread(row).0
    }

    /// (mean, standard deviation) of per-tree predictions
    pub fn predict_with_spread(&self, row: &FeatureRow) -> (f64, f64) {
        let predictions: Vec<f64> = self.trees.iter().map(|t| t.predict(row)).collect();
        let n = predictions.len() as f64;
        let mean = predictions.iter().sum::<f64>() / n;
        let variance = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    pub fn feature_importances(&self) -> &FeatureRow {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Per-tree importances normalized to 1, averaged, then renormalized.
fn average_importances(trees: &[RegressionTree]) -> FeatureRow {
    let mut total = [0.0; PARAMETER_COUNT];
    for tree in trees {
        let raw = tree.importances();
        let sum: f64 = raw.iter().sum();
        if sum > 0.0 {
            for (acc, value) in total.iter_mut().zip(raw.iter()) {
                *acc += value / sum;
            }
        }
    }

    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        for value in total.iter_mut() {
            *value /= sum;
        }
    }
    total
}
