//! CART regression tree
//!
//! Splits minimise the summed squared error of the two children. Each split's
//! SSE reduction is credited to its feature, which gives the impurity-based
//! feature importance used by the forest.

use serde::{Deserialize, Serialize};

use crate::soil::PARAMETER_COUNT;

pub type FeatureRow = [f64; PARAMETER_COUNT];

/// Minimum SSE reduction worth a split
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    /// Unnormalized SSE reduction per feature
    importances: FeatureRow,
}

struct SplitCandidate {
    feature: usize,
    position: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on the rows selected by `sample` (indices may repeat, as in a bootstrap).
    pub fn fit(rows: &[FeatureRow], targets: &[f64], mut sample: Vec<usize>, params: &TreeParams) -> Self {
        let mut tree = RegressionTree {
            nodes: Vec::new(),
            importances: [0.0; PARAMETER_COUNT],
        };
        if sample.is_empty() {
            tree.nodes.push(Node::Leaf { value: 0.0 });
            return tree;
        }
        tree.grow(rows, targets, &mut sample, 0, params);
        tree
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn importances(&self) -> &FeatureRow {
        &self.importances
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Grow the subtree for `sample` and return its node index.
    fn grow(
        &mut self,
        rows: &[FeatureRow],
        targets: &[f64],
        sample: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let n = sample.len();
        let mean = sample.iter().map(|&i| targets[i]).sum::<f64>() / n as f64;

        let node_index = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= params.max_depth || n < params.min_samples_split {
            return node_index;
        }

        let Some(best) = best_split(rows, targets, sample, params.min_samples_leaf) else {
            return node_index;
        };

        self.importances[best.feature] += best.gain;

        sort_by_feature(rows, sample, best.feature);
        let (left_sample, right_sample) = sample.split_at_mut(best.position);
        let left = self.grow(rows, targets, left_sample, depth + 1, params);
        let right = self.grow(rows, targets, right_sample, depth + 1, params);

        self.nodes[node_index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_index
    }
}

fn sort_by_feature(rows: &[FeatureRow], sample: &mut [usize], feature: usize) {
    sample.sort_by(|a, b| rows[*a][feature].total_cmp(&rows[*b][feature]).then(a.cmp(b)));
}

/// Exhaustive search over every feature and every distinct threshold.
fn best_split(
    rows: &[FeatureRow],
    targets: &[f64],
    sample: &mut [usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = sample.len();
    let total_sum: f64 = sample.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = sample.iter().map(|&i| targets[i] * targets[i]).sum();
    let parent_sse = total_sq - total_sum * total_sum / n as f64;

    let mut best: Option<SplitCandidate> = None;

    for feature in 0..PARAMETER_COUNT {
        sort_by_feature(rows, sample, feature);

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for position in 1..n {
            let y = targets[sample[position - 1]];
            left_sum += y;
            left_sq += y * y;

            if position < min_leaf || n - position < min_leaf {
                continue;
            }
            let lower = rows[sample[position - 1]][feature];
            let upper = rows[sample[position]][feature];
            if lower >= upper {
                continue;
            }

            let n_left = position as f64;
            let n_right = (n - position) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let child_sse = (left_sq - left_sum * left_sum / n_left) + (right_sq - right_sum * right_sum / n_right);
            let gain = parent_sse - child_sse;

            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    position,
                    threshold: (lower + upper) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}
