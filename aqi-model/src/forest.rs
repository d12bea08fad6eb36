//! Random forest regressor: bagged CART regression trees.
//!
//! Each tree is fitted on a bootstrap sample (drawn with replacement, same
//! size as the training set) by greedy variance-reduction splits. The forest
//! predicts the mean of its trees' leaf values.

use aqi_core::schema::{FeatureVector, FEATURE_COUNT};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hyper-parameters for [`RandomForest::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    /// Minimum samples a node needs to be split.
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split.
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them.
    pub max_features: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
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

/// A single regression tree, stored as a flat node list rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Bagged ensemble of [`RegressionTree`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl RegressionTree {
    fn fit(
        x: &[FeatureVector],
        y: &[f64],
        samples: Vec<usize>,
        config: &ForestConfig,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = vec![Node::Leaf {
            value: mean(y, &samples),
        }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];
        let n_features = config
            .max_features
            .unwrap_or(FEATURE_COUNT)
            .clamp(1, FEATURE_COUNT);
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();

        while let Some(pending) = stack.pop() {
            if !can_split(&pending, y, config) {
                continue;
            }
            features.shuffle(rng);
            let candidates = &features[..n_features];
            let Some((feature, threshold)) =
                best_split(x, y, &pending.samples, candidates, config.min_samples_leaf)
            else {
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = pending
                .samples
                .into_iter()
                .partition(|&i| x[i][feature] <= threshold);

            let left = nodes.len();
            nodes.push(Node::Leaf {
                value: mean(y, &left_samples),
            });
            let right = nodes.len();
            nodes.push(Node::Leaf {
                value: mean(y, &right_samples),
            });
            nodes[pending.node] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: pending.depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: pending.depth + 1,
            });
        }

        RegressionTree { nodes }
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
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
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Number of nodes, leaves included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural checks for a tree read from an artifact.
    ///
    /// Children must point forward in the node list (so traversal always
    /// terminates) and splits must reference a schema feature.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(String::from("tree has no nodes"));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(format!("leaf {index} has a non-finite value"));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(format!(
                            "split {index} uses feature {feature}, schema has {FEATURE_COUNT}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("split {index} has a non-finite threshold"));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("split {index} has invalid child {child}"));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl RandomForest {
    /// Fit a forest on `x`/`y`.
    ///
    /// Trees are fitted in parallel; tree `t` draws from its own generator
    /// seeded with `seed` and `t`, so the result is the same for any thread
    /// count. `x` and `y` must be non-empty and of equal length.
    pub fn fit(x: &[FeatureVector], y: &[f64], config: &ForestConfig, seed: u64) -> Self {
        assert_eq!(x.len(), y.len(), "feature and target lengths differ");
        let n = x.len();
        let trees = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, t));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, y, bootstrap, config, &mut rng)
            })
            .collect();
        RandomForest { trees }
    }

    /// Mean of the trees' predictions.
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        total / self.trees.len() as f64
    }

    pub fn predict_batch(&self, rows: &[FeatureVector]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Structural checks for a forest read from an artifact.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err(String::from("forest has no trees"));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {t}: {e}"))?;
        }
        Ok(())
    }
}

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn mean(y: &[f64], samples: &[usize]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|&i| y[i]).sum::<f64>() / samples.len() as f64
}

fn can_split(pending: &Pending, y: &[f64], config: &ForestConfig) -> bool {
    let n = pending.samples.len();
    if n < config.min_samples_split.max(2) || n < 2 * config.min_samples_leaf.max(1) {
        return false;
    }
    if config.max_depth.is_some_and(|d| pending.depth >= d) {
        return false;
    }
    // pure node
    let first = y[pending.samples[0]];
    pending.samples.iter().any(|&i| y[i] != first)
}

/// Best (feature, threshold) by squared-error reduction, if any split is valid.
///
/// Samples with `x[feature] <= threshold` go left.
fn best_split(
    x: &[FeatureVector],
    y: &[f64],
    samples: &[usize],
    features: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = samples.len();
    let min_leaf = min_samples_leaf.max(1);
    let total: f64 = samples.iter().map(|&i| y[i]).sum();
    let mut order = samples.to_vec();
    let mut best: Option<(f64, usize, f64)> = None;

    for &feature in features {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));
        let mut left_sum = 0.0;
        for pos in 1..n {
            left_sum += y[order[pos - 1]];
            let lo = x[order[pos - 1]][feature];
            let hi = x[order[pos]][feature];
            if lo >= hi || pos < min_leaf || n - pos < min_leaf {
                continue;
            }
            let right_sum = total - left_sum;
            // maximizing this minimizes the children's summed squared error
            let score = left_sum * left_sum / pos as f64 + right_sum * right_sum / (n - pos) as f64;
            if best.map_or(true, |(s, _, _)| score > s) {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some((score, feature, threshold));
            }
        }
    }
    best.map(|(_, feature, threshold)| (feature, threshold))
}
