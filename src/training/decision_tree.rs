//! Decision tree classifier

use crate::error::{AnalyticsError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the class distribution of its samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Gini impurity of a class histogram
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Decision tree classifier over class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Features considered per split (all when `None`)
    pub max_features: Option<usize>,
    /// Seed for per-node feature sampling
    pub random_state: Option<u64>,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

/// Read-only inputs shared by every recursive build step
struct BuildContext<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    total_samples: usize,
}

struct BestSplit {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            max_features: None,
            random_state: None,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit on the rows named by `sample_indices` (repeats allowed, as in a bootstrap sample)
    pub fn fit_on(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        sample_indices: &[usize],
        n_classes: usize,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(AnalyticsError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if sample_indices.is_empty() {
            return Err(AnalyticsError::ValidationError("cannot fit a tree on zero samples".to_string()));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(AnalyticsError::ValidationError(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;

        let ctx = BuildContext {
            x,
            y,
            total_samples: sample_indices.len(),
        };
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));
        let mut importances = vec![0.0; self.n_features];

        self.root = Some(self.build_tree(&ctx, sample_indices.to_vec(), 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let n = n_samples.max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / n).collect(),
            n_samples,
        }
    }

    fn build_tree(
        &self,
        ctx: &BuildContext<'_>,
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let counts = self.class_counts(ctx.y, &indices);
        let impurity = gini(&counts, n_samples);

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let should_stop = n_samples < 2
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure;

        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        let Some(best) = self.find_best_split(ctx, &indices, &counts, impurity, rng) else {
            return self.leaf(&counts, n_samples);
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| ctx.x[[i, best.feature_idx]] <= best.threshold);

        // Weighted impurity decrease, scaled by the node's share of the training sample
        importances[best.feature_idx] +=
            n_samples as f64 / ctx.total_samples as f64 * best.gain;

        let left = Box::new(self.build_tree(ctx, left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(ctx, right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let k = self.max_features.unwrap_or(self.n_features).min(self.n_features);
        if k >= self.n_features {
            return (0..self.n_features).collect();
        }
        let mut features = sample(rng, self.n_features, k).into_vec();
        features.sort_unstable();
        features
    }

    fn find_best_split(
        &self,
        ctx: &BuildContext<'_>,
        indices: &[usize],
        parent_counts: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<BestSplit> {
        let n = indices.len();
        let mut best: Option<BestSplit> = None;
        let mut sorted = indices.to_vec();

        for feature_idx in self.candidate_features(rng) {
            sorted.sort_by(|&a, &b| {
                ctx.x[[a, feature_idx]]
                    .partial_cmp(&ctx.x[[b, feature_idx]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            // Sweep split positions left to right, moving one sample at a time
            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for pos in 0..n - 1 {
                let class = ctx.y[sorted[pos]];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let current = ctx.x[[sorted[pos], feature_idx]];
                let next = ctx.x[[sorted[pos + 1], feature_idx]];
                if next <= current {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let weighted = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                    best = Some(BestSplit {
                        feature_idx,
                        threshold: (current + next) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Class distribution for one sample
    pub fn predict_proba_row(&self, sample: ArrayView1<'_, f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(AnalyticsError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }
}

/// Index of the largest value; ties go to the lowest index
pub(crate) fn argmax(values: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
