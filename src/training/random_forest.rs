//! Random Forest classifier

use super::decision_tree::{argmax, DecisionTree};
use crate::error::{AnalyticsError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
    /// Sorted class labels; column `j` of `predict_proba` is `classes[j]`
    classes: Vec<i64>,
}

impl RandomForest {
    /// Create a new classifier forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: None,
            feature_importances: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Candidate features per split: `floor(sqrt(n_features))`, at least one
    fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().floor() as usize).max(1)
    }

    /// Fit the forest to training data.
    ///
    /// Tree `i` draws its bootstrap sample and its feature subsets from a
    /// generator seeded with `random_state + i`, so the fitted forest does not
    /// depend on how rayon schedules the trees.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[i64]) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AnalyticsError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AnalyticsError::ValidationError(format!(
                "cannot fit on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if self.n_estimators == 0 {
            return Err(AnalyticsError::ValidationError("n_estimators must be positive".to_string()));
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let y_idx: Vec<usize> = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();
        let n_classes = classes.len();
        let max_features = Self::max_features(n_features);
        let base_seed = self.random_state.unwrap_or(42);

        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| -> Result<DecisionTree> {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut tree = DecisionTree::new()
                    .with_max_features(max_features)
                    .with_random_state(rng.next_u64());
                if let Some(d) = self.max_depth {
                    tree = tree.with_max_depth(d);
                }

                tree.fit_on(x, &y_idx, &sample_indices, n_classes)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = n_features;
        self.classes = classes;
        self.compute_feature_importances();

        Ok(self)
    }

    /// Mean of per-tree importances, renormalized to sum to one.
    ///
    /// When no tree ever splits (single-class training data) every feature
    /// gets the same share.
    fn compute_feature_importances(&mut self) {
        let mut total_importances = vec![0.0; self.n_features];

        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                for (total, &val) in total_importances.iter_mut().zip(imp.iter()) {
                    *total += val;
                }
            }
        }

        let total: f64 = total_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut total_importances {
                *imp /= total;
            }
        } else if self.n_features > 0 {
            total_importances.fill(1.0 / self.n_features as f64);
        }

        self.feature_importances = Some(Array1::from_vec(total_importances));
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AnalyticsError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AnalyticsError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    /// Class probabilities: the mean of the trees' leaf distributions.
    /// Columns follow [`RandomForest::classes`].
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_input(x)?;

        let n_trees = self.trees.len() as f64;
        let rows: Vec<Vec<f64>> = x
            .rows()
            .into_iter()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|row| -> Result<Vec<f64>> {
                let mut acc = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    let dist = tree.predict_proba_row(row)?;
                    for (a, &p) in acc.iter_mut().zip(dist) {
                        *a += p;
                    }
                }
                Ok(acc.into_iter().map(|a| a / n_trees).collect())
            })
            .collect::<Result<_>>()?;

        let n_classes = self.classes.len();
        Ok(Array2::from_shape_fn((rows.len(), n_classes), |(i, j)| rows[i][j]))
    }

    /// Hard labels: the class with the highest mean probability
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row)])
            .collect())
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Column of `predict_proba` holding `label`
    pub fn class_index(&self, label: i64) -> Option<usize> {
        self.classes.binary_search(&label).ok()
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
