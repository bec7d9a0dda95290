//! Model training module
//!
//! Provides the deterministic split-and-train routine:
//! - [`train_test_split`]: seeded 80/20 partition of dataset rows
//! - [`DecisionTree`]: CART classifier with per-node feature sampling
//! - [`RandomForest`]: bootstrap ensemble with probability averaging
//! - [`TrainEngine`]: loads features, splits, fits and scores in one call

mod engine;
pub mod decision_tree;
pub mod random_forest;
pub mod split;

pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{accuracy_score, train, TrainEngine, TrainOutcome, TrainingConfig, DEFAULT_SEED};
pub use random_forest::RandomForest;
pub use split::{test_count, train_test_split, SplitIndices};
