//! Seeded train/test partitioning

use crate::error::{AnalyticsError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Row indices of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Rows of `x` belonging to the train partition
    pub fn train_rows(&self, x: &Array2<f64>) -> Array2<f64> {
        x.select(Axis(0), &self.train)
    }

    /// Rows of `x` belonging to the test partition
    pub fn test_rows(&self, x: &Array2<f64>) -> Array2<f64> {
        x.select(Axis(0), &self.test)
    }

    pub fn train_labels<T: Copy>(&self, y: &[T]) -> Vec<T> {
        self.train.iter().map(|&i| y[i]).collect()
    }

    pub fn test_labels<T: Copy>(&self, y: &[T]) -> Vec<T> {
        self.test.iter().map(|&i| y[i]).collect()
    }
}

/// Number of test rows for `n_samples` rows and a `test_size` fraction
pub fn test_count(n_samples: usize, test_size: f64) -> usize {
    (n_samples as f64 * test_size).ceil() as usize
}

/// Shuffle `0..n_samples` with a ChaCha8 generator seeded by `seed` and take
/// the first `ceil(test_size * n)` indices as the test partition.
///
/// The permutation depends only on `(n_samples, test_size, seed)`, so every
/// caller that loads the same dataset sees the same partition.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AnalyticsError::ValidationError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = test_count(n_samples, test_size);
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(AnalyticsError::ValidationError(format!(
            "{} samples cannot be split with test_size {} (train={}, test={})",
            n_samples, test_size, n_train, n_test
        )));
    }

    let mut permutation: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    permutation.shuffle(&mut rng);

    let train = permutation.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: permutation,
    })
}
