//! Column scaling and correlated Gaussian sampling

use crate::error::{AnalyticsError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;

/// Z-score scaler with population standard deviation; constant columns
/// get a scale of 1.
#[derive(Debug, Clone)]
pub struct ColumnScaler {
    means: Array1<f64>,
    scales: Array1<f64>,
}

impl ColumnScaler {
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        let means = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalyticsError::ValidationError("cannot scale an empty matrix".into()))?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
        Ok(Self { means, scales })
    }

    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.means) / &self.scales
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Array2<f64> {
        x * &self.scales + &self.means
    }
}

/// Sample covariance matrix of the columns (ddof = 1)
pub fn covariance(x: &Array2<f64>) -> Result<Array2<f64>> {
    let n = x.nrows();
    if n < 2 {
        return Err(AnalyticsError::ValidationError(format!(
            "covariance needs at least 2 rows, got {}",
            n
        )));
    }
    let means = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
    let centered = x - &means;
    Ok(centered.t().dot(&centered) / (n as f64 - 1.0))
}

/// Lower-triangular `L` with `A = L Lᵀ`
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(AnalyticsError::ShapeError {
            expected: "square matrix".to_string(),
            actual: format!("{}x{}", n, a.ncols()),
        });
    }

    let mut l = Array2::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let val = a[[i, i]] - sum;
                if val <= 0.0 || !val.is_finite() {
                    return Err(AnalyticsError::ComputationError(
                        "matrix not positive definite".into(),
                    ));
                }
                l[[i, j]] = val.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }
    Ok(l)
}

/// Cholesky factor, adding a growing diagonal jitter until the matrix
/// factors. Covers singular covariances from constant or collinear columns.
pub fn cholesky_with_jitter(a: &Array2<f64>) -> Result<Array2<f64>> {
    if let Ok(l) = cholesky(a) {
        return Ok(l);
    }

    let n = a.nrows();
    let mean_diag = if n > 0 { a.diag().sum() / n as f64 } else { 0.0 };
    let mut jitter = 1e-10 * mean_diag.abs().max(1.0);
    for _ in 0..12 {
        let mut adjusted = a.clone();
        adjusted.diag_mut().mapv_inplace(|d| d + jitter);
        if let Ok(l) = cholesky(&adjusted) {
            tracing::debug!(jitter, "Covariance regularized");
            return Ok(l);
        }
        jitter *= 10.0;
    }

    Err(AnalyticsError::ComputationError(
        "covariance could not be regularized to positive definite".into(),
    ))
}

/// `n` standard normal draws using the Box–Muller transform
pub fn standard_normals<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n + 1);
    while out.len() < n {
        // 1 - u keeps the log argument in (0, 1]
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        out.push(radius * angle.cos());
        out.push(radius * angle.sin());
    }
    out.truncate(n);
    out
}

/// Zero-mean multivariate normal with the given covariance
#[derive(Debug, Clone)]
pub struct MultivariateNormal {
    factor: Array2<f64>,
}

impl MultivariateNormal {
    pub fn new(covariance: &Array2<f64>) -> Result<Self> {
        Ok(Self {
            factor: cholesky_with_jitter(covariance)?,
        })
    }

    /// `n` rows, one sample per row
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Result<Array2<f64>> {
        let d = self.factor.nrows();
        let z = Array2::from_shape_vec((n, d), standard_normals(rng, n * d))?;
        Ok(z.dot(&self.factor.t()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_scaler_roundtrip_and_constant_column() {
        let x = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let scaler = ColumnScaler::fit(&x).unwrap();
        let z = scaler.transform(&x);

        assert!(z.column(0).sum().abs() < 1e-12);
        assert!(z.column(1).iter().all(|&v| v == 0.0));
        let back = scaler.inverse_transform(&z);
        assert!((back - &x).iter().all(|d| d.abs() < 1e-12));
    }

    #[test]
    fn test_covariance_ddof_one() {
        let x = array![[1.0, 2.0], [3.0, 6.0]];
        let cov = covariance(&x).unwrap();
        assert!((cov[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((cov[[1, 1]] - 8.0).abs() < 1e-12);
        assert!((cov[[0, 1]] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_cholesky_known_factor() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky(&a).unwrap();
        assert!((l[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((l[[1, 0]] - 1.0).abs() < 1e-12);
        assert!((l[[1, 1]] - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(l[[0, 1]], 0.0);
    }

    #[test]
    fn test_jitter_rescues_singular_matrix() {
        let a = array![[1.0, 1.0], [1.0, 1.0]];
        assert!(cholesky(&a).is_err());
        assert!(cholesky_with_jitter(&a).is_ok());
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = standard_normals(&mut rng, 20_001);
        assert_eq!(draws.len(), 20_001);

        let n = draws.len() as f64;
        let mean = draws.iter().sum::<f64>() / n;
        let var = draws.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var - 1.0).abs() < 0.05, "var = {var}");
    }

    #[test]
    fn test_sample_recovers_covariance() {
        let cov = array![[1.0, 0.8], [0.8, 1.0]];
        let mvn = MultivariateNormal::new(&cov).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let samples = mvn.sample(&mut rng, 20_000).unwrap();

        let est = covariance(&samples).unwrap();
        assert!((est[[0, 1]] - 0.8).abs() < 0.05);
        assert!((est[[1, 1]] - 1.0).abs() < 0.05);
    }
}
