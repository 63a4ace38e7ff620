//! `strata-learn` - Small learners built on `strata-tensor`.
//!
//! Linear regression with momentum and gradient clipping, mini-batch logistic
//! regression with feature standardization, k-nearest-neighbours
//! classification and binary classification metrics.

pub mod config;
pub mod error;
pub mod estimator;
pub mod knn;
pub mod linear;
pub mod logistic;
pub mod metrics;
pub mod scaler;

pub use config::{LinearRegressionConfig, LogisticRegressionConfig};
pub use error::{ModelError, Result};
pub use estimator::Estimator;
pub use knn::{majority_vote, Knn, Neighbor};
pub use linear::LinearRegression;
pub use logistic::LogisticRegression;
pub use metrics::{accuracy, r2_score, root_mean_square_error, ConfusionMatrix};
pub use scaler::StandardScaler;

use strata_tensor::{Dim, Element, TensorError};

/// Convert a row or column number into the tensor index type.
pub(crate) fn to_dim<S: Dim>(i: usize) -> Result<S> {
    S::from_usize(i).ok_or_else(|| TensorError::IndexOverflow(i).into())
}

/// A sample count as an element value to divide by. Counts the element type
/// cannot hold (over 127 rows for `i8`) are an error rather than a zero divisor.
pub(crate) fn sample_count<T: Element>(n: usize) -> Result<T> {
    let count = T::from_f64(n as f64);
    if count == T::zero() {
        return Err(TensorError::IndexOverflow(n).into());
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use strata_tensor::random::target_tensor;
    use strata_tensor::Tensor;

    fn fit_and_score<E: Estimator<f64, usize>>(
        model: &mut E,
        x: &Tensor<f64>,
        y: &Tensor<f64>,
    ) -> Result<Tensor<f64>> {
        model.fit(x, y)?;
        model.predict(x)
    }

    #[test]
    fn test_estimators_share_a_seam() {
        let mut rng = StdRng::seed_from_u64(3);
        let x = Tensor::<f64>::random(vec![40, 2], 1.0, &mut rng).unwrap();
        let y = target_tensor(&x, &[1.0, 2.0, -1.0], &mut rng).unwrap();

        let config = LinearRegressionConfig {
            max_iterations: 5,
            ..Default::default()
        };
        let mut linear = LinearRegression::with_seed(3, config, 0).unwrap();
        let x_aug = x.augment_bias().unwrap();
        Estimator::fit(&mut linear, &x_aug, &y).unwrap();
        assert_eq!(Estimator::predict(&linear, &x).unwrap().dims(), &[40, 1]);
        assert_eq!(Estimator::name(&linear), "linear_regression");

        let config = LogisticRegressionConfig {
            num_iterations: 2,
            ..Default::default()
        };
        let mut logistic = LogisticRegression::with_seed(2, config, 0).unwrap();
        let labels = strata_tensor::activation::classify(&y, 1.0).unwrap();
        let p = fit_and_score(&mut logistic, &x, &labels).unwrap();
        assert_eq!(p.dims(), &[40, 1]);
        assert_eq!(Estimator::name(&logistic), "logistic_regression");
    }

    #[test]
    fn test_to_dim_overflow() {
        assert_eq!(to_dim::<u8>(255).unwrap(), 255);
        assert_eq!(
            to_dim::<u8>(256).unwrap_err(),
            ModelError::Tensor(TensorError::IndexOverflow(256))
        );
    }
}
