use log::warn;
use strata_tensor::{Dim, Element, Tensor};

use crate::error::{ModelError, Result};
use crate::{sample_count, to_dim};

/// Standard deviations below this are treated as a constant column.
const MIN_STD: f64 = 1e-9;

/// Per-feature standardization to zero mean and unit variance.
#[derive(Debug, Clone, Default)]
pub struct StandardScaler<T: Element> {
    mu: Vec<T>,
    sigma: Vec<T>,
}

impl<T: Element> StandardScaler<T> {
    pub fn new() -> Self {
        StandardScaler {
            mu: Vec::new(),
            sigma: Vec::new(),
        }
    }

    /// Per-feature means, empty until fitted.
    pub fn mu(&self) -> &[T] {
        &self.mu
    }

    /// Per-feature population standard deviations, empty until fitted.
    pub fn sigma(&self) -> &[T] {
        &self.sigma
    }

    pub fn is_fitted(&self) -> bool {
        !self.mu.is_empty()
    }

    /// Compute the mean and population standard deviation of every column of
    /// a `[samples, features]` tensor, replacing any earlier statistics.
    ///
    /// Variance uses two passes over each column. A standard deviation below
    /// 1e-9 is stored as 1 so constant columns map to zero. Integer columns
    /// use wrapping arithmetic, so a deviation below the mean squares to the
    /// right value as long as the square itself fits in `T`.
    pub fn fit_statistics<S: Dim>(&mut self, features: &Tensor<T, S>) -> Result<()> {
        if features.ndim() != 2 {
            return Err(ModelError::Rank2Required {
                op: "fit_statistics",
                shape: features.shape().to_usize_vec(),
            });
        }
        let rows = features.dims()[0].as_usize();
        let cols = features.dims()[1].as_usize();
        if rows == 0 {
            return Err(ModelError::ZeroSamples);
        }
        let n: T = sample_count(rows)?;

        let mut mu = Vec::with_capacity(cols);
        let mut sigma = Vec::with_capacity(cols);
        for feature in 0..cols {
            let column = features.get_slice(1, to_dim(feature)?)?;
            let mean = column.sum() / n;

            let mut squared = T::zero();
            for row in 0..rows {
                let deviation = column.get(&[to_dim(row)?])?.wrapping_sub(mean);
                squared = squared.wrapping_add(deviation.wrapping_mul(deviation));
            }
            let std = (squared / n).as_f64().sqrt();

            mu.push(mean);
            if std < MIN_STD {
                warn!("feature {} has zero variance, leaving it unscaled", feature);
                sigma.push(T::one());
            } else {
                sigma.push(T::from_f64(std));
            }
        }

        self.mu = mu;
        self.sigma = sigma;
        Ok(())
    }

    /// `(x - mu) / sigma` per column, into a new tensor.
    ///
    /// Fails with `NumericInstability` when a result is NaN or negative
    /// infinity. Positive infinity passes through.
    pub fn transform<S: Dim>(&self, input: &Tensor<T, S>) -> Result<Tensor<T, S>> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }
        if input.ndim() != 2 {
            return Err(ModelError::Rank2Required {
                op: "transform",
                shape: input.shape().to_usize_vec(),
            });
        }
        let rows = input.dims()[0].as_usize();
        let cols = input.dims()[1].as_usize();
        if cols != self.mu.len() {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.mu.len(),
                got: cols,
            });
        }

        let mut out = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for feature in 0..cols {
                let x = input.get(&[to_dim(row)?, to_dim(feature)?])?;
                let z = x.wrapping_sub(self.mu[feature]) / self.sigma[feature];
                let check = z.as_f64();
                if check.is_nan() || check == f64::NEG_INFINITY {
                    return Err(ModelError::NumericInstability { row, feature });
                }
                out.push(z);
            }
        }
        Ok(Tensor::from_vec(out, input.shape().clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use strata_tensor::TensorError;

    fn sample() -> Tensor<f64> {
        Tensor::from_vec(
            vec![10.0, 0.0, 20.0, 10.0, 30.0, 20.0, 40.0, 30.0],
            vec![4, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_statistics() {
        let mut scaler = StandardScaler::new();
        scaler.fit_statistics(&sample()).unwrap();
        assert_abs_diff_eq!(scaler.mu()[0], 25.0, epsilon = 1e-5);
        assert_abs_diff_eq!(scaler.mu()[1], 15.0, epsilon = 1e-5);
        assert_abs_diff_eq!(scaler.sigma()[0], 11.1803398875, epsilon = 1e-5);
        assert_abs_diff_eq!(scaler.sigma()[1], 11.1803398875, epsilon = 1e-5);
    }

    #[test]
    fn test_transform() {
        let mut scaler = StandardScaler::new();
        let data = sample();
        scaler.fit_statistics(&data).unwrap();
        let z = scaler.transform(&data).unwrap();
        assert_eq!(z.dims(), &[4, 2]);
        let expected = [-1.3416, -0.4472, 0.4472, 1.3416];
        for (row, &e) in expected.iter().enumerate() {
            assert_abs_diff_eq!(z.get(&[row, 0]).unwrap(), e, epsilon = 1e-4);
            assert_abs_diff_eq!(z.get(&[row, 1]).unwrap(), e, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_constant_column_is_centred_not_scaled() {
        let data = Tensor::<f64>::from_vec(vec![3.0, 1.0, 3.0, 2.0, 3.0, 3.0], vec![3, 2]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit_statistics(&data).unwrap();
        assert_eq!(scaler.sigma()[0], 1.0);
        let z = scaler.transform(&data).unwrap();
        assert!((0..3).all(|r| z.get(&[r, 0]).unwrap() == 0.0));
    }

    #[test]
    fn test_unsigned_column_below_mean() {
        let data = Tensor::<u32>::from_vec(vec![1, 3, 5, 7], vec![4, 1]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit_statistics(&data).unwrap();
        assert_eq!(scaler.mu(), &[4]);
        // sqrt(5) truncated.
        assert_eq!(scaler.sigma(), &[2]);
        let z = scaler.transform(&data).unwrap();
        assert_eq!(z.get(&[3, 0]).unwrap(), 1);
    }

    #[test]
    fn test_row_count_must_fit_element_type() {
        let data = Tensor::<i8>::zeros(vec![200, 1]).unwrap();
        let mut scaler = StandardScaler::new();
        assert!(matches!(
            scaler.fit_statistics(&data),
            Err(ModelError::Tensor(TensorError::IndexOverflow(200)))
        ));
    }

    #[test]
    fn test_errors() {
        let scaler = StandardScaler::<f64>::new();
        assert_eq!(scaler.transform(&sample()).unwrap_err(), ModelError::NotFitted);

        let mut scaler = StandardScaler::new();
        let flat = Tensor::<f64>::zeros(vec![4]).unwrap();
        assert!(matches!(
            scaler.fit_statistics(&flat),
            Err(ModelError::Rank2Required { .. })
        ));

        scaler.fit_statistics(&sample()).unwrap();
        let wide = Tensor::<f64>::zeros(vec![2, 3]).unwrap();
        assert_eq!(
            scaler.transform(&wide).unwrap_err(),
            ModelError::FeatureCountMismatch {
                expected: 2,
                got: 3
            }
        );
        assert!(matches!(
            scaler.transform(&flat),
            Err(ModelError::Rank2Required { .. })
        ));
    }

    #[test]
    fn test_only_nan_and_negative_infinity_rejected() {
        let mut scaler = StandardScaler::new();
        scaler.fit_statistics(&sample()).unwrap();

        let pos = Tensor::<f64>::from_vec(vec![f64::INFINITY, 0.0], vec![1, 2]).unwrap();
        assert!(scaler.transform(&pos).unwrap().get(&[0, 0]).unwrap().is_infinite());

        let neg = Tensor::<f64>::from_vec(vec![0.0, f64::NEG_INFINITY], vec![1, 2]).unwrap();
        assert_eq!(
            scaler.transform(&neg).unwrap_err(),
            ModelError::NumericInstability { row: 0, feature: 1 }
        );

        let nan = Tensor::<f64>::from_vec(vec![f64::NAN, 0.0], vec![1, 2]).unwrap();
        assert!(matches!(
            scaler.transform(&nan),
            Err(ModelError::NumericInstability { row: 0, feature: 0 })
        ));
    }
}
