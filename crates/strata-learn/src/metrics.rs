use strata_tensor::{Dim, Element, Tensor};

use crate::error::{ModelError, Result};

/// Outcome counts for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    /// Count outcomes over the data windows of two 0/1 label tensors.
    pub fn generate<T: Element, S: Dim>(
        actual: &Tensor<T, S>,
        predicted: &Tensor<T, S>,
    ) -> Result<Self> {
        let a = actual.data();
        let p = predicted.data();
        if a.len() != p.len() {
            return Err(ModelError::LengthMismatch {
                actual: a.len(),
                predicted: p.len(),
            });
        }

        let (one, zero) = (T::one(), T::zero());
        let mut matrix = ConfusionMatrix::default();
        for (index, (&y, &y_hat)) in a.iter().zip(p.iter()).enumerate() {
            if y == one && y_hat == one {
                matrix.true_positives += 1;
            } else if y == zero && y_hat == one {
                matrix.false_positives += 1;
            } else if y == zero && y_hat == zero {
                matrix.true_negatives += 1;
            } else if y == one && y_hat == zero {
                matrix.false_negatives += 1;
            } else {
                return Err(ModelError::InvalidLabelValue {
                    index,
                    actual: y.as_f64(),
                    predicted: y_hat.as_f64(),
                });
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    /// TP / (TP + FP), or 0 with no positive predictions.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), or 0 with no actual positives.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall, or 0 when both are 0.
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Coefficient of determination, `1 - SSE / SST`.
///
/// Returns 1 when the targets are constant (SST is exactly 0).
pub fn r2_score<T: Element, S: Dim>(predictions: &Tensor<T, S>, targets: &Tensor<T, S>) -> Result<T> {
    let residuals = targets.subtract(predictions)?;
    let sse = residuals.norm().as_f64().powi(2);

    let mean = Tensor::full(targets.shape().clone(), targets.mean())?;
    let sst = targets.subtract(&mean)?.norm().as_f64().powi(2);
    if sst == 0.0 {
        return Ok(T::one());
    }
    Ok(T::from_f64(1.0 - sse / sst))
}

/// `sqrt(mean((predictions - targets)^2))`.
pub fn root_mean_square_error<T: Element, S: Dim>(
    predictions: &Tensor<T, S>,
    targets: &Tensor<T, S>,
) -> Result<T> {
    let diff = predictions.subtract(targets)?;
    let mean_sq = diff.hadamard(&diff)?.mean();
    Ok(T::from_f64(mean_sq.as_f64().sqrt()))
}

/// Fraction of positions where `actual` and `predicted` hold the same value.
/// Empty inputs score 0.
pub fn accuracy<T: Element, S: Dim>(actual: &Tensor<T, S>, predicted: &Tensor<T, S>) -> Result<f64> {
    let a = actual.data();
    let p = predicted.data();
    if a.len() != p.len() {
        return Err(ModelError::LengthMismatch {
            actual: a.len(),
            predicted: p.len(),
        });
    }
    let correct = a.iter().zip(p.iter()).filter(|(x, y)| x == y).count();
    Ok(ratio(correct, a.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn labels(values: &[f64]) -> Tensor<f64> {
        Tensor::from_vec(values.to_vec(), vec![values.len()]).unwrap()
    }

    #[test]
    fn test_all_false_negatives() {
        let cm = ConfusionMatrix::generate(&labels(&[1.0; 4]), &labels(&[0.0; 4])).unwrap();
        assert_eq!(
            cm,
            ConfusionMatrix {
                false_negatives: 4,
                ..Default::default()
            }
        );
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1_score(), 0.0);
    }

    #[test]
    fn test_mixed_outcomes() {
        let actual = labels(&[1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
        let predicted = labels(&[1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0]);
        let cm = ConfusionMatrix::generate(&actual, &predicted).unwrap();
        assert_eq!(cm.true_positives, 4);
        assert_eq!(cm.false_positives, 2);
        assert_eq!(cm.true_negatives, 3);
        assert_eq!(cm.false_negatives, 1);
        assert_eq!(cm.total(), 10);
        assert_abs_diff_eq!(cm.precision(), 0.6667, epsilon = 1e-4);
        assert_abs_diff_eq!(cm.recall(), 0.8, epsilon = 1e-5);
        assert_abs_diff_eq!(cm.f1_score(), 0.7273, epsilon = 1e-4);
    }

    #[test]
    fn test_confusion_matrix_errors() {
        assert_eq!(
            ConfusionMatrix::generate(&labels(&[1.0, 0.0]), &labels(&[1.0])).unwrap_err(),
            ModelError::LengthMismatch {
                actual: 2,
                predicted: 1
            }
        );
        assert_eq!(
            ConfusionMatrix::generate(&labels(&[1.0, 2.0]), &labels(&[1.0, 1.0])).unwrap_err(),
            ModelError::InvalidLabelValue {
                index: 1,
                actual: 2.0,
                predicted: 1.0
            }
        );
    }

    #[test]
    fn test_r2_score() {
        let targets = labels(&[1.0, 2.0, 3.0, 4.0]);
        assert_abs_diff_eq!(r2_score(&targets, &targets).unwrap(), 1.0);

        let at_mean = labels(&[2.5; 4]);
        assert_abs_diff_eq!(r2_score(&at_mean, &targets).unwrap(), 0.0, epsilon = 1e-12);

        let constant = labels(&[3.0; 3]);
        let off = labels(&[1.0, 2.0, 3.0]);
        assert_eq!(r2_score(&off, &constant).unwrap(), 1.0);
    }

    #[test]
    fn test_root_mean_square_error() {
        let rmse = root_mean_square_error(&labels(&[10.0, 20.0, 30.0]), &labels(&[11.0, 18.0, 27.0]))
            .unwrap();
        assert_abs_diff_eq!(rmse, 2.1602, epsilon = 1e-4);
        assert!(root_mean_square_error(&labels(&[1.0]), &labels(&[1.0, 2.0])).is_err());
    }

    #[test]
    fn test_accuracy() {
        let a = labels(&[1.0, 0.0, 1.0, 1.0]);
        let p = labels(&[1.0, 1.0, 1.0, 0.0]);
        assert_abs_diff_eq!(accuracy(&a, &p).unwrap(), 0.5);
        assert_eq!(accuracy(&labels(&[]), &labels(&[])).unwrap(), 0.0);
    }
}
