//! Random tensor construction for initialization and synthetic data.

use rand::Rng;

use crate::dtype::{Dim, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::tensor::Tensor;

/// Uniform sample in `[-max_val, max_val)`. Returns 0 when `max_val` is 0.
fn symmetric<R: Rng + ?Sized>(rng: &mut R, max_val: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * max_val
}

impl<T: Element, S: Dim> Tensor<T, S> {
    /// Tensor of uniform values in `[-max_val, max_val)`.
    pub fn random<R: Rng + ?Sized>(
        shape: impl Into<Shape<S>>,
        max_val: T,
        rng: &mut R,
    ) -> Result<Self> {
        let mut t = Self::zeros(shape)?;
        let max_val = max_val.as_f64();
        for v in t.data_mut().iter_mut() {
            *v = T::from_f64(symmetric(rng, max_val));
        }
        Ok(t)
    }
}

/// Noisy linear targets for a `[samples, features]` tensor.
///
/// With `weights = [bias, w1, w2]` each row yields
/// `bias + w1 * x[0] + w2 * x[1] + noise`, noise uniform in `[-1, 1)`. The
/// result has shape `[samples, 1]`.
pub fn target_tensor<T: Element, S: Dim, R: Rng + ?Sized>(
    x_base: &Tensor<T, S>,
    weights: &[T],
    rng: &mut R,
) -> Result<Tensor<T, S>> {
    if x_base.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            op: "target_tensor",
            expected: 2,
            got: x_base.shape().to_usize_vec(),
        });
    }
    let rows = x_base.dims()[0];
    if x_base.dims()[1].as_usize() < 2 {
        return Err(TensorError::ShapeMismatch {
            expected: vec![rows.as_usize(), 2],
            got: x_base.shape().to_usize_vec(),
        });
    }
    if weights.len() != 3 {
        return Err(TensorError::ShapeMismatch {
            expected: vec![3],
            got: vec![weights.len()],
        });
    }

    let (bias, w1, w2) = (weights[0].as_f64(), weights[1].as_f64(), weights[2].as_f64());
    let mut targets = Vec::with_capacity(rows.as_usize());
    for r in 0..rows.as_usize() {
        let row = S::from_usize(r).ok_or(TensorError::IndexOverflow(r))?;
        let x1 = x_base.get(&[row, S::zero()])?.as_f64();
        let x2 = x_base.get(&[row, S::one()])?.as_f64();
        let noise = symmetric(rng, 1.0);
        targets.push(T::from_f64(bias + w1 * x1 + w2 * x2 + noise));
    }
    Tensor::from_vec(targets, vec![rows, S::one()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let t = Tensor::<f64, u64>::random(vec![50, 4], 0.5, &mut rng).unwrap();
        assert_eq!(t.dims(), &[50, 4]);
        assert!(t.to_vec().iter().all(|&v| (-0.5..0.5).contains(&v)));
        assert!(t.to_vec().iter().any(|&v| v != 0.0));
    }

    #[test]
    fn test_random_is_seeded() {
        let a = Tensor::<f32>::random(vec![8], 1.0, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = Tensor::<f32>::random(vec![8], 1.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.to_vec(), b.to_vec());
    }

    #[test]
    fn test_target_tensor() {
        let mut rng = StdRng::seed_from_u64(9);
        let x = Tensor::<f64>::from_vec(vec![1.0, 2.0, -1.0, 0.5], vec![2, 2]).unwrap();
        let y = target_tensor(&x, &[10.0, 5.0, -2.0], &mut rng).unwrap();
        assert_eq!(y.dims(), &[2, 1]);
        let y = y.to_vec();
        // 10 + 5 - 4 = 11 and 10 - 5 - 1 = 4, each within unit noise.
        assert!((y[0] - 11.0).abs() <= 1.0);
        assert!((y[1] - 4.0).abs() <= 1.0);
    }

    #[test]
    fn test_target_tensor_rejects() {
        let mut rng = StdRng::seed_from_u64(0);
        let narrow = Tensor::<f64>::zeros(vec![3, 1]).unwrap();
        assert!(matches!(
            target_tensor(&narrow, &[1.0, 1.0, 1.0], &mut rng),
            Err(TensorError::ShapeMismatch { .. })
        ));
        let x = Tensor::<f64>::zeros(vec![3, 2]).unwrap();
        assert!(matches!(
            target_tensor(&x, &[1.0, 1.0], &mut rng),
            Err(TensorError::ShapeMismatch { .. })
        ));
        let flat = Tensor::<f64>::zeros(vec![3]).unwrap();
        assert!(matches!(
            target_tensor(&flat, &[1.0, 1.0, 1.0], &mut rng),
            Err(TensorError::RankMismatch { .. })
        ));
    }
}
