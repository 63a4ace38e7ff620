pub mod matmul;
pub mod unary;

use crate::backend::{ComputeBackend, MatrixLayout};
use crate::dtype::Element;
use crate::error::{Result, TensorError};

/// Pure-Rust CPU compute backend.
///
/// Implements all operations with straightforward loops optimized for
/// correctness rather than peak performance. Intended as a reference
/// implementation and the default for every tensor operation.
#[derive(Debug, Clone, Copy)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_same_len<T>(a: &[T], b: &[T]) -> Result<()> {
    if a.len() != b.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![a.len()],
            got: vec![b.len()],
        });
    }
    Ok(())
}

impl<T: Element> ComputeBackend<T> for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(
        &self,
        a: &[T],
        a_layout: MatrixLayout,
        b: &[T],
        b_layout: MatrixLayout,
    ) -> Result<Vec<T>> {
        matmul::strided_matmul(a, a_layout, b, b_layout)
    }

    fn add(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        check_same_len(a, b)?;
        Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x.wrapping_add(y)).collect())
    }

    fn sub(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        check_same_len(a, b)?;
        Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x.wrapping_sub(y)).collect())
    }

    fn mul(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        check_same_len(a, b)?;
        Ok(a.iter().zip(b.iter()).map(|(&x, &y)| x.wrapping_mul(y)).collect())
    }

    fn add_scalar(&self, a: &[T], s: T) -> Vec<T> {
        a.iter().map(|&x| x.wrapping_add(s)).collect()
    }

    fn sub_scalar(&self, a: &[T], s: T) -> Vec<T> {
        a.iter().map(|&x| x.wrapping_sub(s)).collect()
    }

    fn scalar_sub(&self, s: T, a: &[T]) -> Vec<T> {
        a.iter().map(|&x| s.wrapping_sub(x)).collect()
    }

    fn scale(&self, a: &[T], s: T) -> Vec<T> {
        a.iter().map(|&x| x.wrapping_mul(s)).collect()
    }

    fn sigmoid(&self, x: &[T]) -> Vec<T> {
        unary::map_f64(x, unary::sigmoid)
    }

    fn log_eps(&self, x: &[T], eps: f64) -> Vec<T> {
        unary::map_f64(x, |v| (v + eps).ln())
    }

    fn sqrt(&self, x: &[T]) -> Vec<T> {
        unary::map_f64(x, f64::sqrt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> CpuBackend {
        CpuBackend::new()
    }

    #[test]
    fn test_matmul_basic() {
        let b = backend();
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let l = MatrixLayout::contiguous(2, 2);
        let c = b.matmul(&[1.0, 2.0, 3.0, 4.0], l, &[5.0, 6.0, 7.0, 8.0], l).unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_add_sub_mul() {
        let b = backend();
        assert_eq!(b.add(&[1, 2], &[3, 4]).unwrap(), vec![4, 6]);
        assert_eq!(b.sub(&[5, 2], &[3, 4]).unwrap(), vec![2, -2]);
        assert_eq!(b.mul(&[2.0, 3.0], &[4.0, 5.0]).unwrap(), vec![8.0, 15.0]);
    }

    #[test]
    fn test_integer_kernels_wrap() {
        let b = backend();
        assert_eq!(b.add(&[250u8], &[10]).unwrap(), vec![4]);
        assert_eq!(b.sub(&[1u8], &[2]).unwrap(), vec![255]);
        assert_eq!(b.mul(&[i8::MAX], &[2]).unwrap(), vec![-2]);
        assert_eq!(b.add_scalar(&[i16::MAX], 1), vec![i16::MIN]);
        assert_eq!(b.sub_scalar(&[0u32], 1), vec![u32::MAX]);
        assert_eq!(b.scalar_sub(0u64, &[1]), vec![u64::MAX]);
        assert_eq!(b.scale(&[200u8], 2), vec![144]);
    }

    #[test]
    fn test_scalar_ops() {
        let b = backend();
        assert_eq!(b.scale(&[1.0, 2.0, 3.0], 2.0), vec![2.0, 4.0, 6.0]);
        assert_eq!(b.add_scalar(&[1u8, 2], 3), vec![4, 5]);
        assert_eq!(b.sub_scalar(&[5i16, 2], 3), vec![2, -1]);
        assert_eq!(b.scalar_sub(1.0, &[0.25, 1.0]), vec![0.75, 0.0]);
    }

    #[test]
    fn test_sigmoid() {
        let b = backend();
        let r = b.sigmoid(&[0.0f64, 1.0]);
        assert!((r[0] - 0.5).abs() < 1e-12);
        assert!((r[1] - 0.7310586).abs() < 1e-6);
    }

    #[test]
    fn test_log_eps_guards_zero() {
        let b = backend();
        let r = b.log_eps(&[0.0f64, 1.0], 1e-12);
        assert!((r[0] - (1e-12f64).ln()).abs() < 1e-9);
        assert!(r[0].is_finite());
        assert!(r[1].abs() < 1e-9);
    }

    #[test]
    fn test_sqrt() {
        let b = backend();
        assert_eq!(b.sqrt(&[4.0f32, 9.0]), vec![2.0, 3.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let b = backend();
        assert!(b.add(&[1.0], &[1.0, 2.0]).is_err());
        assert!(b.mul(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_name() {
        assert_eq!(ComputeBackend::<f32>::name(&backend()), "cpu");
    }
}
