// Strided matmul kernel used by CpuBackend::matmul.

use crate::backend::MatrixLayout;
use crate::dtype::Element;
use crate::error::{Result, TensorError};

/// Plain triple loop over (i, j, k) reading both operands through their
/// layouts. The accumulator has the element type, matching the precision of
/// `T`. Integer products and sums wrap on overflow.
pub(crate) fn strided_matmul<T: Element>(
    a: &[T],
    a_layout: MatrixLayout,
    b: &[T],
    b_layout: MatrixLayout,
) -> Result<Vec<T>> {
    let m = a_layout.rows;
    let k = a_layout.cols;
    let k2 = b_layout.rows;
    let n = b_layout.cols;

    if k != k2 {
        return Err(TensorError::InnerDimMismatch { m, k, k2, n });
    }
    if a.len() < a_layout.required_len() {
        return Err(TensorError::DataLength {
            shape: vec![m, k],
            expected: a_layout.required_len(),
            got: a.len(),
        });
    }
    if b.len() < b_layout.required_len() {
        return Err(TensorError::DataLength {
            shape: vec![k2, n],
            expected: b_layout.required_len(),
            got: b.len(),
        });
    }

    let mut c = vec![T::zero(); m * n];
    for i in 0..m {
        for j in 0..n {
            let mut sum = T::zero();
            for p in 0..k {
                sum = sum.wrapping_add(a[a_layout.index(i, p)].wrapping_mul(b[b_layout.index(p, j)]));
            }
            c[i * n + j] = sum;
        }
    }
    Ok(c)
}
