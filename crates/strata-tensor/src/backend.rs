use std::fmt::Debug;

use crate::dtype::Element;
use crate::error::Result;

/// Where one matrix lives inside a flat buffer.
///
/// Element `(i, j)` is stored at `offset + i * row_stride + j * col_stride`,
/// which covers both contiguous matrices and transposed views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixLayout {
    pub offset: usize,
    pub rows: usize,
    pub cols: usize,
    pub row_stride: usize,
    pub col_stride: usize,
}

impl MatrixLayout {
    /// A row-major matrix starting at offset 0.
    pub fn contiguous(rows: usize, cols: usize) -> Self {
        MatrixLayout {
            offset: 0,
            rows,
            cols,
            row_stride: cols,
            col_stride: 1,
        }
    }

    /// Flat index of element `(i, j)`.
    pub fn index(&self, i: usize, j: usize) -> usize {
        self.offset + i * self.row_stride + j * self.col_stride
    }

    /// Smallest buffer length that holds every element, or 0 for an empty matrix.
    pub fn required_len(&self) -> usize {
        if self.rows == 0 || self.cols == 0 {
            return 0;
        }
        self.index(self.rows - 1, self.cols - 1) + 1
    }
}

/// Trait for pluggable compute backends.
///
/// Operands are passed in as slices and results returned as owned vectors;
/// no backend ever writes into its inputs. Arithmetic happens in `T` itself,
/// so integer overflow and float rounding follow the element type.
pub trait ComputeBackend<T: Element>: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Matrix multiplication of a single matrix pair: C = A @ B.
    ///
    /// - `a`: `[m, k]` matrix described by `a_layout`
    /// - `b`: `[k, n]` matrix described by `b_layout`
    /// - Returns: row-major data of shape `[m, n]`
    fn matmul(&self, a: &[T], a_layout: MatrixLayout, b: &[T], b_layout: MatrixLayout)
        -> Result<Vec<T>>;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[T], b: &[T]) -> Result<Vec<T>>;

    /// Element-wise subtraction: result[i] = a[i] - b[i].
    fn sub(&self, a: &[T], b: &[T]) -> Result<Vec<T>>;

    /// Element-wise (Hadamard) multiplication: result[i] = a[i] * b[i].
    fn mul(&self, a: &[T], b: &[T]) -> Result<Vec<T>>;

    /// result[i] = a[i] + s.
    fn add_scalar(&self, a: &[T], s: T) -> Vec<T>;

    /// result[i] = a[i] - s.
    fn sub_scalar(&self, a: &[T], s: T) -> Vec<T>;

    /// result[i] = s - a[i].
    fn scalar_sub(&self, s: T, a: &[T]) -> Vec<T>;

    /// result[i] = a[i] * s.
    fn scale(&self, a: &[T], s: T) -> Vec<T>;

    /// Logistic function, evaluated in f64: result[i] = 1 / (1 + exp(-x[i])).
    fn sigmoid(&self, x: &[T]) -> Vec<T>;

    /// Natural log with an additive guard, evaluated in f64: ln(x[i] + eps).
    fn log_eps(&self, x: &[T], eps: f64) -> Vec<T>;

    /// Square root, evaluated in f64.
    fn sqrt(&self, x: &[T]) -> Vec<T>;
}
