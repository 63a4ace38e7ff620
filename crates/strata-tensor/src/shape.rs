use crate::dtype::Dim;
use crate::error::{Result, TensorError};
use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape<S: Dim = usize> {
    dims: Vec<S>,
}

impl<S: Dim> Shape<S> {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<S>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[S]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().map(|d| d.as_usize()).product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> S {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[S] {
        &self.dims
    }

    /// Dimension sizes widened to `usize`, as carried in error values.
    pub fn to_usize_vec(&self) -> Vec<usize> {
        self.dims.iter().map(|d| d.as_usize()).collect()
    }

    /// Computes row-major contiguous strides for this shape.
    ///
    /// For a shape [d0, d1, d2], the strides are [d1*d2, d2, 1].
    pub fn strides(&self) -> Vec<S> {
        if self.dims.is_empty() {
            return vec![];
        }
        let mut strides = vec![S::zero(); self.dims.len()];
        strides[self.dims.len() - 1] = S::one();
        for i in (0..self.dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Checks if the given strides correspond to a contiguous (row-major) layout
    /// for this shape.
    pub fn is_contiguous(&self, strides: &[S]) -> bool {
        if strides.len() != self.dims.len() {
            return false;
        }
        let expected = self.strides();
        strides == expected.as_slice()
    }

    /// Checks that the element count fits the index type, so that stride and
    /// offset arithmetic in `S` cannot overflow.
    pub fn check_index_range(&self) -> Result<()> {
        let mut total = S::one();
        for &d in &self.dims {
            total = total
                .checked_mul(&d)
                .ok_or_else(|| TensorError::IndexOverflow(self.numel()))?;
        }
        Ok(())
    }
}

impl<S: Dim> fmt::Display for Shape<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl<S: Dim> From<Vec<S>> for Shape<S> {
    fn from(dims: Vec<S>) -> Self {
        Shape::new(dims)
    }
}

impl<S: Dim> From<&[S]> for Shape<S> {
    fn from(dims: &[S]) -> Self {
        Shape::from_slice(dims)
    }
}
