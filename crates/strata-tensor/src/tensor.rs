use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard};

use crate::backend::{ComputeBackend, MatrixLayout};
use crate::cpu::CpuBackend;
use crate::dtype::{DType, Dim, Element};
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A strided n-dimensional tensor backed by CPU storage.
///
/// A tensor is a header (shape, strides and a window into a buffer) over
/// storage that may be shared with other tensors. `transpose`, `get_slice` and
/// `get_batch_slice` return views over the same buffer. Arithmetic always
/// allocates a fresh, contiguous result and never writes into its operands.
///
/// The window (`len()` elements starting at the header's offset) is the
/// tensor's flat data: `valid`, `norm`, `mean` and the elementwise length checks
/// look at the whole window regardless of shape.
#[derive(Debug, Clone)]
pub struct Tensor<T: Element, S: Dim = usize> {
    storage: CpuStorage<T>,
    offset: usize,
    len: usize,
    shape: Shape<S>,
    strides: Vec<S>,
}

/// Double-precision tensor with 64-bit indices.
pub type Tensor64 = Tensor<f64, u64>;

fn dims_of<S: Dim>(dims: &[S]) -> Vec<usize> {
    dims.iter().map(|d| d.as_usize()).collect()
}

impl<T: Element, S: Dim> Tensor<T, S> {
    /// Allocate a zero-filled tensor with row-major strides.
    ///
    /// Fails with `InvalidShape` for an empty shape. A zero-sized dimension is
    /// accepted and yields an empty buffer.
    pub fn zeros(shape: impl Into<Shape<S>>) -> Result<Self> {
        let shape = shape.into();
        Self::check_shape(&shape)?;
        let n = shape.numel();
        Ok(Self::contiguous(CpuStorage::zeros(n), shape))
    }

    /// Allocate a tensor with every element set to `value`.
    pub fn full(shape: impl Into<Shape<S>>, value: T) -> Result<Self> {
        let shape = shape.into();
        Self::check_shape(&shape)?;
        let n = shape.numel();
        Ok(Self::contiguous(CpuStorage::from_vec(vec![value; n]), shape))
    }

    /// Create a tensor from row-major data and a shape.
    pub fn from_vec(data: Vec<T>, shape: impl Into<Shape<S>>) -> Result<Self> {
        let shape = shape.into();
        Self::check_shape(&shape)?;
        if data.len() != shape.numel() {
            return Err(TensorError::DataLength {
                shape: shape.to_usize_vec(),
                expected: shape.numel(),
                got: data.len(),
            });
        }
        Ok(Self::contiguous(CpuStorage::from_vec(data), shape))
    }

    fn check_shape(shape: &Shape<S>) -> Result<()> {
        if shape.ndim() == 0 {
            return Err(TensorError::InvalidShape {
                shape: shape.to_usize_vec(),
            });
        }
        shape.check_index_range()
    }

    fn contiguous(storage: CpuStorage<T>, shape: Shape<S>) -> Self {
        let strides = shape.strides();
        Tensor {
            len: storage.len(),
            storage,
            offset: 0,
            shape,
            strides,
        }
    }

    fn view(&self, offset: usize, len: usize, shape: Shape<S>, strides: Vec<S>) -> Self {
        Tensor {
            storage: self.storage.clone(),
            offset,
            len,
            shape,
            strides,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape<S> {
        &self.shape
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[S] {
        self.shape.dims()
    }

    /// Per-dimension strides, in elements.
    pub fn strides(&self) -> &[S] {
        &self.strides
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Number of elements in the data window.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the data window is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the tensor's element type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the underlying storage handle.
    pub fn storage(&self) -> &CpuStorage<T> {
        &self.storage
    }

    /// True when both tensors are headers over the same buffer.
    pub fn shares_storage_with(&self, other: &Tensor<T, S>) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    /// True when the strides are the row-major strides of the shape.
    pub fn is_contiguous(&self) -> bool {
        self.shape.is_contiguous(&self.strides)
    }

    /// Borrow the data window.
    pub fn data(&self) -> MappedRwLockReadGuard<'_, [T]> {
        self.storage.read(self.offset..self.offset + self.len)
    }

    /// Borrow the data window mutably. Writes are visible through every view
    /// sharing this buffer.
    ///
    /// Takes the buffer's write lock, so it deadlocks if this thread still
    /// holds a [`Tensor::data`] guard from any view of the same buffer.
    pub fn data_mut(&mut self) -> MappedRwLockWriteGuard<'_, [T]> {
        self.storage.write(self.offset..self.offset + self.len)
    }

    /// Copy the data window into a new vector.
    pub fn to_vec(&self) -> Vec<T> {
        self.data().to_vec()
    }

    /// Copy the elements into a new row-major buffer that shares nothing with
    /// `self`. Views are materialized in coordinate order.
    pub fn deep_clone(&self) -> Result<Self> {
        let shape = self.shape.clone();
        let n = shape.numel();
        let src = self.data();
        let mut out = Vec::with_capacity(n);
        let mut coord = vec![0usize; self.ndim()];
        for _ in 0..n {
            let idx: usize = coord
                .iter()
                .zip(&self.strides)
                .map(|(&c, s)| c * s.as_usize())
                .sum();
            out.push(*src.get(idx).ok_or(TensorError::OutOfBounds {
                axis: 0,
                index: idx,
                size: self.len,
            })?);
            for axis in (0..coord.len()).rev() {
                coord[axis] += 1;
                if coord[axis] < shape.dim(axis).as_usize() {
                    break;
                }
                coord[axis] = 0;
            }
        }
        drop(src);
        Ok(Self::contiguous(CpuStorage::from_vec(out), shape))
    }

    /// The first `numel` elements of the window, which elementwise operations
    /// read and write.
    fn leading(&self) -> Result<MappedRwLockReadGuard<'_, [T]>> {
        let n = self.shape.numel();
        if self.len < n {
            return Err(TensorError::DataLength {
                shape: self.shape.to_usize_vec(),
                expected: n,
                got: self.len,
            });
        }
        Ok(self.storage.read(self.offset..self.offset + n))
    }

    /// Replace the buffer wholesale with `data`, keeping shape and strides.
    /// Views taken before the call keep the old buffer.
    pub(crate) fn replace_data(&mut self, data: Vec<T>) {
        self.len = data.len();
        self.offset = 0;
        self.storage = CpuStorage::from_vec(data);
    }

    /// Flat offset of `coord` within the data window: Σ coord[i] * strides[i].
    pub fn linear_index(&self, coord: &[S]) -> Result<S> {
        if coord.len() != self.ndim() {
            return Err(TensorError::DimensionMismatch {
                coord: dims_of(coord),
                shape: self.shape.to_usize_vec(),
            });
        }
        let mut offset = S::zero();
        for (axis, (&c, &size)) in coord.iter().zip(self.shape.dims()).enumerate() {
            if c >= size {
                return Err(TensorError::OutOfBounds {
                    axis,
                    index: c.as_usize(),
                    size: size.as_usize(),
                });
            }
            offset = offset + c * self.strides[axis];
        }
        Ok(offset)
    }

    fn window_index(&self, coord: &[S]) -> Result<usize> {
        let idx = self.linear_index(coord)?.as_usize();
        if idx >= self.len {
            return Err(TensorError::OutOfBounds {
                axis: 0,
                index: idx,
                size: self.len,
            });
        }
        Ok(idx)
    }

    /// Read the element at `coord`.
    pub fn get(&self, coord: &[S]) -> Result<T> {
        let idx = self.window_index(coord)?;
        Ok(self.data()[idx])
    }

    /// Write `value` at `coord`.
    ///
    /// Like [`Tensor::data_mut`], this must not run while the calling thread
    /// holds a [`Tensor::data`] guard on a view of the same buffer.
    pub fn set(&mut self, coord: &[S], value: T) -> Result<()> {
        let idx = self.window_index(coord)?;
        self.data_mut()[idx] = value;
        Ok(())
    }

    /// Permute dimensions without copying data.
    ///
    /// With no axes the dimension order is reversed. Otherwise `axes` must have
    /// one entry per dimension and each entry must name an existing axis.
    /// Repeated axes are not rejected.
    pub fn transpose(&self, axes: &[usize]) -> Result<Self> {
        let ndim = self.ndim();
        let reversed: Vec<usize>;
        let axes = if axes.is_empty() {
            reversed = (0..ndim).rev().collect();
            &reversed[..]
        } else {
            axes
        };

        if axes.len() != ndim {
            return Err(TensorError::AxesMismatch {
                axes: axes.len(),
                ndim,
            });
        }
        if let Some(&axis) = axes.iter().find(|&&a| a >= ndim) {
            return Err(TensorError::InvalidAxis { axis, ndim });
        }

        let dims: Vec<S> = axes.iter().map(|&a| self.shape.dim(a)).collect();
        let strides: Vec<S> = axes.iter().map(|&a| self.strides[a]).collect();
        Ok(self.view(self.offset, self.len, Shape::new(dims), strides))
    }

    /// Batched matrix product on the CPU backend. See [`Tensor::matmul_with`].
    pub fn dot(&self, other: &Tensor<T, S>) -> Result<Self> {
        self.matmul_with(other, &CpuBackend)
    }

    /// Batched matrix product using the given backend.
    ///
    /// The last two dimensions of each operand are the matrix dimensions
    /// (`[M, K]` and `[K, N]`); every leading dimension is a batch dimension and
    /// must match exactly. The result has shape `batch ++ [M, N]`. Batches are
    /// visited in row-major order of the batch dimensions.
    pub fn matmul_with(
        &self,
        other: &Tensor<T, S>,
        backend: &dyn ComputeBackend<T>,
    ) -> Result<Self> {
        let rank_a = self.ndim();
        let rank_b = other.ndim();
        if rank_a < 2 || rank_b < 2 {
            return Err(TensorError::RankTooLow {
                lhs: self.shape.to_usize_vec(),
                rhs: other.shape.to_usize_vec(),
            });
        }

        let batch_rank = rank_a - 2;
        if batch_rank != rank_b - 2 {
            return Err(TensorError::BatchMismatch {
                lhs: batch_rank,
                rhs: rank_b - 2,
            });
        }
        let batch_dims = &self.dims()[..batch_rank];
        if batch_dims != &other.dims()[..batch_rank] {
            return Err(TensorError::BatchShapeMismatch {
                lhs: dims_of(batch_dims),
                rhs: dims_of(&other.dims()[..batch_rank]),
            });
        }

        let m = self.shape.dim(batch_rank).as_usize();
        let k = self.shape.dim(batch_rank + 1).as_usize();
        let k2 = other.shape.dim(batch_rank).as_usize();
        let n = other.shape.dim(batch_rank + 1).as_usize();
        if k != k2 {
            return Err(TensorError::InnerDimMismatch { m, k, k2, n });
        }

        let mut out_dims = batch_dims.to_vec();
        out_dims.push(self.shape.dim(batch_rank));
        out_dims.push(other.shape.dim(batch_rank + 1));
        let out_shape = Shape::new(out_dims);
        Self::check_shape(&out_shape)?;

        let batch_count: usize = batch_dims.iter().map(|d| d.as_usize()).product();
        let a = self.data();
        let b = other.data();
        let mut out = Vec::with_capacity(out_shape.numel());

        for batch_idx in 0..batch_count {
            let a_layout = MatrixLayout {
                offset: self.batch_offset(batch_idx, batch_rank),
                rows: m,
                cols: k,
                row_stride: self.strides[batch_rank].as_usize(),
                col_stride: self.strides[batch_rank + 1].as_usize(),
            };
            let b_layout = MatrixLayout {
                offset: other.batch_offset(batch_idx, batch_rank),
                rows: k2,
                cols: n,
                row_stride: other.strides[batch_rank].as_usize(),
                col_stride: other.strides[batch_rank + 1].as_usize(),
            };
            out.extend(backend.matmul(&a, a_layout, &b, b_layout)?);
        }

        Ok(Self::contiguous(CpuStorage::from_vec(out), out_shape))
    }

    /// Window offset of the first element of batch `batch_idx`, unravelling the
    /// flat batch index over the leading `batch_rank` dimensions.
    fn batch_offset(&self, mut batch_idx: usize, batch_rank: usize) -> usize {
        let mut offset = 0;
        for axis in (0..batch_rank).rev() {
            let size = self.shape.dim(axis).as_usize();
            offset += (batch_idx % size) * self.strides[axis].as_usize();
            batch_idx /= size;
        }
        offset
    }

    fn check_same_shape(&self, other: &Tensor<T, S>) -> Result<()> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch {
                expected: self.shape.to_usize_vec(),
                got: other.shape.to_usize_vec(),
            });
        }
        if self.len != other.len {
            return Err(TensorError::ShapeMismatch {
                expected: vec![self.len],
                got: vec![other.len],
            });
        }
        Ok(())
    }

    fn zip_with(
        &self,
        other: &Tensor<T, S>,
        op: impl FnOnce(&CpuBackend, &[T], &[T]) -> Result<Vec<T>>,
    ) -> Result<Self> {
        self.check_same_shape(other)?;
        let lhs = self.leading()?;
        let rhs = other.leading()?;
        let data = op(&CpuBackend, &lhs, &rhs)?;
        Ok(Self::contiguous(
            CpuStorage::from_vec(data),
            self.shape.clone(),
        ))
    }

    fn map_with(&self, op: impl FnOnce(&CpuBackend, &[T]) -> Vec<T>) -> Result<Self> {
        let src = self.leading()?;
        let data = op(&CpuBackend, &src);
        Ok(Self::contiguous(
            CpuStorage::from_vec(data),
            self.shape.clone(),
        ))
    }

    /// Elementwise sum. Shapes and data lengths must match.
    pub fn add(&self, other: &Tensor<T, S>) -> Result<Self> {
        self.zip_with(other, |b, x, y| b.add(x, y))
    }

    /// Elementwise difference. Shapes and data lengths must match.
    pub fn subtract(&self, other: &Tensor<T, S>) -> Result<Self> {
        self.zip_with(other, |b, x, y| b.sub(x, y))
    }

    /// Elementwise product. Shapes and data lengths must match.
    pub fn hadamard(&self, other: &Tensor<T, S>) -> Result<Self> {
        self.zip_with(other, |b, x, y| b.mul(x, y))
    }

    pub fn add_scalar(&self, scalar: T) -> Result<Self> {
        self.map_with(|b, x| b.add_scalar(x, scalar))
    }

    pub fn subtract_scalar(&self, scalar: T) -> Result<Self> {
        self.map_with(|b, x| b.sub_scalar(x, scalar))
    }

    /// `scalar - x` for every element.
    pub fn scalar_subtract(&self, scalar: T) -> Result<Self> {
        self.map_with(|b, x| b.scalar_sub(scalar, x))
    }

    pub fn mul_scalar(&self, scalar: T) -> Result<Self> {
        self.map_with(|b, x| b.scale(x, scalar))
    }

    /// Apply a float-evaluated unary kernel to every element.
    pub(crate) fn map_unary(&self, op: impl FnOnce(&CpuBackend, &[T]) -> Vec<T>) -> Result<Self> {
        self.map_with(op)
    }

    /// False if any element, read as a float, is NaN or infinite.
    pub fn valid(&self) -> bool {
        self.data().iter().all(|v| v.is_finite_value())
    }

    /// Prepend a column of ones to a `[samples, features]` tensor.
    pub fn augment_bias(&self) -> Result<Self> {
        if self.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                op: "augment_bias",
                expected: 2,
                got: self.shape.to_usize_vec(),
            });
        }
        let rows = self.shape.dim(0).as_usize();
        let cols = self.shape.dim(1).as_usize();
        let row_stride = self.strides[0].as_usize();
        let col_stride = self.strides[1].as_usize();

        let out_cols = self.shape.dim(1) + S::one();
        let out_shape = Shape::new(vec![self.shape.dim(0), out_cols]);
        Self::check_shape(&out_shape)?;

        let src = self.data();
        let mut out = Vec::with_capacity(rows * (cols + 1));
        for r in 0..rows {
            out.push(T::one());
            for c in 0..cols {
                out.push(src[r * row_stride + c * col_stride]);
            }
        }
        Ok(Self::contiguous(CpuStorage::from_vec(out), out_shape))
    }

    /// Euclidean norm of the data window, computed in f64.
    pub fn norm(&self) -> T {
        let data = self.data();
        if data.is_empty() {
            return T::zero();
        }
        let sum_sq: f64 = data.iter().map(|v| v.as_f64() * v.as_f64()).sum();
        T::from_f64(sum_sq.sqrt())
    }

    /// Arithmetic mean of the data window, computed in f64.
    pub fn mean(&self) -> T {
        let data = self.data();
        if data.is_empty() {
            return T::zero();
        }
        let sum: f64 = data.iter().map(|v| v.as_f64()).sum();
        T::from_f64(sum / data.len() as f64)
    }

    /// Sum along the leading dimension only.
    ///
    /// Visits `dims()[0]` elements spaced `strides()[0]` apart from the start
    /// of the window. For a `[n]` or `[n, 1]` tensor this is the total; for
    /// wider tensors it is the sum of the first column. A rank-0 view sums to
    /// its single element.
    pub fn sum(&self) -> T {
        let data = self.data();
        if data.is_empty() {
            return T::zero();
        }
        if self.ndim() == 0 {
            return data[0];
        }
        let count = self.shape.dim(0).as_usize();
        let stride = self.strides[0].as_usize();
        (0..count)
            .filter_map(|i| data.get(i * stride).copied())
            .fold(T::zero(), |acc, v| acc.wrapping_add(v))
    }

    /// View with `axis` fixed at `index` and removed from the shape.
    ///
    /// The view's window starts at the selected element and runs to the end of
    /// this tensor's window.
    pub fn get_slice(&self, axis: usize, index: S) -> Result<Self> {
        let ndim = self.ndim();
        if axis >= ndim {
            return Err(TensorError::InvalidAxis { axis, ndim });
        }
        let size = self.shape.dim(axis);
        if index >= size {
            return Err(TensorError::OutOfBounds {
                axis,
                index: index.as_usize(),
                size: size.as_usize(),
            });
        }

        let start = (index * self.strides[axis]).as_usize().min(self.len);
        let dims: Vec<S> = (0..ndim)
            .filter(|&i| i != axis)
            .map(|i| self.shape.dim(i))
            .collect();
        let strides: Vec<S> = (0..ndim)
            .filter(|&i| i != axis)
            .map(|i| self.strides[i])
            .collect();
        Ok(self.view(self.offset + start, self.len - start, Shape::new(dims), strides))
    }

    /// View over rows `[start_row, start_row + count)` of a rank-2 tensor.
    pub fn get_batch_slice(&self, start_row: S, count: S) -> Result<Self> {
        if self.ndim() != 2 {
            return Err(TensorError::RankMismatch {
                op: "get_batch_slice",
                expected: 2,
                got: self.shape.to_usize_vec(),
            });
        }
        let rows = self.shape.dim(0).as_usize();
        let start = start_row.as_usize();
        let count_usize = count.as_usize();
        let out_of_bounds = TensorError::RowRangeOutOfBounds {
            start,
            count: count_usize,
            rows,
        };
        if start >= rows || start + count_usize > rows {
            return Err(out_of_bounds);
        }

        let row_stride = self.strides[0].as_usize();
        let begin = start * row_stride;
        let end = begin + count_usize * row_stride;
        if end > self.len {
            return Err(out_of_bounds);
        }

        Ok(self.view(
            self.offset + begin,
            end - begin,
            Shape::new(vec![count, self.shape.dim(1)]),
            self.strides.clone(),
        ))
    }
}
