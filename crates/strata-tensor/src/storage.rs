use std::ops::Range;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::dtype::{DType, Element};

/// CPU-side tensor storage.
///
/// A reference-counted flat buffer. Cloning the storage clones the handle, not
/// the data: a tensor and every view derived from it (transpose, slices, batch
/// slices) hold handles to the same buffer, so a write through one is visible
/// through all of them.
#[derive(Debug, Clone)]
pub struct CpuStorage<T> {
    buffer: Arc<RwLock<Vec<T>>>,
}

impl<T: Element> CpuStorage<T> {
    /// Create zero-filled storage with `n` elements.
    pub fn zeros(n: usize) -> Self {
        Self::from_vec(vec![T::zero(); n])
    }

    /// Take ownership of `data` as a new, unshared buffer.
    pub fn from_vec(data: Vec<T>) -> Self {
        CpuStorage {
            buffer: Arc::new(RwLock::new(data)),
        }
    }

    /// Number of elements in the whole buffer.
    pub fn len(&self) -> usize {
        self.buffer.read_recursive().len()
    }

    /// Returns true if the buffer contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow `range` of the buffer for reading.
    ///
    /// # Panics
    /// Panics if `range` is out of bounds for the buffer.
    pub fn read(&self, range: Range<usize>) -> MappedRwLockReadGuard<'_, [T]> {
        RwLockReadGuard::map(self.buffer.read_recursive(), move |v| &v[range])
    }

    /// Borrow `range` of the buffer for writing.
    ///
    /// Must not be called while a read guard on the same buffer is alive.
    ///
    /// # Panics
    /// Panics if `range` is out of bounds for the buffer.
    pub fn write(&self, range: Range<usize>) -> MappedRwLockWriteGuard<'_, [T]> {
        RwLockWriteGuard::map(self.buffer.write(), move |v| &mut v[range])
    }

    /// Returns true if both handles point at the same buffer.
    pub fn ptr_eq(&self, other: &CpuStorage<T>) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }
}
