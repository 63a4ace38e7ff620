//! `strata-tensor` - Strided n-dimensional tensors for strata.
//!
//! This crate provides:
//! - A `Tensor` type generic over element and index types, backed by shared CPU storage
//! - Zero-copy views (transpose, slices, row batches) and batched matrix products
//! - A `ComputeBackend` trait for pluggable compute, with a reference `CpuBackend`
//! - Row-wise ops, activations and the cross-entropy cost used by the learners
//! - Random tensor construction for initialization and synthetic data

pub mod activation;
pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod random;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::{ComputeBackend, MatrixLayout};
pub use cpu::CpuBackend;
pub use dtype::{DType, Dim, Element};
pub use error::{Result, TensorError};
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::{Tensor, Tensor64};
