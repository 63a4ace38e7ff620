//! Row- and column-wise operations on `[samples, features]` tensors.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::activation;
use crate::dtype::{Dim, Element};
use crate::error::{Result, TensorError};
use crate::tensor::Tensor;

fn require_rank2<T: Element, S: Dim>(op: &'static str, t: &Tensor<T, S>) -> Result<(usize, usize)> {
    if t.ndim() != 2 {
        return Err(TensorError::RankMismatch {
            op,
            expected: 2,
            got: t.shape().to_usize_vec(),
        });
    }
    Ok((t.dims()[0].as_usize(), t.dims()[1].as_usize()))
}

/// Sum a rank-2 tensor along `axis`. Only `axis == 1` (one total per row) is
/// supported; the result has shape `[rows]`.
pub fn reduce_sum<T: Element, S: Dim>(tensor: &Tensor<T, S>, axis: usize) -> Result<Tensor<T, S>> {
    let (rows, cols) = require_rank2("reduce_sum", tensor)?;
    if axis != 1 {
        return Err(TensorError::UnsupportedReduction {
            axis,
            ndim: tensor.ndim(),
        });
    }

    let row_stride = tensor.strides()[0].as_usize();
    let col_stride = tensor.strides()[1].as_usize();
    let data = tensor.data();
    let sums = (0..rows)
        .map(|r| {
            (0..cols).fold(T::zero(), |acc, c| {
                acc.wrapping_add(data[r * row_stride + c * col_stride])
            })
        })
        .collect();
    Tensor::from_vec(sums, vec![tensor.dims()[0]])
}

/// `training[row] - query[0]` for every training row.
///
/// `query` must be `[1, features]` and `training` `[rows, features]`; the
/// result has the training shape.
pub fn broadcast_subtract<T: Element, S: Dim>(
    query: &Tensor<T, S>,
    training: &Tensor<T, S>,
) -> Result<Tensor<T, S>> {
    let (query_rows, query_cols) = require_rank2("broadcast_subtract", query)?;
    let (rows, cols) = require_rank2("broadcast_subtract", training)?;
    if query_rows != 1 {
        return Err(TensorError::QueryShape {
            shape: query.shape().to_usize_vec(),
        });
    }
    if query_cols != cols {
        return Err(TensorError::FeatureMismatch {
            query: query_cols,
            training: cols,
        });
    }

    let q_stride = query.strides()[1].as_usize();
    let (row_stride, col_stride) = (
        training.strides()[0].as_usize(),
        training.strides()[1].as_usize(),
    );
    let q = query.data();
    let t = training.data();
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            out.push(t[r * row_stride + c * col_stride].wrapping_sub(q[c * q_stride]));
        }
    }
    Tensor::from_vec(out, training.shape().clone())
}

/// Distance from a `[1, features]` query to every row of `training`, as a
/// `[rows]` tensor.
pub fn euclidean_distances<T: Element, S: Dim>(
    query: &Tensor<T, S>,
    training: &Tensor<T, S>,
) -> Result<Tensor<T, S>> {
    let diff = broadcast_subtract(query, training)?;
    let squared = diff.hadamard(&diff)?;
    activation::sqrt(&reduce_sum(&squared, 1)?)
}

/// Reorder the rows of `features` and `labels` with one random permutation.
///
/// Both tensors get freshly allocated buffers; views taken before the call
/// still see the old order.
pub fn shuffle_tensors<T: Element, S: Dim, R: Rng + ?Sized>(
    features: &mut Tensor<T, S>,
    labels: &mut Tensor<T, S>,
    rng: &mut R,
) -> Result<()> {
    let rows = leading_rows("shuffle_tensors", features)?;
    let label_rows = leading_rows("shuffle_tensors", labels)?;
    if rows != label_rows {
        return Err(TensorError::RowCountMismatch {
            features: rows,
            labels: label_rows,
        });
    }

    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(rng);

    let shuffled_features = permute_rows(features, &order)?;
    let shuffled_labels = permute_rows(labels, &order)?;
    features.replace_data(shuffled_features);
    labels.replace_data(shuffled_labels);
    Ok(())
}

fn leading_rows<T: Element, S: Dim>(op: &'static str, t: &Tensor<T, S>) -> Result<usize> {
    match t.dims().first() {
        Some(rows) => Ok(rows.as_usize()),
        None => Err(TensorError::RankMismatch {
            op,
            expected: 1,
            got: Vec::new(),
        }),
    }
}

/// Copy the window with row `i` of the result taken from row `order[i]`.
/// Elements past the last row are carried over unchanged.
fn permute_rows<T: Element, S: Dim>(t: &Tensor<T, S>, order: &[usize]) -> Result<Vec<T>> {
    let row_len = t.strides()[0].as_usize();
    let src = t.data();
    if order.len() * row_len > src.len() {
        return Err(TensorError::DataLength {
            shape: t.shape().to_usize_vec(),
            expected: order.len() * row_len,
            got: src.len(),
        });
    }
    let mut out = src.to_vec();
    for (dst_row, &src_row) in order.iter().enumerate() {
        let from = src_row * row_len;
        out[dst_row * row_len..(dst_row + 1) * row_len]
            .copy_from_slice(&src[from..from + row_len]);
    }
    Ok(out)
}
