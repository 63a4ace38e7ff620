//! Elementwise activations and the binary cross-entropy cost.

use crate::backend::ComputeBackend;
use crate::dtype::{Dim, Element};
use crate::error::Result;
use crate::tensor::Tensor;

/// Guard added inside every logarithm so that `ln(0)` stays finite.
pub const LOG_EPSILON: f64 = 1e-12;

/// `1 / (1 + exp(-z))` for every element.
pub fn sigmoid<T: Element, S: Dim>(z: &Tensor<T, S>) -> Result<Tensor<T, S>> {
    z.map_unary(|b, x| b.sigmoid(x))
}

/// `ln(x + LOG_EPSILON)` for every element.
pub fn log<T: Element, S: Dim>(x: &Tensor<T, S>) -> Result<Tensor<T, S>> {
    x.map_unary(|b, x| b.log_eps(x, LOG_EPSILON))
}

pub fn sqrt<T: Element, S: Dim>(x: &Tensor<T, S>) -> Result<Tensor<T, S>> {
    x.map_unary(|b, x| b.sqrt(x))
}

/// 1 where `predicted >= threshold`, 0 elsewhere.
pub fn classify<T: Element, S: Dim>(predicted: &Tensor<T, S>, threshold: T) -> Result<Tensor<T, S>> {
    predicted.map_unary(|_, x| {
        x.iter()
            .map(|&v| if v >= threshold { T::one() } else { T::zero() })
            .collect()
    })
}

/// Mean binary cross-entropy of probabilities against 0/1 targets:
/// `-(1/n) Σ [y ln(p + ε) + (1 - y) ln(1 - p + ε)]`, with `n = dims()[0]`
/// of the targets.
pub fn calculate_cost<T: Element, S: Dim>(
    predictions: &Tensor<T, S>,
    targets: &Tensor<T, S>,
) -> Result<T> {
    let positive = targets.hadamard(&log(predictions)?)?;
    let negative = targets
        .scalar_subtract(T::one())?
        .hadamard(&log(&predictions.scalar_subtract(T::one())?)?)?;
    let total = positive.add(&negative)?.sum();

    let n = targets.dims().first().map_or(0, |d| d.as_usize());
    if n == 0 {
        return Ok(T::zero());
    }
    Ok(T::from_f64(-total.as_f64() / n as f64))
}
