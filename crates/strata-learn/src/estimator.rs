use strata_tensor::{Dim, Element, Tensor};

/// A model that learns from `[samples, features]` inputs and a target column.
///
/// Implementations own their parameters and random source. `fit` may be
/// called repeatedly; each call resumes from the current parameters.
pub trait Estimator<T: Element, S: Dim>: Send + Sync {
    /// Short model name used in log lines.
    fn name(&self) -> &str;

    /// Train on `features` against `targets`.
    ///
    /// On error the parameters are left as they were when the failing step
    /// ran; nothing is rolled back.
    fn fit(&mut self, features: &Tensor<T, S>, targets: &Tensor<T, S>) -> crate::Result<()>;

    /// Produce one output row per input row.
    fn predict(&self, features: &Tensor<T, S>) -> crate::Result<Tensor<T, S>>;
}
