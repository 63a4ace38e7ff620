use strata_tensor::TensorError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
    #[error("{op} requires a rank 2 [samples, features] tensor, got shape {shape:?}")]
    Rank2Required { op: &'static str, shape: Vec<usize> },
    #[error("scaler has not been fitted")]
    NotFitted,
    #[error("expected {expected} features, got {got}")]
    FeatureCountMismatch { expected: usize, got: usize },
    #[error("non-finite value after scaling at row {row}, feature {feature}")]
    NumericInstability { row: usize, feature: usize },
    #[error("weights diverged at iteration {iteration}")]
    NumericDivergence { iteration: usize },
    #[error("input has {got} columns after bias augmentation, weights have {expected} rows")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("cannot fit on zero samples")]
    ZeroSamples,
    #[error("training data has {samples} samples but {labels} labels")]
    LabelCountMismatch { samples: usize, labels: usize },
    #[error("no neighbours to vote on")]
    EmptyNeighborSet,
    #[error("actual has {actual} values, predicted has {predicted}")]
    LengthMismatch { actual: usize, predicted: usize },
    #[error("label pair ({actual}, {predicted}) at index {index} is not binary")]
    InvalidLabelValue {
        index: usize,
        actual: f64,
        predicted: f64,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
