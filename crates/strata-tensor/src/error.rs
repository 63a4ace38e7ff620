use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    #[error("invalid shape {shape:?}: a tensor needs at least one dimension")]
    InvalidShape { shape: Vec<usize> },
    #[error("data length {got} does not match shape {shape:?} (numel={expected})")]
    DataLength {
        shape: Vec<usize>,
        expected: usize,
        got: usize,
    },
    #[error("coordinate {coord:?} has {} dimensions but shape {shape:?} has {}", .coord.len(), .shape.len())]
    DimensionMismatch { coord: Vec<usize>, shape: Vec<usize> },
    #[error("index {index} out of bounds for axis {axis} of size {size}")]
    OutOfBounds {
        axis: usize,
        index: usize,
        size: usize,
    },
    #[error("invalid axis {axis} for tensor with {ndim} dimensions")]
    InvalidAxis { axis: usize, ndim: usize },
    #[error("transpose got {axes} axes for tensor with {ndim} dimensions")]
    AxesMismatch { axes: usize, ndim: usize },
    #[error("dot requires rank >= 2 operands, got shapes {lhs:?} and {rhs:?}")]
    RankTooLow { lhs: Vec<usize>, rhs: Vec<usize> },
    #[error("dot batch rank mismatch: {lhs} batch dims vs {rhs}")]
    BatchMismatch { lhs: usize, rhs: usize },
    #[error("dot batch shape mismatch: {lhs:?} vs {rhs:?}")]
    BatchShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },
    #[error("dot inner dimension mismatch: [{m}x{k}] @ [{k2}x{n}]")]
    InnerDimMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
    },
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("{op} requires a rank {expected} tensor, got shape {got:?}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: Vec<usize>,
    },
    #[error("rows [{start}, {start}+{count}) out of bounds for {rows} rows")]
    RowRangeOutOfBounds {
        start: usize,
        count: usize,
        rows: usize,
    },
    #[error("row count mismatch: features have {features} rows, labels have {labels}")]
    RowCountMismatch { features: usize, labels: usize },
    #[error("reduction over axis {axis} of a rank {ndim} tensor is not supported")]
    UnsupportedReduction { axis: usize, ndim: usize },
    #[error("query has {query} features but training data has {training}")]
    FeatureMismatch { query: usize, training: usize },
    #[error("query must have exactly one row, got shape {shape:?}")]
    QueryShape { shape: Vec<usize> },
    #[error("value {0} does not fit in the tensor index type")]
    IndexOverflow(usize),
}

pub type Result<T> = std::result::Result<T, TensorError>;
