use crate::error::{ModelError, Result};

/// Hyperparameters for momentum gradient descent on a linear model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressionConfig {
    /// Step size applied to each gradient before it enters the velocity.
    pub learning_rate: f64,
    /// Fraction of the previous velocity kept each iteration, in `[0, 1)`.
    pub momentum_rate: f64,
    /// Gradient norm above which the gradient is rescaled. 0 disables clipping.
    pub clip_threshold: f64,
    /// Number of full-batch iterations per `fit`.
    pub max_iterations: usize,
}

impl Default for LinearRegressionConfig {
    fn default() -> Self {
        LinearRegressionConfig {
            learning_rate: 1e-4,
            momentum_rate: 0.9,
            clip_threshold: 5.0,
            max_iterations: 1000,
        }
    }
}

impl LinearRegressionConfig {
    pub fn validate(&self) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        if !(0.0..1.0).contains(&self.momentum_rate) {
            return Err(ModelError::InvalidConfig(format!(
                "momentum_rate must be in [0, 1), got {}",
                self.momentum_rate
            )));
        }
        if !self.clip_threshold.is_finite() || self.clip_threshold < 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "clip_threshold must be finite and non-negative, got {}",
                self.clip_threshold
            )));
        }
        Ok(())
    }
}

/// Hyperparameters for mini-batch logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionConfig {
    /// Initial bias term.
    pub bias: f64,
    pub learning_rate: f64,
    /// Number of epochs per `fit`.
    pub num_iterations: usize,
    /// Rows per mini-batch. The last batch of an epoch may be shorter.
    pub batch_size: usize,
}

impl Default for LogisticRegressionConfig {
    fn default() -> Self {
        LogisticRegressionConfig {
            bias: 0.0,
            learning_rate: 0.01,
            num_iterations: 1000,
            batch_size: 128,
        }
    }
}

impl LogisticRegressionConfig {
    pub fn validate(&self) -> Result<()> {
        check_learning_rate(self.learning_rate)?;
        if !self.bias.is_finite() {
            return Err(ModelError::InvalidConfig(format!(
                "bias must be finite, got {}",
                self.bias
            )));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() || learning_rate < 0.0 {
        return Err(ModelError::InvalidConfig(format!(
            "learning_rate must be finite and non-negative, got {learning_rate}"
        )));
    }
    Ok(())
}
