use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_tensor::{Dim, Element, Tensor};

use crate::config::LinearRegressionConfig;
use crate::error::{ModelError, Result};
use crate::estimator::Estimator;
use crate::to_dim;

/// Half-width of the uniform range initial weights are drawn from.
pub const INIT_WEIGHT_RANGE: f64 = 1.25e-6;

const LOG_EVERY: usize = 100;

/// Linear regression trained by full-batch gradient descent with classical
/// momentum and optional gradient-norm clipping.
///
/// `fit` expects its design matrix to already carry the bias column (see
/// [`Tensor::augment_bias`]); `predict` adds the bias column itself.
#[derive(Debug, Clone)]
pub struct LinearRegression<T: Element, S: Dim = usize> {
    config: LinearRegressionConfig,
    weights: Tensor<T, S>,
    velocity: Tensor<T, S>,
}

impl<T: Element, S: Dim> LinearRegression<T, S> {
    /// Create a model with `num_features` weights (bias included) drawn from
    /// an entropy-seeded generator.
    pub fn new(num_features: S, config: LinearRegressionConfig) -> Result<Self> {
        Self::with_rng(num_features, config, &mut StdRng::from_entropy())
    }

    /// Like [`LinearRegression::new`] with reproducible initial weights.
    pub fn with_seed(num_features: S, config: LinearRegressionConfig, seed: u64) -> Result<Self> {
        Self::with_rng(num_features, config, &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng + ?Sized>(
        num_features: S,
        config: LinearRegressionConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let shape = vec![num_features, S::one()];
        let weights = Tensor::random(shape.clone(), T::from_f64(INIT_WEIGHT_RANGE), rng)?;
        let velocity = Tensor::zeros(shape)?;
        Ok(LinearRegression {
            config,
            weights,
            velocity,
        })
    }

    /// Positional constructor mirroring the config fields.
    pub fn init(
        num_features: S,
        learning_rate: f64,
        momentum_rate: f64,
        clip_threshold: f64,
        max_iterations: usize,
    ) -> Result<Self> {
        Self::new(
            num_features,
            LinearRegressionConfig {
                learning_rate,
                momentum_rate,
                clip_threshold,
                max_iterations,
            },
        )
    }

    pub fn config(&self) -> &LinearRegressionConfig {
        &self.config
    }

    /// Current weights, shape `[num_features, 1]`.
    pub fn weights(&self) -> &Tensor<T, S> {
        &self.weights
    }

    /// Momentum accumulator, same shape as the weights.
    pub fn velocity(&self) -> &Tensor<T, S> {
        &self.velocity
    }

    /// Run `max_iterations` momentum steps on `x` (`[samples, num_features]`,
    /// bias column included) against `y` (`[samples, 1]`).
    ///
    /// Resumes from the current weights and velocity. Fails with
    /// `NumericDivergence` as soon as the weights stop being finite, leaving
    /// whatever the earlier iterations wrote.
    pub fn fit(&mut self, x: &Tensor<T, S>, y: &Tensor<T, S>) -> Result<()> {
        let x_t = x.transpose(&[])?;
        let learning_rate = T::from_f64(self.config.learning_rate);
        let momentum = T::from_f64(self.config.momentum_rate);
        let clip = self.config.clip_threshold;

        info!(
            "fitting linear regression on {} design matrix for {} iterations",
            x.shape(),
            self.config.max_iterations
        );

        for iteration in 0..self.config.max_iterations {
            if !self.weights.valid() {
                warn!("linear regression weights diverged at iteration {}", iteration);
                return Err(ModelError::NumericDivergence { iteration });
            }

            let predictions = x.dot(&self.weights)?;
            let error = predictions.subtract(y)?;
            let mut gradient = x_t.dot(&error)?;

            if clip > 0.0 {
                let norm = gradient.norm().as_f64();
                if norm > clip {
                    gradient = gradient.mul_scalar(T::from_f64(clip / norm))?;
                }
            }

            self.velocity = self
                .velocity
                .mul_scalar(momentum)?
                .add(&gradient.mul_scalar(learning_rate)?)?;
            self.weights = self.weights.subtract(&self.velocity)?;

            if iteration % LOG_EVERY == 0 {
                debug!(
                    "iteration {}: gradient norm {}",
                    iteration,
                    gradient.norm()
                );
            }
        }

        info!("linear regression fit finished");
        Ok(())
    }

    /// `augment_bias(x) · weights` for a `[samples, num_features - 1]` input.
    pub fn predict(&self, x: &Tensor<T, S>) -> Result<Tensor<T, S>> {
        if x.ndim() != 2 {
            return Err(ModelError::Rank2Required {
                op: "predict",
                shape: x.shape().to_usize_vec(),
            });
        }
        let augmented = x.augment_bias()?;
        let got = augmented.dims()[1].as_usize();
        let expected = self.weights.dims()[0].as_usize();
        if got != expected {
            return Err(ModelError::DimensionMismatch { expected, got });
        }
        Ok(augmented.dot(&self.weights)?)
    }

    /// Overwrite one weight, e.g. to warm-start from known values.
    pub fn set_weight(&mut self, index: usize, value: T) -> Result<()> {
        Ok(self.weights.set(&[to_dim(index)?, S::zero()], value)?)
    }
}

impl<T: Element, S: Dim> Estimator<T, S> for LinearRegression<T, S> {
    fn name(&self) -> &str {
        "linear_regression"
    }

    fn fit(&mut self, features: &Tensor<T, S>, targets: &Tensor<T, S>) -> Result<()> {
        LinearRegression::fit(self, features, targets)
    }

    fn predict(&self, features: &Tensor<T, S>) -> Result<Tensor<T, S>> {
        LinearRegression::predict(self, features)
    }
}
