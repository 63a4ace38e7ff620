use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use strata_tensor::activation::{calculate_cost, sigmoid};
use strata_tensor::ops::shuffle_tensors;
use strata_tensor::{Dim, Element, Tensor};

use crate::config::LogisticRegressionConfig;
use crate::error::{ModelError, Result};
use crate::estimator::Estimator;
use crate::scaler::StandardScaler;
use crate::{sample_count, to_dim};

/// Half-width of the uniform range initial weights are drawn from.
pub const INIT_WEIGHT_RANGE: f64 = 0.01;

/// Binary logistic regression trained with shuffled mini-batch gradient
/// descent on standardized features.
///
/// `fit` standardizes its input with a scaler fitted on the full training
/// set and keeps that scaler; `predict` does not scale. Apply
/// [`LogisticRegression::scaler`] to new inputs before predicting.
#[derive(Debug, Clone)]
pub struct LogisticRegression<T: Element, S: Dim = usize> {
    config: LogisticRegressionConfig,
    weights: Tensor<T, S>,
    bias: T,
    scaler: StandardScaler<T>,
    cost_history: Vec<T>,
    rng: StdRng,
}

impl<T: Element, S: Dim> LogisticRegression<T, S> {
    pub fn new(num_features: S, config: LogisticRegressionConfig) -> Result<Self> {
        Self::with_rng(num_features, config, StdRng::from_entropy())
    }

    /// Reproducible initial weights and shuffling.
    pub fn with_seed(num_features: S, config: LogisticRegressionConfig, seed: u64) -> Result<Self> {
        Self::with_rng(num_features, config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(
        num_features: S,
        config: LogisticRegressionConfig,
        mut rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;
        let weights = Tensor::random(
            vec![num_features, S::one()],
            T::from_f64(INIT_WEIGHT_RANGE),
            &mut rng,
        )?;
        Ok(LogisticRegression {
            bias: T::from_f64(config.bias),
            cost_history: Vec::with_capacity(config.num_iterations),
            config,
            weights,
            scaler: StandardScaler::new(),
            rng,
        })
    }

    /// Positional constructor with the default batch size.
    pub fn init(num_features: S, bias: f64, learning_rate: f64, num_iterations: usize) -> Result<Self> {
        Self::new(
            num_features,
            LogisticRegressionConfig {
                bias,
                learning_rate,
                num_iterations,
                ..Default::default()
            },
        )
    }

    pub fn config(&self) -> &LogisticRegressionConfig {
        &self.config
    }

    /// Current weights, shape `[num_features, 1]`.
    pub fn weights(&self) -> &Tensor<T, S> {
        &self.weights
    }

    pub fn bias(&self) -> T {
        self.bias
    }

    /// Scaler fitted by the most recent `fit`.
    pub fn scaler(&self) -> &StandardScaler<T> {
        &self.scaler
    }

    /// Full-dataset cost after each epoch, across every `fit` call.
    pub fn cost_history(&self) -> &[T] {
        &self.cost_history
    }

    /// Replace the weights and bias, e.g. with values trained elsewhere.
    pub fn set_parameters(&mut self, weights: Tensor<T, S>, bias: T) {
        self.weights = weights;
        self.bias = bias;
    }

    /// Train on `features` (`[samples, num_features]`) against 0/1 `targets`
    /// (`[samples, 1]`).
    ///
    /// Each epoch shuffles rows, runs one gradient step per batch of
    /// `batch_size` rows and appends the full-dataset cost to
    /// `cost_history`. The caller's tensors are not reordered.
    pub fn fit(&mut self, features: &Tensor<T, S>, targets: &Tensor<T, S>) -> Result<()> {
        if features.ndim() != 2 {
            return Err(ModelError::Rank2Required {
                op: "fit",
                shape: features.shape().to_usize_vec(),
            });
        }
        let num_samples = features.dims()[0].as_usize();
        if num_samples == 0 {
            return Err(ModelError::ZeroSamples);
        }

        self.scaler.fit_statistics(features)?;
        let mut scaled = self.scaler.transform(features)?;
        let mut labels = targets.clone();

        let batch_size = self.config.batch_size;
        let num_batches = num_samples.div_ceil(batch_size);
        let learning_rate = T::from_f64(self.config.learning_rate);

        info!(
            "fitting logistic regression on {} samples: {} epochs of {} batches",
            num_samples, self.config.num_iterations, num_batches
        );

        for epoch in 0..self.config.num_iterations {
            if !self.weights.valid() {
                warn!("logistic regression weights diverged at epoch {}", epoch);
                return Err(ModelError::NumericDivergence { iteration: epoch });
            }

            shuffle_tensors(&mut scaled, &mut labels, &mut self.rng)?;

            for batch in 0..num_batches {
                let start = batch * batch_size;
                let count = batch_size.min(num_samples - start);
                let batch_features = scaled.get_batch_slice(to_dim(start)?, to_dim(count)?)?;
                let batch_targets = labels.get_batch_slice(to_dim(start)?, to_dim(count)?)?;
                self.step(&batch_features, &batch_targets, count, learning_rate)?;
            }

            let cost = calculate_cost(&self.predict(&scaled)?, &labels)?;
            debug!("epoch {}: cost {}", epoch, cost);
            self.cost_history.push(cost);
        }

        info!("logistic regression fit finished");
        Ok(())
    }

    fn step(
        &mut self,
        features: &Tensor<T, S>,
        targets: &Tensor<T, S>,
        count: usize,
        learning_rate: T,
    ) -> Result<()> {
        let n: T = sample_count(count)?;
        let probabilities = self.predict(features)?;
        let error = probabilities.subtract(targets)?;

        let grad_weights = features
            .transpose(&[])?
            .dot(&error)?
            .mul_scalar(T::one() / n)?;
        let grad_bias = error.sum() / n;

        self.weights = self.weights.subtract(&grad_weights.mul_scalar(learning_rate)?)?;
        self.bias = self.bias.wrapping_sub(learning_rate.wrapping_mul(grad_bias));
        Ok(())
    }

    /// `sigmoid(input · weights + bias)`.
    pub fn predict(&self, input: &Tensor<T, S>) -> Result<Tensor<T, S>> {
        let linear = input.dot(&self.weights)?.add_scalar(self.bias)?;
        Ok(sigmoid(&linear)?)
    }
}

impl<T: Element, S: Dim> Estimator<T, S> for LogisticRegression<T, S> {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn fit(&mut self, features: &Tensor<T, S>, targets: &Tensor<T, S>) -> Result<()> {
        LogisticRegression::fit(self, features, targets)
    }

    fn predict(&self, features: &Tensor<T, S>) -> Result<Tensor<T, S>> {
        LogisticRegression::predict(self, features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::accuracy;
    use approx::assert_abs_diff_eq;
    use strata_tensor::activation::classify;

    fn and_dataset() -> (Tensor<f64>, Tensor<f64>) {
        let features = Tensor::from_vec(
            vec![1.0, 1.0, -1.0, -1.0, 1.0, -1.0, -1.0, 1.0],
            vec![4, 2],
        )
        .unwrap();
        let targets = Tensor::from_vec(vec![1.0, 0.0, 0.0, 0.0], vec![4, 1]).unwrap();
        (features, targets)
    }

    #[test]
    fn test_init() {
        let model = LogisticRegression::<f64>::init(3, 0.5, 0.01, 10).unwrap();
        assert_eq!(model.weights().dims(), &[3, 1]);
        assert_eq!(model.bias(), 0.5);
        assert_eq!(model.config().batch_size, 128);
        assert!(model.cost_history().is_empty());
        assert!(model
            .weights()
            .to_vec()
            .iter()
            .all(|&w| w.abs() <= INIT_WEIGHT_RANGE));
    }

    #[test]
    fn test_predict_known_parameters() {
        let mut model = LogisticRegression::<f64>::with_seed(2, Default::default(), 0).unwrap();
        let weights = Tensor::from_vec(vec![1.0, 1.0], vec![2, 1]).unwrap();
        model.set_parameters(weights, -1.0);

        let input = Tensor::from_vec(vec![1.0, 1.0, -1.0, -1.0], vec![2, 2]).unwrap();
        let p = model.predict(&input).unwrap().to_vec();
        assert_abs_diff_eq!(p[0], 0.731058578, epsilon = 1e-8);
        assert_abs_diff_eq!(p[1], 0.047425873, epsilon = 1e-8);
    }

    #[test]
    fn test_fit_separable_data() {
        let (features, targets) = and_dataset();
        let config = LogisticRegressionConfig {
            learning_rate: 0.1,
            num_iterations: 2000,
            ..Default::default()
        };
        let mut model = LogisticRegression::with_seed(2, config, 42).unwrap();
        model.fit(&features, &targets).unwrap();

        let history = model.cost_history();
        assert_eq!(history.len(), 2000);
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-12, "cost rose: {:?}", pair);
        }
        assert!(history[history.len() - 1] < 0.1);

        let scaled = model.scaler().transform(&features).unwrap();
        let predicted = classify(&model.predict(&scaled).unwrap(), 0.5).unwrap();
        assert_abs_diff_eq!(accuracy(&targets, &predicted).unwrap(), 1.0);

        // The caller's rows keep their order.
        assert_eq!(targets.to_vec(), vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_partial_last_batch() {
        let mut rng = StdRng::seed_from_u64(5);
        let features = Tensor::<f64>::random(vec![10, 2], 1.0, &mut rng).unwrap();
        let targets = classify(&features.get_slice(1, 0).unwrap().deep_clone().unwrap(), 0.0)
            .unwrap()
            .to_vec();
        let targets = Tensor::from_vec(targets, vec![10, 1]).unwrap();
        let config = LogisticRegressionConfig {
            batch_size: 4,
            num_iterations: 3,
            ..Default::default()
        };
        let mut model = LogisticRegression::with_seed(2, config, 1).unwrap();
        model.fit(&features, &targets).unwrap();
        assert_eq!(model.cost_history().len(), 3);
        assert!(model.cost_history().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_divergence_leaves_dirty_state() {
        // The two columns scale to exact negatives of each other, so every
        // row starts at a linear term of 0 and the bias gradient is 0.
        let features = Tensor::<f64>::from_vec(vec![0.0, 0.0, 1.0, -1.0], vec![2, 2]).unwrap();
        let targets = Tensor::<f64>::from_vec(vec![1.0, 0.0], vec![2, 1]).unwrap();
        let config = LogisticRegressionConfig {
            learning_rate: f64::MAX,
            num_iterations: 10,
            ..Default::default()
        };
        let mut model = LogisticRegression::with_seed(2, config, 3).unwrap();
        let start = Tensor::full(vec![2, 1], 0.75 * f64::MAX).unwrap();
        model.set_parameters(start, 0.0);

        assert_eq!(
            model.fit(&features, &targets).unwrap_err(),
            ModelError::NumericDivergence { iteration: 1 }
        );

        let weights = model.weights().to_vec();
        assert!(!model.weights().valid());
        assert_abs_diff_eq!(weights[0], 0.25 * f64::MAX, epsilon = 1e295);
        assert_eq!(weights[1], f64::INFINITY);
        assert_eq!(model.bias(), 0.0);

        // Epoch 0 completed and its cost is kept.
        assert_eq!(model.cost_history().len(), 1);
        assert_abs_diff_eq!(model.cost_history()[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_errors() {
        let mut model = LogisticRegression::<f64>::with_seed(2, Default::default(), 0).unwrap();
        let empty = Tensor::<f64>::zeros(vec![0, 2]).unwrap();
        let no_targets = Tensor::<f64>::zeros(vec![0, 1]).unwrap();
        assert_eq!(
            model.fit(&empty, &no_targets).unwrap_err(),
            ModelError::ZeroSamples
        );

        let flat = Tensor::<f64>::zeros(vec![4]).unwrap();
        assert!(matches!(
            model.fit(&flat, &no_targets),
            Err(ModelError::Rank2Required { .. })
        ));

        let (features, _) = and_dataset();
        let short = Tensor::<f64>::zeros(vec![3, 1]).unwrap();
        assert!(matches!(model.fit(&features, &short), Err(ModelError::Tensor(_))));
    }
}
