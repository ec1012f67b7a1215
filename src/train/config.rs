use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::loss::loss::Loss;
use crate::model::model::Model;
use crate::optim::optimizer::Optimizer;

/// Everything a training session needs, fixed at construction.
///
/// The model and optimizer are mutated by training, but only through the
/// trainer; this struct exposes them read-only.
pub struct TrainingConfig<M, L, O> {
    training_name: String,
    epochs: usize,
    learning_rate: f64,
    model: M,
    loss_function: L,
    optimizer: O,
    optimizer_params: BTreeMap<String, Value>,
}

impl<M: Model, L: Loss, O: Optimizer> TrainingConfig<M, L, O> {
    /// Validates the session invariants. `optimizer_params` starts out as the
    /// optimizer's own hyperparameters.
    pub fn new(
        training_name: impl Into<String>,
        epochs: usize,
        learning_rate: f64,
        model: M,
        loss_function: L,
        optimizer: O,
    ) -> Result<TrainingConfig<M, L, O>> {
        let training_name = training_name.into();
        if training_name.trim().is_empty() {
            return Err(Error::InvalidConfig("training_name must not be empty".to_owned()));
        }
        if epochs == 0 {
            return Err(Error::InvalidConfig("epochs must be at least 1".to_owned()));
        }
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive and finite, got {}",
                learning_rate
            )));
        }
        let optimizer_lr = optimizer.learning_rate();
        if (optimizer_lr - learning_rate).abs() > f64::EPSILON * learning_rate {
            return Err(Error::InvalidConfig(format!(
                "learning_rate {} does not match the optimizer's {}",
                learning_rate, optimizer_lr
            )));
        }
        let optimizer_params = optimizer.hyperparams();
        Ok(TrainingConfig {
            training_name,
            epochs,
            learning_rate,
            model,
            loss_function,
            optimizer,
            optimizer_params,
        })
    }

    /// Adds or replaces logged optimizer parameters.
    pub fn with_optimizer_params(mut self, params: BTreeMap<String, Value>) -> TrainingConfig<M, L, O> {
        self.optimizer_params.extend(params);
        self
    }

    pub fn training_name(&self) -> &str {
        &self.training_name
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn loss_function(&self) -> &L {
        &self.loss_function
    }

    pub fn optimizer(&self) -> &O {
        &self.optimizer
    }

    pub fn optimizer_params(&self) -> &BTreeMap<String, Value> {
        &self.optimizer_params
    }

    /// Hands back the trained model and optimizer.
    pub fn into_parts(self) -> (M, L, O) {
        (self.model, self.loss_function, self.optimizer)
    }

    pub(crate) fn session_mut(&mut self) -> (&mut M, &L, &mut O) {
        (&mut self.model, &self.loss_function, &mut self.optimizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::loss::CrossEntropyLoss;
    use crate::model::{ModelSpec, Sequential};
    use crate::optim::Sgd;
    use serde_json::json;

    fn model() -> Sequential {
        ModelSpec::mlp("m", 2, &[], 2, ActivationFunction::ReLU, 0.0).build().unwrap()
    }

    #[test]
    fn collects_optimizer_hyperparams() {
        let mut extra = BTreeMap::new();
        extra.insert("nesterov".to_owned(), json!(false));
        let cfg = TrainingConfig::new("run", 3, 0.1, model(), CrossEntropyLoss::new(), Sgd::new(0.1).with_momentum(0.9))
            .unwrap()
            .with_optimizer_params(extra);
        assert_eq!(cfg.optimizer_params()["momentum"], json!(0.9));
        assert_eq!(cfg.optimizer_params()["nesterov"], json!(false));
        assert_eq!(cfg.epochs(), 3);
        assert_eq!(cfg.training_name(), "run");
    }

    #[test]
    fn rejects_zero_epochs() {
        let err = TrainingConfig::new("run", 0, 0.1, model(), CrossEntropyLoss::new(), Sgd::new(0.1));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        let err = TrainingConfig::new("run", 1, 0.0, model(), CrossEntropyLoss::new(), Sgd::new(0.0));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_learning_rate_mismatch_with_optimizer() {
        let err = TrainingConfig::new("run", 1, 0.1, model(), CrossEntropyLoss::new(), Sgd::new(0.01));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_blank_name() {
        let err = TrainingConfig::new("  ", 1, 0.1, model(), CrossEntropyLoss::new(), Sgd::new(0.1));
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }
}
