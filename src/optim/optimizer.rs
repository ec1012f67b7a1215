use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;
use crate::layers::param::Param;

/// Updates parameters in place from their accumulated gradients.
///
/// Optimizers never own parameters. The epoch runner hands them the
/// model's `parameters_mut()` on every step, so an optimizer always acts on
/// exactly the parameter set of the model it is stepping. Per-parameter
/// state (momentum buffers, moment estimates) is keyed by parameter name.
pub trait Optimizer {
    /// Identifying name, logged as the run's `optimizer_class`.
    fn name(&self) -> &str;

    fn learning_rate(&self) -> f64;

    /// Auxiliary hyperparameters, flattened into the run configuration.
    fn hyperparams(&self) -> BTreeMap<String, Value>;

    fn step(&mut self, params: Vec<(String, &mut Param)>) -> Result<()>;
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn learning_rate(&self) -> f64 {
        (**self).learning_rate()
    }

    fn hyperparams(&self) -> BTreeMap<String, Value> {
        (**self).hyperparams()
    }

    fn step(&mut self, params: Vec<(String, &mut Param)>) -> Result<()> {
        (**self).step(params)
    }
}
