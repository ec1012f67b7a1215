use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use crate::error::Result;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::Optimizer;

/// Stochastic gradient descent with optional momentum and L2 weight decay.
///
/// With momentum `mu` and decay `wd`, each step computes
/// `g = grad + wd * w`, `v = mu * v + g`, `w -= lr * v`.
#[derive(Debug, Clone)]
pub struct Sgd {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    velocity: HashMap<String, Matrix>,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate, momentum: 0.0, weight_decay: 0.0, velocity: HashMap::new() }
    }

    pub fn with_momentum(mut self, momentum: f64) -> Sgd {
        self.momentum = momentum;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Sgd {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for Sgd {
    fn name(&self) -> &str {
        "SGD"
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn hyperparams(&self) -> BTreeMap<String, Value> {
        let mut params = BTreeMap::new();
        params.insert("momentum".to_owned(), json!(self.momentum));
        params.insert("weight_decay".to_owned(), json!(self.weight_decay));
        params
    }

    fn step(&mut self, params: Vec<(String, &mut Param)>) -> Result<()> {
        for (name, param) in params {
            let mut grad = param.grad.clone();
            if self.weight_decay != 0.0 {
                grad.add_scaled(&param.value, self.weight_decay)?;
            }
            if self.momentum != 0.0 {
                let velocity = self
                    .velocity
                    .entry(name)
                    .or_insert_with(|| Matrix::zeros(grad.rows, grad.cols));
                *velocity = velocity.map(|v| v * self.momentum);
                velocity.add_scaled(&grad, 1.0)?;
                grad = velocity.clone();
            }
            param.value.add_scaled(&grad, -self.learning_rate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(value: f64, grad: f64) -> Param {
        let mut p = Param::new(Matrix::from_vec(1, 1, vec![value]).unwrap());
        p.grad.data[0] = grad;
        p
    }

    #[test]
    fn plain_step_moves_against_gradient() {
        let mut sgd = Sgd::new(0.1);
        let mut p = param(1.0, 2.0);
        sgd.step(vec![("w".into(), &mut p)]).unwrap();
        assert!((p.value.data[0] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn momentum_accumulates_across_steps() {
        let mut sgd = Sgd::new(0.1).with_momentum(0.9);
        let mut p = param(0.0, 1.0);
        sgd.step(vec![("w".into(), &mut p)]).unwrap();
        sgd.step(vec![("w".into(), &mut p)]).unwrap();
        // v1 = 1, v2 = 0.9 + 1 = 1.9; w = -0.1 - 0.19
        assert!((p.value.data[0] + 0.29).abs() < 1e-12);
    }

    #[test]
    fn weight_decay_shrinks_weights_without_gradient() {
        let mut sgd = Sgd::new(0.5).with_weight_decay(0.1);
        let mut p = param(2.0, 0.0);
        sgd.step(vec![("w".into(), &mut p)]).unwrap();
        assert!((p.value.data[0] - 1.9).abs() < 1e-12);
    }

    #[test]
    fn hyperparams_list_momentum_and_decay() {
        let sgd = Sgd::new(0.01).with_momentum(0.9);
        let hp = sgd.hyperparams();
        assert_eq!(hp["momentum"], json!(0.9));
        assert_eq!(hp["weight_decay"], json!(0.0));
    }
}
