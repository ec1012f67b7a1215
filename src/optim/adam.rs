use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use crate::error::Result;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::Optimizer;

/// Adam with bias-corrected first and second moment estimates.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    pub weight_decay: f64,
    step_count: u64,
    moments: HashMap<String, (Matrix, Matrix)>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay: 0.0,
            step_count: 0,
            moments: HashMap::new(),
        }
    }

    pub fn with_betas(mut self, beta1: f64, beta2: f64) -> Adam {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Adam {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for Adam {
    fn name(&self) -> &str {
        "Adam"
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn hyperparams(&self) -> BTreeMap<String, Value> {
        let mut params = BTreeMap::new();
        params.insert("beta1".to_owned(), json!(self.beta1));
        params.insert("beta2".to_owned(), json!(self.beta2));
        params.insert("eps".to_owned(), json!(self.eps));
        params.insert("weight_decay".to_owned(), json!(self.weight_decay));
        params
    }

    fn step(&mut self, params: Vec<(String, &mut Param)>) -> Result<()> {
        self.step_count += 1;
        let t = self.step_count as i32;
        let bias1 = 1.0 - self.beta1.powi(t);
        let bias2 = 1.0 - self.beta2.powi(t);
        let (b1, b2) = (self.beta1, self.beta2);

        for (name, param) in params {
            let mut grad = param.grad.clone();
            if self.weight_decay != 0.0 {
                grad.add_scaled(&param.value, self.weight_decay)?;
            }
            let (m, v) = self.moments.entry(name).or_insert_with(|| {
                (Matrix::zeros(grad.rows, grad.cols), Matrix::zeros(grad.rows, grad.cols))
            });
            *m = m.zip_map(&grad, |m, g| b1 * m + (1.0 - b1) * g)?;
            *v = v.zip_map(&grad, |v, g| b2 * v + (1.0 - b2) * g * g)?;

            let eps = self.eps;
            let update = m.zip_map(v, |m, v| (m / bias1) / ((v / bias2).sqrt() + eps))?;
            param.value.add_scaled(&update, -self.learning_rate)?;
        }
        Ok(())
    }
}
