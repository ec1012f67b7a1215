use rand::Rng;

use crate::error::{Error, Result};
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::model::Mode;

/// Weight initialization scheme for a `Linear` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Init {
    He,
    Xavier,
}

/// Fully connected layer: `y = x * W + b` with `W` stored as (inputs, outputs).
#[derive(Debug, Clone)]
pub struct Linear {
    pub weights: Param,
    pub biases: Param,
    // Input of the last training-mode forward, needed for the weight gradient.
    input: Option<Matrix>,
}

impl Linear {
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, init: Init, rng: &mut R) -> Linear {
        let weights = match init {
            Init::He => Matrix::he(input_size, size, rng),
            Init::Xavier => Matrix::xavier(input_size, size, rng),
        };
        Linear {
            weights: Param::new(weights),
            biases: Param::new(Matrix::zeros(1, size)),
            input: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.value.rows
    }

    pub fn size(&self) -> usize {
        self.weights.value.cols
    }

    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        if input.cols != self.input_size() {
            return Err(Error::Shape(format!(
                "linear layer expects {} input features, got {}",
                self.input_size(), input.cols
            )));
        }
        let out = input.matmul(&self.weights.value)?.add_row(&self.biases.value)?;
        self.input = match mode {
            Mode::Train => Some(input.clone()),
            Mode::Eval => None,
        };
        Ok(out)
    }

    /// Accumulates dL/dW and dL/db, returns dL/dx.
    pub fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let input = self.input.as_ref().ok_or_else(|| {
            Error::Model("linear backward called without a training-mode forward".to_owned())
        })?;
        let w_grad = input.transpose().matmul(grad_output)?;
        self.weights.grad.add_scaled(&w_grad, 1.0)?;
        self.biases.grad.add_scaled(&grad_output.sum_rows(), 1.0)?;
        grad_output.matmul(&self.weights.value.transpose())
    }
}
