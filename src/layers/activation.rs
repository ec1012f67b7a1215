use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::model::Mode;

/// Applies an `ActivationFunction` element-wise.
#[derive(Debug, Clone)]
pub struct Activation {
    pub function: ActivationFunction,
    // Pre-activation values z, so the backward pass can evaluate f'(z).
    pre_activation: Option<Matrix>,
}

impl Activation {
    pub fn new(function: ActivationFunction) -> Activation {
        Activation { function, pre_activation: None }
    }

    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        let f = self.function;
        let out = input.map(|x| f.function(x));
        self.pre_activation = match mode {
            Mode::Train => Some(input.clone()),
            Mode::Eval => None,
        };
        Ok(out)
    }

    pub fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let z = self.pre_activation.as_ref().ok_or_else(|| {
            Error::Model("activation backward called without a training-mode forward".to_owned())
        })?;
        let f = self.function;
        grad_output.hadamard(&z.map(|x| f.derivative(x)))
    }
}
