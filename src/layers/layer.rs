use crate::error::Result;
use crate::layers::activation::Activation;
use crate::layers::dense::Linear;
use crate::layers::dropout::Dropout;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::model::Mode;

/// One stage of a `Sequential` model.
#[derive(Debug, Clone)]
pub enum Layer {
    Linear(Linear),
    Activation(Activation),
    Dropout(Dropout),
}

impl Layer {
    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        match self {
            Layer::Linear(l) => l.forward(input, mode),
            Layer::Activation(a) => a.forward(input, mode),
            Layer::Dropout(d) => d.forward(input, mode),
        }
    }

    pub fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        match self {
            Layer::Linear(l) => l.backward(grad_output),
            Layer::Activation(a) => a.backward(grad_output),
            Layer::Dropout(d) => d.backward(grad_output),
        }
    }

    /// Trainable parameters with their local names (`weight`, `bias`).
    pub fn params(&self) -> Vec<(&'static str, &Param)> {
        match self {
            Layer::Linear(l) => vec![("weight", &l.weights), ("bias", &l.biases)],
            _ => Vec::new(),
        }
    }

    pub fn params_mut(&mut self) -> Vec<(&'static str, &mut Param)> {
        match self {
            Layer::Linear(l) => vec![("weight", &mut l.weights), ("bias", &mut l.biases)],
            _ => Vec::new(),
        }
    }
}
