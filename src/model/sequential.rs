use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::layers::layer::Layer;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor;
use crate::model::mode::Mode;
use crate::model::model::Model;
use crate::model::state_dict::{StateDict, TensorRecord};

/// A feed-forward stack of layers over flattened inputs.
///
/// Parameters are named `{layer_index}.{weight|bias}`.
#[derive(Debug, Clone)]
pub struct Sequential {
    name: String,
    input_size: usize,
    pub layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(name: impl Into<String>, input_size: usize, layers: Vec<Layer>) -> Sequential {
        Sequential { name: name.into(), input_size, layers }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .flat_map(|l| l.params())
            .map(|(_, p)| p.value.data.len())
            .sum()
    }
}

impl Model for Sequential {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&mut self, inputs: &Tensor, mode: Mode) -> Result<Matrix> {
        let mut current = inputs.to_matrix();
        if current.cols != self.input_size {
            return Err(Error::Shape(format!(
                "{} expects {} features per example, batch of shape {:?} has {}",
                self.name, self.input_size, inputs.shape(), current.cols
            )));
        }
        for layer in &mut self.layers {
            current = layer.forward(&current, mode)?;
        }
        Ok(current)
    }

    fn backward(&mut self, grad_logits: &Matrix) -> Result<()> {
        let mut grad = grad_logits.clone();
        for layer in self.layers.iter_mut().rev() {
            grad = layer.backward(&grad)?;
        }
        Ok(())
    }

    fn zero_grad(&mut self) {
        for layer in &mut self.layers {
            for (_, p) in layer.params_mut() {
                p.zero_grad();
            }
        }
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Param)> {
        self.layers
            .iter_mut()
            .enumerate()
            .flat_map(|(i, layer)| {
                layer
                    .params_mut()
                    .into_iter()
                    .map(move |(local, p)| (format!("{}.{}", i, local), p))
            })
            .collect()
    }

    fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for (local, p) in layer.params() {
                state.insert(format!("{}.{}", i, local), TensorRecord::from(&p.value));
            }
        }
        state
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        // Every entry is checked before any parameter is touched.
        let mut staged = Vec::new();
        let mut expected = BTreeSet::new();
        for (name, param) in self.parameters_mut() {
            let record = state
                .get(&name)
                .ok_or_else(|| Error::Checkpoint(format!("missing parameter `{}`", name)))?;
            let value = record.to_matrix()?;
            if (value.rows, value.cols) != param.shape() {
                return Err(Error::Checkpoint(format!(
                    "parameter `{}` has shape {:?}, model expects {:?}",
                    name, record.shape, param.shape()
                )));
            }
            expected.insert(name);
            staged.push(value);
        }
        if let Some(extra) = state.keys().find(|k| !expected.contains(*k)) {
            return Err(Error::Checkpoint(format!("unexpected parameter `{}`", extra)));
        }
        for ((_, param), value) in self.parameters_mut().into_iter().zip(staged) {
            param.value = value;
        }
        Ok(())
    }
}
