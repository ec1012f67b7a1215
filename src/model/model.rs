use crate::error::Result;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor;
use crate::model::mode::{Device, Mode};
use crate::model::state_dict::StateDict;

/// A trainable classifier.
///
/// `forward` maps a batch tensor `[batch, ...]` to a `batch x classes`
/// matrix of logits. `backward` consumes dL/dlogits for the most recent
/// `Mode::Train` forward and accumulates parameter gradients.
pub trait Model {
    /// Identifying name, logged as the run's `architecture`.
    fn name(&self) -> &str;

    fn forward(&mut self, inputs: &Tensor, mode: Mode) -> Result<Matrix>;

    fn backward(&mut self, grad_logits: &Matrix) -> Result<()>;

    fn zero_grad(&mut self);

    /// Parameters keyed by their fully qualified name (e.g. `0.weight`).
    fn parameters_mut(&mut self) -> Vec<(String, &mut Param)>;

    fn state_dict(&self) -> StateDict;

    fn load_state_dict(&mut self, state: &StateDict) -> Result<()>;

    /// CPU is the only device, so there is nothing to move.
    fn to_device(&mut self, device: Device) -> Result<()> {
        match device {
            Device::Cpu => Ok(()),
        }
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn forward(&mut self, inputs: &Tensor, mode: Mode) -> Result<Matrix> {
        (**self).forward(inputs, mode)
    }

    fn backward(&mut self, grad_logits: &Matrix) -> Result<()> {
        (**self).backward(grad_logits)
    }

    fn zero_grad(&mut self) {
        (**self).zero_grad()
    }

    fn parameters_mut(&mut self) -> Vec<(String, &mut Param)> {
        (**self).parameters_mut()
    }

    fn state_dict(&self) -> StateDict {
        (**self).state_dict()
    }

    fn load_state_dict(&mut self, state: &StateDict) -> Result<()> {
        (**self).load_state_dict(state)
    }

    fn to_device(&mut self, device: Device) -> Result<()> {
        (**self).to_device(device)
    }
}
