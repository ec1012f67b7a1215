use crate::error::Result;
use crate::math::matrix::Matrix;

/// Scalar loss of one batch together with its gradient w.r.t. the logits.
#[derive(Debug, Clone)]
pub struct LossOutput {
    pub value: f64,
    pub grad: Matrix,
}

/// Maps (logits batch, target class indices) to a scalar loss.
pub trait Loss {
    fn name(&self) -> &str;

    fn forward(&self, logits: &Matrix, targets: &[usize]) -> Result<LossOutput>;
}

impl<L: Loss + ?Sized> Loss for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn forward(&self, logits: &Matrix, targets: &[usize]) -> Result<LossOutput> {
        (**self).forward(logits, targets)
    }
}
