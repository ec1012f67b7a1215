use crate::math::matrix::Matrix;

/// A trainable tensor together with its accumulated gradient.
///
/// Gradients accumulate across `backward` calls until `zero_grad` is issued,
/// so the epoch runner clears them before every batch.
#[derive(Debug, Clone)]
pub struct Param {
    pub value: Matrix,
    pub grad: Matrix,
}

impl Param {
    pub fn new(value: Matrix) -> Param {
        let grad = Matrix::zeros(value.rows, value.cols);
        Param { value, grad }
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.value.rows, self.value.cols)
    }
}
