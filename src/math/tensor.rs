use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// An n-dimensional array of `f64` values in row-major order.
///
/// Images are `[channels, height, width]`; a batch of images is
/// `[batch_size, channels, height, width]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if shape.is_empty() || expected != data.len() {
            return Err(Error::Shape(format!(
                "shape {:?} needs {} values, got {}",
                shape, expected, data.len()
            )));
        }
        Ok(Tensor { shape, data })
    }

    pub fn zeros(shape: Vec<usize>) -> Result<Tensor> {
        let n = shape.iter().product();
        Tensor::new(shape, vec![0.0; n])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Stacks equally-shaped tensors along a new leading dimension.
    pub fn stack(items: &[Tensor]) -> Result<Tensor> {
        let first = items
            .first()
            .ok_or_else(|| Error::Shape("cannot stack an empty list of tensors".to_owned()))?;
        let mut data = Vec::with_capacity(first.numel() * items.len());
        for (i, t) in items.iter().enumerate() {
            if t.shape != first.shape {
                return Err(Error::Shape(format!(
                    "item {} has shape {:?}, expected {:?}",
                    i, t.shape, first.shape
                )));
            }
            data.extend_from_slice(&t.data);
        }
        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(items.len());
        shape.extend_from_slice(&first.shape);
        Ok(Tensor { shape, data })
    }

    /// Flattens every dimension after the first: `[n, d1, d2, ...]` becomes an
    /// `n x (d1 * d2 * ...)` matrix.
    pub fn to_matrix(&self) -> Matrix {
        let rows = self.shape.first().copied().unwrap_or(0);
        let cols = if rows == 0 { 0 } else { self.data.len() / rows };
        Matrix { rows, cols, data: self.data.clone() }
    }
}

impl From<Matrix> for Tensor {
    fn from(m: Matrix) -> Self {
        Tensor { shape: vec![m.rows, m.cols], data: m.data }
    }
}
