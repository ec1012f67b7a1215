use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::model::Mode;

/// Inverted dropout. In `Mode::Train` every activation is zeroed with
/// probability `p` and the survivors are scaled by `1 / (1 - p)`; in
/// `Mode::Eval` the layer is the identity.
#[derive(Debug, Clone)]
pub struct Dropout {
    pub p: f64,
    rng: StdRng,
    mask: Option<Matrix>,
}

impl Dropout {
    pub fn new(p: f64, seed: u64) -> Result<Dropout> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::InvalidConfig(format!(
                "dropout probability must lie in [0, 1), got {}",
                p
            )));
        }
        Ok(Dropout { p, rng: StdRng::seed_from_u64(seed), mask: None })
    }

    pub fn forward(&mut self, input: &Matrix, mode: Mode) -> Result<Matrix> {
        match mode {
            Mode::Eval => {
                self.mask = None;
                Ok(input.clone())
            }
            Mode::Train => {
                let keep = 1.0 - self.p;
                let scale = 1.0 / keep;
                let mut mask = Matrix::zeros(input.rows, input.cols);
                for m in mask.data.iter_mut() {
                    if self.rng.gen::<f64>() < keep {
                        *m = scale;
                    }
                }
                let out = input.hadamard(&mask)?;
                self.mask = Some(mask);
                Ok(out)
            }
        }
    }

    pub fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let mask = self.mask.as_ref().ok_or_else(|| {
            Error::Model("dropout backward called without a training-mode forward".to_owned())
        })?;
        grad_output.hadamard(mask)
    }
}
