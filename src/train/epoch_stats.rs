use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Aggregate metrics of one pass over a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Sum of per-batch losses divided by the number of batches. A smaller
    /// final batch is weighted like a full one.
    pub loss: f64,
    /// Percentage in [0, 100] of examples whose arg-max logit equals the target.
    pub accuracy: f64,
    pub examples: usize,
    pub batches: usize,
}

/// Running sums for one pass.
#[derive(Debug, Clone, Default)]
pub(crate) struct Accumulator {
    running_loss: f64,
    batches: usize,
    correct: usize,
    total: usize,
}

impl Accumulator {
    pub(crate) fn update(&mut self, loss: f64, logits: &Matrix, targets: &[usize]) {
        self.running_loss += loss;
        self.batches += 1;
        self.total += targets.len();
        self.correct += logits
            .argmax_rows()
            .iter()
            .zip(targets.iter())
            .filter(|(predicted, target)| predicted == target)
            .count();
    }

    pub(crate) fn finish(self, epoch: usize) -> Result<EpochMetrics> {
        if self.batches == 0 || self.total == 0 {
            return Err(Error::EmptyLoader);
        }
        Ok(EpochMetrics {
            epoch,
            loss: self.running_loss / self.batches as f64,
            accuracy: 100.0 * self.correct as f64 / self.total as f64,
            examples: self.total,
            batches: self.batches,
        })
    }
}
