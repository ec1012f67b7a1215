use crate::error::{Error, Result};
use crate::loss::loss::{Loss, LossOutput};
use crate::math::matrix::Matrix;

/// Categorical cross-entropy over raw logits, averaged over the batch.
///
/// Softmax is folded in through a max-shifted log-sum-exp, so the gradient
/// w.r.t. the logits is `(softmax(z) - q) / batch_size`, where `q` is the
/// (optionally smoothed) one-hot target distribution.
#[derive(Debug, Clone, Default)]
pub struct CrossEntropyLoss {
    label_smoothing: f64,
}

impl CrossEntropyLoss {
    pub fn new() -> CrossEntropyLoss {
        CrossEntropyLoss { label_smoothing: 0.0 }
    }

    pub fn with_label_smoothing(label_smoothing: f64) -> Result<CrossEntropyLoss> {
        if !(0.0..1.0).contains(&label_smoothing) {
            return Err(Error::InvalidConfig(format!(
                "label smoothing must lie in [0, 1), got {}",
                label_smoothing
            )));
        }
        Ok(CrossEntropyLoss { label_smoothing })
    }
}

impl Loss for CrossEntropyLoss {
    fn name(&self) -> &str {
        "CrossEntropyLoss"
    }

    fn forward(&self, logits: &Matrix, targets: &[usize]) -> Result<LossOutput> {
        if logits.rows != targets.len() {
            return Err(Error::Shape(format!(
                "{} logit rows for {} targets",
                logits.rows, targets.len()
            )));
        }
        if logits.rows == 0 || logits.cols == 0 {
            return Err(Error::Shape("cross-entropy of an empty batch".to_owned()));
        }

        let batch = logits.rows as f64;
        let classes = logits.cols;
        let off_target = self.label_smoothing / classes as f64;
        let on_target = 1.0 - self.label_smoothing + off_target;

        let mut total = 0.0;
        let mut grad = Matrix::zeros(logits.rows, classes);

        for (i, &target) in targets.iter().enumerate() {
            if target >= classes {
                return Err(Error::Target { target, classes });
            }
            let row = logits.row(i);
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let sum_exp: f64 = row.iter().map(|z| (z - max).exp()).sum();
            let log_sum_exp = max + sum_exp.ln();

            for (j, &z) in row.iter().enumerate() {
                let q = if j == target { on_target } else { off_target };
                let log_p = z - log_sum_exp;
                total -= q * log_p;
                grad.data[i * classes + j] = (log_p.exp() - q) / batch;
            }
        }

        Ok(LossOutput { value: total / batch, grad })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_logits_give_log_of_class_count() {
        let logits = Matrix::zeros(3, 4);
        let out = CrossEntropyLoss::new().forward(&logits, &[0, 1, 3]).unwrap();
        assert!((out.value - 4f64.ln()).abs() < 1e-12);
        // each row of the gradient sums to zero
        for i in 0..3 {
            assert!(out.grad.row(i).iter().sum::<f64>().abs() < 1e-12);
        }
    }

    #[test]
    fn confident_correct_prediction_has_small_loss() {
        let logits = Matrix::from_rows(vec![vec![20.0, 0.0], vec![0.0, 20.0]]).unwrap();
        let out = CrossEntropyLoss::new().forward(&logits, &[0, 1]).unwrap();
        assert!(out.value < 1e-8);
    }

    #[test]
    fn large_logits_stay_finite() {
        let logits = Matrix::from_rows(vec![vec![1000.0, -1000.0]]).unwrap();
        let out = CrossEntropyLoss::new().forward(&logits, &[1]).unwrap();
        assert!((out.value - 2000.0).abs() < 1e-9);
        assert!(out.grad.data.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn gradient_matches_finite_difference() {
        let loss = CrossEntropyLoss::with_label_smoothing(0.1).unwrap();
        let logits = Matrix::from_rows(vec![vec![0.2, -1.0, 0.7], vec![1.5, 0.3, -0.4]]).unwrap();
        let targets = [2, 0];
        let out = loss.forward(&logits, &targets).unwrap();
        let h = 1e-6;
        for k in 0..logits.data.len() {
            let mut plus = logits.clone();
            plus.data[k] += h;
            let mut minus = logits.clone();
            minus.data[k] -= h;
            let numeric = (loss.forward(&plus, &targets).unwrap().value
                - loss.forward(&minus, &targets).unwrap().value)
                / (2.0 * h);
            assert!((numeric - out.grad.data[k]).abs() < 1e-7);
        }
    }

    #[test]
    fn rejects_out_of_range_target() {
        let err = CrossEntropyLoss::new().forward(&Matrix::zeros(1, 3), &[3]).unwrap_err();
        assert!(matches!(err, Error::Target { target: 3, classes: 3 }));
    }

    #[test]
    fn rejects_row_target_mismatch() {
        let err = CrossEntropyLoss::new().forward(&Matrix::zeros(2, 3), &[0]).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }
}
