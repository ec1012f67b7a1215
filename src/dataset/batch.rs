use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// One labeled example: an image tensor `[channels, height, width]` and its class index.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: Tensor,
    pub label: usize,
}

/// A group of examples processed together in one forward/backward step.
///
/// `inputs` is `[batch_size, channels, height, width]`; `targets` has
/// `batch_size` class indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Tensor,
    pub targets: Vec<usize>,
}

impl Batch {
    pub fn new(inputs: Tensor, targets: Vec<usize>) -> Result<Batch> {
        let rows = inputs
            .shape()
            .first()
            .copied()
            .ok_or_else(|| Error::Shape("batch inputs need a leading batch dimension".to_owned()))?;
        if rows != targets.len() {
            return Err(Error::Shape(format!(
                "batch has {} inputs but {} targets",
                rows, targets.len()
            )));
        }
        Ok(Batch { inputs, targets })
    }

    /// Collates samples into a batch along a new leading dimension.
    pub fn from_samples(samples: Vec<Sample>) -> Result<Batch> {
        let targets = samples.iter().map(|s| s.label).collect();
        let images: Vec<Tensor> = samples.into_iter().map(|s| s.image).collect();
        Batch::new(Tensor::stack(&images)?, targets)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unranked_or_mismatched_inputs() {
        let unranked: Tensor = serde_json::from_str(r#"{"shape":[],"data":[]}"#).unwrap();
        assert!(matches!(Batch::new(unranked, vec![]), Err(Error::Shape(_))));

        let inputs = Tensor::zeros(vec![3, 2]).unwrap();
        assert!(matches!(Batch::new(inputs, vec![0, 1]), Err(Error::Shape(_))));
    }

    #[test]
    fn collates_samples_in_order() {
        let samples = (0..3)
            .map(|i| Sample { image: Tensor::new(vec![1, 2], vec![i as f64, 0.5]).unwrap(), label: i })
            .collect();
        let batch = Batch::from_samples(samples).unwrap();
        assert_eq!(batch.inputs.shape(), &[3, 1, 2]);
        assert_eq!(batch.targets, vec![0, 1, 2]);
        assert_eq!(batch.inputs.data()[4], 2.0);
    }
}
