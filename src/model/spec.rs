use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{Activation, Dropout, Init, Layer, Linear};
use crate::model::sequential::Sequential;

/// Describes one layer in a model specification. Input widths are inferred
/// from the preceding layer, so only output sizes are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Linear { size: usize },
    Activation { function: ActivationFunction },
    Dropout { p: f64 },
}

/// A fully serializable description of a classifier architecture.
///
/// `ModelSpec` can be saved to / loaded from JSON independently of the
/// trained weights, which live in checkpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Human-readable name, logged as the run's architecture.
    pub name: String,
    /// Number of features of one flattened example (channels * height * width).
    pub input_size: usize,
    /// Ordered list of layers (input -> logits).
    pub layers: Vec<LayerSpec>,
    /// Seed for weight initialization and dropout masks.
    #[serde(default)]
    pub seed: u64,
}

impl ModelSpec {
    /// Multi-layer perceptron: `hidden` linear+activation(+dropout) blocks
    /// followed by a linear layer producing `num_classes` logits.
    pub fn mlp(
        name: impl Into<String>,
        input_size: usize,
        hidden: &[usize],
        num_classes: usize,
        activation: ActivationFunction,
        dropout: f64,
    ) -> ModelSpec {
        let mut layers = Vec::new();
        for &size in hidden {
            layers.push(LayerSpec::Linear { size });
            layers.push(LayerSpec::Activation { function: activation });
            if dropout > 0.0 {
                layers.push(LayerSpec::Dropout { p: dropout });
            }
        }
        layers.push(LayerSpec::Linear { size: num_classes });
        ModelSpec { name: name.into(), input_size, layers, seed: 0 }
    }

    pub fn with_seed(mut self, seed: u64) -> ModelSpec {
        self.seed = seed;
        self
    }

    /// Width of the final layer, i.e. the number of classes.
    pub fn output_size(&self) -> usize {
        self.layers
            .iter()
            .rev()
            .find_map(|l| match l {
                LayerSpec::Linear { size } => Some(*size),
                _ => None,
            })
            .unwrap_or(self.input_size)
    }

    pub fn build(&self) -> Result<Sequential> {
        if self.input_size == 0 {
            return Err(Error::InvalidConfig("model input_size must be positive".to_owned()));
        }
        if !matches!(self.layers.last(), Some(LayerSpec::Linear { .. })) {
            return Err(Error::InvalidConfig(format!(
                "model `{}` must end with a linear layer producing logits",
                self.name
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut width = self.input_size;
        let mut layers = Vec::with_capacity(self.layers.len());

        for (i, spec) in self.layers.iter().enumerate() {
            let layer = match spec {
                LayerSpec::Linear { size } => {
                    if *size == 0 {
                        return Err(Error::InvalidConfig(format!("layer {} has size 0", i)));
                    }
                    let init = match self.layers.get(i + 1) {
                        Some(LayerSpec::Activation { function }) if function.prefers_he_init() => Init::He,
                        _ => Init::Xavier,
                    };
                    let linear = Linear::new(width, *size, init, &mut rng);
                    width = *size;
                    Layer::Linear(linear)
                }
                LayerSpec::Activation { function } => Layer::Activation(Activation::new(*function)),
                LayerSpec::Dropout { p } => {
                    Layer::Dropout(Dropout::new(*p, self.seed.wrapping_add(i as u64 + 1))?)
                }
            };
            layers.push(layer);
        }

        Ok(Sequential::new(self.name.clone(), self.input_size, layers))
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `ModelSpec` from a JSON file.
    pub fn load_json(path: &Path) -> Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
