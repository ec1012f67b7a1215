//! TOML settings for the `ferrite-trainer` binary.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [run]
//! training_name = "tiny-imagenet-mlp"
//! epochs = 10
//!
//! [data]
//! train_dir = "tiny-imagenet/tiny-imagenet-200/train"
//! val_dir = "tiny-imagenet/tiny-imagenet-200/val"
//!
//! [optimizer]
//! kind = "sgd"
//! learning_rate = 0.01
//! momentum = 0.9
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::optim::{Adam, Optimizer, Sgd};
use crate::tracking::mode::TrackingMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub training_name: String,
    pub project: String,
    pub epochs: usize,
    pub seed: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            training_name: "ferrite-run".to_owned(),
            project: crate::train::DEFAULT_PROJECT.to_owned(),
            epochs: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Tiny-ImageNet style root holding `train/` and `val/`. When set it
    /// replaces `train_dir`, `val_dir` and `image_size` with the standard
    /// 224x224 ImageNet pipeline.
    pub root: Option<PathBuf>,
    pub train_dir: PathBuf,
    /// Validation is skipped when unset.
    pub val_dir: Option<PathBuf>,
    pub image_size: u32,
    pub batch_size: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            root: None,
            train_dir: PathBuf::from("data/train"),
            val_dir: Some(PathBuf::from("data/val")),
            image_size: 64,
            batch_size: crate::dataset::presets::DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub hidden: Vec<usize>,
    pub activation: ActivationFunction,
    pub dropout: f64,
    /// Defaults to the number of training class directories.
    pub num_classes: Option<usize>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        ModelSettings {
            name: "mlp".to_owned(),
            hidden: vec![256, 128],
            activation: ActivationFunction::ReLU,
            dropout: 0.0,
            num_classes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Sgd,
    Adam,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub kind: OptimizerKind,
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub betas: (f64, f64),
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            kind: OptimizerKind::Sgd,
            learning_rate: 0.01,
            momentum: 0.9,
            weight_decay: 0.0,
            betas: (0.9, 0.999),
        }
    }
}

impl OptimizerSettings {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match self.kind {
            OptimizerKind::Sgd => Box::new(
                Sgd::new(self.learning_rate)
                    .with_momentum(self.momentum)
                    .with_weight_decay(self.weight_decay),
            ),
            OptimizerKind::Adam => Box::new(
                Adam::new(self.learning_rate)
                    .with_betas(self.betas.0, self.betas.1)
                    .with_weight_decay(self.weight_decay),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub checkpoint_dir: PathBuf,
    pub tracking_dir: PathBuf,
    pub tracking_mode: TrackingMode,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            checkpoint_dir: PathBuf::from("checkpoints"),
            tracking_dir: PathBuf::from("runs"),
            tracking_mode: TrackingMode::Offline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunSettings,
    pub data: DataSettings,
    pub model: ModelSettings,
    pub optimizer: OptimizerSettings,
    pub output: OutputSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Settings> {
        let text = fs::read_to_string(path)?;
        Settings::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies `FERRITE_TRACKING_MODE` when it is set.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(mode) = TrackingMode::from_env()? {
            self.output.tracking_mode = mode;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));
        if self.run.training_name.trim().is_empty() {
            return invalid("run.training_name must not be empty".to_owned());
        }
        if self.run.epochs == 0 {
            return invalid("run.epochs must be at least 1".to_owned());
        }
        if self.data.batch_size == 0 {
            return invalid("data.batch_size must be at least 1".to_owned());
        }
        if self.data.image_size == 0 {
            return invalid("data.image_size must be positive".to_owned());
        }
        if !(0.0..1.0).contains(&self.model.dropout) {
            return invalid(format!("model.dropout must lie in [0, 1), got {}", self.model.dropout));
        }
        if self.model.hidden.iter().any(|&h| h == 0) {
            return invalid("model.hidden sizes must be positive".to_owned());
        }
        if self.model.num_classes == Some(0) {
            return invalid("model.num_classes must be positive".to_owned());
        }
        let lr = self.optimizer.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return invalid(format!("optimizer.learning_rate must be positive, got {}", lr));
        }
        if !(0.0..1.0).contains(&self.optimizer.momentum) {
            return invalid(format!("optimizer.momentum must lie in [0, 1), got {}", self.optimizer.momentum));
        }
        if self.optimizer.weight_decay < 0.0 {
            return invalid("optimizer.weight_decay must not be negative".to_owned());
        }
        let (beta1, beta2) = self.optimizer.betas;
        if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
            return invalid(format!("optimizer.betas must lie in [0, 1), got ({}, {})", beta1, beta2));
        }
        Ok(())
    }
}
