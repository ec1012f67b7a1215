pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod model;
pub mod loss;
pub mod optim;
pub mod dataset;
pub mod checkpoint;
pub mod tracking;
pub mod train;
pub mod config;
pub mod utils;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::{Matrix, Tensor};
pub use activation::ActivationFunction;
pub use model::{Device, Mode, Model, ModelSpec, Sequential, StateDict};
pub use loss::{CrossEntropyLoss, Loss};
pub use optim::{Adam, Optimizer, Sgd};
pub use dataset::{Batch, BatchSource, DataLoader, ImageFolder, ImageTransform};
pub use checkpoint::{CheckpointStore, FileCheckpointStore};
pub use tracking::{MemorySink, MetricsSink, OfflineSink, TrackingMode};
pub use train::{run_training_pass, run_validation_pass, EpochMetrics, Trainer, TrainingConfig};
